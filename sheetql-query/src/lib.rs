//! Translation of worksheet query expressions into parameterized SQL, and
//! execution of the result through a pluggable driver.

pub mod compiler;
pub mod driver;
pub mod emitter;
pub mod expr;
pub mod memory;
pub mod model;
pub mod queryable;
pub mod translate;
pub mod visitor;
pub mod workbook;

pub use compiler::compile;
pub use driver::{Connection, DataSourceDriver};
pub use emitter::{emit, Parameter, StatementPlan};
pub use expr::{BinaryOp, Expr, Literal, UnaryOp};
pub use memory::{MemoryDriver, MemorySheet};
pub use model::{
    BoundLiteral, Cardinality, ComparisonOp, FilterExpr, Operand, OrderBy, ProjectedColumn,
    Projection, QueryModel, SortDirection,
};
pub use queryable::Query;
pub use translate::{translate, Translation};
pub use visitor::ExprVisitor;
pub use workbook::Workbook;
