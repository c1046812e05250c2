pub mod config;
pub mod dialect;
pub mod error;
pub mod materialize;
pub mod record;
pub mod row;
pub mod schema;
pub mod value;

pub use config::{ContainsMatching, TranslatorConfig};
pub use dialect::{DialectProfile, FileIdentity, FileVersion, LikeEscape};
pub use error::{Error, Result};
pub use materialize::{materialize_records, materialize_rows, MaterializeOptions, RowCursor};
pub use record::{ElementType, FieldDescriptor, FieldType, QueryElement, RecordShape};
pub use row::{Cell, Row};
pub use schema::{ColumnMapping, PhysicalSchema};
pub use value::{DataType, Value};
