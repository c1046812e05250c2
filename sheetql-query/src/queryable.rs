// Fluent query construction over a worksheet

use sheetql_core::{ColumnMapping, DialectProfile, QueryElement, Result, Row, TranslatorConfig};
use std::fmt;
use std::marker::PhantomData;

use crate::expr::Expr;
use crate::translate::{translate, Translation};

const PARAMETER: &str = "x";

/// A query over one worksheet, materializing into `T`.
///
/// Each combinator appends a method call to the underlying expression tree;
/// nothing is checked until the query is translated.
///
/// ```ignore
/// let adults = Query::<Person>::new("People")
///     .map_column("name", "Full Name")
///     .filter(|x| x.member("age").ge(18))
///     .order_by(|x| x.member("name"))
///     .take(10);
/// ```
pub struct Query<T: QueryElement> {
    expr: Expr,
    worksheet: String,
    mapping: ColumnMapping,
    _element: PhantomData<fn() -> T>,
}

impl<T: QueryElement> Query<T> {
    pub fn new(worksheet: impl Into<String>) -> Self {
        Self {
            expr: Expr::source(T::element_type()),
            worksheet: worksheet.into(),
            mapping: ColumnMapping::new(),
            _element: PhantomData,
        }
    }

    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Read `property` from the column headed `column`.
    pub fn map_column(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        self.mapping.add_mapping(property, column);
        self
    }

    fn call(self, method: &str, args: Vec<Expr>) -> Self {
        Self {
            expr: self.expr.call(method, args),
            ..self
        }
    }

    fn call_lambda(self, method: &str, body: impl FnOnce(Expr) -> Expr) -> Self {
        self.call(method, vec![Expr::lambda(PARAMETER, body)])
    }

    /// Keep rows matching `predicate`. Repeated filters are combined with AND.
    pub fn filter(self, predicate: impl FnOnce(Expr) -> Expr) -> Self {
        self.call_lambda("where", predicate)
    }

    pub fn order_by(self, key: impl FnOnce(Expr) -> Expr) -> Self {
        self.call_lambda("order_by", key)
    }

    pub fn order_by_descending(self, key: impl FnOnce(Expr) -> Expr) -> Self {
        self.call_lambda("order_by_descending", key)
    }

    pub fn then_by(self, key: impl FnOnce(Expr) -> Expr) -> Self {
        self.call_lambda("then_by", key)
    }

    pub fn then_by_descending(self, key: impl FnOnce(Expr) -> Expr) -> Self {
        self.call_lambda("then_by_descending", key)
    }

    pub fn take(self, count: u32) -> Self {
        self.call("take", vec![Expr::constant(i64::from(count))])
    }

    pub fn first(self) -> Self {
        self.call("first", Vec::new())
    }

    pub fn first_or_default(self) -> Self {
        self.call("first_or_default", Vec::new())
    }

    /// Project onto a subset of columns. The result is untyped.
    pub fn select(self, projection: impl FnOnce(Expr) -> Expr) -> Query<Row> {
        Query {
            expr: self.expr.call("select", vec![Expr::lambda(PARAMETER, projection)]),
            worksheet: self.worksheet,
            mapping: self.mapping,
            _element: PhantomData,
        }
    }

    /// Read every column as untyped [`Row`]s.
    pub fn into_rows(self) -> Query<Row> {
        Query {
            expr: self.expr.call("as_rows", Vec::new()),
            worksheet: self.worksheet,
            mapping: self.mapping,
            _element: PhantomData,
        }
    }

    pub fn expression(&self) -> &Expr {
        &self.expr
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn translate(&self, dialect: &DialectProfile, config: &TranslatorConfig) -> Result<Translation> {
        translate(&self.expr, &self.mapping, &self.worksheet, dialect, config)
    }
}

impl<T: QueryElement> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            worksheet: self.worksheet.clone(),
            mapping: self.mapping.clone(),
            _element: PhantomData,
        }
    }
}

impl<T: QueryElement> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("worksheet", &self.worksheet)
            .field("expr", &self.expr.to_string())
            .field("mapping", &self.mapping)
            .finish()
    }
}
