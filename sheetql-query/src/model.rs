use serde::{Deserialize, Serialize};
use sheetql_core::{DataType, ElementType, Value};

/// A literal operand, numbered by the order in which it was compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundLiteral {
    pub value: Value,
    pub data_type: DataType,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    pub fn sql(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }

    /// The operator that keeps the meaning when both operands swap sides.
    pub fn mirrored(&self) -> Self {
        match self {
            ComparisonOp::Lt => ComparisonOp::Gt,
            ComparisonOp::Le => ComparisonOp::Ge,
            ComparisonOp::Gt => ComparisonOp::Lt,
            ComparisonOp::Ge => ComparisonOp::Le,
            other => *other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Literal(BoundLiteral),
    Column(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    Comparison {
        column: String,
        op: ComparisonOp,
        operand: Operand,
    },
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
    Contains {
        column: String,
        substring: BoundLiteral,
    },
    StartsWith {
        column: String,
        prefix: BoundLiteral,
    },
    EndsWith {
        column: String,
        suffix: BoundLiteral,
    },
    IsNull(String),
    IsNotNull(String),
}

impl FilterExpr {
    /// Literals in rendering order (left to right).
    pub fn literals(&self) -> Vec<&BoundLiteral> {
        let mut out = Vec::new();
        self.collect_literals(&mut out);
        out
    }

    fn collect_literals<'a>(&'a self, out: &mut Vec<&'a BoundLiteral>) {
        match self {
            FilterExpr::Comparison {
                operand: Operand::Literal(literal),
                ..
            } => out.push(literal),
            FilterExpr::Comparison { .. } | FilterExpr::IsNull(_) | FilterExpr::IsNotNull(_) => {}
            FilterExpr::And(left, right) | FilterExpr::Or(left, right) => {
                left.collect_literals(out);
                right.collect_literals(out);
            }
            FilterExpr::Not(inner) => inner.collect_literals(out),
            FilterExpr::Contains { substring: literal, .. }
            | FilterExpr::StartsWith { prefix: literal, .. }
            | FilterExpr::EndsWith { suffix: literal, .. } => out.push(literal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedColumn {
    pub column: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// `*`
    All,
    Columns(Vec<ProjectedColumn>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    All,
    First,
    FirstOrDefault,
}

/// Dialect-agnostic description of one flat single-worksheet SELECT.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryModel {
    pub worksheet: String,
    pub projection: Projection,
    pub filter: Option<FilterExpr>,
    pub ordering: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub element: ElementType,
    pub cardinality: Cardinality,
}

impl QueryModel {
    pub fn new(worksheet: impl Into<String>, element: ElementType) -> Self {
        Self {
            worksheet: worksheet.into(),
            projection: Projection::All,
            filter: None,
            ordering: Vec::new(),
            limit: None,
            element,
            cardinality: Cardinality::All,
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.filter.as_ref().map_or(0, |f| f.literals().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(value: i64, position: usize) -> BoundLiteral {
        BoundLiteral {
            value: Value::Integer(value),
            data_type: DataType::Integer,
            position,
        }
    }

    #[test]
    fn test_literals_in_rendering_order() {
        let filter = FilterExpr::Or(
            Box::new(FilterExpr::Comparison {
                column: "a".to_string(),
                op: ComparisonOp::Gt,
                operand: Operand::Literal(literal(1, 0)),
            }),
            Box::new(FilterExpr::Not(Box::new(FilterExpr::And(
                Box::new(FilterExpr::IsNull("b".to_string())),
                Box::new(FilterExpr::Contains {
                    column: "c".to_string(),
                    substring: BoundLiteral {
                        value: Value::from("x"),
                        data_type: DataType::Text,
                        position: 1,
                    },
                }),
            )))),
        );
        let positions: Vec<usize> = filter.literals().iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn test_mirrored_operators() {
        assert_eq!(ComparisonOp::Lt.mirrored(), ComparisonOp::Gt);
        assert_eq!(ComparisonOp::Ge.mirrored(), ComparisonOp::Le);
        assert_eq!(ComparisonOp::Eq.mirrored(), ComparisonOp::Eq);
    }

    #[test]
    fn test_new_model_defaults() {
        let model = QueryModel::new("Sheet1", ElementType::Dynamic);
        assert_eq!(model.projection, Projection::All);
        assert!(model.filter.is_none());
        assert_eq!(model.parameter_count(), 0);
        assert_eq!(model.cardinality, Cardinality::All);
    }
}
