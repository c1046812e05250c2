//! Query-expression trees.
//!
//! A query is a chain of method calls on a worksheet source, each taking a
//! lambda: `worksheet<Person>.where(|x| (x.age > 30)).take(10)`. The fluent
//! [`Query`](crate::queryable::Query) builds these trees; they can also be
//! assembled by hand with the constructors below.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sheetql_core::{DataType, ElementType, Error, Result, Value};
use std::fmt;

/// A constant operand with the type it was declared with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: Value,
    pub data_type: DataType,
}

impl Literal {
    /// A literal of `data_type`; the value is converted to that type up front.
    pub fn typed(value: impl Into<Value>, data_type: DataType) -> Result<Self> {
        let value = value.into().coerce(data_type)?;
        Ok(Self { value, data_type })
    }

    pub fn null(data_type: DataType) -> Self {
        Self {
            value: Value::Null,
            data_type,
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

impl From<Value> for Literal {
    fn from(value: Value) -> Self {
        let data_type = value.data_type().unwrap_or(DataType::Text);
        Self { value, data_type }
    }
}

macro_rules! literal_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Literal {
                fn from(v: $ty) -> Self {
                    Literal::from(Value::from(v))
                }
            }

            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Expr::Constant(Literal::from(v))
                }
            }
        )*
    };
}

literal_from!(bool, i32, i64, f64, &str, String, NaiveDate, NaiveDateTime);

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Expr::Constant(literal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Negate,
    Convert(DataType),
}

/// Node kinds of a query-expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The worksheet being queried.
    Source(ElementType),
    Call {
        method: String,
        target: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
    Lambda {
        parameter: String,
        body: Box<Expr>,
    },
    Parameter(String),
    Member {
        target: Box<Expr>,
        name: String,
    },
    /// `row["Header"]` on a dynamic row.
    Index {
        target: Box<Expr>,
        key: String,
    },
    Constant(Literal),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Anonymous record construction, used by projections.
    New {
        fields: Vec<(String, Expr)>,
    },
}

impl Expr {
    pub fn source(element: ElementType) -> Self {
        Expr::Source(element)
    }

    pub fn param(name: impl Into<String>) -> Self {
        Expr::Parameter(name.into())
    }

    pub fn constant(literal: impl Into<Literal>) -> Self {
        Expr::Constant(literal.into())
    }

    pub fn null() -> Self {
        Expr::Constant(Literal::null(DataType::Text))
    }

    /// `|parameter| body(parameter)`
    pub fn lambda(parameter: &str, body: impl FnOnce(Expr) -> Expr) -> Self {
        Expr::Lambda {
            parameter: parameter.to_string(),
            body: Box::new(body(Expr::param(parameter))),
        }
    }

    pub fn new_record<S: Into<String>>(fields: impl IntoIterator<Item = (S, Expr)>) -> Self {
        Expr::New {
            fields: fields.into_iter().map(|(name, e)| (name.into(), e)).collect(),
        }
    }

    pub fn member(self, name: impl Into<String>) -> Self {
        Expr::Member {
            target: Box::new(self),
            name: name.into(),
        }
    }

    pub fn index(self, key: impl Into<String>) -> Self {
        Expr::Index {
            target: Box::new(self),
            key: key.into(),
        }
    }

    pub fn call(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            method: method.into(),
            target: Some(Box::new(self)),
            args,
        }
    }

    pub fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Self {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right.into()),
        }
    }

    pub fn eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    pub fn ne(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ne, right)
    }

    pub fn lt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, right)
    }

    pub fn le(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Le, right)
    }

    pub fn gt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    pub fn ge(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ge, right)
    }

    pub fn and(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, right)
    }

    pub fn or(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    pub fn contains(self, substring: impl Into<Expr>) -> Self {
        self.call("contains", vec![substring.into()])
    }

    pub fn starts_with(self, prefix: impl Into<Expr>) -> Self {
        self.call("starts_with", vec![prefix.into()])
    }

    pub fn ends_with(self, suffix: impl Into<Expr>) -> Self {
        self.call("ends_with", vec![suffix.into()])
    }

    /// `cell.cast()` on a dynamic row cell.
    pub fn cast(self) -> Self {
        self.call("cast", Vec::new())
    }

    pub fn convert(self, data_type: DataType) -> Self {
        Expr::Unary {
            op: UnaryOp::Convert(data_type),
            operand: Box::new(self),
        }
    }

    /// Lambda argument of a query-level call, with its parameter name.
    pub fn as_lambda(&self) -> Option<(&str, &Expr)> {
        match self {
            Expr::Lambda { parameter, body } => Some((parameter, body)),
            _ => None,
        }
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(self),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Source(ElementType::Typed(name)) => write!(f, "worksheet<{}>", name),
            Expr::Source(ElementType::Dynamic) => write!(f, "worksheet<Row>"),
            Expr::Call {
                method,
                target,
                args,
            } => {
                if let Some(target) = target {
                    write!(f, "{}.", target)?;
                }
                write!(f, "{}(", method)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Lambda { parameter, body } => write!(f, "|{}| {}", parameter, body),
            Expr::Parameter(name) => write!(f, "{}", name),
            Expr::Member { target, name } => write!(f, "{}.{}", target, name),
            Expr::Index { target, key } => write!(f, "{}[{:?}]", target, key),
            Expr::Constant(literal) => write!(f, "{}", literal.value),
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{}", operand),
                UnaryOp::Negate => write!(f, "-{}", operand),
                UnaryOp::Convert(data_type) => write!(f, "({} as {})", operand, data_type),
            },
            Expr::New { fields } => {
                write!(f, "{{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, " }}")
            }
        }
    }
}

/// Fail with the node's text as diagnostic.
pub(crate) fn unsupported<T>(node: &Expr) -> Result<T> {
    Err(Error::unsupported(node))
}
