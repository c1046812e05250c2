use thiserror::Error;

use crate::value::{DataType, Value};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported query construct: {construct}")]
    UnsupportedQueryConstruct { construct: String },

    #[error("Column '{column}' at row {row}: cannot convert {value} to {expected}")]
    ColumnTypeMismatch {
        column: String,
        expected: DataType,
        row: usize,
        value: String,
    },

    #[error("Cannot convert {value} to {target}")]
    Conversion { value: String, target: DataType },

    #[error("Invalid query model: {0}")]
    InvalidQueryModel(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Execution aborted: {0}")]
    ExecutionAborted(String),

    #[error("Query returned no rows")]
    NoRows,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn unsupported(construct: impl ToString) -> Self {
        Error::UnsupportedQueryConstruct {
            construct: construct.to_string(),
        }
    }

    pub fn conversion(value: &Value, target: DataType) -> Self {
        Error::Conversion {
            value: value.to_string(),
            target,
        }
    }

    /// Only an aborted execution may be retried; everything else is fatal to the query.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ExecutionAborted(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
