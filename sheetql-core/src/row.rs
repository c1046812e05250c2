use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::record::FieldType;
use crate::value::{DataType, Value};

/// One raw worksheet value. Conversions happen on access, never eagerly.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    value: Value,
}

impl Cell {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn as_text(&self) -> Result<String> {
        self.cast()
    }

    pub fn as_number(&self) -> Result<f64> {
        self.cast()
    }

    pub fn as_integer(&self) -> Result<i64> {
        self.cast()
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.cast()
    }

    pub fn as_date_time(&self) -> Result<NaiveDateTime> {
        self.cast()
    }

    pub fn as_date(&self) -> Result<NaiveDate> {
        self.cast()
    }

    /// Convert the raw value to any field type; `Option<T>` maps blanks to `None`.
    pub fn cast<T: FieldType>(&self) -> Result<T> {
        let coerced = self.value.coerce(T::DATA_TYPE)?;
        T::from_value(coerced).ok_or_else(|| Error::conversion(&self.value, T::DATA_TYPE))
    }

    pub fn try_as(&self, target: DataType) -> Result<Value> {
        self.value.coerce(target)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Null => Ok(()),
            Value::Text(s) => write!(f, "{}", s),
            other => write!(f, "{}", other),
        }
    }
}

/// A schema-less result row: cells in worksheet column order plus a shared
/// header index.
#[derive(Debug, Clone)]
pub struct Row {
    cells: Vec<Cell>,
    columns: Arc<HashMap<String, usize>>,
}

impl Row {
    pub fn new(cells: Vec<Cell>, columns: Arc<HashMap<String, usize>>) -> Self {
        Self { cells, columns }
    }

    pub fn cell(&self, column: &str) -> Result<&Cell> {
        self.columns
            .get(column)
            .and_then(|&idx| self.cells.get(idx))
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Header names ordered by position.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<(&str, usize)> = self
            .columns
            .iter()
            .map(|(name, &idx)| (name.as_str(), idx))
            .collect();
        names.sort_by_key(|&(_, idx)| idx);
        names.into_iter().map(|(name, _)| name).collect()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl std::ops::Index<usize> for Row {
    type Output = Cell;

    fn index(&self, index: usize) -> &Cell {
        &self.cells[index]
    }
}
