use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::{ElementType, FieldDescriptor, QueryElement, RecordShape};
use crate::row::{Cell, Row};
use crate::schema::{ColumnMapping, PhysicalSchema};
use crate::value::Value;

/// Forward-only cursor over the raw rows of an executed statement.
pub trait RowCursor {
    /// Next row in schema order, or `None` at end of data.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

impl<I> RowCursor for I
where
    I: Iterator<Item = Result<Vec<Value>>>,
{
    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        self.next().transpose()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeOptions {
    /// Trim surrounding whitespace from text cells before typed conversion.
    pub trim_text: bool,
}

fn checked_width(values: &[Value], schema: &PhysicalSchema, row: usize) -> Result<()> {
    if values.len() != schema.len() {
        return Err(Error::Execution(format!(
            "row {} has {} values but the result has {} columns",
            row,
            values.len(),
            schema.len()
        )));
    }
    Ok(())
}

/// Build one dynamic [`Row`] per raw row, cells in schema order.
pub fn materialize_rows(schema: &PhysicalSchema, cursor: &mut dyn RowCursor) -> Result<Vec<Row>> {
    let columns = schema.index_map();
    let mut rows = Vec::new();
    while let Some(values) = cursor.next_row()? {
        checked_width(&values, schema, rows.len() + 1)?;
        let cells = values.into_iter().map(Cell::new).collect();
        rows.push(Row::new(cells, columns.clone()));
    }
    debug!("Materialized {} dynamic rows", rows.len());
    Ok(rows)
}

struct Binding<T> {
    field: FieldDescriptor<T>,
    column: String,
    index: usize,
}

/// Assign one record per raw row. Fields whose column is absent from the
/// schema keep their default; a value that does not convert aborts the whole
/// result with [`Error::ColumnTypeMismatch`].
pub fn materialize_records<T: RecordShape>(
    schema: &PhysicalSchema,
    cursor: &mut dyn RowCursor,
    mapping: &ColumnMapping,
    options: &MaterializeOptions,
) -> Result<Vec<T>> {
    let mut bindings = Vec::new();
    let mut unbound = Vec::new();
    for field in T::fields() {
        let column = mapping.resolve(field.name).to_string();
        match schema.column_index(&column) {
            Some(index) => bindings.push(Binding { field, column, index }),
            None => unbound.push(column),
        }
    }
    if !unbound.is_empty() {
        warn!(
            "{}: columns {:?} not present in worksheet, fields left at default",
            T::TYPE_NAME,
            unbound
        );
    }

    let mut records = Vec::new();
    while let Some(values) = cursor.next_row()? {
        let row = records.len() + 1;
        checked_width(&values, schema, row)?;
        let mut record = T::default();
        // Several fields may read the same column.
        for binding in &bindings {
            let raw = match &values[binding.index] {
                Value::Text(s) if options.trim_text => Value::Text(s.trim().to_string()),
                other => other.clone(),
            };
            assign(&mut record, binding, raw, row)?;
        }
        records.push(record);
    }
    debug!("Materialized {} {} records", records.len(), T::TYPE_NAME);
    Ok(records)
}

fn assign<T>(record: &mut T, binding: &Binding<T>, raw: Value, row: usize) -> Result<()> {
    let field = &binding.field;
    let mismatch = |raw: &Value| Error::ColumnTypeMismatch {
        column: binding.column.clone(),
        expected: field.data_type,
        row,
        value: raw.to_string(),
    };
    if raw.is_null() && !field.nullable {
        return Err(mismatch(&raw));
    }
    let converted = raw.coerce(field.data_type).map_err(|_| mismatch(&raw))?;
    (field.set)(record, converted).ok_or_else(|| mismatch(&raw))
}

impl QueryElement for Row {
    fn element_type() -> ElementType {
        ElementType::Dynamic
    }

    fn materialize(
        schema: &PhysicalSchema,
        cursor: &mut dyn RowCursor,
        _mapping: &ColumnMapping,
        _options: &MaterializeOptions,
    ) -> Result<Vec<Self>> {
        materialize_rows(schema, cursor)
    }
}
