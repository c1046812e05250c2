// Record shapes: explicit field descriptor tables in place of runtime reflection

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::Result;
use crate::materialize::{MaterializeOptions, RowCursor};
use crate::schema::{ColumnMapping, PhysicalSchema};
use crate::value::{DataType, Value};

/// A Rust type that a worksheet value can be assigned to.
pub trait FieldType: Sized {
    const DATA_TYPE: DataType;
    const NULLABLE: bool = false;

    /// Build from a value already coerced to `DATA_TYPE`. `None` means the
    /// value does not fit (e.g. `Null` for a non-optional field).
    fn from_value(value: Value) -> Option<Self>;

    fn to_value(&self) -> Value;
}

impl FieldType for String {
    const DATA_TYPE: DataType = DataType::Text;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FieldType for i64 {
    const DATA_TYPE: DataType = DataType::Integer;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }
}

impl FieldType for i32 {
    const DATA_TYPE: DataType = DataType::Integer;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Integer(i) => i32::try_from(i).ok(),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }
}

impl FieldType for u32 {
    const DATA_TYPE: DataType = DataType::Integer;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Integer(i) => u32::try_from(i).ok(),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }
}

impl FieldType for f64 {
    const DATA_TYPE: DataType = DataType::Float;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FieldType for bool {
    const DATA_TYPE: DataType = DataType::Boolean;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl FieldType for NaiveDateTime {
    const DATA_TYPE: DataType = DataType::DateTime;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl FieldType for NaiveDate {
    const DATA_TYPE: DataType = DataType::Date;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl<T: FieldType> FieldType for Option<T> {
    const DATA_TYPE: DataType = T::DATA_TYPE;
    const NULLABLE: bool = true;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        self.as_ref().map(FieldType::to_value).unwrap_or(Value::Null)
    }
}

/// Name, declared type, getter and setter of one record property.
pub struct FieldDescriptor<T> {
    pub name: &'static str,
    pub data_type: DataType,
    pub nullable: bool,
    pub get: fn(&T) -> Value,
    pub set: fn(&mut T, Value) -> Option<()>,
}

impl<T> std::fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// Enumerable property metadata for a record type. Usually generated with
/// [`record_shape!`](crate::record_shape).
pub trait RecordShape: Default + Sized {
    const TYPE_NAME: &'static str;

    fn fields() -> Vec<FieldDescriptor<Self>>;
}

/// What a query materializes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ElementType {
    Typed(&'static str),
    Dynamic,
}

impl ElementType {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ElementType::Dynamic)
    }
}

/// Result element of a query: a typed record or a dynamic [`Row`](crate::row::Row).
pub trait QueryElement: Sized {
    fn element_type() -> ElementType;

    fn materialize(
        schema: &PhysicalSchema,
        cursor: &mut dyn RowCursor,
        mapping: &ColumnMapping,
        options: &MaterializeOptions,
    ) -> Result<Vec<Self>>;
}

/// Implement [`RecordShape`] and [`QueryElement`] for a struct with named fields.
///
/// ```ignore
/// #[derive(Debug, Default)]
/// struct Company { name: String, employees: i64, founded: Option<NaiveDate> }
///
/// sheetql_core::record_shape!(Company { name: String, employees: i64, founded: Option<NaiveDate> });
/// ```
#[macro_export]
macro_rules! record_shape {
    ($record:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        impl $crate::record::RecordShape for $record {
            const TYPE_NAME: &'static str = stringify!($record);

            fn fields() -> Vec<$crate::record::FieldDescriptor<Self>> {
                vec![$(
                    $crate::record::FieldDescriptor {
                        name: stringify!($field),
                        data_type: <$ty as $crate::record::FieldType>::DATA_TYPE,
                        nullable: <$ty as $crate::record::FieldType>::NULLABLE,
                        get: |record: &Self| $crate::record::FieldType::to_value(&record.$field),
                        set: |record: &mut Self, value: $crate::value::Value| -> Option<()> {
                            record.$field = <$ty as $crate::record::FieldType>::from_value(value)?;
                            Some(())
                        },
                    }
                ),*]
            }
        }

        impl $crate::record::QueryElement for $record {
            fn element_type() -> $crate::record::ElementType {
                $crate::record::ElementType::Typed(
                    <Self as $crate::record::RecordShape>::TYPE_NAME,
                )
            }

            fn materialize(
                schema: &$crate::schema::PhysicalSchema,
                cursor: &mut dyn $crate::materialize::RowCursor,
                mapping: &$crate::schema::ColumnMapping,
                options: &$crate::materialize::MaterializeOptions,
            ) -> $crate::error::Result<Vec<Self>> {
                $crate::materialize::materialize_records::<Self>(schema, cursor, mapping, options)
            }
        }
    };
}
