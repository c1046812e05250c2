use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Property-to-column translation table for one record type.
///
/// Properties are the keys and worksheet column headers are the values.
/// Unmapped properties resolve to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    mappings: HashMap<String, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        self.add_mapping(property, column);
        self
    }

    pub fn add_mapping(&mut self, property: impl Into<String>, column: impl Into<String>) {
        self.mappings.insert(property.into(), column.into());
    }

    /// Physical column for `property`; total, never fails.
    pub fn resolve<'a>(&'a self, property: &'a str) -> &'a str {
        self.mappings
            .get(property)
            .map(String::as_str)
            .unwrap_or(property)
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut mapping = ColumnMapping::new();
        for (property, column) in iter {
            mapping.add_mapping(property, column);
        }
        mapping
    }
}

/// Column headers of a result set, in the order the driver returned them.
#[derive(Debug, Clone, Serialize)]
pub struct PhysicalSchema {
    columns: Vec<String>,
    #[serde(skip)]
    index: Arc<HashMap<String, usize>>,
}

impl<'de> Deserialize<'de> for PhysicalSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct SchemaHelper {
            columns: Vec<String>,
        }

        let helper = SchemaHelper::deserialize(deserializer)?;
        Ok(PhysicalSchema::new(helper.columns))
    }
}

impl PhysicalSchema {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        // Duplicate headers keep the first position, matching driver lookup by name.
        let mut index = HashMap::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(idx);
        }
        Self {
            columns,
            index: Arc::new(index),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Shared name-to-position map handed to every dynamic row.
    pub fn index_map(&self) -> Arc<HashMap<String, usize>> {
        Arc::clone(&self.index)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
