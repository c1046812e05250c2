//! Query pipeline over one workbook file: translate, open, execute, materialize.

use sheetql_core::{
    DialectProfile, Error, FileIdentity, FileVersion, QueryElement, Result, Row, RowCursor,
    TranslatorConfig, Value,
};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::driver::DataSourceDriver;
use crate::model::Cardinality;
use crate::queryable::Query;
use crate::translate::Translation;

const DEFAULT_WORKSHEET: &str = "Sheet1";

/// Stops reading after `remaining` rows, for drivers that ignore the row limit.
struct LimitedCursor<'c> {
    cursor: &'c mut dyn RowCursor,
    remaining: usize,
}

impl Iterator for LimitedCursor<'_> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.cursor.next_row().transpose()
    }
}

/// A workbook reachable through `driver`.
pub struct Workbook<D: DataSourceDriver> {
    driver: D,
    file: FileIdentity,
    config: TranslatorConfig,
    dialect: DialectProfile,
}

impl<D: DataSourceDriver> Workbook<D> {
    /// Open the workbook at `path`; the file version comes from its extension.
    pub fn open(driver: D, path: impl Into<PathBuf>) -> Result<Self> {
        let file = FileIdentity::new(path)?;
        let config = TranslatorConfig::default();
        let dialect = config.dialect_for(file.version);
        Ok(Self {
            driver,
            file,
            config,
            dialect,
        })
    }

    /// Replace the configuration. The file version override and the
    /// matching mode are checked against the resulting dialect.
    pub fn with_config(mut self, config: TranslatorConfig) -> Result<Self> {
        let dialect = config.dialect_for(self.file.version);
        config.validate(&dialect)?;
        self.config = config;
        self.dialect = dialect;
        Ok(self)
    }

    pub fn file(&self) -> &FileIdentity {
        &self.file
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn dialect(&self) -> &DialectProfile {
        &self.dialect
    }

    /// Text files hold a single table addressed by file name.
    fn worksheet_name(&self, requested: &str) -> String {
        match (self.dialect_version(), self.file.file_name()) {
            (FileVersion::Csv, Some(file_name)) => file_name.to_string(),
            _ => requested.to_string(),
        }
    }

    fn dialect_version(&self) -> FileVersion {
        self.config.file_version.unwrap_or(self.file.version)
    }

    /// Query worksheet `name` as records of type `T`.
    pub fn worksheet<T: QueryElement>(&self, name: &str) -> Query<T> {
        Query::new(self.worksheet_name(name))
    }

    /// Query the first worksheet (`Sheet1`, or the file itself for CSV).
    pub fn default_worksheet<T: QueryElement>(&self) -> Query<T> {
        self.worksheet(DEFAULT_WORKSHEET)
    }

    /// Query worksheet `name` as untyped rows.
    pub fn rows(&self, name: &str) -> Query<Row> {
        self.worksheet(name)
    }

    pub fn translate<T: QueryElement>(&self, query: &Query<T>) -> Result<Translation> {
        query.translate(&self.dialect, &self.config)
    }

    /// Run `query` and materialize every returned row.
    pub fn execute<T: QueryElement>(&self, query: &Query<T>) -> Result<Vec<T>> {
        // Translation errors must never reach the driver.
        let translation = self.translate(query)?;
        if translation.model.element.is_dynamic() != T::element_type().is_dynamic() {
            return Err(Error::InvalidQueryModel(format!(
                "query materializes {:?} but was requested as {:?}",
                translation.model.element,
                T::element_type()
            )));
        }
        debug!("Executing {}", translation.plan.text);

        let mut connection = self.driver.open(&self.file, &self.dialect)?;
        let records = {
            let (schema, mut cursor) = connection.execute(&translation.plan)?;
            let mut limited = LimitedCursor {
                cursor: cursor.as_mut(),
                remaining: translation
                    .model
                    .limit
                    .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX)),
            };
            T::materialize(
                &schema,
                &mut limited,
                query.mapping(),
                &self.config.materialize_options(),
            )?
        };

        if records.is_empty() && translation.model.cardinality == Cardinality::First {
            return Err(Error::NoRows);
        }

        info!(
            "Query on {} returned {} rows",
            translation.model.worksheet,
            records.len()
        );
        Ok(records)
    }

    /// First matching record; `Error::NoRows` when nothing matches.
    pub fn first<T: QueryElement>(&self, query: Query<T>) -> Result<T> {
        let records = self.execute(&query.first())?;
        records.into_iter().next().ok_or(Error::NoRows)
    }

    /// First matching record, if any.
    pub fn first_or_default<T: QueryElement>(&self, query: Query<T>) -> Result<Option<T>> {
        let records = self.execute(&query.first_or_default())?;
        Ok(records.into_iter().next())
    }
}
