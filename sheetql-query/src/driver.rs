// Boundary with the component that opens worksheet files and runs statements

use sheetql_core::{DialectProfile, FileIdentity, PhysicalSchema, Result, RowCursor};

use crate::emitter::StatementPlan;

/// Opens connections to worksheet files.
pub trait DataSourceDriver: Send + Sync {
    /// Open `file` with the connection parameters of `dialect`.
    ///
    /// Fails with `Error::Connection` when the file is missing, the profile is
    /// not supported or the driver itself is unavailable.
    fn open(&self, file: &FileIdentity, dialect: &DialectProfile) -> Result<Box<dyn Connection>>;
}

/// An open connection. Dropping it releases the underlying resource.
pub trait Connection: Send {
    /// Execute `plan`, binding its parameters positionally.
    ///
    /// Returns the result column names and a forward-only cursor over the
    /// raw rows. Driver diagnostics surface as `Error::Execution`.
    fn execute(&mut self, plan: &StatementPlan) -> Result<(PhysicalSchema, Box<dyn RowCursor + '_>)>;
}
