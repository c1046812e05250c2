use serde::Serialize;
use sheetql_core::{ColumnMapping, DialectProfile, Result, TranslatorConfig};
use tracing::debug;

use crate::compiler::compile;
use crate::emitter::{emit, StatementPlan};
use crate::expr::Expr;
use crate::model::QueryModel;

/// Output of one translation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    pub model: QueryModel,
    pub plan: StatementPlan,
}

/// Compile `expr` and render it for `dialect`.
pub fn translate(
    expr: &Expr,
    mapping: &ColumnMapping,
    worksheet: &str,
    dialect: &DialectProfile,
    config: &TranslatorConfig,
) -> Result<Translation> {
    let model = compile(expr, mapping, worksheet)?;
    let plan = emit(&model, dialect, config)?;
    debug!(
        "Translated query on {} for dialect {} ({} parameters)",
        worksheet,
        dialect.name,
        plan.parameters.len()
    );
    Ok(Translation { model, plan })
}
