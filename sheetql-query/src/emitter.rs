//! Renders a [`QueryModel`] into dialect-specific SQL text
//! with positional `?` placeholders and the matching parameter list.

use serde::Serialize;
use sheetql_core::dialect::LimitStyle;
use sheetql_core::{
    ContainsMatching, DataType, DialectProfile, Error, Result, TranslatorConfig, Value,
};
use tracing::debug;

use crate::model::{
    BoundLiteral, FilterExpr, Operand, OrderBy, Projection, QueryModel, SortDirection,
};

/// One positional parameter of a [`StatementPlan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub value: Value,
    pub data_type: DataType,
}

/// Statement text plus parameters, aligned with the placeholders in `text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementPlan {
    pub text: String,
    pub parameters: Vec<Parameter>,
}

impl StatementPlan {
    /// Number of `?` placeholders in `text`, ignoring any inside quoted
    /// identifiers or string literals.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut closing: Option<char> = None;
        let mut chars = self.text.chars().peekable();
        while let Some(ch) = chars.next() {
            match closing {
                Some(close) if ch == close => {
                    // A doubled closing character is an escaped literal one.
                    if chars.peek() == Some(&close) {
                        chars.next();
                    } else {
                        closing = None;
                    }
                }
                Some(_) => {}
                None => match ch {
                    '?' => count += 1,
                    '[' => closing = Some(']'),
                    '"' => closing = Some('"'),
                    '\'' => closing = Some('\''),
                    _ => {}
                },
            }
        }
        count
    }
}

/// Render `model` for `dialect`.
pub fn emit(
    model: &QueryModel,
    dialect: &DialectProfile,
    config: &TranslatorConfig,
) -> Result<StatementPlan> {
    config.validate(dialect)?;

    let mut sql = SqlBuilder {
        dialect,
        matching: config.contains_matching,
        text: String::new(),
        parameters: Vec::new(),
    };

    sql.append_syntax("SELECT ");
    if let (LimitStyle::Top, Some(limit)) = (dialect.limit_style, model.limit) {
        sql.append_syntax(&format!("TOP {} ", limit));
    }
    sql.append_projection(&model.projection);
    sql.append_syntax(" FROM ");
    sql.append_syntax(&dialect.worksheet_reference(&model.worksheet));

    if let Some(filter) = &model.filter {
        sql.append_syntax(" WHERE ");
        sql.append_filter(filter)?;
    }

    if !model.ordering.is_empty() {
        sql.append_syntax(" ORDER BY ");
        sql.append_ordering(&model.ordering);
    }

    if let (LimitStyle::Limit, Some(limit)) = (dialect.limit_style, model.limit) {
        sql.append_syntax(&format!(" LIMIT {}", limit));
    }

    let plan = StatementPlan {
        text: sql.text,
        parameters: sql.parameters,
    };
    debug!(
        "Emitted statement {} with {} parameters",
        plan.text,
        plan.parameters.len()
    );
    Ok(plan)
}

#[derive(Clone, Copy)]
enum Anchor {
    Anywhere,
    Start,
    End,
}

struct SqlBuilder<'d> {
    dialect: &'d DialectProfile,
    matching: ContainsMatching,
    text: String,
    parameters: Vec<Parameter>,
}

impl<'d> SqlBuilder<'d> {
    fn append_syntax(&mut self, syntax: &str) {
        self.text.push_str(syntax);
    }

    fn append_identifier(&mut self, name: &str) {
        let quoted = self.dialect.quote_identifier(name);
        self.text.push_str(&quoted);
    }

    /// Append a placeholder for `literal`, checking it is the next one expected.
    fn append_param(&mut self, literal: &BoundLiteral, value: Value) -> Result<()> {
        if literal.position != self.parameters.len() {
            return Err(Error::InvalidQueryModel(format!(
                "literal at position {} rendered as parameter {}",
                literal.position,
                self.parameters.len()
            )));
        }
        self.text.push('?');
        self.parameters.push(Parameter {
            value,
            data_type: literal.data_type,
        });
        Ok(())
    }

    fn append_projection(&mut self, projection: &Projection) {
        match projection {
            Projection::All => self.append_syntax("*"),
            Projection::Columns(columns) => {
                for (i, projected) in columns.iter().enumerate() {
                    if i > 0 {
                        self.append_syntax(", ");
                    }
                    self.append_identifier(&projected.column);
                    if let Some(alias) = &projected.alias {
                        self.append_syntax(" AS ");
                        self.append_identifier(alias);
                    }
                }
            }
        }
    }

    fn append_ordering(&mut self, ordering: &[OrderBy]) {
        for (i, order) in ordering.iter().enumerate() {
            if i > 0 {
                self.append_syntax(", ");
            }
            self.append_identifier(&order.column);
            self.append_syntax(match order.direction {
                SortDirection::Ascending => " ASC",
                SortDirection::Descending => " DESC",
            });
        }
    }

    fn append_filter(&mut self, filter: &FilterExpr) -> Result<()> {
        match filter {
            FilterExpr::Comparison {
                column,
                op,
                operand,
            } => {
                self.append_identifier(column);
                self.append_syntax(" ");
                self.append_syntax(op.sql());
                self.append_syntax(" ");
                match operand {
                    Operand::Literal(literal) => self.append_param(literal, literal.value.clone())?,
                    Operand::Column(other) => self.append_identifier(other),
                }
            }
            FilterExpr::And(left, right) => self.append_binary(left, "AND", right)?,
            FilterExpr::Or(left, right) => self.append_binary(left, "OR", right)?,
            FilterExpr::Not(inner) => {
                self.append_syntax("(NOT ");
                self.append_filter(inner)?;
                self.append_syntax(")");
            }
            FilterExpr::Contains { column, substring } => {
                self.append_pattern(column, substring, Anchor::Anywhere)?
            }
            FilterExpr::StartsWith { column, prefix } => {
                self.append_pattern(column, prefix, Anchor::Start)?
            }
            FilterExpr::EndsWith { column, suffix } => {
                self.append_pattern(column, suffix, Anchor::End)?
            }
            FilterExpr::IsNull(column) => {
                self.append_identifier(column);
                self.append_syntax(" IS NULL");
            }
            FilterExpr::IsNotNull(column) => {
                self.append_identifier(column);
                self.append_syntax(" IS NOT NULL");
            }
        }
        Ok(())
    }

    fn append_binary(&mut self, left: &FilterExpr, keyword: &str, right: &FilterExpr) -> Result<()> {
        self.append_syntax("(");
        self.append_filter(left)?;
        self.append_syntax(" ");
        self.append_syntax(keyword);
        self.append_syntax(" ");
        self.append_filter(right)?;
        self.append_syntax(")");
        Ok(())
    }

    fn append_pattern(&mut self, column: &str, literal: &BoundLiteral, anchor: Anchor) -> Result<()> {
        let text = match &literal.value {
            Value::Text(text) => text.clone(),
            other => {
                return Err(Error::InvalidQueryModel(format!(
                    "pattern literal {} is not text",
                    other
                )))
            }
        };

        match self.matching {
            ContainsMatching::CaseSensitive => {
                let length = text.chars().count();
                match anchor {
                    Anchor::Anywhere => {
                        self.append_syntax("INSTR(1, ");
                        self.append_identifier(column);
                        self.append_syntax(", ");
                        self.append_param(literal, Value::Text(text))?;
                        self.append_syntax(", 0) > 0");
                    }
                    Anchor::Start | Anchor::End => {
                        let function = if matches!(anchor, Anchor::Start) { "LEFT" } else { "RIGHT" };
                        self.append_syntax(&format!("STRCOMP({}(", function));
                        self.append_identifier(column);
                        self.append_syntax(&format!(", {}), ", length));
                        self.append_param(literal, Value::Text(text))?;
                        self.append_syntax(", 0) = 0");
                    }
                }
            }
            ContainsMatching::DriverDefault | ContainsMatching::CaseInsensitive => {
                let folded = self.matching == ContainsMatching::CaseInsensitive;
                let escaped = if folded {
                    self.dialect.like_escape.escape(&text.to_uppercase())
                } else {
                    self.dialect.like_escape.escape(&text)
                };
                let pattern = match anchor {
                    Anchor::Anywhere => format!("%{}%", escaped),
                    Anchor::Start => format!("{}%", escaped),
                    Anchor::End => format!("%{}", escaped),
                };
                if folded {
                    self.append_syntax(self.dialect.upper_function);
                    self.append_syntax("(");
                    self.append_identifier(column);
                    self.append_syntax(")");
                } else {
                    self.append_identifier(column);
                }
                self.append_syntax(" LIKE ");
                self.append_param(literal, Value::Text(pattern))?;
                self.append_syntax(self.dialect.like_escape.clause());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComparisonOp, ProjectedColumn};
    use proptest::prelude::*;
    use sheetql_core::{ElementType, FileVersion};

    fn text_literal(text: &str, position: usize) -> BoundLiteral {
        BoundLiteral {
            value: Value::from(text),
            data_type: DataType::Text,
            position,
        }
    }

    fn int_literal(value: i64, position: usize) -> BoundLiteral {
        BoundLiteral {
            value: Value::Integer(value),
            data_type: DataType::Integer,
            position,
        }
    }

    fn model(filter: Option<FilterExpr>) -> QueryModel {
        let mut model = QueryModel::new("Sheet1", ElementType::Dynamic);
        model.filter = filter;
        model
    }

    fn excel() -> DialectProfile {
        DialectProfile::for_version(FileVersion::Excel2007)
    }

    fn with_matching(matching: ContainsMatching) -> TranslatorConfig {
        TranslatorConfig {
            contains_matching: matching,
            ..TranslatorConfig::default()
        }
    }

    fn contains(text: &str) -> FilterExpr {
        FilterExpr::Contains {
            column: "Name".to_string(),
            substring: text_literal(text, 0),
        }
    }

    #[test]
    fn test_select_all() {
        let plan = emit(&model(None), &excel(), &TranslatorConfig::default()).unwrap();
        assert_eq!(plan.text, "SELECT * FROM [Sheet1$]");
        assert!(plan.parameters.is_empty());
    }

    #[test]
    fn test_full_statement_with_top() {
        let mut model = model(Some(FilterExpr::And(
            Box::new(FilterExpr::Comparison {
                column: "Age".to_string(),
                op: ComparisonOp::Gt,
                operand: Operand::Literal(int_literal(30, 0)),
            }),
            Box::new(FilterExpr::IsNotNull("E-mail".to_string())),
        )));
        model.projection = Projection::Columns(vec![
            ProjectedColumn {
                column: "Company Title".to_string(),
                alias: Some("name".to_string()),
            },
            ProjectedColumn {
                column: "Age".to_string(),
                alias: None,
            },
        ]);
        model.ordering = vec![
            OrderBy {
                column: "Age".to_string(),
                direction: SortDirection::Descending,
            },
            OrderBy {
                column: "Company Title".to_string(),
                direction: SortDirection::Ascending,
            },
        ];
        model.limit = Some(5);

        let plan = emit(&model, &excel(), &TranslatorConfig::default()).unwrap();
        assert_eq!(
            plan.text,
            "SELECT TOP 5 [Company Title] AS [name], [Age] FROM [Sheet1$] \
             WHERE ([Age] > ? AND [E-mail] IS NOT NULL) ORDER BY [Age] DESC, [Company Title] ASC"
        );
        assert_eq!(
            plan.parameters,
            vec![Parameter {
                value: Value::Integer(30),
                data_type: DataType::Integer
            }]
        );
    }

    #[test]
    fn test_ansi_dialect_uses_limit_and_double_quotes() {
        let mut model = model(Some(contains("50%")));
        model.limit = Some(2);
        let plan = emit(&model, &DialectProfile::ansi(), &TranslatorConfig::default()).unwrap();
        assert_eq!(
            plan.text,
            "SELECT * FROM \"Sheet1\" WHERE \"Name\" LIKE ? ESCAPE '\\' LIMIT 2"
        );
        assert_eq!(plan.parameters[0].value, Value::from("%50\\%%"));
        assert_eq!(plan.placeholder_count(), 1);
    }

    #[test]
    fn test_csv_sheet_reference_is_plain() {
        let mut model = model(None);
        model.worksheet = "people.csv".to_string();
        let dialect = DialectProfile::for_version(FileVersion::Csv);
        let plan = emit(&model, &dialect, &TranslatorConfig::default()).unwrap();
        assert_eq!(plan.text, "SELECT * FROM [people.csv]");
    }

    #[test]
    fn test_contains_escapes_wildcards() {
        let plan = emit(&model(Some(contains("a_b[c"))), &excel(), &TranslatorConfig::default()).unwrap();
        assert_eq!(plan.text, "SELECT * FROM [Sheet1$] WHERE [Name] LIKE ?");
        assert_eq!(plan.parameters[0].value, Value::from("%a[_]b[[]c%"));
    }

    #[test]
    fn test_case_insensitive_contains() {
        let plan = emit(
            &model(Some(contains("acme"))),
            &excel(),
            &with_matching(ContainsMatching::CaseInsensitive),
        )
        .unwrap();
        assert_eq!(plan.text, "SELECT * FROM [Sheet1$] WHERE UCASE([Name]) LIKE ?");
        assert_eq!(plan.parameters[0].value, Value::from("%ACME%"));
    }

    #[test]
    fn test_case_sensitive_forms() {
        let config = with_matching(ContainsMatching::CaseSensitive);
        let plan = emit(&model(Some(contains("Ac"))), &excel(), &config).unwrap();
        assert_eq!(plan.text, "SELECT * FROM [Sheet1$] WHERE INSTR(1, [Name], ?, 0) > 0");
        assert_eq!(plan.parameters[0].value, Value::from("Ac"));

        let starts = FilterExpr::StartsWith {
            column: "Name".to_string(),
            prefix: text_literal("Acm", 0),
        };
        let plan = emit(&model(Some(starts)), &excel(), &config).unwrap();
        assert_eq!(
            plan.text,
            "SELECT * FROM [Sheet1$] WHERE STRCOMP(LEFT([Name], 3), ?, 0) = 0"
        );

        let ends = FilterExpr::EndsWith {
            column: "Name".to_string(),
            suffix: text_literal("é!", 0),
        };
        let plan = emit(&model(Some(ends)), &excel(), &config).unwrap();
        assert_eq!(
            plan.text,
            "SELECT * FROM [Sheet1$] WHERE STRCOMP(RIGHT([Name], 2), ?, 0) = 0"
        );
    }

    #[test]
    fn test_case_sensitive_without_instr_is_rejected() {
        let result = emit(
            &model(Some(contains("x"))),
            &DialectProfile::ansi(),
            &with_matching(ContainsMatching::CaseSensitive),
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_prefix_and_suffix_patterns() {
        let filter = FilterExpr::Or(
            Box::new(FilterExpr::StartsWith {
                column: "A".to_string(),
                prefix: text_literal("x", 0),
            }),
            Box::new(FilterExpr::Not(Box::new(FilterExpr::EndsWith {
                column: "B".to_string(),
                suffix: text_literal("y", 1),
            }))),
        );
        let plan = emit(&model(Some(filter)), &excel(), &TranslatorConfig::default()).unwrap();
        assert_eq!(
            plan.text,
            "SELECT * FROM [Sheet1$] WHERE ([A] LIKE ? OR (NOT [B] LIKE ?))"
        );
        let values: Vec<Value> = plan.parameters.into_iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Value::from("x%"), Value::from("%y")]);
    }

    #[test]
    fn test_out_of_order_positions_are_rejected() {
        let filter = FilterExpr::And(
            Box::new(FilterExpr::Comparison {
                column: "A".to_string(),
                op: ComparisonOp::Eq,
                operand: Operand::Literal(int_literal(1, 1)),
            }),
            Box::new(FilterExpr::Comparison {
                column: "B".to_string(),
                op: ComparisonOp::Eq,
                operand: Operand::Literal(int_literal(2, 0)),
            }),
        );
        let result = emit(&model(Some(filter)), &excel(), &TranslatorConfig::default());
        assert!(matches!(result, Err(Error::InvalidQueryModel(_))));
    }

    #[test]
    fn test_column_comparison_has_no_parameter() {
        let filter = FilterExpr::Comparison {
            column: "Start".to_string(),
            op: ComparisonOp::Le,
            operand: Operand::Column("End".to_string()),
        };
        let plan = emit(&model(Some(filter)), &excel(), &TranslatorConfig::default()).unwrap();
        assert_eq!(plan.text, "SELECT * FROM [Sheet1$] WHERE [Start] <= [End]");
        assert_eq!(plan.placeholder_count(), 0);
    }

    #[test]
    fn test_placeholder_count_skips_quoted_text() {
        let plan = StatementPlan {
            text: "SELECT [Why?], \"a\"\"?\" FROM [Q?]]$] WHERE [x] = ? AND y LIKE '?'".to_string(),
            parameters: Vec::new(),
        };
        assert_eq!(plan.placeholder_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_substring_never_changes_statement_text(substring in ".*") {
            let config = TranslatorConfig::default();
            let baseline = emit(&model(Some(contains("x"))), &excel(), &config).unwrap();
            let plan = emit(&model(Some(contains(&substring))), &excel(), &config).unwrap();
            prop_assert_eq!(&plan.text, &baseline.text);
            prop_assert_eq!(plan.placeholder_count(), plan.parameters.len());
            prop_assert_eq!(plan.parameters[0].data_type, DataType::Text);
        }

        #[test]
        fn prop_ansi_pattern_round_trips(substring in "[a-z%_\\\\]{0,12}") {
            let plan = emit(&model(Some(contains(&substring))), &DialectProfile::ansi(), &TranslatorConfig::default()).unwrap();
            let pattern = match &plan.parameters[0].value {
                Value::Text(text) => text.clone(),
                other => panic!("unexpected parameter {:?}", other),
            };
            let inner = &pattern[1..pattern.len() - 1];
            let mut unescaped = String::new();
            let mut chars = inner.chars();
            while let Some(ch) = chars.next() {
                if ch == '\\' {
                    if let Some(next) = chars.next() {
                        unescaped.push(next);
                    }
                } else {
                    prop_assert!(ch != '%' && ch != '_');
                    unescaped.push(ch);
                }
            }
            prop_assert_eq!(unescaped, substring);
        }
    }
}
