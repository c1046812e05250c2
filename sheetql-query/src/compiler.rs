//! Builds a [`QueryModel`] from a query-expression tree.
//!
//! Two visitors cooperate: [`QueryCompiler`] walks the chain of query-level
//! calls (`where`, `order_by`, `take`, ...) from the worksheet source
//! outwards, and [`PredicateCompiler`] compiles each lambda body into a
//! column reference, a literal or a filter.

use sheetql_core::{ColumnMapping, DataType, ElementType, Error, Result, Value};
use tracing::trace;

use crate::expr::{unsupported, BinaryOp, Expr, Literal};
use crate::model::{
    BoundLiteral, Cardinality, ComparisonOp, FilterExpr, Operand, OrderBy, ProjectedColumn,
    Projection, QueryModel, SortDirection,
};
use crate::visitor::ExprVisitor;

/// Compile `expr` against `worksheet`, resolving properties through `mapping`.
pub fn compile(expr: &Expr, mapping: &ColumnMapping, worksheet: &str) -> Result<QueryModel> {
    let mut compiler = QueryCompiler {
        mapping,
        worksheet,
        model: None,
        next_position: 0,
    };
    compiler.visit(expr)?;
    let model = compiler
        .model
        .ok_or_else(|| Error::unsupported(expr))?;
    trace!("Compiled {} into {:?}", expr, model);
    Ok(model)
}

struct QueryCompiler<'a> {
    mapping: &'a ColumnMapping,
    worksheet: &'a str,
    model: Option<QueryModel>,
    next_position: usize,
}

fn single_lambda<'e>(node: &Expr, args: &'e [Expr]) -> Result<(&'e str, &'e Expr)> {
    match args {
        [arg] => arg.as_lambda().ok_or_else(|| Error::unsupported(node)),
        _ => unsupported(node),
    }
}

fn row_count(node: &Expr, args: &[Expr]) -> Result<u64> {
    let literal = match args {
        [Expr::Constant(literal)] => literal,
        _ => return unsupported(node),
    };
    let count = literal
        .value
        .coerce(DataType::Integer)
        .map_err(|_| Error::unsupported(node))?;
    match count {
        Value::Integer(n) if n >= 0 => Ok(n as u64),
        _ => unsupported(node),
    }
}

/// Names after a projection are aliases, not worksheet columns.
fn is_projected(model: &QueryModel) -> bool {
    matches!(model.projection, Projection::Columns(_))
}

impl<'a> QueryCompiler<'a> {
    fn predicates<'s>(&'s mut self, parameter: &'s str) -> PredicateCompiler<'s> {
        PredicateCompiler {
            mapping: self.mapping,
            parameter,
            next_position: &mut self.next_position,
        }
    }

    fn add_filter(&mut self, node: &Expr, args: &[Expr]) -> Result<()> {
        let (parameter, body) = single_lambda(node, args)?;
        let model = self.model_ref(node)?;
        // Filtering after a row limit or a projection has no flat SELECT equivalent.
        if model.limit.is_some() || is_projected(model) {
            return unsupported(node);
        }
        let filter = {
            let mut predicates = self.predicates(parameter);
            let fragment = predicates.visit(body)?;
            predicates.into_filter(body, fragment)?
        };
        let model = self.model_mut(node)?;
        model.filter = Some(match model.filter.take() {
            Some(existing) => FilterExpr::And(Box::new(existing), Box::new(filter)),
            None => filter,
        });
        Ok(())
    }

    fn add_ordering(
        &mut self,
        node: &Expr,
        args: &[Expr],
        direction: SortDirection,
        then: bool,
    ) -> Result<()> {
        let (parameter, body) = single_lambda(node, args)?;
        let column = self.predicates(parameter).column(body)?;
        let model = self.model_mut(node)?;
        if model.limit.is_some() || is_projected(model) || (then && model.ordering.is_empty()) {
            return unsupported(node);
        }
        model.ordering.push(OrderBy { column, direction });
        Ok(())
    }

    fn project(&mut self, node: &Expr, args: &[Expr]) -> Result<()> {
        let (parameter, body) = single_lambda(node, args)?;
        if is_projected(self.model_ref(node)?) {
            return unsupported(node);
        }
        let columns = match body {
            Expr::Parameter(name) if name == parameter => return Ok(()),
            Expr::New { fields } => {
                let mut columns = Vec::with_capacity(fields.len());
                for (name, value) in fields {
                    let column = self.predicates(parameter).column(value)?;
                    let alias = (*name != column).then(|| name.clone());
                    columns.push(ProjectedColumn { column, alias });
                }
                columns
            }
            other => vec![ProjectedColumn {
                column: self.predicates(parameter).column(other)?,
                alias: None,
            }],
        };
        let model = self.model_mut(node)?;
        model.projection = Projection::Columns(columns);
        model.element = ElementType::Dynamic;
        Ok(())
    }

    fn model_ref(&self, node: &Expr) -> Result<&QueryModel> {
        self.model.as_ref().ok_or_else(|| Error::unsupported(node))
    }

    fn model_mut(&mut self, node: &Expr) -> Result<&mut QueryModel> {
        self.model.as_mut().ok_or_else(|| Error::unsupported(node))
    }
}

impl<'a> ExprVisitor for QueryCompiler<'a> {
    type Output = ();

    fn visit_source(&mut self, node: &Expr, element: ElementType) -> Result<()> {
        if self.model.is_some() {
            return unsupported(node);
        }
        self.model = Some(QueryModel::new(self.worksheet, element));
        Ok(())
    }

    fn visit_call(
        &mut self,
        node: &Expr,
        method: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> Result<()> {
        let target = match target {
            Some(target) => target,
            None => return unsupported(node),
        };
        // Inner calls first, so the model sees calls in the order they were made.
        self.visit(target)?;

        match method {
            "where" => self.add_filter(node, args),
            "order_by" => self.add_ordering(node, args, SortDirection::Ascending, false),
            "order_by_descending" => self.add_ordering(node, args, SortDirection::Descending, false),
            "then_by" => self.add_ordering(node, args, SortDirection::Ascending, true),
            "then_by_descending" => self.add_ordering(node, args, SortDirection::Descending, true),
            "take" => {
                let limit = row_count(node, args)?;
                self.model_mut(node)?.limit = Some(limit);
                Ok(())
            }
            "first" | "first_or_default" => {
                if !args.is_empty() {
                    self.add_filter(node, args)?;
                }
                let model = self.model_mut(node)?;
                model.limit = Some(1);
                model.cardinality = if method == "first" {
                    Cardinality::First
                } else {
                    Cardinality::FirstOrDefault
                };
                Ok(())
            }
            "select" => self.project(node, args),
            "as_rows" if args.is_empty() => {
                self.model_mut(node)?.element = ElementType::Dynamic;
                Ok(())
            }
            _ => unsupported(node),
        }
    }
}

/// Partial result of compiling a lambda body.
#[derive(Debug, Clone, PartialEq)]
enum Fragment {
    Column(String),
    Literal(Literal),
    Filter(FilterExpr),
}

struct PredicateCompiler<'c> {
    mapping: &'c ColumnMapping,
    parameter: &'c str,
    next_position: &'c mut usize,
}

impl<'c> PredicateCompiler<'c> {
    fn bind(&mut self, literal: Literal) -> BoundLiteral {
        let position = *self.next_position;
        *self.next_position += 1;
        BoundLiteral {
            value: literal.value,
            data_type: literal.data_type,
            position,
        }
    }

    fn column(&mut self, node: &Expr) -> Result<String> {
        match self.visit(node)? {
            Fragment::Column(column) => Ok(column),
            _ => unsupported(node),
        }
    }

    /// A lambda body used as a predicate. A bare boolean column means `column = true`.
    fn into_filter(&mut self, node: &Expr, fragment: Fragment) -> Result<FilterExpr> {
        match fragment {
            Fragment::Filter(filter) => Ok(filter),
            Fragment::Column(column) => Ok(FilterExpr::Comparison {
                column,
                op: ComparisonOp::Eq,
                operand: Operand::Literal(self.bind(Literal::from(true))),
            }),
            Fragment::Literal(_) => unsupported(node),
        }
    }

    fn is_own_parameter(&self, target: &Expr) -> bool {
        matches!(target, Expr::Parameter(name) if name == self.parameter)
    }

    fn compare(&mut self, node: &Expr, op: ComparisonOp, left: &Expr, right: &Expr) -> Result<Fragment> {
        let left = self.visit(left)?;
        let right = self.visit(right)?;
        let (column, op, other) = match (left, right) {
            (Fragment::Column(column), other) => (column, op, other),
            (Fragment::Literal(literal), Fragment::Column(column)) => {
                (column, op.mirrored(), Fragment::Literal(literal))
            }
            _ => return unsupported(node),
        };
        let filter = match other {
            Fragment::Column(right) => FilterExpr::Comparison {
                column,
                op,
                operand: Operand::Column(right),
            },
            Fragment::Literal(literal) if literal.is_null() => match op {
                ComparisonOp::Eq => FilterExpr::IsNull(column),
                ComparisonOp::Ne => FilterExpr::IsNotNull(column),
                _ => return unsupported(node),
            },
            Fragment::Literal(literal) => FilterExpr::Comparison {
                column,
                op,
                operand: Operand::Literal(self.bind(literal)),
            },
            Fragment::Filter(_) => return unsupported(node),
        };
        Ok(Fragment::Filter(filter))
    }

    fn pattern(&mut self, node: &Expr, method: &str, target: &Expr, args: &[Expr]) -> Result<Fragment> {
        let column = self.column(target)?;
        let literal = match args {
            [arg] => match self.visit(arg)? {
                Fragment::Literal(literal) if !literal.is_null() => literal,
                _ => return unsupported(node),
            },
            _ => return unsupported(node),
        };
        let text = self.bind(Literal::typed(literal.value, DataType::Text)?);
        let filter = match method {
            "contains" => FilterExpr::Contains {
                column,
                substring: text,
            },
            "starts_with" => FilterExpr::StartsWith {
                column,
                prefix: text,
            },
            _ => FilterExpr::EndsWith {
                column,
                suffix: text,
            },
        };
        Ok(Fragment::Filter(filter))
    }
}

impl<'c> ExprVisitor for PredicateCompiler<'c> {
    type Output = Fragment;

    fn visit_member(&mut self, node: &Expr, target: &Expr, name: &str) -> Result<Fragment> {
        if !self.is_own_parameter(target) {
            return unsupported(node);
        }
        Ok(Fragment::Column(self.mapping.resolve(name).to_string()))
    }

    fn visit_index(&mut self, node: &Expr, target: &Expr, key: &str) -> Result<Fragment> {
        if !self.is_own_parameter(target) {
            return unsupported(node);
        }
        Ok(Fragment::Column(self.mapping.resolve(key).to_string()))
    }

    fn visit_constant(&mut self, _node: &Expr, literal: &Literal) -> Result<Fragment> {
        Ok(Fragment::Literal(literal.clone()))
    }

    fn visit_call(
        &mut self,
        node: &Expr,
        method: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> Result<Fragment> {
        match (method, target) {
            ("cast", Some(target)) if args.is_empty() => {
                Ok(Fragment::Column(self.column(target)?))
            }
            ("contains" | "starts_with" | "ends_with", Some(target)) => {
                self.pattern(node, method, target, args)
            }
            _ => unsupported(node),
        }
    }

    fn visit_binary(&mut self, node: &Expr, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Fragment> {
        let comparison = match op {
            BinaryOp::Eq => ComparisonOp::Eq,
            BinaryOp::Ne => ComparisonOp::Ne,
            BinaryOp::Lt => ComparisonOp::Lt,
            BinaryOp::Le => ComparisonOp::Le,
            BinaryOp::Gt => ComparisonOp::Gt,
            BinaryOp::Ge => ComparisonOp::Ge,
            BinaryOp::And | BinaryOp::Or => {
                let lhs = self.visit(left)?;
                let lhs = self.into_filter(left, lhs)?;
                let rhs = self.visit(right)?;
                let rhs = self.into_filter(right, rhs)?;
                let filter = if op == BinaryOp::And {
                    FilterExpr::And(Box::new(lhs), Box::new(rhs))
                } else {
                    FilterExpr::Or(Box::new(lhs), Box::new(rhs))
                };
                return Ok(Fragment::Filter(filter));
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                return unsupported(node)
            }
        };
        self.compare(node, comparison, left, right)
    }

    fn visit_not(&mut self, node: &Expr, operand: &Expr) -> Result<Fragment> {
        match self.visit(operand)? {
            Fragment::Literal(_) => unsupported(node),
            fragment => {
                let inner = self.into_filter(operand, fragment)?;
                Ok(Fragment::Filter(FilterExpr::Not(Box::new(inner))))
            }
        }
    }

    fn visit_negate(&mut self, node: &Expr, operand: &Expr) -> Result<Fragment> {
        match self.visit(operand)? {
            Fragment::Literal(Literal {
                value: Value::Integer(i),
                data_type,
            }) => Ok(Fragment::Literal(Literal {
                value: Value::Integer(i.checked_neg().ok_or_else(|| Error::unsupported(node))?),
                data_type,
            })),
            Fragment::Literal(Literal {
                value: Value::Float(f),
                data_type,
            }) => Ok(Fragment::Literal(Literal {
                value: Value::Float(-f),
                data_type,
            })),
            _ => unsupported(node),
        }
    }

    fn visit_convert(&mut self, node: &Expr, operand: &Expr, data_type: DataType) -> Result<Fragment> {
        match self.visit(operand)? {
            Fragment::Column(column) => Ok(Fragment::Column(column)),
            Fragment::Literal(literal) => Literal::typed(literal.value, data_type)
                .map(Fragment::Literal)
                .map_err(|_| Error::unsupported(node)),
            Fragment::Filter(_) => unsupported(node),
        }
    }
}
