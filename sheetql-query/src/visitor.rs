// Generic dispatch over query-expression trees

use sheetql_core::{DataType, ElementType, Result};

use crate::expr::{unsupported, BinaryOp, Expr, Literal, UnaryOp};

/// Recursive visitor over [`Expr`].
///
/// `visit` dispatches on the node kind. Every per-kind hook defaults to
/// failing with `UnsupportedQueryConstruct` carrying the node's text, so a
/// visitor only accepts the constructs it explicitly handles.
pub trait ExprVisitor {
    type Output;

    fn visit(&mut self, node: &Expr) -> Result<Self::Output> {
        match node {
            Expr::Source(element) => self.visit_source(node, *element),
            Expr::Call {
                method,
                target,
                args,
            } => self.visit_call(node, method, target.as_deref(), args),
            Expr::Lambda { parameter, body } => self.visit_lambda(node, parameter, body),
            Expr::Parameter(name) => self.visit_parameter(node, name),
            Expr::Member { target, name } => self.visit_member(node, target, name),
            Expr::Index { target, key } => self.visit_index(node, target, key),
            Expr::Constant(literal) => self.visit_constant(node, literal),
            Expr::Binary { op, left, right } => self.visit_binary(node, *op, left, right),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => self.visit_not(node, operand),
                UnaryOp::Negate => self.visit_negate(node, operand),
                UnaryOp::Convert(data_type) => self.visit_convert(node, operand, *data_type),
            },
            Expr::New { fields } => self.visit_new(node, fields),
        }
    }

    fn visit_source(&mut self, node: &Expr, _element: ElementType) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_call(
        &mut self,
        node: &Expr,
        _method: &str,
        _target: Option<&Expr>,
        _args: &[Expr],
    ) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_lambda(&mut self, node: &Expr, _parameter: &str, _body: &Expr) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_parameter(&mut self, node: &Expr, _name: &str) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_member(&mut self, node: &Expr, _target: &Expr, _name: &str) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_index(&mut self, node: &Expr, _target: &Expr, _key: &str) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_constant(&mut self, node: &Expr, _literal: &Literal) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_binary(
        &mut self,
        node: &Expr,
        _op: BinaryOp,
        _left: &Expr,
        _right: &Expr,
    ) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_not(&mut self, node: &Expr, _operand: &Expr) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_negate(&mut self, node: &Expr, _operand: &Expr) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_convert(
        &mut self,
        node: &Expr,
        _operand: &Expr,
        _data_type: DataType,
    ) -> Result<Self::Output> {
        unsupported(node)
    }

    fn visit_new(&mut self, node: &Expr, _fields: &[(String, Expr)]) -> Result<Self::Output> {
        unsupported(node)
    }
}
