//! Expression AST nodes

use super::{DeclId, Type};
use crate::common::Span;

/// Expression node
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Type of this expression (filled in during semantic analysis)
    pub ty: Option<Type>,
    /// Levels in the subtree rooted here; a literal or identifier is 1
    pub height: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        let below = match &kind {
            ExprKind::IntLiteral(_) | ExprKind::CharLiteral(_) | ExprKind::Identifier { .. } => 0,
            ExprKind::Index { array, index } => array.height.max(index.height),
            ExprKind::Call { callee, args } => args.iter().map(|arg| arg.height).fold(callee.height, usize::max),
            ExprKind::Unary { operand, .. } => operand.height,
            ExprKind::Binary { left, right, .. } => left.height.max(right.height),
            ExprKind::Assign { target, value } => target.height.max(value.height),
        };
        Self {
            kind,
            span,
            ty: None,
            height: below + 1,
        }
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Self::new(
            ExprKind::Identifier {
                name: name.into(),
                decl: None,
            },
            span,
        )
    }

    /// Resolved type; reaching this on an unchecked node is a compiler defect
    pub fn resolved_type(&self) -> &Type {
        match &self.ty {
            Some(ty) => ty,
            None => panic!("internal error: expression at {} has no resolved type", self.span),
        }
    }
}

/// Expression kinds
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal: 42
    IntLiteral(i32),

    /// Character literal: 'a', '\n'
    CharLiteral(u8),

    /// Identifier, resolved to its declaration during analysis
    Identifier { name: String, decl: Option<DeclId> },

    /// Array subscript: arr[i]
    Index { array: Box<Expr>, index: Box<Expr> },

    /// Function call: foo(a, b)
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Unary operation: -x, !flag
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation: a + b, x && y
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Assignment: x = y (right-associative)
    Assign { target: Box<Expr>, value: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogAnd,
    LogOr,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::LogOr => 1,
            BinaryOp::LogAnd => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div => 6,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::LogAnd => "&&",
            BinaryOp::LogOr => "||",
        }
    }
}
