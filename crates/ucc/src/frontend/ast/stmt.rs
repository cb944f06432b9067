//! Statement AST nodes

use super::{Expr, VarDecl};
use crate::common::Span;

/// Statement node
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Empty statement: ;
    Empty,

    /// Expression statement: x = 5;
    Expr(Expr),

    /// Compound statement: { ... }
    Block(Block),

    /// If statement
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// While loop
    While { condition: Expr, body: Box<Stmt> },

    /// Return statement
    Return(Option<Expr>),

    /// Local declaration: int a, b[3];
    Declaration(Vec<VarDecl>),
}

/// Block of statements; local declarations come first
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }
}
