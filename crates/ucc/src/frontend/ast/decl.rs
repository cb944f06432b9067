//! Declaration AST nodes

use super::{Block, Type};
use crate::common::Span;

/// Stable handle of a declaration in the symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub usize);

/// Stable handle of a scope in the symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

/// Top-level declaration node
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: DeclKind,
    pub span: Span,
}

impl Declaration {
    pub fn new(kind: DeclKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Declaration kinds
#[derive(Debug, Clone)]
pub enum DeclKind {
    /// Global variables: int a, b[10];
    Variables(Vec<VarDecl>),

    /// Function prototype or definition
    Function(FuncDecl),
}

/// Variable declaration (global or local)
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub span: Span,
    /// Symbol created for this declaration (filled in during semantic analysis)
    pub decl: Option<DeclId>,
}

impl VarDecl {
    pub fn new(name: String, ty: Type, span: Span) -> Self {
        Self {
            name,
            ty,
            span,
            decl: None,
        }
    }
}

/// Function parameter. Prototypes may leave it unnamed.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: Option<String>,
    pub ty: Type,
    pub span: Span,
    pub decl: Option<DeclId>,
}

impl ParamDecl {
    pub fn new(name: Option<String>, ty: Type, span: Span) -> Self {
        Self {
            name,
            ty,
            span,
            decl: None,
        }
    }
}

/// Function declaration or definition
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<ParamDecl>,
    /// Function body (None for prototypes)
    pub body: Option<Block>,
    pub span: Span,
    pub name_span: Span,
    pub decl: Option<DeclId>,
    /// Function scope holding parameters and locals
    pub scope: Option<ScopeId>,
}

impl FuncDecl {
    pub fn is_definition(&self) -> bool {
        self.body.is_some()
    }

    pub fn signature(&self) -> Type {
        Type::Function {
            return_type: Box::new(self.return_type.clone()),
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
        }
    }
}
