//! Abstract Syntax Tree definitions

mod decl;
mod expr;
mod stmt;
mod types;

pub use decl::*;
pub use expr::*;
pub use stmt::*;
pub use types::*;

/// A complete translation unit (source file)
#[derive(Debug, Clone)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

impl Program {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    /// Function definitions (declarations with a body), in source order
    pub fn functions(&self) -> impl Iterator<Item = &FuncDecl> {
        self.declarations.iter().filter_map(|d| match &d.kind {
            DeclKind::Function(f) if f.body.is_some() => Some(f),
            _ => None,
        })
    }
}
