//! Semantic analysis for µC

mod analyzer;
mod returns;
mod scope;

pub use analyzer::SemanticAnalyzer;
pub use returns::{block_returns, stmt_returns};
pub use scope::{
    runtime_signature, Scope, StorageClass, Symbol, SymbolKind, SymbolTable, RUNTIME_FUNCTIONS,
};
