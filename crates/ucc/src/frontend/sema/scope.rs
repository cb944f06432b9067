//! Symbol table and scope management
//!
//! Scopes and symbols live in two arenas owned by [`SymbolTable`] and refer
//! to each other through [`ScopeId`] and [`DeclId`] handles.

use crate::common::Span;
use crate::frontend::ast::{DeclId, ScopeId, Type};
use std::collections::HashMap;

/// Where a variable lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Global,
    Parameter,
    Local,
}

/// Kind of symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable(StorageClass),
    /// `defined` once a body has been seen; `builtin` for runtime prototypes
    Function { defined: bool, builtin: bool },
}

/// A symbol in the symbol table
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub span: Span,
    /// Scope that owns this declaration
    pub scope: ScopeId,
}

impl Symbol {
    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function { .. })
    }

    pub fn storage(&self) -> Option<StorageClass> {
        match self.kind {
            SymbolKind::Variable(storage) => Some(storage),
            SymbolKind::Function { .. } => None,
        }
    }
}

/// A scope containing symbols
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    names: HashMap<String, DeclId>,
    order: Vec<DeclId>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Declarations in insertion order
    pub fn declarations(&self) -> &[DeclId] {
        &self.order
    }
}

/// Runtime functions every program may call
pub const RUNTIME_FUNCTIONS: [&str; 3] = ["putint", "putstring", "getstring"];

/// Signature of a runtime function: `void putint(int)`, `void putstring(char[])`,
/// `void getstring(char[])`
pub fn runtime_signature(name: &str) -> Option<Type> {
    let param = match name {
        "putint" => Type::Int,
        "putstring" | "getstring" => Type::array_of(Type::Char, None),
        _ => return None,
    };
    Some(Type::Function {
        return_type: Box::new(Type::Void),
        params: vec![param],
    })
}

/// Arena of scopes and symbols for one translation unit
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            symbols: Vec::new(),
        }
    }

    /// The single global scope
    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        id
    }

    /// Insert a symbol into `scope`. Fails with the existing declaration if
    /// the name is already taken at that level.
    pub fn define(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        ty: Type,
        span: Span,
    ) -> Result<DeclId, DeclId> {
        if let Some(&existing) = self.scopes[scope.0].names.get(name) {
            return Err(existing);
        }
        let id = DeclId(self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            ty,
            span,
            scope,
        });
        let scope = &mut self.scopes[scope.0];
        scope.names.insert(name.to_string(), id);
        scope.order.push(id);
        Ok(id)
    }

    /// Resolve `name` from `scope` outwards
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(&decl) = scope.names.get(name) {
                return Some(decl);
            }
            current = scope.parent;
        }
        None
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        self.scopes[scope.0].names.get(name).copied()
    }

    pub fn symbol(&self, id: DeclId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn symbol_mut(&mut self, id: DeclId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(storage: StorageClass) -> SymbolKind {
        SymbolKind::Variable(storage)
    }

    #[test]
    fn test_lookup_walks_to_global_scope() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let g = table
            .define(global, "x", var(StorageClass::Global), Type::Int, Span::default())
            .unwrap();
        let body = table.push_scope(global);
        assert_eq!(table.lookup(body, "x"), Some(g));
        assert_eq!(table.lookup_local(body, "x"), None);

        let shadow = table
            .define(body, "x", var(StorageClass::Local), Type::Char, Span::default())
            .unwrap();
        assert_eq!(table.lookup(body, "x"), Some(shadow));
        assert_eq!(table.lookup(global, "x"), Some(g));
        assert_eq!(table.symbol(shadow).scope, body);
    }

    #[test]
    fn test_duplicate_in_same_scope_returns_existing() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let first = table
            .define(global, "n", var(StorageClass::Global), Type::Int, Span::default())
            .unwrap();
        let second = table.define(global, "n", var(StorageClass::Global), Type::Char, Span::default());
        assert_eq!(second, Err(first));
        assert_eq!(table.scope(global).declarations(), &[first]);
    }
}
