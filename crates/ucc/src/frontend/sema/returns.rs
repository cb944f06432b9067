//! Return-path analysis
//!
//! A statement "returns" when every path through it ends in `return`:
//! a `return` itself, an `if` whose two arms both return, or a block whose
//! last statement returns. Loops never count, whatever their condition.

use crate::frontend::ast::{Block, Stmt, StmtKind};

pub fn block_returns(block: &Block) -> bool {
    block.stmts.last().is_some_and(stmt_returns)
}

pub fn stmt_returns(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => stmt_returns(then_branch) && stmt_returns(else_branch),
        StmtKind::Block(block) => block_returns(block),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{DeclKind, Program};
    use crate::frontend::parser::Parser;

    fn body_returns(source: &str) -> bool {
        let program: Program = Parser::new(source).parse();
        match &program.declarations[0].kind {
            DeclKind::Function(f) => block_returns(f.body.as_ref().unwrap()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_return_paths() {
        assert!(body_returns("int f(int n) { return n; }"));
        assert!(body_returns("int f(int n) { if (n) return 1; else return 2; }"));
        assert!(body_returns("int f(int n) { if (n) { return 1; } else { { return 2; } } }"));
        assert!(body_returns(
            "int f(int n) { if (n == 0) return 1; else if (n == 1) return 2; else return 3; }"
        ));
        assert!(body_returns("int f(int n) { if (n) return 1; return 0; }"));
    }

    #[test]
    fn test_missing_return_paths() {
        assert!(!body_returns("int f(int n) { }"));
        assert!(!body_returns("int f(int n) { if (n) return 1; }"));
        assert!(!body_returns("int f(int n) { while (1) return 1; }"));
        assert!(!body_returns("int f(int n) { if (n) return 1; else if (n) return 2; }"));
        assert!(!body_returns("int f(int n) { return 1; ; }"));
    }
}
