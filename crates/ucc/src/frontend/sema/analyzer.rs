//! Semantic analyzer - scope resolution and type checking
//!
//! Runs in two passes. The first enters every top-level declaration into the
//! global scope so functions may be called before their definition; the
//! second walks each function body, resolving identifiers and decorating
//! every expression with its type. All problems are collected; nothing here
//! stops at the first error.

use super::returns::block_returns;
use super::scope::{runtime_signature, StorageClass, SymbolKind, SymbolTable, RUNTIME_FUNCTIONS};
use crate::common::{CompileError, Diagnostics, Span, Warning};
use crate::frontend::ast::*;

struct FunctionContext {
    name: String,
    return_type: Type,
}

/// Semantic analyzer for type checking
pub struct SemanticAnalyzer {
    symbols: SymbolTable,
    scope: ScopeId,
    function: Option<FunctionContext>,
    errors: Vec<CompileError>,
    warnings: Vec<Warning>,
    runtime_prelude: bool,
    require_main: bool,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        let symbols = SymbolTable::new();
        let scope = symbols.global();
        Self {
            symbols,
            scope,
            function: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            runtime_prelude: true,
            require_main: true,
        }
    }

    /// Pre-declare `putint`, `putstring` and `getstring` (on by default)
    pub fn with_runtime_prelude(mut self, enabled: bool) -> Self {
        self.runtime_prelude = enabled;
        self
    }

    /// Require a definition of `int main(void)` (on by default)
    pub fn with_require_main(mut self, enabled: bool) -> Self {
        self.require_main = enabled;
        self
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }

    /// Analyze a translation unit, reporting into `diagnostics`.
    /// An analyzer handles exactly one unit.
    pub fn analyze(&mut self, program: &mut Program, diagnostics: &mut Diagnostics) {
        if self.runtime_prelude {
            self.declare_runtime_prelude();
        }

        for decl in &mut program.declarations {
            self.declare_global(decl);
        }

        if self.require_main {
            self.check_main();
        }

        for decl in &mut program.declarations {
            if let DeclKind::Function(func) = &mut decl.kind {
                self.analyze_function(func);
            }
        }

        diagnostics.extend(self.errors.drain(..));
        for warning in self.warnings.drain(..) {
            diagnostics.warning(warning);
        }
    }

    fn error(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    // =========================================================================
    // Pass 1: global declarations
    // =========================================================================

    fn declare_runtime_prelude(&mut self) {
        let global = self.symbols.global();
        for name in RUNTIME_FUNCTIONS {
            if let Some(ty) = runtime_signature(name) {
                let kind = SymbolKind::Function {
                    defined: false,
                    builtin: true,
                };
                // The prelude is the first thing entered into the global scope
                if self.symbols.define(global, name, kind, ty, Span::default()).is_err() {
                    panic!("internal error: runtime function `{}` declared before the prelude", name);
                }
            }
        }
    }

    fn declare_global(&mut self, decl: &mut Declaration) {
        match &mut decl.kind {
            DeclKind::Variables(vars) => {
                for var in vars {
                    self.declare_variable(var, StorageClass::Global);
                }
            }
            DeclKind::Function(func) => self.declare_function(func),
        }
    }

    fn declare_variable(&mut self, var: &mut VarDecl, storage: StorageClass) {
        if var.ty.is_void() || var.ty.element().is_some_and(Type::is_void) {
            self.error(CompileError::type_mismatch(
                format!("variable `{}` declared with type `{}`", var.name, var.ty),
                var.span,
            ));
        }

        let kind = SymbolKind::Variable(storage);
        match self.symbols.define(self.scope, &var.name, kind, var.ty.clone(), var.span) {
            Ok(id) => var.decl = Some(id),
            Err(_) => self.error(CompileError::redeclaration(
                format!("`{}` is already declared in this scope", var.name),
                var.span,
            )),
        }
    }

    fn declare_function(&mut self, func: &mut FuncDecl) {
        for param in &func.params {
            if param.ty.is_void() || param.ty.element().is_some_and(Type::is_void) {
                self.error(CompileError::type_mismatch(
                    format!("parameter of `{}` declared with type `{}`", func.name, param.ty),
                    param.span,
                ));
            }
        }

        let signature = func.signature();
        let defining = func.is_definition();
        let global = self.symbols.global();
        let kind = SymbolKind::Function {
            defined: defining,
            builtin: false,
        };

        let existing = match self.symbols.define(global, &func.name, kind, signature.clone(), func.name_span) {
            Ok(id) => {
                func.decl = Some(id);
                return;
            }
            Err(existing) => existing,
        };

        let previous = self.symbols.symbol(existing);
        let (previous_kind, previous_ty) = (previous.kind, previous.ty.clone());
        match previous_kind {
            SymbolKind::Variable(_) => self.error(CompileError::redeclaration(
                format!("`{}` is already declared as a variable", func.name),
                func.name_span,
            )),
            SymbolKind::Function { .. } if previous_ty != signature => {
                self.error(CompileError::redeclaration(
                    format!(
                        "conflicting types for `{}`: previously `{}`, now `{}`",
                        func.name, previous_ty, signature
                    ),
                    func.name_span,
                ))
            }
            SymbolKind::Function { defined: true, .. } if defining => {
                self.error(CompileError::redeclaration(
                    format!("function `{}` is already defined", func.name),
                    func.name_span,
                ))
            }
            SymbolKind::Function { .. } => {
                if defining {
                    let symbol = self.symbols.symbol_mut(existing);
                    symbol.kind = SymbolKind::Function {
                        defined: true,
                        builtin: false,
                    };
                    symbol.span = func.name_span;
                }
                func.decl = Some(existing);
            }
        }
    }

    fn check_main(&mut self) {
        let expected = Type::Function {
            return_type: Box::new(Type::Int),
            params: Vec::new(),
        };
        let global = self.symbols.global();

        let Some(id) = self.symbols.lookup_local(global, "main") else {
            self.error(CompileError::undeclared(
                "program does not define `int main(void)`",
                Span::default(),
            ));
            return;
        };

        let symbol = self.symbols.symbol(id);
        let span = symbol.span;
        if symbol.ty != expected {
            let found = symbol.ty.to_string();
            self.error(CompileError::type_mismatch(
                format!("`main` must be declared as `int main(void)`, found `{}`", found),
                span,
            ));
        } else if !matches!(symbol.kind, SymbolKind::Function { defined: true, .. }) {
            self.error(CompileError::undeclared("`main` is declared but never defined", span));
        }
    }

    // =========================================================================
    // Pass 2: function bodies
    // =========================================================================

    fn analyze_function(&mut self, func: &mut FuncDecl) {
        let Some(body) = func.body.as_mut() else {
            return;
        };

        let global = self.symbols.global();
        let scope = self.symbols.push_scope(global);
        func.scope = Some(scope);
        self.scope = scope;
        self.function = Some(FunctionContext {
            name: func.name.clone(),
            return_type: func.return_type.clone(),
        });

        for param in &mut func.params {
            let Some(name) = &param.name else { continue };
            let kind = SymbolKind::Variable(StorageClass::Parameter);
            match self.symbols.define(scope, name, kind, param.ty.clone(), param.span) {
                Ok(id) => param.decl = Some(id),
                Err(_) => self.errors.push(CompileError::redeclaration(
                    format!("duplicate parameter `{}` in `{}`", name, func.name),
                    param.span,
                )),
            }
        }

        self.analyze_block(body);

        // `main` may fall off its end; lowering supplies `return 0`
        if !func.return_type.is_void() && func.name != "main" && !block_returns(body) {
            self.error(CompileError::missing_return(
                format!(
                    "control reaches the end of non-void function `{}` without a return",
                    func.name
                ),
                func.name_span,
            ));
        }

        self.scope = global;
        self.function = None;
    }

    fn analyze_block(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            self.analyze_stmt(stmt);
        }
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::Empty => {}
            StmtKind::Expr(expr) => {
                if self.check_expr(expr).is_some_and(|ty| ty.is_function()) {
                    self.error(CompileError::type_mismatch(
                        "function used as a value; call it with `(...)`",
                        expr.span,
                    ));
                }
            }
            StmtKind::Block(block) => self.analyze_block(block),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_condition(condition);
                self.analyze_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.analyze_stmt(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                self.check_condition(condition);
                self.analyze_stmt(body);
            }
            StmtKind::Return(value) => self.check_return(value.as_mut(), span),
            StmtKind::Declaration(vars) => {
                for var in vars {
                    self.declare_variable(var, StorageClass::Local);
                }
            }
        }
    }

    fn check_condition(&mut self, condition: &mut Expr) {
        if let Some(ty) = self.check_expr(condition) {
            if !ty.is_scalar() {
                self.error(CompileError::type_mismatch(
                    format!("condition must be `int` or `char`, found `{}`", ty),
                    condition.span,
                ));
            }
        }
    }

    fn check_return(&mut self, value: Option<&mut Expr>, span: Span) {
        let Some(context) = &self.function else {
            return;
        };
        let name = context.name.clone();
        let expected = context.return_type.clone();

        match value {
            Some(expr) => {
                let found = self.check_expr(expr);
                if expected.is_void() {
                    self.error(CompileError::type_mismatch(
                        format!("void function `{}` cannot return a value", name),
                        expr.span,
                    ));
                } else if let Some(found) = found {
                    if !found.assignable_to(&expected) {
                        self.error(CompileError::type_mismatch(
                            format!(
                                "cannot return `{}` from `{}`, which returns `{}`",
                                found, name, expected
                            ),
                            expr.span,
                        ));
                    }
                }
            }
            None if !expected.is_void() => self.error(CompileError::type_mismatch(
                format!("non-void function `{}` must return a value", name),
                span,
            )),
            None => {}
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Type-check `expr`, record its type on the node and return it.
    /// `None` means an error was already reported inside the expression.
    fn check_expr(&mut self, expr: &mut Expr) -> Option<Type> {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::IntLiteral(_) => Some(Type::Int),
            ExprKind::CharLiteral(_) => Some(Type::Char),
            ExprKind::Identifier { name, decl } => match self.symbols.lookup(self.scope, name) {
                Some(id) => {
                    *decl = Some(id);
                    Some(self.symbols.symbol(id).ty.clone())
                }
                None => {
                    self.error(CompileError::undeclared(
                        format!("`{}` is not declared", name),
                        span,
                    ));
                    None
                }
            },
            ExprKind::Index { array, index } => self.check_index(array, index),
            ExprKind::Call { callee, args } => self.check_call(callee, args, span),
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.check_expr(operand)?;
                let symbol = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                };
                self.require_scalar(&operand_ty, operand.span, symbol)?;
                Some(Type::Int)
            }
            ExprKind::Binary { op, left, right } => {
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                let (left_ty, right_ty) = (left_ty?, right_ty?);
                self.require_scalar(&left_ty, left.span, op.symbol())?;
                self.require_scalar(&right_ty, right.span, op.symbol())?;
                Some(Type::Int)
            }
            ExprKind::Assign { target, value } => self.check_assign(target, value),
        };
        expr.ty = ty.clone();
        ty
    }

    fn require_scalar(&mut self, ty: &Type, span: Span, operator: &str) -> Option<()> {
        if ty.is_scalar() {
            return Some(());
        }
        self.error(CompileError::type_mismatch(
            format!("operand of `{}` must be `int` or `char`, found `{}`", operator, ty),
            span,
        ));
        None
    }

    fn check_index(&mut self, array: &mut Expr, index: &mut Expr) -> Option<Type> {
        let array_ty = self.check_expr(array);
        let index_ty = self.check_expr(index);
        let array_ty = array_ty?;

        let Some(element) = array_ty.element().cloned() else {
            self.error(CompileError::type_mismatch(
                format!("subscripted value of type `{}` is not an array", array_ty),
                array.span,
            ));
            return None;
        };

        let index_ty = index_ty?;
        if !index_ty.is_scalar() {
            self.error(CompileError::type_mismatch(
                format!("array index must be `int`, found `{}`", index_ty),
                index.span,
            ));
            return None;
        }

        if let (Some(len), Some(value)) = (array_ty.array_len(), constant_value(index)) {
            if value < 0 || value >= len as i64 {
                self.warnings.push(Warning::new(
                    format!(
                        "index {} is out of bounds for {} of {} element(s)",
                        value,
                        describe(array),
                        len
                    ),
                    index.span,
                ));
            }
        }

        Some(element)
    }

    fn check_call(&mut self, callee: &mut Expr, args: &mut [Expr], span: Span) -> Option<Type> {
        let callee_ty = self.check_expr(callee);
        let arg_types: Vec<Option<Type>> = args.iter_mut().map(|arg| self.check_expr(arg)).collect();
        let callee_ty = callee_ty?;
        let name = describe(callee);

        let (return_type, params) = match callee_ty {
            Type::Function {
                return_type,
                params,
            } => (*return_type, params),
            other => {
                self.error(CompileError::type_mismatch(
                    format!("{} of type `{}` is not a function", name, other),
                    callee.span,
                ));
                return None;
            }
        };

        if params.len() != args.len() {
            self.error(CompileError::arity(
                format!(
                    "{} expects {} argument(s), found {}",
                    name,
                    params.len(),
                    args.len()
                ),
                span,
            ));
            return Some(return_type);
        }

        for (position, ((arg, arg_ty), param)) in args.iter().zip(&arg_types).zip(&params).enumerate() {
            let Some(arg_ty) = arg_ty else { continue };
            if !arg_ty.passable_to(param) {
                self.error(CompileError::type_mismatch(
                    format!(
                        "argument {} of {} expects `{}`, found `{}`",
                        position + 1,
                        name,
                        param,
                        arg_ty
                    ),
                    arg.span,
                ));
            }
        }

        Some(return_type)
    }

    fn check_assign(&mut self, target: &mut Expr, value: &mut Expr) -> Option<Type> {
        let target_ty = self.check_expr(target);
        let value_ty = self.check_expr(value);
        let target_ty = target_ty?;

        match &target.kind {
            ExprKind::Identifier { name, .. } if !target_ty.is_scalar() => {
                let what = if target_ty.is_array() { "array" } else { "function" };
                self.error(CompileError::not_lvalue(
                    format!("cannot assign to {} `{}`", what, name),
                    target.span,
                ));
                return None;
            }
            ExprKind::Identifier { .. } | ExprKind::Index { .. } => {}
            _ => {
                self.error(CompileError::not_lvalue(
                    "left side of `=` is not assignable",
                    target.span,
                ));
                return None;
            }
        }

        let value_ty = value_ty?;
        if !value_ty.assignable_to(&target_ty) {
            self.error(CompileError::type_mismatch(
                format!("cannot assign `{}` to `{}`", value_ty, target_ty),
                value.span,
            ));
        }
        Some(target_ty)
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of a literal, possibly negated, used as an index
fn constant_value(expr: &Expr) -> Option<i64> {
    match &expr.kind {
        ExprKind::IntLiteral(n) => Some(i64::from(*n)),
        ExprKind::CharLiteral(c) => Some(i64::from(*c)),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => constant_value(operand).map(|v| -v),
        _ => None,
    }
}

fn describe(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Identifier { name, .. } => format!("`{}`", name),
        _ => "expression".to_string(),
    }
}
