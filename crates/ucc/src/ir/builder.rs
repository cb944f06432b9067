//! IR builder - lowers the checked AST to three-address code
//!
//! Runs only on a program that passed semantic analysis: every expression
//! carries its type and every identifier its declaration. A node reaching
//! lowering without them is a compiler defect and panics.

use super::inst::*;
use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::ast::*;
use crate::frontend::sema::{StorageClass, SymbolTable};
use crate::types::{IrType, WORD_SIZE};
use std::collections::HashMap;

/// Largest object, frame or global area the 32-bit address space can hold
pub const MAX_OBJECT_SIZE: usize = i32::MAX as usize;

/// Builds IR from a checked AST
pub struct IrBuilder<'a> {
    symbols: &'a SymbolTable,
    module: IrModule,
    current_func: Option<IrFunction>,
    label_counter: u32,
    locals: HashMap<DeclId, LocalId>,
    /// Set after a `br`/`cbr`/`ret`; instructions are dropped until the next label
    terminated: bool,
    global_bytes: usize,
}

impl<'a> IrBuilder<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            module: IrModule::new(),
            current_func: None,
            label_counter: 0,
            locals: HashMap::new(),
            terminated: false,
            global_bytes: 0,
        }
    }

    /// Build IR module from a checked program
    pub fn build(&mut self, program: &Program) -> CompileResult<IrModule> {
        for decl in &program.declarations {
            match &decl.kind {
                DeclKind::Variables(vars) => {
                    for var in vars {
                        self.build_global_var(var)?;
                    }
                }
                DeclKind::Function(func) => self.build_function(func)?,
            }
        }
        Ok(std::mem::take(&mut self.module))
    }

    fn func(&mut self) -> &mut IrFunction {
        match self.current_func.as_mut() {
            Some(func) => func,
            None => panic!("internal error: instruction emitted outside a function"),
        }
    }

    fn new_temp(&mut self, ty: IrType) -> Temp {
        let func = self.func();
        let t = Temp(func.temps.len() as u32);
        func.temps.push(ty);
        t
    }

    fn new_label(&mut self, prefix: &str) -> Label {
        let l = Label(format!(".L{}_{}", prefix, self.label_counter));
        self.label_counter += 1;
        l
    }

    fn emit(&mut self, inst: Inst) {
        let is_label = matches!(inst, Inst::Label(_));
        if self.terminated && !is_label {
            return;
        }
        self.terminated = inst.is_terminator();
        self.func().body.push(inst);
    }

    fn build_global_var(&mut self, var: &VarDecl) -> CompileResult<()> {
        let ty = IrType::from_source(&var.ty);
        check_object_size(&var.name, &ty, var.span)?;
        self.global_bytes = align_up(self.global_bytes, ty.align) + ty.size;
        if self.global_bytes > MAX_OBJECT_SIZE {
            return Err(CompileError::constant_out_of_range(
                format!(
                    "global variables need more than {} bytes of storage",
                    MAX_OBJECT_SIZE
                ),
                var.span,
            ));
        }

        self.module.globals.push(IrGlobal {
            name: var.name.clone(),
            size: ty.size,
            ty,
        });
        Ok(())
    }

    // =========================================================================
    // Functions and frame layout
    // =========================================================================

    fn build_function(&mut self, func: &FuncDecl) -> CompileResult<()> {
        let Some(body) = &func.body else {
            return Ok(()); // Prototypes produce no code
        };

        let mut ir_func = IrFunction::new(func.name.clone(), IrType::from_source(&func.return_type));
        self.locals.clear();
        self.terminated = false;

        for (index, param) in func.params.iter().enumerate() {
            let decl = expect_decl(param.decl, param.span);
            let id = LocalId(ir_func.locals.len() as u32);
            ir_func.locals.push(IrLocal {
                name: self.symbols.symbol(decl).name.clone(),
                ty: IrType::from_source(&param.ty),
                slot: Slot::Param(index),
            });
            ir_func.params.push(id);
            self.locals.insert(decl, id);
        }

        let scope = match func.scope {
            Some(scope) => scope,
            None => panic!("internal error: function `{}` reached lowering without a scope", func.name),
        };
        let mut offset = 0usize;
        for &decl in self.symbols.scope(scope).declarations() {
            let symbol = self.symbols.symbol(decl);
            if symbol.storage() != Some(StorageClass::Local) {
                continue;
            }
            let ty = IrType::from_source(&symbol.ty);
            check_object_size(&symbol.name, &ty, symbol.span)?;
            offset = align_up(offset, ty.align);
            let id = LocalId(ir_func.locals.len() as u32);
            ir_func.locals.push(IrLocal {
                name: symbol.name.clone(),
                slot: Slot::Frame(offset),
                ty: ty.clone(),
            });
            self.locals.insert(decl, id);
            offset = offset.saturating_add(ty.size);
        }
        ir_func.frame_size = align_up(offset, WORD_SIZE);
        if ir_func.frame_size > MAX_OBJECT_SIZE {
            return Err(CompileError::constant_out_of_range(
                format!(
                    "locals of `{}` need {} bytes, more than the {}-byte address space",
                    func.name, ir_func.frame_size, MAX_OBJECT_SIZE
                ),
                func.name_span,
            ));
        }

        self.current_func = Some(ir_func);
        self.build_block(body);

        // Falling off the end
        if !self.terminated {
            if func.return_type.is_void() {
                self.emit(Inst::Ret(None));
            } else if func.name == "main" {
                self.emit(Inst::Ret(Some(Operand::Const(0))));
            } else {
                panic!(
                    "internal error: control reaches the end of `{}` during lowering",
                    func.name
                );
            }
        }

        if let Some(built) = self.current_func.take() {
            self.module.functions.push(built);
        }
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn build_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.build_stmt(stmt);
        }
    }

    fn build_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Empty | StmtKind::Declaration(_) => {}
            StmtKind::Expr(expr) => {
                if let ExprKind::Call { callee, args } = &expr.kind {
                    self.build_call(callee, args);
                } else {
                    self.build_expr(expr);
                }
            }
            StmtKind::Block(block) => self.build_block(block),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.build_if(condition, then_branch, else_branch.as_deref()),
            StmtKind::While { condition, body } => self.build_while(condition, body),
            StmtKind::Return(value) => {
                let return_type = self.func().return_type.clone();
                let val = value.as_ref().map(|expr| self.build_value(expr, &return_type));
                self.emit(Inst::Ret(val));
            }
        }
    }

    fn build_if(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        let cond = self.build_value(condition, &IrType::i32());
        let then_label = self.new_label("if_then");
        let else_label = else_branch.map(|_| self.new_label("if_else"));
        let end_label = self.new_label("if_end");

        self.emit(Inst::Cbr {
            cond,
            then_label: then_label.clone(),
            else_label: else_label.clone().unwrap_or_else(|| end_label.clone()),
        });

        self.emit(Inst::Label(then_label));
        self.build_stmt(then_branch);
        let mut joins = !self.terminated;
        self.emit(Inst::Br(end_label.clone()));

        match (else_branch, else_label) {
            (Some(else_branch), Some(else_label)) => {
                self.emit(Inst::Label(else_label));
                self.build_stmt(else_branch);
                joins |= !self.terminated;
                self.emit(Inst::Br(end_label.clone()));
            }
            _ => joins = true,
        }

        // Both arms returned: nothing reaches the join point
        if joins {
            self.emit(Inst::Label(end_label));
        }
    }

    fn build_while(&mut self, condition: &Expr, body: &Stmt) {
        let cond_label = self.new_label("while_cond");
        let body_label = self.new_label("while_body");
        let end_label = self.new_label("while_end");

        self.emit(Inst::Br(cond_label.clone()));
        self.emit(Inst::Label(cond_label.clone()));
        let cond = self.build_value(condition, &IrType::i32());
        self.emit(Inst::Cbr {
            cond,
            then_label: body_label.clone(),
            else_label: end_label.clone(),
        });

        self.emit(Inst::Label(body_label));
        self.build_stmt(body);
        self.emit(Inst::Br(cond_label));

        self.emit(Inst::Label(end_label));
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Lower `expr` and convert the result to the scalar type `ty`
    fn build_value(&mut self, expr: &Expr, ty: &IrType) -> Operand {
        let value = self.build_expr(expr);
        let from = self.ir_type(expr);
        self.coerce(value, &from, ty)
    }

    /// Lower `expr` to an operand of its own type. Scalar reads of named
    /// storage are copied into temporaries so operands are evaluated left
    /// to right.
    fn build_expr(&mut self, expr: &Expr) -> Operand {
        match &expr.kind {
            ExprKind::IntLiteral(n) => Operand::Const(*n),
            ExprKind::CharLiteral(c) => Operand::Const(i32::from(*c)),
            ExprKind::Identifier { .. } => {
                let ty = self.ir_type(expr);
                let place = self.place_of(expr);
                if ty.is_scalar() {
                    let dst = self.new_temp(ty.clone());
                    self.emit(Inst::Move {
                        dst: Dest::Temp(dst),
                        src: Operand::Var(place),
                        ty,
                    });
                    Operand::Temp(dst)
                } else {
                    Operand::Base(place)
                }
            }
            ExprKind::Index { array, index } => {
                let base = Operand::Base(self.place_of(array));
                let index = self.build_value(index, &IrType::i32());
                let ty = self.ir_type(expr);
                let dst = self.new_temp(ty.clone());
                self.emit(Inst::Load { dst, base, index, ty });
                Operand::Temp(dst)
            }
            ExprKind::Call { callee, args } => match self.build_call(callee, args) {
                Some(value) => value,
                None => panic!("internal error: void call at {} used as a value", expr.span),
            },
            ExprKind::Unary { op, operand } => {
                let src = self.build_value(operand, &IrType::i32());
                let op = match op {
                    UnaryOp::Neg => UnOp::Neg,
                    UnaryOp::Not => UnOp::Not,
                };
                match (op, &src) {
                    (UnOp::Neg, Operand::Const(n)) => Operand::Const(n.wrapping_neg()),
                    (UnOp::Not, Operand::Const(n)) => Operand::Const(i32::from(*n == 0)),
                    _ => {
                        let dst = self.new_temp(IrType::i32());
                        self.emit(Inst::Un { dst, op, src });
                        Operand::Temp(dst)
                    }
                }
            }
            ExprKind::Binary { op, left, right } => match op {
                BinaryOp::LogAnd => self.build_short_circuit(left, right, true),
                BinaryOp::LogOr => self.build_short_circuit(left, right, false),
                _ => self.build_binary(*op, left, right),
            },
            ExprKind::Assign { target, value } => self.build_assign(target, value),
        }
    }

    fn build_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Operand {
        let left = self.build_value(left, &IrType::i32());
        let right = self.build_value(right, &IrType::i32());
        let dst = self.new_temp(IrType::i32());
        let inst = match op {
            BinaryOp::Add => Inst::Bin { dst, op: BinOp::Add, left, right },
            BinaryOp::Sub => Inst::Bin { dst, op: BinOp::Sub, left, right },
            BinaryOp::Mul => Inst::Bin { dst, op: BinOp::Mul, left, right },
            BinaryOp::Div => Inst::Bin { dst, op: BinOp::Div, left, right },
            BinaryOp::Eq => Inst::Cmp { dst, op: CmpOp::Eq, left, right },
            BinaryOp::Ne => Inst::Cmp { dst, op: CmpOp::Ne, left, right },
            BinaryOp::Lt => Inst::Cmp { dst, op: CmpOp::Lt, left, right },
            BinaryOp::Le => Inst::Cmp { dst, op: CmpOp::Le, left, right },
            BinaryOp::Gt => Inst::Cmp { dst, op: CmpOp::Gt, left, right },
            BinaryOp::Ge => Inst::Cmp { dst, op: CmpOp::Ge, left, right },
            BinaryOp::LogAnd | BinaryOp::LogOr => {
                unreachable!("logical operators are lowered by build_short_circuit")
            }
        };
        self.emit(inst);
        Operand::Temp(dst)
    }

    /// `a && b` / `a || b` as branches; the right operand is only evaluated
    /// on the edge where the left one does not decide the result.
    fn build_short_circuit(&mut self, left: &Expr, right: &Expr, is_and: bool) -> Operand {
        let prefix = if is_and { "and" } else { "or" };
        let lhs = self.build_value(left, &IrType::i32());
        let result = self.new_temp(IrType::i32());
        let rhs_label = self.new_label(&format!("{}_rhs", prefix));
        let end_label = self.new_label(&format!("{}_end", prefix));

        self.emit(Inst::Move {
            dst: Dest::Temp(result),
            src: Operand::Const(if is_and { 0 } else { 1 }),
            ty: IrType::i32(),
        });
        let (then_label, else_label) = if is_and {
            (rhs_label.clone(), end_label.clone())
        } else {
            (end_label.clone(), rhs_label.clone())
        };
        self.emit(Inst::Cbr { cond: lhs, then_label, else_label });

        self.emit(Inst::Label(rhs_label));
        let rhs = self.build_value(right, &IrType::i32());
        self.emit(Inst::Cmp {
            dst: result,
            op: CmpOp::Ne,
            left: rhs,
            right: Operand::Const(0),
        });
        self.emit(Inst::Br(end_label.clone()));

        self.emit(Inst::Label(end_label));
        Operand::Temp(result)
    }

    /// Store the converted value and yield it, so `x = y = e` evaluates `e` once
    fn build_assign(&mut self, target: &Expr, value: &Expr) -> Operand {
        let ty = self.ir_type(target);
        match &target.kind {
            ExprKind::Identifier { .. } => {
                let place = self.place_of(target);
                let src = self.build_value(value, &ty);
                self.emit(Inst::Move {
                    dst: Dest::Var(place),
                    src: src.clone(),
                    ty,
                });
                src
            }
            ExprKind::Index { array, index } => {
                let base = Operand::Base(self.place_of(array));
                let index = self.build_value(index, &IrType::i32());
                let src = self.build_value(value, &ty);
                self.emit(Inst::Store {
                    base,
                    index,
                    src: src.clone(),
                    ty,
                });
                src
            }
            _ => panic!("internal error: assignment target at {} is not an lvalue", target.span),
        }
    }

    /// Lower a call; `None` for a void callee
    fn build_call(&mut self, callee: &Expr, args: &[Expr]) -> Option<Operand> {
        let (return_type, params) = match callee.resolved_type() {
            Type::Function { return_type, params } => (return_type.as_ref().clone(), params.clone()),
            other => panic!("internal error: call at {} through non-function `{}`", callee.span, other),
        };
        let func = match &callee.kind {
            ExprKind::Identifier { name, .. } => name.clone(),
            _ => panic!("internal error: callee at {} is not a name", callee.span),
        };

        let mut operands = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(&params) {
            let operand = if param.is_array() {
                // Arrays pass their base address
                self.build_expr(arg)
            } else {
                self.build_value(arg, &IrType::from_source(param))
            };
            operands.push(operand);
        }

        let dst = if return_type.is_void() {
            None
        } else {
            Some(self.new_temp(IrType::from_source(&return_type)))
        };
        self.emit(Inst::Call {
            dst,
            func,
            args: operands,
        });
        dst.map(Operand::Temp)
    }

    /// Zero-extend or truncate between scalar types; constants are folded
    fn coerce(&mut self, value: Operand, from: &IrType, to: &IrType) -> Operand {
        if from == to {
            return value;
        }
        if !from.is_scalar() || !to.is_scalar() {
            panic!("internal error: no conversion from `{}` to `{}`", from, to);
        }
        if let Operand::Const(n) = value {
            return Operand::Const(if *to == IrType::u8() { n & 0xff } else { n });
        }
        let dst = self.new_temp(to.clone());
        if *to == IrType::i32() {
            self.emit(Inst::Zext { dst, src: value });
        } else {
            self.emit(Inst::Trunc { dst, src: value });
        }
        Operand::Temp(dst)
    }

    fn ir_type(&self, expr: &Expr) -> IrType {
        IrType::from_source(expr.resolved_type())
    }

    /// Storage named by an identifier expression
    fn place_of(&self, expr: &Expr) -> Place {
        let decl = match &expr.kind {
            ExprKind::Identifier { decl, .. } => expect_decl(*decl, expr.span),
            _ => panic!("internal error: expression at {} does not name storage", expr.span),
        };
        let symbol = self.symbols.symbol(decl);
        match symbol.storage() {
            Some(StorageClass::Global) => Place::Global(symbol.name.clone()),
            Some(StorageClass::Parameter | StorageClass::Local) => match self.locals.get(&decl) {
                Some(&id) => Place::Local(id),
                None => panic!("internal error: `{}` has no frame slot", symbol.name),
            },
            None => panic!("internal error: function `{}` used as storage", symbol.name),
        }
    }
}

fn expect_decl(decl: Option<DeclId>, span: Span) -> DeclId {
    match decl {
        Some(decl) => decl,
        None => panic!("internal error: unresolved name at {} reached lowering", span),
    }
}

fn check_object_size(name: &str, ty: &IrType, span: Span) -> CompileResult<()> {
    if ty.size > MAX_OBJECT_SIZE {
        return Err(CompileError::constant_out_of_range(
            format!(
                "`{}` needs more than the {}-byte address space",
                name, MAX_OBJECT_SIZE
            ),
            span,
        ));
    }
    Ok(())
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}
