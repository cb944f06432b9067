//! IR instruction definitions

use crate::types::IrType;
use std::fmt;

/// A temporary value (virtual register)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Temp(pub u32);

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A label in the IR
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(pub String);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into [`IrFunction::locals`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub u32);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Named storage: a parameter or frame slot, or a global
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Place {
    Local(LocalId),
    Global(String),
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Local(id) => write!(f, "{}", id),
            Place::Global(name) => write!(f, "@{}", name),
        }
    }
}

/// An IR operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Const(i32),
    Temp(Temp),
    /// Value of a named scalar
    Var(Place),
    /// Base address of a named array or array reference
    Base(Place),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(n) => write!(f, "{}", n),
            Operand::Temp(t) => write!(f, "{}", t),
            Operand::Var(place) => write!(f, "{}", place),
            Operand::Base(place) => write!(f, "&{}", place),
        }
    }
}

/// Destination of a `move`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dest {
    Temp(Temp),
    Var(Place),
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dest::Temp(t) => write!(f, "{}", t),
            Dest::Var(place) => write!(f, "{}", place),
        }
    }
}

/// Arithmetic on `i32`, wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// Truncates toward zero
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Add => write!(f, "add"),
            BinOp::Sub => write!(f, "sub"),
            BinOp::Mul => write!(f, "mul"),
            BinOp::Div => write!(f, "div"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    /// Logical not: 1 if the operand is zero, else 0
    Not,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnOp::Neg => write!(f, "neg"),
            UnOp::Not => write!(f, "not"),
        }
    }
}

/// Signed comparison producing 0 or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn evaluate(self, left: i32, right: i32) -> bool {
        match self {
            CmpOp::Eq => left == right,
            CmpOp::Ne => left != right,
            CmpOp::Lt => left < right,
            CmpOp::Le => left <= right,
            CmpOp::Gt => left > right,
            CmpOp::Ge => left >= right,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmpOp::Eq => write!(f, "eq"),
            CmpOp::Ne => write!(f, "ne"),
            CmpOp::Lt => write!(f, "lt"),
            CmpOp::Le => write!(f, "le"),
            CmpOp::Gt => write!(f, "gt"),
            CmpOp::Ge => write!(f, "ge"),
        }
    }
}

/// IR instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    /// Label definition
    Label(Label),

    /// dst = src, at scalar type `ty`
    Move { dst: Dest, src: Operand, ty: IrType },

    /// dst = left op right
    Bin {
        dst: Temp,
        op: BinOp,
        left: Operand,
        right: Operand,
    },

    /// dst = op src
    Un { dst: Temp, op: UnOp, src: Operand },

    /// dst = left op right ? 1 : 0
    Cmp {
        dst: Temp,
        op: CmpOp,
        left: Operand,
        right: Operand,
    },

    /// Widen a `u8` to `i32` with zero fill
    Zext { dst: Temp, src: Operand },

    /// Keep the low 8 bits of an `i32`
    Trunc { dst: Temp, src: Operand },

    /// Jump to `then_label` if cond is non-zero, else to `else_label`
    Cbr {
        cond: Operand,
        then_label: Label,
        else_label: Label,
    },

    /// Unconditional jump
    Br(Label),

    /// dst = base[index], element type `ty`
    Load {
        dst: Temp,
        base: Operand,
        index: Operand,
        ty: IrType,
    },

    /// base[index] = src, element type `ty`
    Store {
        base: Operand,
        index: Operand,
        src: Operand,
        ty: IrType,
    },

    /// dst = func(args...)
    Call {
        dst: Option<Temp>,
        func: String,
        args: Vec<Operand>,
    },

    /// Return, with a value unless the function is void
    Ret(Option<Operand>),
}

impl Inst {
    /// Ends a straight-line region
    pub fn is_terminator(&self) -> bool {
        matches!(self, Inst::Br(_) | Inst::Cbr { .. } | Inst::Ret(_))
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Label(l) => write!(f, "{}:", l),
            Inst::Move { dst, src, ty } => write!(f, "  {} = move.{} {}", dst, ty, src),
            Inst::Bin { dst, op, left, right } => write!(f, "  {} = {} {}, {}", dst, op, left, right),
            Inst::Un { dst, op, src } => write!(f, "  {} = {} {}", dst, op, src),
            Inst::Cmp { dst, op, left, right } => {
                write!(f, "  {} = cmp {} {}, {}", dst, op, left, right)
            }
            Inst::Zext { dst, src } => write!(f, "  {} = zext {}", dst, src),
            Inst::Trunc { dst, src } => write!(f, "  {} = trunc {}", dst, src),
            Inst::Cbr { cond, then_label, else_label } => {
                write!(f, "  cbr {}, {}, {}", cond, then_label, else_label)
            }
            Inst::Br(l) => write!(f, "  br {}", l),
            Inst::Load { dst, base, index, ty } => {
                write!(f, "  {} = load.{} {}[{}]", dst, ty, base, index)
            }
            Inst::Store { base, index, src, ty } => {
                write!(f, "  store.{} {}[{}], {}", ty, base, index, src)
            }
            Inst::Call { dst, func, args } => {
                if let Some(d) = dst {
                    write!(f, "  {} = call @{}(", d, func)?;
                } else {
                    write!(f, "  call @{}(", func)?;
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Inst::Ret(Some(v)) => write!(f, "  ret {}", v),
            Inst::Ret(None) => write!(f, "  ret"),
        }
    }
}

/// Where a local lives at run time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Incoming argument by position
    Param(usize),
    /// Byte offset into the frame
    Frame(usize),
}

/// Parameter or local variable of a function
#[derive(Debug, Clone, PartialEq)]
pub struct IrLocal {
    pub name: String,
    pub ty: IrType,
    pub slot: Slot,
}

impl fmt::Display for IrLocal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            Slot::Param(index) => write!(f, "{}: {} param {}", self.name, self.ty, index),
            Slot::Frame(offset) => write!(f, "{}: {} frame {}", self.name, self.ty, offset),
        }
    }
}

/// IR function
#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub name: String,
    pub return_type: IrType,
    /// Parameters in declaration order
    pub params: Vec<LocalId>,
    pub locals: Vec<IrLocal>,
    /// Type of every temporary, indexed by [`Temp`]
    pub temps: Vec<IrType>,
    /// Bytes of frame storage for non-parameter locals
    pub frame_size: usize,
    pub body: Vec<Inst>,
}

impl IrFunction {
    pub fn new(name: String, return_type: IrType) -> Self {
        Self {
            name,
            return_type,
            params: Vec::new(),
            locals: Vec::new(),
            temps: Vec::new(),
            frame_size: 0,
            body: Vec::new(),
        }
    }

    pub fn local(&self, id: LocalId) -> &IrLocal {
        &self.locals[id.0 as usize]
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function {} @{}(", self.return_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        writeln!(f, ") frame {}:", self.frame_size)?;
        for (i, local) in self.locals.iter().enumerate() {
            writeln!(f, "  ; {} {}", LocalId(i as u32), local)?;
        }
        for inst in &self.body {
            writeln!(f, "{}", inst)?;
        }
        Ok(())
    }
}

/// IR global variable, zero-initialized
#[derive(Debug, Clone, PartialEq)]
pub struct IrGlobal {
    pub name: String,
    pub ty: IrType,
    /// Bytes of storage
    pub size: usize,
}

impl fmt::Display for IrGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "global @{}: {}, size {}", self.name, self.ty, self.size)
    }
}

/// IR module (translation unit)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrModule {
    pub globals: Vec<IrGlobal>,
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in &self.globals {
            writeln!(f, "{}", global)?;
        }
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 || !self.globals.is_empty() {
                writeln!(f)?;
            }
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_function_display() {
        let mut func = IrFunction::new("twice".to_string(), IrType::i32());
        func.locals.push(IrLocal {
            name: "n".to_string(),
            ty: IrType::i32(),
            slot: Slot::Param(0),
        });
        func.params.push(LocalId(0));
        func.temps = vec![IrType::i32(), IrType::i32()];
        func.body = vec![
            Inst::Move {
                dst: Dest::Temp(Temp(0)),
                src: Operand::Var(Place::Local(LocalId(0))),
                ty: IrType::i32(),
            },
            Inst::Bin {
                dst: Temp(1),
                op: BinOp::Mul,
                left: Operand::Temp(Temp(0)),
                right: Operand::Const(2),
            },
            Inst::Ret(Some(Operand::Temp(Temp(1)))),
        ];
        let expected = "\
function i32 @twice(%0) frame 0:
  ; %0 n: i32 param 0
  t0 = move.i32 %0
  t1 = mul t0, 2
  ret t1
";
        assert_eq!(func.to_string(), expected);
    }

    #[test]
    fn test_memory_and_call_display() {
        let store = Inst::Store {
            base: Operand::Base(Place::Global("board".to_string())),
            index: Operand::Temp(Temp(3)),
            src: Operand::Const(1),
            ty: IrType::i32(),
        };
        assert_eq!(store.to_string(), "  store.i32 &@board[t3], 1");
        let call = Inst::Call {
            dst: None,
            func: "putstring".to_string(),
            args: vec![Operand::Base(Place::Local(LocalId(2)))],
        };
        assert_eq!(call.to_string(), "  call @putstring(&%2)");
        assert!(Inst::Br(Label(".Lend_0".to_string())).is_terminator());
        assert!(!call.is_terminator());
    }

    #[test]
    fn test_cmp_evaluate() {
        assert!(CmpOp::Lt.evaluate(-1, 0));
        assert!(!CmpOp::Ge.evaluate(i32::MIN, i32::MAX));
        assert!(CmpOp::Ne.evaluate(3, 4));
    }
}
