//! Reference runtime executing an [`IrModule`]
//!
//! Memory is one flat little-endian byte array: globals first, then a frame
//! per active call, each zeroed on entry. Values are 32-bit and wrap. Calls
//! use an explicit frame stack, so deep µC recursion is bounded by
//! [`Interpreter::with_max_call_depth`] rather than the host stack.

use super::inst::*;
use crate::types::{IrType, IrTypeKind, WORD_SIZE};
use std::collections::HashMap;
use std::io::{self, BufRead, Cursor, Write};
use thiserror::Error;

pub const DEFAULT_STEP_LIMIT: u64 = 100_000_000;
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;
pub const DEFAULT_MEMORY_LIMIT: usize = 64 * 1024 * 1024;

/// Failure of a running program
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("division by zero in `{function}`")]
    DivisionByZero { function: String },

    #[error("{size}-byte access at address {address} is outside memory ({limit} bytes in use)")]
    OutOfBounds { address: i64, size: usize, limit: usize },

    #[error("string at address {0} is not terminated")]
    UnterminatedString(i64),

    #[error("call to undefined function `{0}`")]
    UnknownFunction(String),

    #[error("reference to undefined global `{0}`")]
    UnknownGlobal(String),

    #[error("jump to undefined label `{label}` in `{function}`")]
    UnknownLabel { function: String, label: String },

    #[error("`{function}` expects {expected} argument(s), got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("control fell off the end of `{0}`")]
    MissingReturn(String),

    #[error("call depth exceeds {0} frames")]
    StackOverflow(usize),

    #[error("program needs more than {limit} bytes of memory")]
    OutOfMemory { limit: usize },

    #[error("step limit of {0} instructions exhausted")]
    StepLimit(u64),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// The runtime library every µC program links against
pub trait Runtime {
    /// Print the decimal representation of `value`
    fn putint(&mut self, value: i32) -> io::Result<()>;

    /// Print `bytes` (the string without its terminator)
    fn putstring(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read the next input line without its line terminator; empty at end of input
    fn getstring(&mut self) -> io::Result<Vec<u8>>;
}

/// Runtime over any line reader and writer
pub struct IoRuntime<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> IoRuntime<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Runtime for IoRuntime<R, W> {
    fn putint(&mut self, value: i32) -> io::Result<()> {
        write!(self.output, "{}", value)
    }

    fn putstring(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.write_all(bytes)
    }

    fn getstring(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        self.input.read_until(b'\n', &mut line)?;
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(line)
    }
}

/// In-memory runtime, used by tests
pub type BufferRuntime = IoRuntime<Cursor<Vec<u8>>, Vec<u8>>;

impl IoRuntime<Cursor<Vec<u8>>, Vec<u8>> {
    pub fn with_input(input: &str) -> Self {
        Self::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    /// Output so far, lossily decoded
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Default for IoRuntime<Cursor<Vec<u8>>, Vec<u8>> {
    fn default() -> Self {
        Self::with_input("")
    }
}

/// Activation record of one call
struct Frame<'m> {
    func: &'m IrFunction,
    pc: usize,
    /// Memory length before this frame was pushed
    mark: usize,
    base: usize,
    args: Vec<i32>,
    temps: Vec<i32>,
    /// Caller temporary receiving the return value
    ret_dst: Option<Temp>,
}

struct GlobalSlot<'m> {
    address: usize,
    ty: &'m IrType,
}

/// Executes IR functions against a [`Runtime`]
pub struct Interpreter<'m> {
    module: &'m IrModule,
    globals: HashMap<&'m str, GlobalSlot<'m>>,
    globals_size: usize,
    labels: HashMap<&'m str, HashMap<&'m str, usize>>,
    memory: Vec<u8>,
    steps: u64,
    step_limit: u64,
    max_call_depth: usize,
    memory_limit: usize,
}

impl<'m> Interpreter<'m> {
    /// Lay out the globals of `module`; their storage is zeroed on the first call
    pub fn new(module: &'m IrModule) -> Self {
        let mut globals = HashMap::new();
        let mut offset = 0usize;
        for global in &module.globals {
            offset = align_up(offset, global.ty.align);
            globals.insert(global.name.as_str(), GlobalSlot { address: offset, ty: &global.ty });
            offset = offset.saturating_add(global.size);
        }

        let labels = module
            .functions
            .iter()
            .map(|func| {
                let targets = func
                    .body
                    .iter()
                    .enumerate()
                    .filter_map(|(pc, inst)| match inst {
                        Inst::Label(label) => Some((label.0.as_str(), pc)),
                        _ => None,
                    })
                    .collect();
                (func.name.as_str(), targets)
            })
            .collect();

        Self {
            module,
            globals,
            globals_size: offset,
            labels,
            memory: Vec::new(),
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            memory_limit: DEFAULT_MEMORY_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = bytes;
        self
    }

    /// Instructions executed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Current value of a scalar global
    pub fn global_value(&self, name: &str) -> Option<i32> {
        let slot = self.globals.get(name).filter(|slot| slot.ty.is_scalar())?;
        if self.memory.len() < self.globals_size {
            return Some(0);
        }
        self.read_scalar(slot.address as i64, slot.ty).ok()
    }

    /// Run `int main(void)` and return its exit value
    pub fn run_main(&mut self, runtime: &mut dyn Runtime) -> RuntimeResult<i32> {
        Ok(self.call("main", &[], runtime)?.unwrap_or(0))
    }

    /// Call a function of the module with scalar arguments
    pub fn call(
        &mut self,
        name: &str,
        args: &[i32],
        runtime: &mut dyn Runtime,
    ) -> RuntimeResult<Option<i32>> {
        let module = self.module;
        let func = module
            .function(name)
            .ok_or_else(|| RuntimeError::UnknownFunction(name.to_string()))?;
        self.allocate_globals()?;
        let entry = self.enter(func, args.to_vec(), None)?;
        self.execute(entry, runtime)
    }

    /// Globals sit below every frame and count against the memory limit
    fn allocate_globals(&mut self) -> RuntimeResult<()> {
        if self.memory.len() >= self.globals_size {
            return Ok(());
        }
        if self.globals_size > self.memory_limit {
            return Err(RuntimeError::OutOfMemory { limit: self.memory_limit });
        }
        self.memory.resize(self.globals_size, 0);
        Ok(())
    }

    fn enter(
        &mut self,
        func: &'m IrFunction,
        args: Vec<i32>,
        ret_dst: Option<Temp>,
    ) -> RuntimeResult<Frame<'m>> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::ArgumentCount {
                function: func.name.clone(),
                expected: func.params.len(),
                found: args.len(),
            });
        }
        let mark = self.memory.len();
        let base = align_up(mark, WORD_SIZE);
        let end = base.saturating_add(func.frame_size);
        if end > self.memory_limit {
            return Err(RuntimeError::OutOfMemory { limit: self.memory_limit });
        }
        self.memory.resize(end, 0);

        // Narrow arguments arrive truncated, like an assignment
        let args = args
            .into_iter()
            .zip(&func.params)
            .map(|(value, &id)| narrow(value, &func.local(id).ty))
            .collect();

        Ok(Frame {
            func,
            pc: 0,
            mark,
            base,
            args,
            temps: vec![0; func.temps.len()],
            ret_dst,
        })
    }

    fn execute(&mut self, entry: Frame<'m>, runtime: &mut dyn Runtime) -> RuntimeResult<Option<i32>> {
        let mut stack = vec![entry];

        while let Some(frame) = stack.last_mut() {
            self.steps += 1;
            if self.steps > self.step_limit {
                return Err(RuntimeError::StepLimit(self.step_limit));
            }

            let func: &'m IrFunction = frame.func;
            let Some(inst) = func.body.get(frame.pc) else {
                return Err(RuntimeError::MissingReturn(func.name.clone()));
            };
            frame.pc += 1;

            match inst {
                Inst::Label(_) => {}
                Inst::Move { dst, src, ty } => {
                    let value = self.operand(frame, src)?;
                    self.write_dest(frame, dst, value, ty)?;
                }
                Inst::Bin { dst, op, left, right } => {
                    let left = self.operand(frame, left)?;
                    let right = self.operand(frame, right)?;
                    let value = match op {
                        BinOp::Add => left.wrapping_add(right),
                        BinOp::Sub => left.wrapping_sub(right),
                        BinOp::Mul => left.wrapping_mul(right),
                        BinOp::Div => {
                            if right == 0 {
                                return Err(RuntimeError::DivisionByZero {
                                    function: func.name.clone(),
                                });
                            }
                            left.wrapping_div(right)
                        }
                    };
                    set_temp(frame, *dst, value);
                }
                Inst::Un { dst, op, src } => {
                    let src = self.operand(frame, src)?;
                    let value = match op {
                        UnOp::Neg => src.wrapping_neg(),
                        UnOp::Not => i32::from(src == 0),
                    };
                    set_temp(frame, *dst, value);
                }
                Inst::Cmp { dst, op, left, right } => {
                    let left = self.operand(frame, left)?;
                    let right = self.operand(frame, right)?;
                    set_temp(frame, *dst, i32::from(op.evaluate(left, right)));
                }
                Inst::Zext { dst, src } | Inst::Trunc { dst, src } => {
                    let value = self.operand(frame, src)? & 0xff;
                    set_temp(frame, *dst, value);
                }
                Inst::Cbr { cond, then_label, else_label } => {
                    let target = if self.operand(frame, cond)? != 0 {
                        then_label
                    } else {
                        else_label
                    };
                    frame.pc = self.label_index(func, target)?;
                }
                Inst::Br(label) => frame.pc = self.label_index(func, label)?,
                Inst::Load { dst, base, index, ty } => {
                    let address = self.element_address(frame, base, index, ty)?;
                    let value = self.read_scalar(address, ty)?;
                    set_temp(frame, *dst, value);
                }
                Inst::Store { base, index, src, ty } => {
                    let address = self.element_address(frame, base, index, ty)?;
                    let value = self.operand(frame, src)?;
                    self.write_scalar(address, value, ty)?;
                }
                Inst::Call { dst, func: callee, args } => {
                    let values = args
                        .iter()
                        .map(|arg| self.operand(frame, arg))
                        .collect::<RuntimeResult<Vec<_>>>()?;
                    let module = self.module;
                    match module.function(callee) {
                        Some(target) => {
                            if stack.len() >= self.max_call_depth {
                                return Err(RuntimeError::StackOverflow(self.max_call_depth));
                            }
                            let next = self.enter(target, values, *dst)?;
                            stack.push(next);
                        }
                        None => {
                            self.call_runtime(callee, &values, runtime)?;
                            if let Some(dst) = dst {
                                set_temp(frame, *dst, 0);
                            }
                        }
                    }
                }
                Inst::Ret(value) => {
                    let value = match value {
                        Some(op) => Some(self.operand(frame, op)?),
                        None => None,
                    };
                    let mark = frame.mark;
                    let ret_dst = frame.ret_dst;
                    stack.pop();
                    self.memory.truncate(mark);
                    match stack.last_mut() {
                        Some(caller) => {
                            if let Some(dst) = ret_dst {
                                set_temp(caller, dst, value.unwrap_or(0));
                            }
                        }
                        None => return Ok(value),
                    }
                }
            }
        }
        Ok(None)
    }

    fn call_runtime(&mut self, name: &str, args: &[i32], runtime: &mut dyn Runtime) -> RuntimeResult<()> {
        let &[arg] = args else {
            return Err(RuntimeError::ArgumentCount {
                function: name.to_string(),
                expected: 1,
                found: args.len(),
            });
        };
        match name {
            "putint" => runtime.putint(arg)?,
            "putstring" => {
                let start = i64::from(arg);
                let bytes = self.c_string(start)?;
                runtime.putstring(bytes)?;
            }
            "getstring" => {
                let mut line = runtime.getstring()?;
                line.push(0);
                let range = self.range(i64::from(arg), line.len())?;
                self.memory[range].copy_from_slice(&line);
            }
            _ => return Err(RuntimeError::UnknownFunction(name.to_string())),
        }
        Ok(())
    }

    fn label_index(&self, func: &IrFunction, label: &Label) -> RuntimeResult<usize> {
        self.labels
            .get(func.name.as_str())
            .and_then(|targets| targets.get(label.0.as_str()))
            .copied()
            .ok_or_else(|| RuntimeError::UnknownLabel {
                function: func.name.clone(),
                label: label.0.clone(),
            })
    }

    fn operand(&self, frame: &Frame<'m>, op: &Operand) -> RuntimeResult<i32> {
        match op {
            Operand::Const(n) => Ok(*n),
            Operand::Temp(t) => Ok(frame.temps[t.0 as usize]),
            Operand::Var(place) => {
                if let Some(index) = param_index(frame, place) {
                    return Ok(frame.args[index]);
                }
                let ty = self.place_type(frame, place)?;
                let address = self.base_address(frame, place)?;
                self.read_scalar(address, ty)
            }
            Operand::Base(place) => Ok(self.base_address(frame, place)? as i32),
        }
    }

    fn write_dest(&mut self, frame: &mut Frame<'m>, dst: &Dest, value: i32, ty: &IrType) -> RuntimeResult<()> {
        let value = narrow(value, ty);
        match dst {
            Dest::Temp(t) => set_temp(frame, *t, value),
            Dest::Var(place) => match param_index(frame, place) {
                Some(index) => frame.args[index] = value,
                None => {
                    let address = self.base_address(frame, place)?;
                    self.write_scalar(address, value, ty)?;
                }
            },
        }
        Ok(())
    }

    fn place_type(&self, frame: &Frame<'m>, place: &Place) -> RuntimeResult<&'m IrType> {
        match place {
            Place::Local(id) => Ok(&frame.func.local(*id).ty),
            Place::Global(name) => self
                .globals
                .get(name.as_str())
                .map(|slot| slot.ty)
                .ok_or_else(|| RuntimeError::UnknownGlobal(name.clone())),
        }
    }

    /// Address of a place's storage; for an array parameter, the address it holds
    fn base_address(&self, frame: &Frame<'m>, place: &Place) -> RuntimeResult<i64> {
        match place {
            Place::Global(name) => self
                .globals
                .get(name.as_str())
                .map(|slot| slot.address as i64)
                .ok_or_else(|| RuntimeError::UnknownGlobal(name.clone())),
            Place::Local(id) => match frame.func.local(*id).slot {
                Slot::Frame(offset) => Ok((frame.base + offset) as i64),
                Slot::Param(index) => Ok(i64::from(frame.args[index])),
            },
        }
    }

    fn element_address(
        &self,
        frame: &Frame<'m>,
        base: &Operand,
        index: &Operand,
        ty: &IrType,
    ) -> RuntimeResult<i64> {
        let base = i64::from(self.operand(frame, base)?);
        let index = i64::from(self.operand(frame, index)?);
        Ok(base + index * ty.size as i64)
    }

    fn range(&self, address: i64, size: usize) -> RuntimeResult<std::ops::Range<usize>> {
        let limit = self.memory.len();
        let end = address + size as i64;
        if address < 0 || end > limit as i64 {
            return Err(RuntimeError::OutOfBounds { address, size, limit });
        }
        Ok(address as usize..end as usize)
    }

    fn read_scalar(&self, address: i64, ty: &IrType) -> RuntimeResult<i32> {
        let range = self.range(address, ty.size)?;
        let bytes = &self.memory[range];
        Ok(match ty.kind {
            IrTypeKind::U8 => i32::from(bytes[0]),
            _ => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        })
    }

    fn write_scalar(&mut self, address: i64, value: i32, ty: &IrType) -> RuntimeResult<()> {
        let range = self.range(address, ty.size)?;
        match ty.kind {
            IrTypeKind::U8 => self.memory[range.start] = value as u8,
            _ => self.memory[range].copy_from_slice(&value.to_le_bytes()),
        }
        Ok(())
    }

    /// Bytes from `start` up to the first 0
    fn c_string(&self, start: i64) -> RuntimeResult<&[u8]> {
        let range = self.range(start, 0)?;
        let tail = &self.memory[range.start..];
        match tail.iter().position(|&b| b == 0) {
            Some(len) => Ok(&tail[..len]),
            None => Err(RuntimeError::UnterminatedString(start)),
        }
    }
}

fn param_index(frame: &Frame<'_>, place: &Place) -> Option<usize> {
    match place {
        Place::Local(id) => match frame.func.local(*id).slot {
            Slot::Param(index) if !frame.func.local(*id).ty.is_array_ref() => Some(index),
            _ => None,
        },
        Place::Global(_) => None,
    }
}

fn set_temp(frame: &mut Frame<'_>, temp: Temp, value: i32) {
    frame.temps[temp.0 as usize] = value;
}

/// Keep the low 8 bits for `u8`
fn narrow(value: i32, ty: &IrType) -> i32 {
    match ty.kind {
        IrTypeKind::U8 => value & 0xff,
        _ => value,
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Diagnostics;
    use crate::frontend::parser::Parser;
    use crate::frontend::sema::SemanticAnalyzer;
    use crate::ir::IrBuilder;
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> IrModule {
        let mut parser = Parser::new(source);
        let mut program = parser.parse();
        assert!(parser.take_errors().is_empty(), "syntax errors in test source");
        let mut diagnostics = Diagnostics::new();
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&mut program, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.errors());
        IrBuilder::new(analyzer.symbols()).build(&program).unwrap()
    }

    fn run_with_input(source: &str, input: &str) -> RuntimeResult<String> {
        let module = compile(source);
        let mut runtime = BufferRuntime::with_input(input);
        Interpreter::new(&module).run_main(&mut runtime)?;
        Ok(runtime.output_string())
    }

    fn run(source: &str) -> String {
        run_with_input(source, "").unwrap()
    }

    #[test]
    fn test_arithmetic_wraps_and_truncates() {
        assert_eq!(run("int main(void) { putint(-7 / 2); }"), "-3");
        assert_eq!(run("int main(void) { putint(7 / -2); }"), "-3");
        assert_eq!(run("int main(void) { putint(2147483647 + 1); }"), "-2147483648");
        assert_eq!(run("int main(void) { putint(65536 * 65536 + 3); }"), "3");
        assert_eq!(run("int main(void) { int m; m = -2147483647 - 1; putint(m / -1); }"), "-2147483648");
    }

    #[test]
    fn test_chars_are_unsigned_bytes() {
        assert_eq!(run("char c; int main(void) { c = 300; putint(c); }"), "44");
        assert_eq!(run("int main(void) { char c; c = -1; putint(c + 1); }"), "256");
        assert_eq!(run("int main(void) { char s[2]; s[0] = 'A' + 256; putint(s[0]); }"), "65");
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(
            run("int main(void) { putint(3 < 4); putint(4 <= 3); putint(!5); putint(2 && 0); putint(0 || 7); }"),
            "10001"
        );
    }

    #[test]
    fn test_short_circuit_skips_side_effects() {
        let source = "int hits;
            int bump(void) { hits = hits + 1; return 1; }
            int main(void) {
                if (0 && bump()) putint(9);
                if (1 || bump()) putint(hits);
                if (1 && bump()) putint(hits);
            }";
        assert_eq!(run(source), "01");
    }

    #[test]
    fn test_recursion() {
        let source = "int fac(int n) { if (n == 0) return 1; return n * fac(n - 1); }
            int main(void) { putint(fac(10)); }";
        assert_eq!(run(source), "3628800");
    }

    #[test]
    fn test_frames_start_zeroed() {
        let source = "int f(void) { int x; x = x + 1; return x; }
            int main(void) { putint(f()); putint(f()); }";
        assert_eq!(run(source), "11");
    }

    #[test]
    fn test_arrays_are_passed_by_reference() {
        let source = "void fill(int a[], int n) { while (n > 0) { n = n - 1; a[n] = n * n; } }
            int main(void) { int v[4]; fill(v, 4); putint(v[3]); putint(v[2]); putint(v[0]); }";
        assert_eq!(run(source), "940");
    }

    #[test]
    fn test_strings_round_trip() {
        let source = "int main(void) { char s[16]; getstring(s); putstring(s); getstring(s); putstring(s); }";
        assert_eq!(run_with_input(source, "hello\r\nworld\n").unwrap(), "helloworld");
        // End of input reads an empty string
        assert_eq!(run_with_input(source, "").unwrap(), "");
    }

    #[test]
    fn test_call_entry_point_and_globals() {
        let module = compile(
            "int total; int add(int a, int b) { total = a + b; return total; } int main(void) { return 0; }",
        );
        let mut runtime = BufferRuntime::default();
        let mut interp = Interpreter::new(&module);
        assert_eq!(interp.call("add", &[40, 2], &mut runtime).unwrap(), Some(42));
        assert_eq!(interp.global_value("total"), Some(42));
        assert!(matches!(
            interp.call("add", &[1], &mut runtime),
            Err(RuntimeError::ArgumentCount { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            interp.call("missing", &[], &mut runtime),
            Err(RuntimeError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        let err = run_with_input("int z; int main(void) { putint(1 / z); }", "").unwrap_err();
        assert!(matches!(err, RuntimeError::DivisionByZero { ref function } if function == "main"));
    }

    #[test]
    fn test_wild_store_is_an_error() {
        let err = run_with_input("int main(void) { int a[2]; a[-100000] = 1; }", "").unwrap_err();
        assert!(matches!(err, RuntimeError::OutOfBounds { size: 4, .. }));
    }

    #[test]
    fn test_step_limit() {
        let module = compile("int main(void) { while (1) ; }");
        let mut runtime = BufferRuntime::default();
        let mut interp = Interpreter::new(&module).with_step_limit(1_000);
        assert!(matches!(interp.run_main(&mut runtime), Err(RuntimeError::StepLimit(1_000))));
        assert_eq!(interp.steps(), 1_001);
    }

    #[test]
    fn test_call_depth_limit() {
        let module = compile("int down(int n) { return down(n + 1); } int main(void) { return down(0); }");
        let mut runtime = BufferRuntime::default();
        let mut interp = Interpreter::new(&module).with_max_call_depth(100);
        assert!(matches!(interp.run_main(&mut runtime), Err(RuntimeError::StackOverflow(100))));
    }

    #[test]
    fn test_memory_limit() {
        let module = compile("int main(void) { int big[1000]; big[0] = 1; return 0; }");
        let mut runtime = BufferRuntime::default();
        let mut interp = Interpreter::new(&module).with_memory_limit(256);
        assert!(matches!(
            interp.run_main(&mut runtime),
            Err(RuntimeError::OutOfMemory { limit: 256 })
        ));
    }

    #[test]
    fn test_memory_limit_covers_globals() {
        let module = compile("int big[1000]; int main(void) { big[999] = 3; return big[999]; }");
        let mut runtime = BufferRuntime::default();
        let mut interp = Interpreter::new(&module).with_memory_limit(256);
        assert!(matches!(
            interp.run_main(&mut runtime),
            Err(RuntimeError::OutOfMemory { limit: 256 })
        ));

        let mut interp = Interpreter::new(&module).with_memory_limit(8 * 1024);
        assert_eq!(interp.run_main(&mut runtime).unwrap(), 3);
    }

    #[test]
    fn test_globals_read_zero_before_the_first_call() {
        let module = compile("int total; int main(void) { total = 5; return 0; }");
        let mut interp = Interpreter::new(&module);
        assert_eq!(interp.global_value("total"), Some(0));
        interp.run_main(&mut BufferRuntime::default()).unwrap();
        assert_eq!(interp.global_value("total"), Some(5));
    }

    #[test]
    fn test_main_exit_value() {
        let module = compile("int main(void) { return 7; }");
        let mut runtime = BufferRuntime::default();
        assert_eq!(Interpreter::new(&module).run_main(&mut runtime).unwrap(), 7);
    }
}
