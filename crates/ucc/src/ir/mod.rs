//! Intermediate Representation module
//!
//! Three-address code handed to the back-end, the lowering that produces
//! it, and a reference interpreter that executes it.

mod builder;
mod inst;
pub mod interp;

pub use builder::{IrBuilder, MAX_OBJECT_SIZE};
pub use inst::*;
pub use interp::{BufferRuntime, Interpreter, IoRuntime, Runtime, RuntimeError};
