//! Type model of the IR
//!
//! Keeps owned arrays and decayed array parameters apart so the back-end
//! can tell storage from a base address held in a parameter slot.

mod ir_type;

pub use ir_type::{IrType, IrTypeKind, WORD_SIZE};
