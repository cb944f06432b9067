//! Parser module for µC

mod parser;

pub use parser::{Parser, MAX_NESTING_DEPTH};
