//! Common infrastructure shared by every phase

mod error;
mod source;
mod span;

pub use error::{
    CompileError, CompileResult, DiagnosticReporter, Diagnostics, ErrorKind, Phase, Warning,
};
pub use source::{LineIndex, Position};
pub use span::Span;
