//! µC compiler front-end
//!
//! Translates programs in µC, a small C-like teaching language, into a
//! three-address intermediate representation for an external back-end.
//!
//! ## Architecture
//!
//! - **Common** (`common/`): spans, source positions, diagnostics
//! - **Frontend** (`frontend/`): lexer, parser, semantic analysis
//! - **Types** (`types/`): IR type model
//! - **IR** (`ir/`): three-address code, lowering, reference interpreter
//! - **Driver** (`driver/`): file-level compilation

pub mod common;
pub mod driver;
pub mod frontend;
pub mod ir;
pub mod types;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, Diagnostics, Span};
pub use driver::Pipeline;
pub use frontend::{CompileContext, Frontend, FrontendConfig, UcFrontend};
pub use ir::IrModule;
