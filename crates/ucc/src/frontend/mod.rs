//! µC frontend
//!
//! The frontend is responsible for:
//! 1. Lexing source code into tokens
//! 2. Parsing tokens into an AST
//! 3. Resolving names and checking types
//! 4. Lowering to the IR
//!
//! Each phase reports into one [`Diagnostics`] list and never stops at the
//! first error; the next phase only runs when the list holds no errors.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod sema;

use crate::common::{CompileError, CompileResult, DiagnosticReporter, Diagnostics, Phase};
use crate::ir::{IrBuilder, IrModule};
use std::panic;
use std::thread;

pub use ast::Program;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use sema::SemanticAnalyzer;

/// Stack reserved for the phases. Parsing, analysis and lowering recurse
/// once per nesting level, up to `parser::MAX_NESTING_DEPTH` levels.
pub const FRONTEND_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Run `f` on a thread with `FRONTEND_STACK_SIZE` bytes of stack
fn on_frontend_stack<'a, T: Send + 'a>(f: impl FnOnce() -> T + Send + 'a) -> CompileResult<T> {
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name("ucc-frontend".to_string())
            .stack_size(FRONTEND_STACK_SIZE)
            .spawn_scoped(scope, f)?;
        match handle.join() {
            Ok(value) => Ok(value),
            Err(payload) => panic::resume_unwind(payload),
        }
    })
}

/// Configuration options passed to the frontend
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub dump_tokens: bool,
    pub dump_ast: bool,
    pub dump_ir: bool,
    pub verbose: bool,
    /// Pre-declare `putint`, `putstring` and `getstring`
    pub runtime_prelude: bool,
    /// Reject programs without `int main(void)`
    pub require_main: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dump_tokens: false,
            dump_ast: false,
            dump_ir: false,
            verbose: false,
            runtime_prelude: true,
            require_main: true,
        }
    }
}

/// Compilation context providing access to diagnostics and file info
pub struct CompileContext<'a> {
    pub filename: String,
    pub file_id: usize,
    pub reporter: &'a DiagnosticReporter,
}

impl<'a> CompileContext<'a> {
    pub fn new(filename: String, file_id: usize, reporter: &'a DiagnosticReporter) -> Self {
        Self { filename, file_id, reporter }
    }
}

/// Trait for language frontends
///
/// A frontend takes source code and produces IR.
pub trait Frontend: Send + Sync {
    /// The name of this frontend
    fn name(&self) -> &'static str;

    /// File extensions this frontend handles
    fn extensions(&self) -> &'static [&'static str];

    /// Compile source code to IR, reporting every diagnostic through `ctx`
    fn compile(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<IrModule>;

    /// Optional: dump tokens for debugging
    fn dump_tokens(&self, source: &str) -> CompileResult<String> {
        let _ = source;
        Ok(String::new())
    }

    /// Optional: dump AST for debugging
    fn dump_ast(&self, source: &str) -> CompileResult<String> {
        let _ = source;
        Ok(String::new())
    }
}

/// µC language frontend
pub struct UcFrontend;

impl UcFrontend {
    pub fn new() -> Self {
        Self
    }

    /// Run the phases in order, collecting diagnostics into `diagnostics`.
    ///
    /// Returns `PhaseFailed` for the first phase that reported an error;
    /// warnings never stop the pipeline.
    pub fn compile_with(
        &self,
        source: &str,
        config: &FrontendConfig,
        diagnostics: &mut Diagnostics,
    ) -> CompileResult<IrModule> {
        on_frontend_stack(|| self.run_phases(source, config, diagnostics))?
    }

    fn run_phases(
        &self,
        source: &str,
        config: &FrontendConfig,
        diagnostics: &mut Diagnostics,
    ) -> CompileResult<IrModule> {
        // Phase 1: Lexing (optional token dump)
        if config.verbose {
            eprintln!("Lexing...");
        }
        if config.dump_tokens {
            eprintln!("=== Tokens ===");
            eprint!("{}", self.dump_tokens(source)?);
            eprintln!("=== End Tokens ===\n");
        }

        // Phase 2: Parsing; the parser pulls tokens on demand, so lexical
        // errors are gated first
        if config.verbose {
            eprintln!("Parsing...");
        }
        let mut parser = Parser::new(source);
        let mut program = parser.parse();
        diagnostics.extend(parser.take_lexical_errors());
        diagnostics.checkpoint(Phase::Lexing)?;
        diagnostics.extend(parser.take_errors());
        diagnostics.checkpoint(Phase::Parsing)?;

        if config.dump_ast {
            eprintln!("=== AST ===");
            eprintln!("{:#?}", program);
            eprintln!("=== End AST ===\n");
        }

        // Phase 3: Semantic analysis
        if config.verbose {
            eprintln!("Analyzing...");
        }
        let mut analyzer = SemanticAnalyzer::new()
            .with_runtime_prelude(config.runtime_prelude)
            .with_require_main(config.require_main);
        analyzer.analyze(&mut program, diagnostics);
        diagnostics.checkpoint(Phase::Analysis)?;

        // Phase 4: Lowering
        if config.verbose {
            eprintln!("Lowering...");
        }
        let lowered = IrBuilder::new(analyzer.symbols()).build(&program);
        let module = match lowered {
            Ok(module) => module,
            Err(e) if e.kind().is_some() => {
                diagnostics.error(e);
                return Err(CompileError::PhaseFailed {
                    phase: Phase::Lowering,
                    errors: diagnostics.error_count(),
                });
            }
            Err(e) => return Err(e),
        };

        if config.dump_ir {
            eprintln!("=== IR ===");
            eprint!("{}", module);
            eprintln!("=== End IR ===\n");
        }

        Ok(module)
    }
}

impl Default for UcFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontend for UcFrontend {
    fn name(&self) -> &'static str {
        "uc"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".c", ".uc"]
    }

    fn compile(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<IrModule> {
        let mut diagnostics = Diagnostics::new();
        let result = self.compile_with(source, config, &mut diagnostics);
        ctx.reporter.report_all(ctx.file_id, &diagnostics);
        if config.verbose {
            eprintln!(
                "{}: {} error(s), {} warning(s)",
                ctx.filename,
                diagnostics.error_count(),
                diagnostics.warnings().len()
            );
        }
        result
    }

    fn dump_tokens(&self, source: &str) -> CompileResult<String> {
        let (tokens, _) = Lexer::new(source).tokenize_all();
        let mut output = String::new();
        for token in &tokens {
            output.push_str(&format!("{:>4}:{:<3} {}\n", token.position.line, token.position.column, token.kind));
        }
        Ok(output)
    }

    fn dump_ast(&self, source: &str) -> CompileResult<String> {
        on_frontend_stack(|| {
            let mut parser = Parser::new(source);
            let program = parser.parse();
            format!("{:#?}", program)
        })
    }
}
