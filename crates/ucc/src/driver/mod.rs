//! Compilation driver: one source file in, one IR file out

use crate::common::{CompileResult, DiagnosticReporter};
use crate::frontend::{CompileContext, Frontend, FrontendConfig, UcFrontend};
use crate::ir::IrModule;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of the IR file written next to the input by default
pub const IR_EXTENSION: &str = "ir";

/// Compilation pipeline that runs a frontend over source files
pub struct Pipeline {
    frontend: Box<dyn Frontend>,
    config: FrontendConfig,
}

impl Pipeline {
    pub fn new(config: FrontendConfig) -> Self {
        Self {
            frontend: Box::new(UcFrontend::new()),
            config,
        }
    }

    pub fn frontend(&self) -> &dyn Frontend {
        self.frontend.as_ref()
    }

    /// Compile in-memory source; diagnostics go to `reporter`
    pub fn compile_source(
        &self,
        source: &str,
        filename: &str,
        reporter: &mut DiagnosticReporter,
    ) -> CompileResult<IrModule> {
        let file_id = reporter.add_file(filename, source);
        let ctx = CompileContext::new(filename.to_string(), file_id, reporter);
        self.frontend.compile(source, &ctx, &self.config)
    }

    /// Read and compile one source file. Bytes that are not UTF-8 are kept
    /// as replacement characters so the lexer reports them.
    pub fn compile_file(&self, input: &Path, reporter: &mut DiagnosticReporter) -> CompileResult<IrModule> {
        let bytes = fs::read(input)?;
        let source = String::from_utf8_lossy(&bytes);
        if !self.handles(input) && self.config.verbose {
            eprintln!(
                "warning: {} has no {} extension, compiling anyway",
                input.display(),
                self.frontend.name()
            );
        }
        self.compile_source(&source, &input.display().to_string(), reporter)
    }

    /// Whether the input's extension belongs to the frontend
    pub fn handles(&self, input: &Path) -> bool {
        let ext = input
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        self.frontend.extensions().iter().any(|e| *e == ext)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(FrontendConfig::default())
    }
}

/// `input` with its extension replaced by `.ir`
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension(IR_EXTENSION)
}

/// Write the textual IR of `module` to `path`
pub fn write_ir(module: &IrModule, path: &Path) -> CompileResult<()> {
    fs::write(path, module.to_string())?;
    Ok(())
}
