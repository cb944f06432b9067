//! Error types and diagnostic reporting

use std::fmt;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};
use thiserror::Error;

use super::Span;

/// Pipeline phase, used to report which phase stopped compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lexing,
    Parsing,
    Analysis,
    Lowering,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lexing => "lexing",
            Phase::Parsing => "parsing",
            Phase::Analysis => "semantic analysis",
            Phase::Lowering => "lowering",
        };
        f.write_str(name)
    }
}

/// Diagnostic category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Redeclaration,
    Undeclared,
    TypeMismatch,
    Arity,
    NotLvalue,
    MissingReturn,
    ConstantOutOfRange,
}

impl ErrorKind {
    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Redeclaration => "redeclaration",
            ErrorKind::Undeclared => "undeclared identifier",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::Arity => "arity mismatch",
            ErrorKind::NotLvalue => "assignment to non-lvalue",
            ErrorKind::MissingReturn => "missing return",
            ErrorKind::ConstantOutOfRange => "constant out of range",
        }
    }
}

/// Compile error with source location
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("lexical error at {span}: {message}")]
    Lexical { message: String, span: Span },

    #[error("syntax error at {span}: {message}")]
    Syntax { message: String, span: Span },

    #[error("redeclaration at {span}: {message}")]
    Redeclaration { message: String, span: Span },

    #[error("undeclared identifier at {span}: {message}")]
    Undeclared { message: String, span: Span },

    #[error("type mismatch at {span}: {message}")]
    TypeMismatch { message: String, span: Span },

    #[error("arity mismatch at {span}: {message}")]
    Arity { message: String, span: Span },

    #[error("assignment to non-lvalue at {span}: {message}")]
    NotLvalue { message: String, span: Span },

    #[error("missing return at {span}: {message}")]
    MissingReturn { message: String, span: Span },

    #[error("constant out of range at {span}: {message}")]
    ConstantOutOfRange { message: String, span: Span },

    #[error("{phase} failed with {errors} error(s)")]
    PhaseFailed { phase: Phase, errors: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexical(message: impl Into<String>, span: Span) -> Self {
        Self::Lexical { message: message.into(), span }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax { message: message.into(), span }
    }

    pub fn redeclaration(message: impl Into<String>, span: Span) -> Self {
        Self::Redeclaration { message: message.into(), span }
    }

    pub fn undeclared(message: impl Into<String>, span: Span) -> Self {
        Self::Undeclared { message: message.into(), span }
    }

    pub fn type_mismatch(message: impl Into<String>, span: Span) -> Self {
        Self::TypeMismatch { message: message.into(), span }
    }

    pub fn arity(message: impl Into<String>, span: Span) -> Self {
        Self::Arity { message: message.into(), span }
    }

    pub fn not_lvalue(message: impl Into<String>, span: Span) -> Self {
        Self::NotLvalue { message: message.into(), span }
    }

    pub fn missing_return(message: impl Into<String>, span: Span) -> Self {
        Self::MissingReturn { message: message.into(), span }
    }

    pub fn constant_out_of_range(message: impl Into<String>, span: Span) -> Self {
        Self::ConstantOutOfRange { message: message.into(), span }
    }

    /// Category of a source diagnostic; `None` for pipeline-level errors
    pub fn kind(&self) -> Option<ErrorKind> {
        let kind = match self {
            Self::Lexical { .. } => ErrorKind::Lexical,
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Redeclaration { .. } => ErrorKind::Redeclaration,
            Self::Undeclared { .. } => ErrorKind::Undeclared,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Arity { .. } => ErrorKind::Arity,
            Self::NotLvalue { .. } => ErrorKind::NotLvalue,
            Self::MissingReturn { .. } => ErrorKind::MissingReturn,
            Self::ConstantOutOfRange { .. } => ErrorKind::ConstantOutOfRange,
            Self::PhaseFailed { .. } | Self::Io(_) => return None,
        };
        Some(kind)
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexical { span, .. }
            | Self::Syntax { span, .. }
            | Self::Redeclaration { span, .. }
            | Self::Undeclared { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::Arity { span, .. }
            | Self::NotLvalue { span, .. }
            | Self::MissingReturn { span, .. }
            | Self::ConstantOutOfRange { span, .. } => Some(*span),
            Self::PhaseFailed { .. } | Self::Io(_) => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Lexical { message, .. }
            | Self::Syntax { message, .. }
            | Self::Redeclaration { message, .. }
            | Self::Undeclared { message, .. }
            | Self::TypeMismatch { message, .. }
            | Self::Arity { message, .. }
            | Self::NotLvalue { message, .. }
            | Self::MissingReturn { message, .. }
            | Self::ConstantOutOfRange { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Non-fatal finding; never gates the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub span: Span,
}

impl Warning {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span }
    }
}

/// Diagnostics collected for one translation unit
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<CompileError>,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    pub fn warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = CompileError>) {
        self.errors.extend(errors);
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Error categories in report order
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.errors.iter().filter_map(CompileError::kind).collect()
    }

    /// Ends a phase: `Err(PhaseFailed)` when any error has been reported so far
    pub fn checkpoint(&self, phase: Phase) -> CompileResult<()> {
        if self.has_errors() {
            Err(CompileError::PhaseFailed {
                phase,
                errors: self.errors.len(),
            })
        } else {
            Ok(())
        }
    }
}

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    /// Report every collected warning and error on stderr
    pub fn report_all(&self, file_id: usize, diagnostics: &Diagnostics) {
        let mut writer = self.writer.lock();
        self.emit_all(&mut writer, file_id, diagnostics);
    }

    /// Render diagnostics without colors, as `report_all` would print them
    pub fn render(&self, file_id: usize, diagnostics: &Diagnostics) -> String {
        let mut buffer = NoColor::new(Vec::new());
        self.emit_all(&mut buffer, file_id, diagnostics);
        String::from_utf8_lossy(&buffer.into_inner()).into_owned()
    }

    fn emit_all(&self, writer: &mut dyn WriteColor, file_id: usize, diagnostics: &Diagnostics) {
        for warning in diagnostics.warnings() {
            let diagnostic = Self::warning_diagnostic(file_id, warning);
            let _ = term::emit(writer, &self.config, &self.files, &diagnostic);
        }
        for error in diagnostics.errors() {
            let diagnostic = Self::error_diagnostic(file_id, error);
            let _ = term::emit(writer, &self.config, &self.files, &diagnostic);
        }
    }

    fn error_diagnostic(file_id: usize, error: &CompileError) -> Diagnostic<usize> {
        match (error.kind(), error.span()) {
            (Some(kind), Some(span)) => Diagnostic::error()
                .with_message(kind.title())
                .with_labels(vec![
                    Label::primary(file_id, span.range()).with_message(error.message())
                ]),
            _ => Diagnostic::error().with_message(error.to_string()),
        }
    }

    fn warning_diagnostic(file_id: usize, warning: &Warning) -> Diagnostic<usize> {
        Diagnostic::warning()
            .with_message("warning")
            .with_labels(vec![
                Label::primary(file_id, warning.span.range()).with_message(&warning.message)
            ])
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_counts_errors() {
        let mut diags = Diagnostics::new();
        assert!(diags.checkpoint(Phase::Parsing).is_ok());

        diags.error(CompileError::syntax("expected ';'", Span::new(3, 4)));
        diags.warning(Warning::new("index 1 is out of bounds", Span::new(0, 1)));
        match diags.checkpoint(Phase::Parsing) {
            Err(CompileError::PhaseFailed { phase, errors }) => {
                assert_eq!(phase, Phase::Parsing);
                assert_eq!(errors, 1);
            }
            other => panic!("unexpected checkpoint result: {:?}", other),
        }
        assert_eq!(diags.kinds(), vec![ErrorKind::Syntax]);
    }

    #[test]
    fn test_render_names_category_and_location() {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("t.c", "int main(void) { x = 1; }\n");
        let mut diags = Diagnostics::new();
        diags.error(CompileError::undeclared("`x` is not declared", Span::new(17, 18)));

        let text = reporter.render(file_id, &diags);
        assert!(text.contains("error: undeclared identifier"), "{}", text);
        assert!(text.contains("t.c:1:18"), "{}", text);
        assert!(text.contains("`x` is not declared"), "{}", text);
    }
}
