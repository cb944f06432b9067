//! Lexer implementation using logos

use super::token::{LexErrorKind, Token, TokenKind};
use crate::common::{CompileError, LineIndex, Span};
use logos::Logos;

/// Lexer for µC source code
///
/// Lexical errors never stop the scan: each one is recorded and the lexer
/// resumes after the offending bytes. Once the input is exhausted every call
/// to [`Lexer::next_token`] yields `Eof`.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    lines: LineIndex,
    errors: Vec<CompileError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            lines: LineIndex::new(source),
            errors: Vec::new(),
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        loop {
            match self.inner.next() {
                Some(Ok(kind)) => return self.make_token(kind, self.inner.span().into()),
                Some(Err(kind)) => {
                    let span: Span = self.inner.span().into();
                    let message = match kind {
                        LexErrorKind::UnexpectedByte => {
                            format!("unexpected character '{}'", self.inner.slice().escape_default())
                        }
                        other => other.to_string(),
                    };
                    self.errors.push(CompileError::lexical(message, span));
                }
                None => {
                    let len = self.inner.source().len();
                    return self.make_token(TokenKind::Eof, Span::new(len, len));
                }
            }
        }
    }

    fn make_token(&self, kind: TokenKind, span: Span) -> Token {
        Token::new(kind, span, self.lines.position(span.start))
    }

    /// Lexical errors reported since the last call
    pub fn take_errors(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.errors)
    }

    /// Tokenize the entire source; the last token is always `Eof`
    pub fn tokenize_all(mut self) -> (Vec<Token>, Vec<CompileError>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, self.errors)
    }
}
