//! Token definitions for the µC lexer

use crate::common::{Position, Span};
use logos::{FilterResult, Logos};
use thiserror::Error;

/// Token with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, position: Position) -> Self {
        Self { kind, span, position }
    }

    /// Source bytes this token was scanned from
    pub fn lexeme<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.range()).unwrap_or("")
    }
}

/// Lexical error raised by a token callback or an unmatched byte
#[derive(Error, Debug, Clone, PartialEq, Default)]
pub enum LexErrorKind {
    #[default]
    #[error("unexpected character")]
    UnexpectedByte,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("unterminated character literal")]
    UnterminatedChar,
    #[error("empty character literal")]
    EmptyChar,
    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscape(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("integer literal exceeds 2147483647")]
    IntegerOverflow,
}

/// All token kinds in µC
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // === Keywords ===
    #[token("int")]
    Int,
    #[token("char")]
    Char,
    #[token("void")]
    Void,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("return")]
    Return,

    // === Identifiers and literals ===
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i32>().map_err(|_| LexErrorKind::IntegerOverflow))]
    IntLiteral(i32),

    #[token("'", char_literal)]
    CharLiteral(u8),

    #[token("\"", string_literal)]
    StringLiteral(Vec<u8>),

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,

    // === Delimiters ===
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    /// Block comments are consumed by their callback and never produced
    #[token("/*", block_comment)]
    BlockComment,

    /// End-of-input sentinel, synthesized by the scanner
    Eof,
}

fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> FilterResult<(), LexErrorKind> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(LexErrorKind::UnterminatedComment)
        }
    }
}

fn escape(byte: u8) -> Option<u8> {
    match byte {
        b'n' => Some(b'\n'),
        b't' => Some(b'\t'),
        b'\\' => Some(b'\\'),
        b'\'' => Some(b'\''),
        b'"' => Some(b'"'),
        b'0' => Some(0),
        _ => None,
    }
}

/// Scan one possibly-escaped character starting at `rest`.
/// Returns the value and the number of bytes it occupies.
fn scan_char(rest: &str) -> (Result<u8, LexErrorKind>, usize) {
    let mut chars = rest.chars();
    match chars.next() {
        Some('\\') => match chars.next() {
            Some(c) if c.is_ascii() => match escape(c as u8) {
                Some(value) => (Ok(value), 2),
                None => (Err(LexErrorKind::UnknownEscape(c)), 2),
            },
            Some(c) => (Err(LexErrorKind::UnknownEscape(c)), 1 + c.len_utf8()),
            None => (Err(LexErrorKind::UnterminatedChar), 1),
        },
        Some(c) if c.is_ascii() => (Ok(c as u8), 1),
        Some(c) => (Err(LexErrorKind::UnexpectedByte), c.len_utf8()),
        None => (Err(LexErrorKind::UnterminatedChar), 0),
    }
}

fn char_literal(lex: &mut logos::Lexer<TokenKind>) -> Result<u8, LexErrorKind> {
    let rest = lex.remainder();
    match rest.as_bytes().first() {
        None | Some(b'\n') | Some(b'\r') => return Err(LexErrorKind::UnterminatedChar),
        Some(b'\'') => {
            lex.bump(1);
            return Err(LexErrorKind::EmptyChar);
        }
        _ => {}
    }

    let (value, len) = scan_char(rest);
    lex.bump(len);
    if lex.remainder().starts_with('\'') {
        lex.bump(1);
        value
    } else {
        // Report the bad escape in preference to the missing quote
        value.and(Err(LexErrorKind::UnterminatedChar))
    }
}

fn string_literal(lex: &mut logos::Lexer<TokenKind>) -> Result<Vec<u8>, LexErrorKind> {
    let mut bytes = Vec::new();
    let mut error = None;
    loop {
        let rest = lex.remainder();
        match rest.as_bytes().first() {
            None | Some(b'\n') => return Err(LexErrorKind::UnterminatedString),
            Some(b'"') => {
                lex.bump(1);
                break;
            }
            _ => {
                let (value, len) = scan_char(rest);
                lex.bump(len.max(1));
                match value {
                    Ok(byte) => bytes.push(byte),
                    Err(e) => {
                        error.get_or_insert(e);
                    }
                }
            }
        }
    }
    match error {
        Some(e) => Err(e),
        None => Ok(bytes),
    }
}

impl TokenKind {
    /// Check if this token starts a type specifier
    pub fn is_type_keyword(&self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Char | TokenKind::Void)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, TokenKind::Eof)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Int => write!(f, "'int'"),
            TokenKind::Char => write!(f, "'char'"),
            TokenKind::Void => write!(f, "'void'"),
            TokenKind::If => write!(f, "'if'"),
            TokenKind::Else => write!(f, "'else'"),
            TokenKind::While => write!(f, "'while'"),
            TokenKind::Return => write!(f, "'return'"),
            TokenKind::Identifier(s) => write!(f, "identifier '{}'", s),
            TokenKind::IntLiteral(n) => write!(f, "integer '{}'", n),
            TokenKind::CharLiteral(c) => write!(f, "char '{}'", c.escape_ascii()),
            TokenKind::StringLiteral(s) => write!(f, "string \"{}\"", s.escape_ascii()),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::LtEq => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::GtEq => write!(f, "'>='"),
            TokenKind::AmpAmp => write!(f, "'&&'"),
            TokenKind::PipePipe => write!(f, "'||'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Semi => write!(f, "';'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::BlockComment => write!(f, "comment"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
