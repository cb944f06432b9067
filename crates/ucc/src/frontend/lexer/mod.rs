//! Lexer module for tokenizing µC source code

mod scanner;
mod token;

pub use scanner::Lexer;
pub use token::{LexErrorKind, Token, TokenKind};
