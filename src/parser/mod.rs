//! GCode Parser
//!
//! Tokenizes source lines and classifies them into [`Command`]s.
//! No machine state lives here apart from the modal motion code.

pub mod ast;
pub mod lexer;
pub mod stream;

pub use ast::{Command, CommandKind, Words};
pub use lexer::{tokenize_line, Token, TokenKind};
pub use stream::CommandStream;

use crate::error::ParseError;

/// Parse a single line of GCode, without modal context.
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    ast::parse_statement(1, line, None)
}
