//! Validation Engine
//!
//! Predicts what translation will make of each line without translating.

use std::fmt;

use crate::config::Mode;
use crate::parser::{Command, CommandKind, CommandStream};
use crate::translate::lacks_linear_fallback;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// A diagnostic message for a validation issue
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
    pub severity: Severity,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: line {}: {}", self.severity, self.line, self.message)
    }
}

/// Result of validating a document or line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, line: usize, message: String, severity: Severity) {
        self.diagnostics.push(Diagnostic {
            line,
            message,
            severity,
        });
    }

    pub fn add_error(&mut self, line: usize, message: String) {
        self.push(line, message, Severity::Error);
    }

    pub fn add_warning(&mut self, line: usize, message: String) {
        self.push(line, message, Severity::Warning);
    }

    pub fn add_info(&mut self, line: usize, message: String) {
        self.push(line, message, Severity::Info);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn is_valid(&self) -> bool {
        self.count(Severity::Error) == 0
    }

    /// No errors and no warnings
    pub fn is_clean(&self) -> bool {
        self.is_valid() && self.count(Severity::Warning) == 0
    }
}

/// Validate one parsed command for `mode`
pub fn validate_command(command: &Command, mode: Mode, result: &mut ValidationResult) {
    match &command.kind {
        CommandKind::Unknown { code } if lacks_linear_fallback(code) => {
            result.add_warning(
                command.line,
                format!("'{}' has no linear equivalent; translation will stop here", code),
            );
        }
        CommandKind::Unknown { code } => {
            result.add_info(
                command.line,
                format!("'{}' is copied into the program as a comment", code),
            );
        }
        CommandKind::ToolOn | CommandKind::ToolOff if mode == Mode::Fdm => {
            let code = command.code().unwrap_or_default();
            result.add_warning(
                command.line,
                format!("'{}' is not supported in {} mode", code, mode),
            );
        }
        _ => {}
    }
}

/// Validate an entire document
pub fn validate_document(content: &str, mode: Mode) -> ValidationResult {
    let mut result = ValidationResult::new();

    for item in CommandStream::from_text(content) {
        match item {
            Ok(command) => validate_command(&command, mode, &mut result),
            Err(err) => result.add_error(err.line(), err.to_string()),
        }
    }

    result
}
