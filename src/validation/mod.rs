//! Validation Engine
//!
//! Line diagnostics for a source file, independent of translation.

pub mod engine;

pub use engine::{validate_command, validate_document, Diagnostic, Severity};

// Re-export common types
pub use engine::ValidationResult;
