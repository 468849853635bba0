//! G-code to Kawasaki AS translator
//!
//! Turns slicer output into robot motion programs for three processes:
//! filament deposition, wire-arc metal deposition and laser cutting.
//!
//! This library provides:
//! - A streaming G-code parser
//! - Machine state tracking and path simplification
//! - Per-mode translation into AS instructions
//! - Program formatting, post-processing and source diagnostics

pub mod config;
pub mod convert;
pub mod core;
pub mod error;
pub mod parser;
pub mod postprocess;
pub mod program;
pub mod stats;
pub mod translate;
pub mod validation;

// Re-exports for clean public API
pub use config::{Config, Mode, TranslationConfig};
pub use convert::{convert_reader, convert_str, Conversion};
pub use error::{ConfigError, ParseError, TranslateError};
pub use parser::{parse_line, Command, CommandKind, CommandStream};
pub use program::{format_program, Instruction, Opcode};
pub use translate::translate;
pub use validation::{validate_document, Diagnostic};
