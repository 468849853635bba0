//! Source-to-program conversion
//!
//! Parse errors are collected and skipped unless `strict` is set; read
//! errors and translation errors always abort. Nothing is returned for a
//! failed run.

use std::io::BufRead;

use crate::config::TranslationConfig;
use crate::error::{ParseError, TranslateError};
use crate::parser::CommandStream;
use crate::program::{format_program, Instruction};
use crate::translate::try_translate;
use crate::validation::ValidationResult;

/// A finished translation
#[derive(Debug, Clone)]
pub struct Conversion {
    pub instructions: Vec<Instruction>,
    /// Formatted AS program
    pub program: String,
    /// Lines skipped because they did not parse
    pub diagnostics: ValidationResult,
}

/// Convert G-code read from `reader` into a program called `name`
pub fn convert_reader<R: BufRead>(
    reader: R,
    name: &str,
    config: &TranslationConfig,
    strict: bool,
) -> Result<Conversion, TranslateError> {
    let mut diagnostics = ValidationResult::new();

    let commands = CommandStream::new(reader).filter_map(|item| match item {
        Ok(command) => Some(Ok(command)),
        Err(err @ ParseError::Read { .. }) => Some(Err(err.into())),
        Err(err) if strict => Some(Err(err.into())),
        Err(err) => {
            log::warn!("skipping {}", err);
            diagnostics.add_error(err.line(), err.to_string());
            None
        }
    });
    let instructions = try_translate(commands, config)?;

    log::info!(
        "{}: {} instructions in {} mode, {} lines skipped",
        name,
        instructions.len(),
        config.mode,
        diagnostics.diagnostics.len()
    );

    let program = format_program(&instructions, name, config.verbose);
    Ok(Conversion {
        instructions,
        program,
        diagnostics,
    })
}

/// Convert in-memory G-code
pub fn convert_str(
    source: &str,
    name: &str,
    config: &TranslationConfig,
    strict: bool,
) -> Result<Conversion, TranslateError> {
    convert_reader(source.as_bytes(), name, config, strict)
}
