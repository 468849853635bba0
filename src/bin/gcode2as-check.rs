use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use gcode2as::config::Mode;
use gcode2as::validation::{validate_document, Severity};

/// Report the lines of a G-code file that translation would skip, copy or reject
#[derive(Debug, Parser)]
#[command(name = "gcode2as-check", version)]
struct CheckArgs {
    /// G-code file to check
    file: PathBuf,

    /// Translation mode to check against (FDM, Metal, LaserCut)
    #[arg(long, default_value = "Metal")]
    mode: Mode,

    /// Also print informational diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<ExitCode> {
    let args = CheckArgs::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let result = validate_document(&content, args.mode);

    for diagnostic in &result.diagnostics {
        if diagnostic.severity != Severity::Info || args.verbose {
            println!("{}:{}", args.file.display(), diagnostic);
        }
    }
    log::info!(
        "{} errors, {} warnings, {} notes",
        result.count(Severity::Error),
        result.count(Severity::Warning),
        result.count(Severity::Info)
    );

    Ok(if result.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
