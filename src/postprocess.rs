//! Final touches on a formatted program
//!
//! Controllers choke on long runs of comments, so the written file keeps
//! only the layer geometry notes and gets a short header describing the run.

use regex::Regex;

use crate::config::TranslationConfig;
use crate::stats::{OrNone, PrintStats};

#[derive(Debug, Clone)]
pub struct PostProcessor {
    keep: Regex,
}

impl PostProcessor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            keep: Regex::new(r"^;\s*(first_)?layer_height\s*=\s*\S+")?,
        })
    }

    /// Drop `;` comments. Lines left empty disappear; layer height notes
    /// survive untouched.
    pub fn strip_comments(&self, program: &str) -> String {
        let mut out = String::with_capacity(program.len());
        for line in program.lines() {
            let trimmed = line.trim();
            let kept = match line.split_once(';') {
                None => line,
                Some(_) if self.keep.is_match(trimmed) => line,
                Some((code, _)) => code.trim_end(),
            };
            if kept.trim().is_empty() {
                continue;
            }
            out.push_str(kept);
            out.push('\n');
        }
        out
    }

    /// Header plus body. Verbose runs keep their annotations.
    pub fn process(&self, program: &str, config: &TranslationConfig, stats: &PrintStats) -> String {
        let body = if config.verbose {
            program.to_string()
        } else {
            self.strip_comments(program)
        };
        header(config, stats) + &body
    }
}

/// Comment lines describing the parameters and the source statistics
pub fn header(config: &TranslationConfig, stats: &PrintStats) -> String {
    [
        format!("; welding_speed = {}", config.welding_speed),
        format!("; line_width = {}", config.line_width),
        format!("; layer_height = {}", config.layer_height),
        format!("; first_layer_height = {}", config.first_layer_height),
        format!("; estimated_printing_time = {}", OrNone(&stats.estimated_printing_time)),
        format!("; total_filament_cost = {}", OrNone(&stats.total_filament_cost)),
        format!("; total_filament_used = {}", OrNone(&stats.total_filament_used)),
    ]
    .iter()
    .map(|line| format!("{}\n", line))
    .collect()
}
