use std::fs::{self, File};
use std::io::BufReader;

use anyhow::{Context, Result};
use clap::Parser;

use gcode2as::config::{Args, Config};
use gcode2as::convert::convert_reader;
use gcode2as::postprocess::PostProcessor;
use gcode2as::stats::StatsScraper;

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    // Parse configuration from command line and parameter files
    let config = Config::from_args(args)?;
    let input = &config.input;
    let name = config.program_name();

    let source = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let conversion = convert_reader(
        BufReader::new(source),
        &name,
        &config.translation,
        config.strict,
    )
    .with_context(|| format!("Failed to translate {}", input.display()))?;

    let source = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let stats = StatsScraper::new()?
        .scrape_reader(BufReader::new(source))
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let text = PostProcessor::new()?.process(&conversion.program, &config.translation, &stats);

    let out_path = config.output_path();
    println!("Saving generated file as {}", out_path.display());
    fs::write(&out_path, text)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    if config.save_params {
        match &config.params_path {
            Some(path) => {
                config.settings.save(path)?;
                log::info!("Parameters saved to {}", path.display());
            }
            None => log::warn!("No configuration directory; parameters not saved"),
        }
    }

    Ok(())
}
