//! Configuration management for gcode2as.
//!
//! Handles:
//! - Command-line argument parsing
//! - Layered parameter files (CLI > options file > parameter file > defaults)
//! - Validation into an immutable [`TranslationConfig`]

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options file looked up in the working directory
pub const OPTIONS_FILE: &str = "gcode2as.toml";

/// Machine class the program is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mode {
    Fdm,
    Metal,
    LaserCut,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Fdm => "FDM",
            Mode::Metal => "Metal",
            Mode::LaserCut => "LaserCut",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    /// Accepts the short names and the long descriptive ones, ignoring case
    /// and punctuation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "fdm" | "fdm3dprinting" | "3dprinting" => Ok(Mode::Fdm),
            "metal" | "metal3dprinting" | "welding" => Ok(Mode::Metal),
            "lasercut" | "laser" | "lasercutting" => Ok(Mode::LaserCut),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.name().to_string()
    }
}

/// Axis whose sign is flipped when inversion is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl FromStr for Axis {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "x" | "X" => Ok(Axis::X),
            "y" | "Y" => Ok(Axis::Y),
            "z" | "Z" => Ok(Axis::Z),
            _ => Err(ConfigError::UnknownAxis(s.to_string())),
        }
    }
}

impl TryFrom<String> for Axis {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Axis> for String {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
        .to_string()
    }
}

/// Fully resolved translation parameters, read-only during a run
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationConfig {
    pub mode: Mode,
    /// Waypoints closer than this to the last kept one are merged (mm)
    pub min_distance: f64,
    pub vase_mode: bool,
    /// Weld pass speed (mm/s)
    pub welding_speed: f64,
    pub inverted: bool,
    pub invert_axis: Axis,
    /// Deposited or cut line width (mm)
    pub line_width: f64,
    pub layer_height: f64,
    pub first_layer_height: f64,
    pub verbose: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Metal,
            min_distance: 2.0,
            vase_mode: false,
            welding_speed: 30.0,
            inverted: false,
            invert_axis: Axis::Y,
            line_width: 2.4,
            layer_height: 1.0,
            first_layer_height: 1.2,
            verbose: false,
        }
    }
}

impl TranslationConfig {
    /// Default parameters for a mode
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Check every numeric field is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("min_distance", self.min_distance, ">= 0", |v| v >= 0.0)?;
        check("welding_speed", self.welding_speed, "> 0", |v| v > 0.0)?;
        check("line_width", self.line_width, ">= 0", |v| v >= 0.0)?;
        check("layer_height", self.layer_height, "> 0", |v| v > 0.0)?;
        check(
            "first_layer_height",
            self.first_layer_height,
            "> 0",
            |v| v > 0.0,
        )?;
        Ok(())
    }
}

fn check(
    name: &'static str,
    value: f64,
    requirement: &'static str,
    ok: impl Fn(f64) -> bool,
) -> Result<(), ConfigError> {
    if value.is_finite() && ok(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            requirement,
        })
    }
}

/// One layer of parameters. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub mode: Option<Mode>,
    #[serde(alias = "min_dist")]
    pub min_distance: Option<f64>,
    pub vase_mode: Option<bool>,
    pub welding_speed: Option<f64>,
    pub inverted: Option<bool>,
    pub invert_axis: Option<Axis>,
    pub line_width: Option<f64>,
    pub layer_height: Option<f64>,
    pub first_layer_height: Option<f64>,
    pub output: Option<PathBuf>,
}

impl Settings {
    /// Load a TOML parameter file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`Settings::load`], but a missing file is not an error
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>, ConfigError> {
        if path.is_file() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Write the settings back as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(self).context("serializing parameters")?;
        fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Fill unset fields from a lower-priority layer
    pub fn or(self, lower: Settings) -> Settings {
        Settings {
            mode: self.mode.or(lower.mode),
            min_distance: self.min_distance.or(lower.min_distance),
            vase_mode: self.vase_mode.or(lower.vase_mode),
            welding_speed: self.welding_speed.or(lower.welding_speed),
            inverted: self.inverted.or(lower.inverted),
            invert_axis: self.invert_axis.or(lower.invert_axis),
            line_width: self.line_width.or(lower.line_width),
            layer_height: self.layer_height.or(lower.layer_height),
            first_layer_height: self.first_layer_height.or(lower.first_layer_height),
            output: self.output.or(lower.output),
        }
    }

    /// Apply built-in defaults and validate
    pub fn resolve(&self, verbose: bool) -> Result<TranslationConfig, ConfigError> {
        let defaults = TranslationConfig::default();
        let config = TranslationConfig {
            mode: self.mode.unwrap_or(defaults.mode),
            min_distance: self.min_distance.unwrap_or(defaults.min_distance),
            vase_mode: self.vase_mode.unwrap_or(defaults.vase_mode),
            welding_speed: self.welding_speed.unwrap_or(defaults.welding_speed),
            inverted: self.inverted.unwrap_or(defaults.inverted),
            invert_axis: self.invert_axis.unwrap_or(defaults.invert_axis),
            line_width: self.line_width.unwrap_or(defaults.line_width),
            layer_height: self.layer_height.unwrap_or(defaults.layer_height),
            first_layer_height: self
                .first_layer_height
                .unwrap_or(defaults.first_layer_height),
            verbose,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Command-line arguments for gcode2as
#[derive(Debug, Parser)]
#[command(name = "gcode2as")]
#[command(about = "Convert slicer G-code into Kawasaki AS robot programs")]
#[command(version)]
pub struct Args {
    /// G-code file to convert
    pub file: PathBuf,

    /// Ignore the options and parameter files
    #[arg(short = 'd', long = "defaults")]
    pub defaults: bool,

    /// Annotate every instruction with its source line and tool state
    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[arg(long, help = "Mode of operation (FDM, Metal, LaserCut)")]
    pub mode: Option<String>,

    #[arg(long = "min-dist", visible_alias = "min_dist", help = "Minimum distance between points (mm)")]
    pub min_dist: Option<f64>,

    #[arg(long, visible_alias = "vase_mode", help = "Spiral vase mode (true/false)")]
    pub vase_mode: Option<bool>,

    #[arg(long, visible_alias = "welding_speed", help = "Welding speed (mm/s)")]
    pub welding_speed: Option<f64>,

    #[arg(long, help = "Flip the sign of the inverted axis (true/false)")]
    pub inverted: Option<bool>,

    #[arg(long, help = "Axis flipped by --inverted (X, Y or Z)")]
    pub invert_axis: Option<String>,

    #[arg(long, help = "Output directory")]
    pub output: Option<PathBuf>,

    #[arg(long, visible_alias = "line_width", help = "Line width (mm)")]
    pub line_width: Option<f64>,

    #[arg(long, visible_alias = "layer_height", help = "Layer height (mm)")]
    pub layer_height: Option<f64>,

    #[arg(long, visible_alias = "first_layer_height", help = "First layer height (mm)")]
    pub first_layer_height: Option<f64>,

    #[arg(long, help = "Options file (default: ./gcode2as.toml when present)")]
    pub options: Option<PathBuf>,

    #[arg(long, help = "Parameter file (default: <config dir>/gcode2as/parameters.toml)")]
    pub params: Option<PathBuf>,

    /// Write the resolved parameters back to the parameter file
    #[arg(long)]
    pub save_params: bool,

    /// Abort on the first malformed line instead of skipping it
    #[arg(long)]
    pub strict: bool,

    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

impl Args {
    /// The settings given on the command line
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        Ok(Settings {
            mode: self.mode.as_deref().map(str::parse).transpose()?,
            min_distance: self.min_dist,
            vase_mode: self.vase_mode,
            welding_speed: self.welding_speed,
            inverted: self.inverted,
            invert_axis: self.invert_axis.as_deref().map(str::parse).transpose()?,
            line_width: self.line_width,
            layer_height: self.layer_height,
            first_layer_height: self.first_layer_height,
            output: self.output.clone(),
        })
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub translation: TranslationConfig,
    /// Every layer merged, before defaults
    pub settings: Settings,
    pub output_dir: PathBuf,
    pub params_path: Option<PathBuf>,
    pub save_params: bool,
    pub strict: bool,
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let params_path = args.params.clone().or_else(default_params_path);
        let mut settings = args.settings()?;

        if !args.defaults {
            let options = match &args.options {
                Some(path) => Some(Settings::load(path)?),
                None => Settings::load_if_exists(Path::new(OPTIONS_FILE))?,
            };
            if let Some(options) = options {
                log::debug!("Applying options file");
                settings = settings.or(options);
            }

            let params = match (&args.params, &params_path) {
                (Some(path), _) => Some(Settings::load(path)?),
                (None, Some(path)) => Settings::load_if_exists(path)?,
                (None, None) => None,
            };
            if let Some(params) = params {
                log::debug!("Applying parameter file");
                settings = settings.or(params);
            }
        }

        let translation = settings.resolve(args.verbose)?;

        let output_dir = settings.output.clone().unwrap_or_else(|| {
            args.file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        });

        Ok(Config {
            input: args.file,
            translation,
            settings,
            output_dir,
            params_path,
            save_params: args.save_params,
            strict: args.strict,
            log_level: args.log_level,
        })
    }

    /// Name of the generated AS program, taken from the input file stem
    pub fn program_name(&self) -> String {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "program".to_string())
    }

    /// `<output dir>/<input stem>.pg`
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.pg", self.program_name()))
    }
}

fn default_params_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gcode2as").join("parameters.toml"))
}
