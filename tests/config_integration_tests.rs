//! Parameter resolution across the command line and TOML files
use std::fs;
use std::path::Path;

use clap::Parser;
use gcode2as::config::{Args, Axis, Config, Settings};
use gcode2as::{ConfigError, Mode};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, text).expect("write fixture");
    path.to_string_lossy().into_owned()
}

fn config(argv: &[&str]) -> anyhow::Result<Config> {
    let mut full = vec!["gcode2as", "part.gcode"];
    full.extend_from_slice(argv);
    Config::from_args(Args::parse_from(full))
}

#[test]
fn options_file_beats_parameter_file() {
    let dir = TempDir::new().expect("tempdir");
    let params = write(
        dir.path(),
        "parameters.toml",
        "mode = \"FDM\"\nwelding_speed = 12.0\nline_width = 1.0\n",
    );
    let options = write(dir.path(), "options.toml", "line_width = 3.0\n");

    let config = config(&["--params", &params, "--options", &options]).expect("config");

    assert_eq!(config.translation.mode, Mode::Fdm);
    assert_eq!(config.translation.welding_speed, 12.0);
    assert_eq!(config.translation.line_width, 3.0);
    // Untouched fields keep their defaults
    assert_eq!(config.translation.layer_height, 1.0);
}

#[test]
fn command_line_beats_files() {
    let dir = TempDir::new().expect("tempdir");
    let params = write(dir.path(), "parameters.toml", "min_dist = 4.0\ninvert_axis = \"x\"\n");
    let options = write(dir.path(), "options.toml", "min_distance = 3.0\n");

    let config = config(&[
        "--params",
        &params,
        "--options",
        &options,
        "--min-dist",
        "0.25",
    ])
    .expect("config");

    assert_eq!(config.translation.min_distance, 0.25);
    assert_eq!(config.translation.invert_axis, Axis::X);
}

#[test]
fn defaults_flag_skips_files() {
    let dir = TempDir::new().expect("tempdir");
    let params = write(dir.path(), "parameters.toml", "mode = \"LaserCut\"\n");

    let config = config(&["-d", "--params", &params]).expect("config");
    assert_eq!(config.translation.mode, Mode::Metal);
}

#[test]
fn long_mode_names_are_accepted_in_files() {
    let dir = TempDir::new().expect("tempdir");
    let params = write(dir.path(), "parameters.toml", "mode = \"Metal 3D Printing\"\n");

    let config = config(&["--params", &params, "--mode", "laser cut"]).expect("config");
    assert_eq!(config.translation.mode, Mode::LaserCut);

    let settings = Settings::load(Path::new(&params)).expect("load");
    assert_eq!(settings.mode, Some(Mode::Metal));
}

#[test]
fn invalid_values_are_rejected() {
    let err = config(&["-d", "--layer-height", "0"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::OutOfRange { name: "layer_height", .. })
    ));

    let err = config(&["-d", "--mode", "plasma"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::UnknownMode(_))
    ));
}

#[test]
fn malformed_toml_names_the_file() {
    let dir = TempDir::new().expect("tempdir");
    let params = write(dir.path(), "parameters.toml", "welding_speed = [\n");

    let err = config(&["--params", &params]).unwrap_err();
    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::Toml { path, .. }) => assert!(path.ends_with("parameters.toml")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn saved_parameters_load_back() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("nested").join("parameters.toml");

    let settings = Settings {
        mode: Some(Mode::LaserCut),
        line_width: Some(0.2),
        invert_axis: Some(Axis::Z),
        ..Settings::default()
    };
    settings.save(&path).expect("save");

    assert_eq!(Settings::load(&path).expect("load"), settings);
}
