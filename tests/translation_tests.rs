//! End-to-end translation behavior through the public API
use gcode2as::core::{SignalKind, ToolStateTracker};
use gcode2as::translate::invert;
use gcode2as::{
    convert_str, format_program, translate, CommandStream, Instruction, Mode, Opcode,
    TranslateError, TranslationConfig,
};

const CUBE: &str = include_str!("fixtures/calibration_cube.gcode");

fn commands(source: &str) -> Vec<gcode2as::Command> {
    CommandStream::from_text(source)
        .collect::<Result<_, _>>()
        .expect("parse")
}

fn config(mode: Mode, min_distance: f64) -> TranslationConfig {
    TranslationConfig {
        min_distance,
        ..TranslationConfig::for_mode(mode)
    }
}

fn motions(instructions: &[Instruction]) -> Vec<&Instruction> {
    instructions.iter().filter(|i| i.is_motion()).collect()
}

#[test]
fn fdm_short_deposit_is_merged_away() {
    let out = translate(
        commands("G0 X0 Y0\nG1 X10 Y0 E5\nG1 X10 Y0.5 E5.2\n"),
        &config(Mode::Fdm, 2.0),
    )
    .expect("translate");

    let motions = motions(&out);
    assert_eq!(motions.len(), 2);
    assert!(matches!(motions[0].opcode, Opcode::Travel(_)));
    assert!(matches!(motions[1].opcode, Opcode::Deposit(_)));
}

#[test]
fn zero_min_distance_keeps_every_waypoint() {
    let source = "G1 X0.1 E0.1\nG1 X0.2 E0.2\nG1 X0.3\nG1 X0.4 E0.3\nG0 X0.5\n";
    let out = translate(commands(source), &config(Mode::Fdm, 0.0)).expect("translate");
    assert_eq!(motions(&out).len(), 5);
}

#[test]
fn metal_arc_wraps_commands_three_to_seven() {
    let source = "\
G0 X0 Y0
M3
G1 X1
G1 X1.2
G1 X1.4
G1 X1.6
G1 X1.8
M5
G0 X20
";
    for min_distance in [0.0, 2.0] {
        let out = translate(commands(source), &config(Mode::Metal, min_distance)).expect("translate");

        let start = out.iter().position(|i| i.opcode == Opcode::ArcStart).expect("arc start");
        let stop = out.iter().position(|i| i.opcode == Opcode::ArcStop).expect("arc stop");
        assert_eq!(out.iter().filter(|i| i.opcode == Opcode::ArcStart).count(), 1);
        assert_eq!(out.iter().filter(|i| i.opcode == Opcode::ArcStop).count(), 1);
        assert_eq!(out[start + 1].line(), Some(3));
        assert_eq!(out[stop - 1].line(), Some(7));
    }
}

#[test]
fn arcs_fail_without_output() {
    for mode in [Mode::Fdm, Mode::Metal, Mode::LaserCut] {
        let result = convert_str("G1 X1 Y1\nG1 X2 Y2\nG2 X3 Y3 I1 J0\nG1 X4\n", "arc", &config(mode, 2.0), false);

        match result {
            Err(TranslateError::UnsupportedCommand { line, ref code, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(code, "G2");
            }
            other => panic!("expected UnsupportedCommand, got {:?}", other.map(|c| c.program)),
        }
    }
}

#[test]
fn inverting_twice_restores_coordinates() {
    for mode in [Mode::Fdm, Mode::Metal, Mode::LaserCut] {
        let plain = translate(commands(CUBE), &config(mode, 0.0)).expect("translate");
        let mut inverted = translate(
            commands(CUBE),
            &TranslationConfig {
                inverted: true,
                ..config(mode, 0.0)
            },
        )
        .expect("translate");

        assert_ne!(plain, inverted);
        invert(&mut inverted, TranslationConfig::default().invert_axis);
        assert_eq!(plain, inverted);
    }
}

#[test]
fn final_position_matches_source() {
    let source = "G0 X5 Y5 Z0.2\nG91\nG1 X10 E1\nG1 Y-2.5 E1\nG90\nG92 X0 Y0\nG1 X3.25 Y1.5 E4\n";

    let mut tracker = ToolStateTracker::new(SignalKind::Continuous);
    for command in commands(source) {
        tracker.apply(&command);
    }
    let expected = tracker.state().position;

    let out = translate(commands(source), &config(Mode::Fdm, 0.0)).expect("translate");
    let last = out.iter().rev().find_map(Instruction::target).expect("motion");
    assert!(last.distance(&expected) < 1e-6, "{:?} != {:?}", last, expected);

    // The formatted program carries the same position
    let program = format_program(&out, "roundtrip", false);
    let line = program
        .lines()
        .rev()
        .find(|l| l.contains("SHIFT(origin BY"))
        .expect("motion line");
    let inner = line
        .split_once("BY ")
        .and_then(|(_, rest)| rest.strip_suffix(')'))
        .expect("shift arguments");
    let values: Vec<f64> = inner
        .split(',')
        .map(|v| v.trim().parse().expect("number"))
        .collect();
    assert!((values[0] - expected.x).abs() < 5e-4);
    assert!((values[1] - expected.y).abs() < 5e-4);
    assert!((values[2] - expected.z).abs() < 5e-4);
}

#[test]
fn vase_mode_climbs_monotonically() {
    let config = TranslationConfig {
        vase_mode: true,
        layer_height: 0.2,
        ..TranslationConfig::for_mode(Mode::Fdm)
    };
    let out = translate(commands(CUBE), &config).expect("translate");

    let zs: Vec<f64> = out.iter().filter_map(Instruction::target).map(|p| p.z).collect();
    assert!(zs.len() > 8);
    assert!(zs.windows(2).all(|w| w[1] > w[0]), "{:?}", zs);
}

#[test]
fn passthrough_comments_keep_source_order() {
    let out = translate(commands(CUBE), &config(Mode::Metal, 2.0)).expect("translate");
    let comments: Vec<&str> = out
        .iter()
        .filter_map(|i| match &i.opcode {
            Opcode::Comment(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(comments[0], "generated by PrusaSlicer 2.7.1");
    assert_eq!(comments[1], "layer_height = 0.2");
    assert!(comments.contains(&"G28 ; home all axes"));
}
