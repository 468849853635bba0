//! Filament deposition
//!
//! The tool follows extrusion: a move whose E delta is positive deposits,
//! anything else travels. Spindle and laser codes mean nothing here.

use crate::config::{Mode, TranslationConfig};
use crate::core::{Point, SignalKind, SimplifiedPoint};
use crate::program::{Instruction, Opcode};
use crate::translate::ModePolicy;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct FdmPolicy {
    vase_mode: bool,
    layer_height: f64,
}

impl FdmPolicy {
    pub fn new(config: &TranslationConfig) -> Self {
        Self {
            vase_mode: config.vase_mode,
            layer_height: config.layer_height,
        }
    }
}

impl ModePolicy for FdmPolicy {
    fn mode(&self) -> Mode {
        Mode::Fdm
    }

    fn signal_kind(&self) -> SignalKind {
        SignalKind::Continuous
    }

    fn maps_tool_commands(&self) -> bool {
        false
    }

    fn motion(&self, point: &SimplifiedPoint, target: Point) -> Opcode {
        if point.tool_active() {
            Opcode::Deposit(target)
        } else {
            Opcode::Travel(target)
        }
    }

    fn finish(&mut self, instructions: &mut Vec<Instruction>) {
        if self.vase_mode {
            spiralize(instructions, self.layer_height);
        }
    }
}

/// Turn stacked layers into one ascending spiral.
///
/// Z-only travels disappear. Within a layer, Z rises from the previous
/// layer's height to the layer's own height in proportion to the XY distance
/// covered, measured from the last point of the previous layer. The first
/// layer starts one `layer_height` below itself, never below zero.
pub fn spiralize(instructions: &mut Vec<Instruction>, layer_height: f64) {
    let mut previous: Option<Point> = None;
    instructions.retain(|instruction| {
        let Some(target) = instruction.target() else {
            return true;
        };
        let z_only = matches!(instruction.opcode, Opcode::Travel(_))
            && previous.is_some_and(|p| {
                p.planar_distance(&target) < EPSILON && (p.z - target.z).abs() > EPSILON
            });
        previous = Some(target);
        !z_only
    });

    let motions: Vec<usize> = instructions
        .iter()
        .enumerate()
        .filter(|(_, i)| i.is_motion())
        .map(|(idx, _)| idx)
        .collect();

    let mut layers: Vec<&[usize]> = Vec::new();
    let mut start = 0;
    for k in 1..=motions.len() {
        let boundary = k == motions.len()
            || match (instructions[motions[k - 1]].target(), instructions[motions[k]].target()) {
                (Some(a), Some(b)) => (a.z - b.z).abs() > EPSILON,
                _ => true,
            };
        if boundary {
            layers.push(&motions[start..k]);
            start = k;
        }
    }

    log::debug!("Spiralizing {} layers", layers.len());

    let mut floor: Option<f64> = None;
    let mut anchor: Option<Point> = None;
    let mut ramps: Vec<(usize, f64)> = Vec::with_capacity(motions.len());

    for layer in layers {
        let points: Vec<Point> = layer
            .iter()
            .filter_map(|&idx| instructions[idx].target())
            .collect();
        let Some(&first) = points.first() else {
            continue;
        };
        let height = first.z;
        let from = floor.unwrap_or_else(|| (height - layer_height).max(0.0));

        let mut travelled = Vec::with_capacity(points.len());
        let mut total = 0.0;
        let mut last = anchor.unwrap_or(first);
        for point in &points {
            total += last.planar_distance(point);
            travelled.push(total);
            last = *point;
        }

        for (&idx, covered) in layer.iter().zip(travelled) {
            let z = if total > EPSILON {
                from + (height - from) * covered / total
            } else {
                height
            };
            ramps.push((idx, z));
        }

        floor = Some(height);
        anchor = Some(last);
    }

    for (idx, z) in ramps {
        if let Some(target) = instructions[idx].target_mut() {
            target.z = z;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranslateError;
    use crate::parser::CommandStream;
    use crate::translate::translate;

    fn fdm(min_distance: f64, vase_mode: bool) -> TranslationConfig {
        TranslationConfig {
            min_distance,
            vase_mode,
            layer_height: 0.5,
            ..TranslationConfig::for_mode(Mode::Fdm)
        }
    }

    fn run(source: &str, config: &TranslationConfig) -> Vec<Instruction> {
        let commands = CommandStream::from_text(source).map(|c| c.expect("parse"));
        translate(commands, config).expect("translate")
    }

    fn motions(instructions: &[Instruction]) -> Vec<&Opcode> {
        instructions
            .iter()
            .filter(|i| i.is_motion())
            .map(|i| &i.opcode)
            .collect()
    }

    #[test]
    fn short_deposit_is_merged() {
        let out = run("G0 X0 Y0\nG1 X10 Y0 E5\nG1 X10 Y0.5 E5.2\n", &fdm(2.0, false));

        assert_eq!(
            motions(&out),
            [
                &Opcode::Travel(Point::new(0.0, 0.0, 0.0)),
                &Opcode::Deposit(Point::new(10.0, 0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn retraction_moves_travel() {
        let out = run("G1 X5 E1\nG1 X10 E0.5\n", &fdm(0.0, false));

        assert_eq!(
            motions(&out),
            [
                &Opcode::Deposit(Point::new(5.0, 0.0, 0.0)),
                &Opcode::Travel(Point::new(10.0, 0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn spindle_codes_are_rejected() {
        let commands = CommandStream::from_text("G1 X1\nM3 S100\n").map(|c| c.expect("parse"));
        let err = translate(commands, &fdm(0.0, false)).unwrap_err();

        assert!(matches!(
            err,
            TranslateError::UnsupportedCommand { line: 2, ref code, mode: Mode::Fdm } if code == "M3"
        ));
    }

    const TWO_LAYERS: &str = "\
G0 X0 Y0 Z0.5
G1 X10 Y0 E1
G1 X10 Y10 E2
G1 X0 Y10 E3
G1 X0 Y0 E4
G0 Z1.0
G1 X10 Y0 E5
G1 X10 Y10 E6
G1 X0 Y10 E7
G1 X0 Y0 E8
";

    #[test]
    fn vase_mode_drops_z_only_travel_and_ramps() {
        let out = run(TWO_LAYERS, &fdm(0.0, true));
        let zs: Vec<f64> = out.iter().filter_map(|i| i.target()).map(|p| p.z).collect();

        assert_eq!(zs.len(), 9);
        assert!(zs.windows(2).all(|w| w[1] > w[0]), "{:?}", zs);
        assert!((zs[4] - 0.5).abs() < 1e-9);
        assert!((zs[8] - 1.0).abs() < 1e-9);
        assert!(!out.iter().any(|i| match i.opcode {
            Opcode::Travel(p) => p.x == 0.0 && p.y == 0.0 && (p.z - 1.0).abs() < 1e-9,
            _ => false,
        }));
    }

    #[test]
    fn vase_ramp_follows_xy_distance() {
        let out = run(TWO_LAYERS, &fdm(0.0, true));
        let second_layer: Vec<f64> = out
            .iter()
            .filter_map(|i| i.target())
            .skip(5)
            .map(|p| p.z)
            .collect();

        // Square of side 10: a quarter of the perimeter per segment
        let expected = [0.625, 0.75, 0.875, 1.0];
        for (z, want) in second_layer.iter().zip(expected) {
            assert!((z - want).abs() < 1e-9, "{} != {}", z, want);
        }
    }

    #[test]
    fn vase_mode_off_keeps_layers_flat() {
        let out = run(TWO_LAYERS, &fdm(0.0, false));
        assert!(out.iter().any(|i| i.opcode == Opcode::Travel(Point::new(0.0, 0.0, 1.0))));
    }
}
