//! Wire-arc deposition
//!
//! The arc is switched on around each active run and every active move is a
//! weld pass at the welding speed. Weld heights come from the configured
//! layer geometry, not from the source: each time a run starts above the
//! current layer a new one begins. The approach to a run sits on the run's
//! layer, so every pass of a layer is flat.

use crate::config::{Mode, TranslationConfig};
use crate::core::{Point, SignalKind, SimplifiedPoint};
use crate::program::{Instruction, Opcode};
use crate::translate::{ModePolicy, ToolEvent};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Layer {
    /// Source Z of the first pass in this layer
    source_z: f64,
    index: usize,
}

#[derive(Debug, Clone)]
pub struct MetalPolicy {
    welding_speed: f64,
    first_layer_height: f64,
    layer_height: f64,
    layer: Option<Layer>,
}

impl MetalPolicy {
    pub fn new(config: &TranslationConfig) -> Self {
        Self {
            welding_speed: config.welding_speed,
            first_layer_height: config.first_layer_height,
            layer_height: config.layer_height,
            layer: None,
        }
    }

    /// Weld height of layer `index`
    pub fn layer_z(&self, index: usize) -> f64 {
        self.first_layer_height + index as f64 * self.layer_height
    }

    fn scale_layer(&mut self, point: &SimplifiedPoint, next: Option<&SimplifiedPoint>) -> Point {
        let mut target = point.position();
        let on_layer = point.tool_active() || next.is_some_and(SimplifiedPoint::tool_active);

        if on_layer {
            self.enter_layer(target.z, point.line());
        }

        if let Some(layer) = self.layer {
            target.z = if on_layer {
                self.layer_z(layer.index)
            } else {
                // Hops and clearances stay relative to the layer
                self.layer_z(layer.index) + (target.z - layer.source_z)
            };
        }

        target
    }

    /// Start a new layer when `source_z` is above the current one
    fn enter_layer(&mut self, source_z: f64, line: usize) {
        let index = match self.layer {
            None => 0,
            Some(current) if source_z > current.source_z + EPSILON => current.index + 1,
            Some(_) => return,
        };
        log::debug!(
            "layer {} starts at line {} (source z {:.3})",
            index,
            line,
            source_z
        );
        self.layer = Some(Layer { source_z, index });
    }
}

impl ModePolicy for MetalPolicy {
    fn mode(&self) -> Mode {
        Mode::Metal
    }

    fn signal_kind(&self) -> SignalKind {
        SignalKind::Edge
    }

    fn map_tool_event(&mut self, event: ToolEvent, _point: &SimplifiedPoint, out: &mut Vec<Instruction>) {
        match event {
            ToolEvent::RunStart => out.push(Instruction::new(Opcode::ArcStart)),
            ToolEvent::RunEnd => out.push(Instruction::new(Opcode::ArcStop)),
            ToolEvent::Hold => {}
        }
    }

    fn place(
        &mut self,
        point: &SimplifiedPoint,
        _previous: Option<Point>,
        next: Option<&SimplifiedPoint>,
    ) -> Point {
        self.scale_layer(point, next)
    }

    fn motion(&self, point: &SimplifiedPoint, target: Point) -> Opcode {
        if point.tool_active() {
            Opcode::Weld(target)
        } else {
            Opcode::Travel(target)
        }
    }

    fn speed(&self, point: &SimplifiedPoint) -> f64 {
        if point.tool_active() {
            self.welding_speed
        } else {
            point.waypoint.feed / 60.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CommandStream;
    use crate::translate::translate;

    fn run(source: &str, config: &TranslationConfig) -> Vec<Instruction> {
        let commands = CommandStream::from_text(source).map(|c| c.expect("parse"));
        translate(commands, config).expect("translate")
    }

    fn motion_of_line(out: &[Instruction], line: usize) -> usize {
        out.iter()
            .position(|i| i.is_motion() && i.line() == Some(line))
            .expect("motion for line")
    }

    #[test]
    fn arc_brackets_active_run_despite_merging() {
        let source = "\
G0 X0 Y0 Z0.2
M3
G1 X10
G1 X10.5
G1 X11
G1 X11.5
G1 X11.8
M5
G0 X60 Z5
";
        let out = run(source, &TranslationConfig::for_mode(Mode::Metal));

        let starts: Vec<_> = out.iter().filter(|i| i.opcode == Opcode::ArcStart).collect();
        let stops: Vec<_> = out.iter().filter(|i| i.opcode == Opcode::ArcStop).collect();
        assert_eq!(starts.len(), 1);
        assert_eq!(stops.len(), 1);

        let first = motion_of_line(&out, 3);
        let last = motion_of_line(&out, 7);
        assert_eq!(out[first - 1].opcode, Opcode::ArcStart);
        assert_eq!(out[last + 1].opcode, Opcode::ArcStop);
        assert!(out[first..=last]
            .iter()
            .filter(|i| i.is_motion())
            .all(|i| matches!(i.opcode, Opcode::Weld(_))));
    }

    #[test]
    fn weld_passes_run_at_welding_speed() {
        let config = TranslationConfig {
            welding_speed: 12.5,
            ..TranslationConfig::for_mode(Mode::Metal)
        };
        let out = run("G0 X0 Y0 F6000\nM3\nG1 X10\nG1 X20\nM5\nG0 X30\n", &config);

        let arc = out.iter().position(|i| i.opcode == Opcode::ArcStart).expect("arc start");
        assert_eq!(out[arc - 1].opcode, Opcode::Speed(12.5));
        assert_eq!(out[0].opcode, Opcode::Speed(100.0));
        assert_eq!(out.last().map(|i| &i.opcode), Some(&Opcode::Travel(Point::new(30.0, 0.0, 1.2))));
    }

    const TWO_LAYERS: &str = "\
G0 X0 Y0 Z0.3
M3
G1 X10
M5
G0 Z0.9
G0 X0 Z0.6
M3
G1 X10
M5
";

    #[test]
    fn layers_are_rescaled() {
        let config = TranslationConfig {
            min_distance: 0.0,
            ..TranslationConfig::for_mode(Mode::Metal)
        };
        let out = run(TWO_LAYERS, &config);
        let targets: Vec<Point> = out.iter().filter_map(|i| i.target()).collect();

        // The hop keeps its 0.6 clearance above the first layer
        let expected = [(0.0, 1.2), (10.0, 1.2), (10.0, 1.8), (0.0, 2.2), (10.0, 2.2)];
        assert_eq!(targets.len(), expected.len());
        for (target, (x, z)) in targets.iter().zip(expected) {
            assert_eq!(target.x, x);
            assert!((target.z - z).abs() < 1e-9, "{:?} != z {}", target, z);
        }
    }

    #[test]
    fn weld_passes_are_flat() {
        let config = TranslationConfig {
            min_distance: 0.0,
            ..TranslationConfig::for_mode(Mode::Metal)
        };
        let out = run(TWO_LAYERS, &config);

        // Each arc starts at the height of the pass it welds
        let mut arc_z = None;
        let mut checked = 0;
        for (idx, instruction) in out.iter().enumerate() {
            match instruction.opcode {
                Opcode::ArcStart => {
                    arc_z = out[..idx].iter().rev().find_map(Instruction::target).map(|p| p.z);
                }
                Opcode::Weld(p) => {
                    let z = arc_z.expect("weld inside an arc");
                    assert!((p.z - z).abs() < 1e-9, "weld at {} started at {}", p.z, z);
                    checked += 1;
                }
                _ => {}
            }
        }
        assert_eq!(checked, 2);
    }

    #[test]
    fn travel_before_any_run_keeps_source_height() {
        let config = TranslationConfig {
            min_distance: 0.0,
            ..TranslationConfig::for_mode(Mode::Metal)
        };
        let out = run("G0 X0 Y0 Z5\nG0 X1 Z0.3\nM3\nG1 X10\nM5\n", &config);
        let targets: Vec<Point> = out.iter().filter_map(|i| i.target()).collect();

        assert_eq!(targets[0].z, 5.0);
        assert_eq!(targets[1].z, 1.2);
        assert_eq!(targets[2].z, 1.2);
    }
}
