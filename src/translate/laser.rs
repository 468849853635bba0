//! Laser cutting
//!
//! The beam is a plain on/off gate around each active run, with its power
//! written to the controller variable before it is switched on. Cut
//! coordinates are shifted by half the kerf to the left of the direction of
//! travel, and the approach to a cut lands on the shifted line, so each cut
//! segment runs parallel to its source.

use crate::config::{Mode, TranslationConfig};
use crate::core::{Point, SignalKind, SimplifiedPoint, ToolSignal};
use crate::program::{Instruction, Opcode};
use crate::translate::{ModePolicy, ToolEvent};

/// Power used when the source never sets `S`
pub const DEFAULT_POWER: f64 = 100.0;

const EPSILON: f64 = 1e-9;
/// Below this `1 + cos` between two cut directions the corner is too sharp
/// to miter and keeps the incoming offset
const MITER_LIMIT: f64 = 0.5;

type Normal = (f64, f64);

#[derive(Debug, Clone)]
pub struct LaserCutPolicy {
    /// Half the kerf width
    offset: f64,
    /// Unit left normal of the last cut segment
    normal: Option<(f64, f64)>,
    /// Last power written out
    power: Option<f64>,
}

impl LaserCutPolicy {
    pub fn new(config: &TranslationConfig) -> Self {
        Self {
            offset: config.line_width / 2.0,
            normal: None,
            power: None,
        }
    }

    fn kerf(
        &mut self,
        point: &SimplifiedPoint,
        previous: Option<Point>,
        next: Option<&SimplifiedPoint>,
    ) -> Point {
        let target = point.position();
        let outgoing = next
            .filter(|next| next.tool_active())
            .and_then(|next| left_normal(target, next.position()));

        if !point.tool_active() {
            // Approach to a cut, or plain travel when `outgoing` is None
            self.normal = outgoing;
            return self.shift(target, outgoing);
        }

        if let Some(incoming) = previous.and_then(|previous| left_normal(previous, target)) {
            self.normal = Some(incoming);
        }
        let normal = match (self.normal, outgoing) {
            (Some(incoming), Some(outgoing)) => Some(miter(incoming, outgoing)),
            (incoming, outgoing) => incoming.or(outgoing),
        };
        self.shift(target, normal)
    }

    fn shift(&self, target: Point, normal: Option<Normal>) -> Point {
        match normal {
            Some((nx, ny)) => Point::new(
                target.x + nx * self.offset,
                target.y + ny * self.offset,
                target.z,
            ),
            None => target,
        }
    }
}

/// Unit normal to the left of `from -> to` in the XY plane
fn left_normal(from: Point, to: Point) -> Option<Normal> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let length = dx.hypot(dy);
    (length > EPSILON).then(|| (-dy / length, dx / length))
}

/// Offset direction at a corner, scaled so both offset lines meet there
fn miter(incoming: Normal, outgoing: Normal) -> Normal {
    let cos = incoming.0 * outgoing.0 + incoming.1 * outgoing.1;
    if 1.0 + cos < MITER_LIMIT {
        return incoming;
    }
    (
        (incoming.0 + outgoing.0) / (1.0 + cos),
        (incoming.1 + outgoing.1) / (1.0 + cos),
    )
}

fn power_of(point: &SimplifiedPoint) -> f64 {
    match point.waypoint.tool {
        ToolSignal::Edge {
            power: Some(power), ..
        } => power,
        _ => DEFAULT_POWER,
    }
}

impl ModePolicy for LaserCutPolicy {
    fn mode(&self) -> Mode {
        Mode::LaserCut
    }

    fn signal_kind(&self) -> SignalKind {
        SignalKind::Edge
    }

    fn map_tool_event(&mut self, event: ToolEvent, point: &SimplifiedPoint, out: &mut Vec<Instruction>) {
        if event == ToolEvent::RunEnd {
            out.push(Instruction::new(Opcode::LaserOff));
            return;
        }

        let power = power_of(point);
        if self.power != Some(power) {
            out.push(Instruction::new(Opcode::LaserPower(power)));
            self.power = Some(power);
        }
        if event == ToolEvent::RunStart {
            out.push(Instruction::new(Opcode::LaserOn));
        }
    }

    fn place(
        &mut self,
        point: &SimplifiedPoint,
        previous: Option<Point>,
        next: Option<&SimplifiedPoint>,
    ) -> Point {
        self.kerf(point, previous, next)
    }

    fn motion(&self, point: &SimplifiedPoint, target: Point) -> Opcode {
        if point.tool_active() {
            Opcode::Cut(target)
        } else {
            Opcode::Travel(target)
        }
    }
}
