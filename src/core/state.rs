//! Machine state tracking
//!
//! [`ToolStateTracker`] folds commands into a [`MachineState`]. It knows
//! nothing about modes: the only mode-dependent input is the [`SignalKind`]
//! that decides how the tool signal behaves.

use std::fmt;

use crate::parser::{Command, CommandKind, Words};

/// Feed rate assumed until the source sets one (mm/min)
pub const DEFAULT_FEED: f64 = 1800.0;

/// A position in machine coordinates (mm)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance
    pub fn distance(&self, other: &Point) -> f64 {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance in the XY plane
    pub fn planar_distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// How the tool signal evolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Extrusion accumulates; a move deposits when its delta is positive
    Continuous,
    /// A latched on/off flag with an optional power level
    Edge,
}

/// Tool activation value carried by the state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolSignal {
    Level { extruded: f64 },
    Edge { on: bool, power: Option<f64> },
}

impl ToolSignal {
    pub fn new(kind: SignalKind) -> Self {
        match kind {
            SignalKind::Continuous => ToolSignal::Level { extruded: 0.0 },
            SignalKind::Edge => ToolSignal::Edge {
                on: false,
                power: None,
            },
        }
    }

    /// Whether a move with extrusion delta `delta_e` carries the tool
    fn carries(&self, delta_e: f64) -> bool {
        match *self {
            ToolSignal::Level { .. } => delta_e > 0.0,
            ToolSignal::Edge { on, power } => {
                (on && power.is_none_or(|p| p > 0.0)) || delta_e > 0.0
            }
        }
    }
}

impl fmt::Display for ToolSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ToolSignal::Level { extruded } => write!(f, "e={:.3}", extruded),
            ToolSignal::Edge { on, power } => {
                write!(f, "tool={}", if on { "on" } else { "off" })?;
                if let Some(power) = power {
                    write!(f, " s={}", power)?;
                }
                Ok(())
            }
        }
    }
}

/// Cumulative machine state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineState {
    pub position: Point,
    /// mm/min
    pub feed: f64,
    pub tool: ToolSignal,
    /// Whether the last motion carried the tool
    pub tool_active: bool,
    pub absolute_positioning: bool,
    pub absolute_extrusion: bool,
    /// Raw E value that the next absolute E word is measured against
    pub e_reference: f64,
    /// False until a motion names an axis; the pose before that is unknown
    pub positioned: bool,
}

impl MachineState {
    pub fn new(kind: SignalKind) -> Self {
        Self {
            position: Point::default(),
            feed: DEFAULT_FEED,
            tool: ToolSignal::new(kind),
            tool_active: false,
            absolute_positioning: true,
            absolute_extrusion: true,
            e_reference: 0.0,
            positioned: false,
        }
    }
}

/// State before and after one command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub before: MachineState,
    pub after: MachineState,
    /// Extrusion delta of this command
    pub extruded: f64,
}

impl Transition {
    pub fn moved(&self) -> bool {
        self.before.position != self.after.position
    }

    /// The waypoint reached by a motion command, if it actually moved.
    /// The first positioning move always counts.
    pub fn waypoint(&self, command: &Command) -> Option<Waypoint> {
        let first = !self.before.positioned && command.words.has_axis();
        if !command.is_motion() || !(self.moved() || first) {
            return None;
        }

        Some(Waypoint {
            line: command.line,
            position: self.after.position,
            feed: self.after.feed,
            rapid: command.kind == CommandKind::RapidMove,
            tool_active: self.after.tool_active,
            tool: self.after.tool,
        })
    }
}

/// A position reached by a motion, with the tool state of that motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub line: usize,
    pub position: Point,
    /// mm/min
    pub feed: f64,
    pub rapid: bool,
    /// Whether the move *to* this point carried the tool
    pub tool_active: bool,
    pub tool: ToolSignal,
}

/// Applies commands to a [`MachineState`]
#[derive(Debug, Clone)]
pub struct ToolStateTracker {
    state: MachineState,
}

impl ToolStateTracker {
    pub fn new(kind: SignalKind) -> Self {
        Self {
            state: MachineState::new(kind),
        }
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Apply one command and return the states around it
    pub fn apply(&mut self, command: &Command) -> Transition {
        let before = self.state;
        let words = &command.words;
        let mut delta_e = 0.0;

        match &command.kind {
            CommandKind::RapidMove | CommandKind::LinearMove => {
                self.state.position = self.target(words);
                self.state.positioned |= words.has_axis();
                if let Some(feed) = words.f.filter(|f| *f > 0.0) {
                    self.state.feed = feed;
                }
                if let Some(e) = words.e {
                    delta_e = self.extrusion_delta(e);
                }
                if let Some(power) = words.s {
                    self.set_power(power);
                }

                let moved = self.state.position != before.position;
                let rapid = command.kind == CommandKind::RapidMove;
                self.state.tool_active = moved && !rapid && self.state.tool.carries(delta_e);

                if let ToolSignal::Level { extruded } = &mut self.state.tool {
                    *extruded += delta_e;
                }
            }
            CommandKind::SetPosition => self.set_position(words),
            CommandKind::Positioning { absolute } => {
                self.state.absolute_positioning = *absolute;
            }
            CommandKind::ExtrusionMode { absolute } => {
                self.state.absolute_extrusion = *absolute;
            }
            CommandKind::ToolOn => {
                if let ToolSignal::Edge { on, power } = &mut self.state.tool {
                    *on = true;
                    if let Some(s) = words.s {
                        *power = Some(s);
                    }
                }
            }
            CommandKind::ToolOff => {
                if let ToolSignal::Edge { on, .. } = &mut self.state.tool {
                    *on = false;
                }
            }
            CommandKind::Comment(_) | CommandKind::Unknown { .. } => {}
        }

        Transition {
            before,
            after: self.state,
            extruded: delta_e,
        }
    }

    fn target(&self, words: &Words) -> Point {
        let current = self.state.position;
        let resolve = |word: Option<f64>, current: f64| match word {
            Some(value) if self.state.absolute_positioning => value,
            Some(offset) => current + offset,
            None => current,
        };

        Point {
            x: resolve(words.x, current.x),
            y: resolve(words.y, current.y),
            z: resolve(words.z, current.z),
        }
    }

    fn extrusion_delta(&mut self, e: f64) -> f64 {
        if self.state.absolute_extrusion {
            let delta = e - self.state.e_reference;
            self.state.e_reference = e;
            delta
        } else {
            e
        }
    }

    fn set_power(&mut self, s: f64) {
        if let ToolSignal::Edge { power, .. } = &mut self.state.tool {
            *power = Some(s);
        }
    }

    /// `G92`: overwrite exactly the given axes; a bare `G92` zeroes them all
    fn set_position(&mut self, words: &Words) {
        let state = &mut self.state;
        if !words.has_axis() && words.e.is_none() {
            state.position = Point::default();
            state.e_reference = 0.0;
            return;
        }

        if let Some(x) = words.x {
            state.position.x = x;
        }
        if let Some(y) = words.y {
            state.position.y = y;
        }
        if let Some(z) = words.z {
            state.position.z = z;
        }
        if let Some(e) = words.e {
            state.e_reference = e;
        }
    }
}
