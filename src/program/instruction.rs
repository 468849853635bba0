//! Target-dialect instructions
//!
//! An [`Instruction`] is one line of the generated program. Translators build
//! them; the formatter only decides how they look.

use crate::core::{Point, ToolSignal};

/// What an instruction does
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    /// Set the motion speed (mm/s)
    Speed(f64),
    /// Move without the tool
    Travel(Point),
    /// FDM move that deposits material
    Deposit(Point),
    /// Metal move inside an active weld run
    Weld(Point),
    /// LaserCut move with the beam on
    Cut(Point),
    ArcStart,
    ArcStop,
    /// Laser power level, set before the beam turns on
    LaserPower(f64),
    LaserOn,
    LaserOff,
    /// Pass-through text
    Comment(String),
}

/// Where an instruction came from, for verbose annotations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Origin {
    /// Source line number
    pub line: usize,
    pub tool: ToolSignal,
    pub tool_active: bool,
    /// Source waypoints merged into this one
    pub merged: usize,
}

/// One output instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub origin: Option<Origin>,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::new(Opcode::Comment(text.into()))
    }

    /// Target of a motion instruction
    pub fn target(&self) -> Option<Point> {
        match self.opcode {
            Opcode::Travel(p) | Opcode::Deposit(p) | Opcode::Weld(p) | Opcode::Cut(p) => Some(p),
            _ => None,
        }
    }

    pub fn target_mut(&mut self) -> Option<&mut Point> {
        match &mut self.opcode {
            Opcode::Travel(p) | Opcode::Deposit(p) | Opcode::Weld(p) | Opcode::Cut(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_motion(&self) -> bool {
        self.target().is_some()
    }

    /// Source line, when known
    pub fn line(&self) -> Option<usize> {
        self.origin.map(|o| o.line)
    }
}
