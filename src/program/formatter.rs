//! Kawasaki AS program text
//!
//! ```text
//! .PROGRAM part()
//! 	HERE origin
//! 	SPEED 30.000 MM/S ALWAYS
//! 	LMOVE SHIFT(origin BY 10.000, 0.000, 1.000)
//! .END
//! ```
//!
//! Every position is a shift of the pose recorded when the program starts.

use std::fmt::Write;

use crate::program::instruction::{Instruction, Opcode};

/// Pose variable all motions are relative to
pub const ORIGIN: &str = "origin";
/// Output signal wired to the welding power source
pub const ARC_SIGNAL: i32 = 1;
/// Output signal gating the laser
pub const LASER_SIGNAL: i32 = 2;
/// Variable read by the laser controller for its power level
pub const POWER_VARIABLE: &str = "lpower";

const MAX_NAME_LEN: usize = 15;

/// Serializes instructions into AS program text
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramFormatter {
    verbose: bool,
}

impl ProgramFormatter {
    /// `verbose` adds a trailing annotation to every instruction that knows
    /// its source line
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn format(&self, instructions: &[Instruction], name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, ".PROGRAM {}()", program_name(name));
        let _ = writeln!(out, "\tHERE {}", ORIGIN);

        for instruction in instructions {
            out.push('\t');
            out.push_str(&self.render(instruction));
            out.push('\n');
        }

        out.push_str(".END\n");
        out
    }

    fn render(&self, instruction: &Instruction) -> String {
        let mut line = match &instruction.opcode {
            Opcode::Speed(speed) => format!("SPEED {} MM/S ALWAYS", number(*speed)),
            Opcode::Travel(p) => format!(
                "JMOVE SHIFT({} BY {}, {}, {})",
                ORIGIN,
                number(p.x),
                number(p.y),
                number(p.z)
            ),
            Opcode::Deposit(p) | Opcode::Weld(p) | Opcode::Cut(p) => format!(
                "LMOVE SHIFT({} BY {}, {}, {})",
                ORIGIN,
                number(p.x),
                number(p.y),
                number(p.z)
            ),
            Opcode::ArcStart => format!("SIGNAL {}", ARC_SIGNAL),
            Opcode::ArcStop => format!("SIGNAL {}", -ARC_SIGNAL),
            Opcode::LaserPower(power) => format!("{} = {}", POWER_VARIABLE, number(*power)),
            Opcode::LaserOn => format!("SIGNAL {}", LASER_SIGNAL),
            Opcode::LaserOff => format!("SIGNAL {}", -LASER_SIGNAL),
            Opcode::Comment(text) => return format!("; {}", text),
        };

        if self.verbose {
            if let Some(origin) = instruction.origin {
                let _ = write!(line, " ; line {} {}", origin.line, origin.tool);
                if origin.merged > 0 {
                    let _ = write!(line, " merged={}", origin.merged);
                }
            }
        }

        line
    }
}

/// Format a whole program
pub fn format_program(instructions: &[Instruction], name: &str, verbose: bool) -> String {
    ProgramFormatter::new(verbose).format(instructions, name)
}

/// Make a file stem usable as an AS program name
pub fn program_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, 'p');
    }
    name.truncate(MAX_NAME_LEN);
    name
}

/// Three decimals, never "-0.000"
fn number(value: f64) -> String {
    let value = if value.abs() < 0.0005 { 0.0 } else { value };
    format!("{:.3}", value)
}
