//! Output program model and its text form

pub mod formatter;
pub mod instruction;

pub use formatter::{format_program, program_name, ProgramFormatter};
pub use instruction::{Instruction, Opcode, Origin};
