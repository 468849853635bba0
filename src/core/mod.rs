//! Translation core
//!
//! Machine state tracking and path simplification, shared by every mode.

pub mod simplify;
pub mod state;

pub use simplify::{simplify, PathSimplifier, SimplifiedPoint};
pub use state::{
    MachineState, Point, SignalKind, ToolSignal, ToolStateTracker, Transition, Waypoint,
};
