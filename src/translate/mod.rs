//! Mode translation
//!
//! One pipeline serves every mode: commands go through the tool state
//! tracker and the path simplifier, and each retained point becomes a motion
//! instruction. What differs per mode lives behind [`ModePolicy`]: how the
//! tool signal behaves, what opens and closes an active run, where a point is
//! placed and which opcode moves to it.
//!
//! A retained point is emitted only once its successor is known, so a
//! policy can place the approach to a run from the run itself. Pass-through
//! text waits in a queue and is written in source-line order between motions.

pub mod fdm;
pub mod laser;
pub mod metal;

pub use fdm::FdmPolicy;
pub use laser::LaserCutPolicy;
pub use metal::MetalPolicy;

use std::collections::VecDeque;

use crate::config::{Axis, Mode, TranslationConfig};
use crate::core::{PathSimplifier, Point, SignalKind, SimplifiedPoint, ToolStateTracker};
use crate::error::TranslateError;
use crate::parser::{Command, CommandKind};
use crate::program::{Instruction, Opcode, Origin};

/// Codes that move the machine along something other than a straight line,
/// or reinterpret coordinates, and have no linear fallback.
pub const NO_LINEAR_FALLBACK: &[&str] = &[
    "G2", "G3", "G5", "G20", "G81", "G82", "G83", "G84", "G85", "G86", "G87", "G88", "G89",
];

/// Whether a parsed code can never be translated
pub fn lacks_linear_fallback(code: &str) -> bool {
    NO_LINEAR_FALLBACK.contains(&code)
}

/// Tool activation boundaries seen by a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEvent {
    /// The point is the first active motion of a run
    RunStart,
    /// The point continues an active run
    Hold,
    /// The previous point was the last active motion of a run
    RunEnd,
}

/// Per-mode behavior plugged into [`Translator`]
pub trait ModePolicy {
    fn mode(&self) -> Mode;

    /// How the tracker should treat the tool signal
    fn signal_kind(&self) -> SignalKind;

    /// Whether `M3`/`M4`/`M5` mean anything in this mode
    fn maps_tool_commands(&self) -> bool {
        true
    }

    /// Instructions for a tool boundary. `RunStart` and `Hold` are called
    /// just before the motion to `point`; `RunEnd` right after the last
    /// active motion.
    fn map_tool_event(
        &mut self,
        _event: ToolEvent,
        _point: &SimplifiedPoint,
        _out: &mut Vec<Instruction>,
    ) {
    }

    /// Where to move for `point`, given the source position of the previous
    /// retained point and the retained point after it
    fn place(
        &mut self,
        point: &SimplifiedPoint,
        _previous: Option<Point>,
        _next: Option<&SimplifiedPoint>,
    ) -> Point {
        point.position()
    }

    /// The motion opcode for `point`
    fn motion(&self, point: &SimplifiedPoint, target: Point) -> Opcode;

    /// Speed for the motion to `point` (mm/s)
    fn speed(&self, point: &SimplifiedPoint) -> f64 {
        point.waypoint.feed / 60.0
    }

    /// Final pass over the complete instruction list
    fn finish(&mut self, _instructions: &mut Vec<Instruction>) {}
}

/// Stateful translation of one command stream
pub struct Translator<'a, P: ModePolicy> {
    policy: P,
    config: &'a TranslationConfig,
    tracker: ToolStateTracker,
    simplifier: PathSimplifier,
    instructions: Vec<Instruction>,
    /// Retained point waiting for its successor
    held: Option<SimplifiedPoint>,
    /// Pass-through text with its source line
    notes: VecDeque<(usize, Instruction)>,
    in_run: bool,
    speed: Option<f64>,
    last: Option<SimplifiedPoint>,
}

impl<'a, P: ModePolicy> Translator<'a, P> {
    pub fn new(policy: P, config: &'a TranslationConfig) -> Self {
        let tracker = ToolStateTracker::new(policy.signal_kind());
        Self {
            policy,
            config,
            tracker,
            simplifier: PathSimplifier::new(config.min_distance),
            instructions: Vec::new(),
            held: None,
            notes: VecDeque::new(),
            in_run: false,
            speed: None,
            last: None,
        }
    }

    /// Consume one command
    pub fn feed(&mut self, command: &Command) -> Result<(), TranslateError> {
        match &command.kind {
            CommandKind::Comment(text) => {
                self.notes
                    .push_back((command.line, Instruction::comment(text.as_str())));
                return Ok(());
            }
            CommandKind::Unknown { code } if lacks_linear_fallback(code) => {
                return Err(self.unsupported(command, code));
            }
            CommandKind::Unknown { .. } => {
                self.notes
                    .push_back((command.line, Instruction::comment(command.text.as_str())));
                return Ok(());
            }
            CommandKind::ToolOn | CommandKind::ToolOff if !self.policy.maps_tool_commands() => {
                let code = command.code().unwrap_or_default();
                return Err(self.unsupported(command, &code));
            }
            _ => {}
        }

        let transition = self.tracker.apply(command);
        if let Some(waypoint) = transition.waypoint(command) {
            for point in self.simplifier.push(waypoint) {
                if let Some(held) = self.held.replace(point) {
                    self.emit(held, Some(&point));
                }
            }
        }
        Ok(())
    }

    /// Close any open run and return the program body
    pub fn finish(mut self) -> Vec<Instruction> {
        if let Some(held) = self.held.take() {
            self.emit(held, None);
        }
        if let Some(last) = self.last.filter(|_| self.in_run) {
            self.end_run(last);
        }
        self.flush_notes(usize::MAX);
        self.policy.finish(&mut self.instructions);

        if self.config.inverted {
            invert(&mut self.instructions, self.config.invert_axis);
        }

        log::debug!(
            "{} mode: {} instructions, {} waypoints merged",
            self.policy.mode(),
            self.instructions.len(),
            self.simplifier.dropped()
        );
        self.instructions
    }

    fn emit(&mut self, point: SimplifiedPoint, next: Option<&SimplifiedPoint>) {
        let active = point.tool_active();

        if let Some(last) = self.last.filter(|_| self.in_run && !active) {
            self.end_run(last);
        }
        self.flush_notes(point.line());

        let previous = self.last.map(|last| last.position());
        let target = self.policy.place(&point, previous, next);
        self.last = Some(point);

        let mark = self.instructions.len();
        let speed = self.policy.speed(&point);
        if self.speed != Some(speed) {
            self.instructions.push(Instruction::new(Opcode::Speed(speed)));
            self.speed = Some(speed);
        }

        if active {
            let event = if self.in_run {
                ToolEvent::Hold
            } else {
                ToolEvent::RunStart
            };
            self.policy
                .map_tool_event(event, &point, &mut self.instructions);
            self.in_run = true;
        }

        self.instructions
            .push(Instruction::new(self.policy.motion(&point, target)));
        self.stamp(mark, &point);
    }

    /// Close the run whose last active motion went to `last`
    fn end_run(&mut self, last: SimplifiedPoint) {
        let mark = self.instructions.len();
        self.policy
            .map_tool_event(ToolEvent::RunEnd, &last, &mut self.instructions);
        self.stamp(mark, &last);
        self.in_run = false;
    }

    /// Attribute everything emitted since `mark` to `point`
    fn stamp(&mut self, mark: usize, point: &SimplifiedPoint) {
        let origin = Origin {
            line: point.line(),
            tool: point.waypoint.tool,
            tool_active: point.tool_active(),
            merged: point.merged,
        };
        for instruction in &mut self.instructions[mark..] {
            if instruction.origin.is_none() {
                instruction.origin = Some(origin);
            }
        }
    }

    /// Write out queued text from lines before `line`
    fn flush_notes(&mut self, line: usize) {
        while self.notes.front().is_some_and(|(from, _)| *from < line) {
            if let Some((_, note)) = self.notes.pop_front() {
                self.instructions.push(note);
            }
        }
    }

    fn unsupported(&self, command: &Command, code: &str) -> TranslateError {
        TranslateError::UnsupportedCommand {
            line: command.line,
            code: code.to_string(),
            mode: self.policy.mode(),
        }
    }
}

/// Flip the sign of one axis on every motion target
pub fn invert(instructions: &mut [Instruction], axis: Axis) {
    for target in instructions.iter_mut().filter_map(Instruction::target_mut) {
        match axis {
            Axis::X => target.x = -target.x,
            Axis::Y => target.y = -target.y,
            Axis::Z => target.z = -target.z,
        }
    }
}

/// Translate a complete command sequence with the policy for `config.mode`.
///
/// Fails on the first command the mode cannot map; no partial program is
/// returned.
pub fn translate<I>(commands: I, config: &TranslationConfig) -> Result<Vec<Instruction>, TranslateError>
where
    I: IntoIterator<Item = Command>,
{
    try_translate(commands.into_iter().map(Ok), config)
}

/// Like [`translate`], for sources that can fail midway
pub fn try_translate<I>(
    commands: I,
    config: &TranslationConfig,
) -> Result<Vec<Instruction>, TranslateError>
where
    I: IntoIterator<Item = Result<Command, TranslateError>>,
{
    config.validate()?;

    match config.mode {
        Mode::Fdm => run(FdmPolicy::new(config), config, commands),
        Mode::Metal => run(MetalPolicy::new(config), config, commands),
        Mode::LaserCut => run(LaserCutPolicy::new(config), config, commands),
    }
}

fn run<P, I>(policy: P, config: &TranslationConfig, commands: I) -> Result<Vec<Instruction>, TranslateError>
where
    P: ModePolicy,
    I: IntoIterator<Item = Result<Command, TranslateError>>,
{
    let mut translator = Translator::new(policy, config);
    for command in commands {
        translator.feed(&command?)?;
    }
    Ok(translator.finish())
}
