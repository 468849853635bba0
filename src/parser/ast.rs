//! Parsed command model
//!
//! Turns the tokens of one line into a [`Command`]. Only the words the
//! translator needs are kept; everything else rides along in `text`.

use std::fmt;

use crate::error::ParseError;
use crate::parser::lexer::{tokenize_line, Token, TokenKind};

/// Axis, extrusion, feed and power words of a command. `None` means the
/// word was absent, so the machine keeps its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Words {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    pub f: Option<f64>,
    pub s: Option<f64>,
}

impl Words {
    /// True when at least one of X, Y or Z is present
    pub fn has_axis(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.z.is_some()
    }
}

/// What a line asks the machine to do
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    /// `G0`
    RapidMove,
    /// `G1`
    LinearMove,
    /// `G92`: redefine the current coordinates without moving
    SetPosition,
    /// `G90` (absolute) / `G91` (relative) axis positioning
    Positioning { absolute: bool },
    /// `M82` (absolute) / `M83` (relative) extrusion
    ExtrusionMode { absolute: bool },
    /// `M3` / `M4`
    ToolOn,
    /// `M5`
    ToolOff,
    /// A line holding only a comment
    Comment(String),
    /// Any other code, kept for pass-through
    Unknown { code: String },
}

/// A parsed G-code statement
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Source line number (1-based)
    pub line: usize,
    pub kind: CommandKind,
    pub words: Words,
    /// Trailing comment without its delimiters
    pub comment: Option<String>,
    /// The statement as written, minus surrounding whitespace
    pub text: String,
}

impl Command {
    /// Normalized opcode, e.g. `G1` or `M104`. Comments have none.
    pub fn code(&self) -> Option<String> {
        let code = match &self.kind {
            CommandKind::RapidMove => "G0",
            CommandKind::LinearMove => "G1",
            CommandKind::SetPosition => "G92",
            CommandKind::Positioning { absolute: true } => "G90",
            CommandKind::Positioning { absolute: false } => "G91",
            CommandKind::ExtrusionMode { absolute: true } => "M82",
            CommandKind::ExtrusionMode { absolute: false } => "M83",
            CommandKind::ToolOn => "M3",
            CommandKind::ToolOff => "M5",
            CommandKind::Comment(_) => return None,
            CommandKind::Unknown { code } => return Some(code.clone()),
        };
        Some(code.to_string())
    }

    pub fn is_motion(&self) -> bool {
        matches!(self.kind, CommandKind::RapidMove | CommandKind::LinearMove)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.text)
    }
}

/// Convert the tokens of one line into a command.
///
/// `modal` is the motion kind used when the line has axis words but no
/// opcode. Returns `Ok(None)` for blank lines.
pub fn tokens_to_command(
    line: usize,
    text: &str,
    tokens: Vec<Token>,
    modal: Option<&CommandKind>,
) -> Result<Option<Command>, ParseError> {
    let command_token = tokens.iter().find(|t| t.kind == TokenKind::Command);
    let classified = command_token
        .map(|token| normalize_code(line, &token.text).map(|code| classify(&code)))
        .transpose()?;
    // Unrecognized codes such as `M117 Layer 1 of 10` carry free text
    let free_text = matches!(classified, Some(CommandKind::Unknown { .. }));

    if !free_text {
        if let Some(stray) = tokens.iter().find(|t| t.kind == TokenKind::Stray) {
            return Err(ParseError::Structure {
                line,
                text: stray.text.clone(),
            });
        }
    }

    let mut comment = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Comment)
        .map(|t| extract_comment_text(&t.text));

    let mut words = Words::default();
    let mut has_parameters = false;
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Parameter) {
        has_parameters = true;
        let (letter, value) = match parse_word(line, &token.text) {
            Ok(word) => word,
            // Flags such as `G28 X Y` and message text
            Err(_) if free_text => continue,
            Err(err) => return Err(err),
        };
        match letter {
            'X' => words.x = Some(value),
            'Y' => words.y = Some(value),
            'Z' => words.z = Some(value),
            'E' => words.e = Some(value),
            'F' => words.f = Some(value),
            'S' => words.s = Some(value),
            _ => {}
        }
    }

    let kind = match classified {
        Some(kind) => kind,
        None if has_parameters => match modal {
            Some(kind) => kind.clone(),
            None => {
                return Err(ParseError::Structure {
                    line,
                    text: text.trim().to_string(),
                });
            }
        },
        // The comment becomes the command itself
        None => match comment.take() {
            Some(body) => CommandKind::Comment(body),
            None => return Ok(None),
        },
    };

    Ok(Some(Command {
        line,
        kind,
        words,
        comment,
        text: text.trim().to_string(),
    }))
}

/// Tokenize and build in one step
pub fn parse_statement(
    line: usize,
    text: &str,
    modal: Option<&CommandKind>,
) -> Result<Option<Command>, ParseError> {
    tokens_to_command(line, text, tokenize_line(text), modal)
}

fn classify(code: &str) -> CommandKind {
    match code {
        "G0" => CommandKind::RapidMove,
        "G1" => CommandKind::LinearMove,
        "G92" => CommandKind::SetPosition,
        "G90" => CommandKind::Positioning { absolute: true },
        "G91" => CommandKind::Positioning { absolute: false },
        "M82" => CommandKind::ExtrusionMode { absolute: true },
        "M83" => CommandKind::ExtrusionMode { absolute: false },
        "M3" | "M4" => CommandKind::ToolOn,
        "M5" => CommandKind::ToolOff,
        _ => CommandKind::Unknown {
            code: code.to_string(),
        },
    }
}

/// `g01` -> `G1`, `G92.1` -> `G92.1`
fn normalize_code(line: usize, text: &str) -> Result<String, ParseError> {
    let (letter, value) = parse_word(line, text)?;
    Ok(format!("{}{}", letter, value))
}

/// Split a word like "X10.5" into its upper-case letter and value
fn parse_word(line: usize, text: &str) -> Result<(char, f64), ParseError> {
    let mut chars = text.chars();
    let malformed = || ParseError::MalformedNumber {
        line,
        token: text.to_string(),
    };

    let letter = chars.next().ok_or_else(malformed)?.to_ascii_uppercase();
    let value = chars
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(malformed)?;

    Ok((letter, value))
}

/// Extract comment text, removing delimiters
fn extract_comment_text(text: &str) -> String {
    if let Some(stripped) = text.strip_prefix(';') {
        stripped.trim().to_string()
    } else if text.starts_with('(') && text.ends_with(')') && text.len() >= 2 {
        text[1..text.len() - 1].trim().to_string()
    } else {
        text.trim_start_matches('(').trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word() {
        assert_eq!(parse_word(1, "X10.5").unwrap(), ('X', 10.5));
        assert_eq!(parse_word(1, "e-0.8").unwrap(), ('E', -0.8));
        assert!(matches!(
            parse_word(7, "X1..2"),
            Err(ParseError::MalformedNumber { line: 7, .. })
        ));
        assert!(parse_word(1, "G").is_err());
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(1, "g01").unwrap(), "G1");
        assert_eq!(normalize_code(1, "M104").unwrap(), "M104");
        assert_eq!(normalize_code(1, "G92.1").unwrap(), "G92.1");
    }

    #[test]
    fn test_extract_comment_text() {
        assert_eq!(extract_comment_text("; this is a comment"), "this is a comment");
        assert_eq!(extract_comment_text("(this is a comment)"), "this is a comment");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("G0"), CommandKind::RapidMove);
        assert_eq!(classify("M4"), CommandKind::ToolOn);
        assert_eq!(
            classify("G2"),
            CommandKind::Unknown {
                code: "G2".to_string()
            }
        );
    }

    #[test]
    fn test_modal_motion_reuses_previous_kind() {
        let cmd = parse_statement(4, "X5 Y6 E0.2", Some(&CommandKind::LinearMove))
            .unwrap()
            .unwrap();
        assert_eq!(cmd.kind, CommandKind::LinearMove);
        assert_eq!(cmd.words.x, Some(5.0));
        assert_eq!(cmd.words.e, Some(0.2));
    }

    #[test]
    fn test_axis_words_without_motion_code() {
        let err = parse_statement(2, "X5 Y6", None).unwrap_err();
        assert!(matches!(err, ParseError::Structure { line: 2, .. }));
    }

    #[test]
    fn test_unknown_codes_keep_free_text() {
        let cmd = parse_statement(4, "M117 Layer 1 of 10", None).unwrap().unwrap();
        assert_eq!(cmd.code().as_deref(), Some("M117"));
        assert_eq!(cmd.text, "M117 Layer 1 of 10");

        let cmd = parse_statement(1, "M862.3 P \"MK3S\" ; printer check", None)
            .unwrap()
            .unwrap();
        assert_eq!(cmd.code().as_deref(), Some("M862.3"));
        assert_eq!(cmd.comment.as_deref(), Some("printer check"));
    }

    #[test]
    fn test_stray_text_on_known_codes_is_rejected() {
        assert!(matches!(
            parse_statement(2, "G1 X10 #5", None),
            Err(ParseError::Structure { line: 2, .. })
        ));
        assert!(matches!(
            parse_statement(3, "M3 S100 \"x\"", None),
            Err(ParseError::Structure { line: 3, .. })
        ));
        assert!(parse_statement(5, "#5=2", None).is_err());
    }

    #[test]
    fn test_bare_letters_on_known_codes_are_malformed() {
        assert!(matches!(
            parse_statement(2, "G1 Xabc", None),
            Err(ParseError::MalformedNumber { line: 2, .. })
        ));
    }

    #[test]
    fn test_bare_letters_are_flags() {
        let cmd = parse_statement(1, "G28 X Y", None).unwrap().unwrap();
        assert_eq!(cmd.code().as_deref(), Some("G28"));
        assert_eq!(cmd.words, Words::default());
    }

    #[test]
    fn test_unknown_code_keeps_text() {
        let cmd = parse_statement(3, "  M104 S200 ; heat", None)
            .unwrap()
            .unwrap();
        assert_eq!(cmd.code().as_deref(), Some("M104"));
        assert_eq!(cmd.text, "M104 S200 ; heat");
        assert_eq!(cmd.comment.as_deref(), Some("heat"));
        assert_eq!(cmd.words.s, Some(200.0));
    }
}
