//! Streaming, line-oriented command reader.
//!
//! Reads one line at a time from any `BufRead`, so large files are never held
//! in memory. Each item is either a command or the parse error for its line;
//! the caller decides whether an error is fatal.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::ParseError;
use crate::parser::ast::{parse_statement, Command, CommandKind};

/// Iterator over the commands of a G-code source
pub struct CommandStream<R: BufRead> {
    reader: R,
    line_no: usize,
    line_buffer: String,
    modal: Option<CommandKind>,
    finished: bool,
}

impl CommandStream<BufReader<File>> {
    /// Open a file. Calling this again restarts from the first line.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<'a> CommandStream<&'a [u8]> {
    /// Parse in-memory text
    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl<R: BufRead> CommandStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            line_buffer: String::new(),
            modal: None,
            finished: false,
        }
    }

    /// Number of lines read so far
    pub fn line_number(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for CommandStream<R> {
    type Item = Result<Command, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.line_buffer.clear();
            match self.reader.read_line(&mut self.line_buffer) {
                Ok(0) => self.finished = true,
                Ok(_) => {
                    self.line_no += 1;
                    let line = self
                        .line_buffer
                        .trim_end_matches('\n')
                        .trim_end_matches('\r');

                    match parse_statement(self.line_no, line, self.modal.as_ref()) {
                        Ok(Some(command)) => {
                            if command.is_motion() {
                                self.modal = Some(command.kind.clone());
                            }
                            return Some(Ok(command));
                        }
                        Ok(None) => continue,
                        Err(err) => return Some(Err(err)),
                    }
                }
                Err(source) => {
                    self.finished = true;
                    return Some(Err(ParseError::Read {
                        line: self.line_no + 1,
                        source,
                    }));
                }
            }
        }

        None
    }
}
