//! Sequential line reader.
//!
//! The parser never peeks: every line it reads is committed, and lookahead is
//! done by consuming a line and branching on its content.

use std::io::{BufRead, Lines};

use crate::ParseError;

/// One physical line of input with its 1-based number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

/// Yields numbered lines until the reader is exhausted, then `None` forever.
pub struct Scanner<R> {
    lines: Lines<R>,
    line_number: usize,
    exhausted: bool,
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            exhausted: false,
        }
    }

    pub fn next_line(&mut self) -> Result<Option<Line>, ParseError> {
        if self.exhausted {
            return Ok(None);
        }

        match self.lines.next() {
            Some(Ok(text)) => {
                self.line_number += 1;
                Ok(Some(Line {
                    number: self.line_number,
                    text,
                }))
            }
            Some(Err(source)) => {
                self.exhausted = true;
                Err(ParseError::Io {
                    line: self.line_number + 1,
                    source,
                })
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Number of the last line returned, 0 before the first call.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
