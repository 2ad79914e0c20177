/// Story markdown parser — line classification and the unit-building
/// state machine.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::schema::intent_unit::{
    IntentUnit, BLANK_LINE, COMMENT_MARKER, INTENT_MARKER, RESPONSE_MARKER, TITLE_MARKER,
};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("story '{title}' closed at line {line} without an intent line")]
    MissingIntent { title: String, line: usize },
}

/// What a single markdown line does to the parser state.
///
/// Checks run in a fixed order and the first match wins, because the
/// markers are substrings and a line may contain several of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Comments and lines carrying no marker.
    Skip,
    /// `## ` anywhere in the line.
    StartUnit,
    /// `* ` anywhere in the line.
    Intent,
    /// ` - ` anywhere in the line.
    Response,
    /// A line that is exactly `\n`.
    Finalize,
}

/// Classify one raw line (line terminator included).
pub fn classify(line: &str) -> LineKind {
    if line.starts_with(COMMENT_MARKER) {
        LineKind::Skip
    } else if line.contains(TITLE_MARKER) {
        LineKind::StartUnit
    } else if line.contains(INTENT_MARKER) {
        LineKind::Intent
    } else if line.contains(RESPONSE_MARKER) {
        LineKind::Response
    } else if line == BLANK_LINE {
        LineKind::Finalize
    } else {
        LineKind::Skip
    }
}

/// Incremental builder state: at most one open unit plus everything
/// finalized so far.
#[derive(Debug, Default)]
pub struct ParserState {
    current: Option<IntentUnit>,
    title: String,
    line: usize,
    units: Vec<IntentUnit>,
}

impl ParserState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one classified line.
    pub fn apply(&mut self, kind: LineKind, line: &str) -> Result<(), ParseError> {
        self.line += 1;
        match kind {
            LineKind::Skip => {}
            LineKind::StartUnit => {
                if self.current.is_some() {
                    // A title without a separating blank line replaces the
                    // open unit.
                    warn!(line = self.line, title = %self.title, "story replaced before it was closed");
                }
                self.title = line.trim_end().to_string();
                self.current = Some(IntentUnit::new());
            }
            LineKind::Intent => match self.current.as_mut() {
                Some(unit) => {
                    debug!(line = self.line, intent = line.trim_end(), "intent");
                    unit.intent = line.to_string();
                }
                None => warn!(line = self.line, "intent line outside a story, ignored"),
            },
            LineKind::Response => match self.current.as_mut() {
                Some(unit) => unit.responses.push(line.to_string()),
                None => warn!(line = self.line, "response line outside a story, ignored"),
            },
            LineKind::Finalize => {
                if let Some(unit) = self.current.take() {
                    if unit.intent.is_empty() {
                        return Err(ParseError::MissingIntent {
                            title: std::mem::take(&mut self.title),
                            line: self.line,
                        });
                    }
                    self.units.push(unit);
                }
            }
        }
        Ok(())
    }

    /// Consume the state. A unit still open here never saw its closing
    /// blank line and is dropped.
    pub fn finish(self) -> Vec<IntentUnit> {
        if self.current.is_some() {
            warn!(title = %self.title, "story not closed by a blank line at end of input, dropped");
        }
        self.units
    }
}

/// Parses story markdown into intent units, in file order.
pub struct StoryParser;

impl StoryParser {
    /// Parse a seed file.
    pub fn parse(path: &Path) -> Result<Vec<IntentUnit>, ParseError> {
        let file = File::open(path)?;
        let units = Self::parse_reader(BufReader::new(file))?;
        info!(path = %path.display(), units = units.len(), "parsed stories");
        Ok(units)
    }

    /// Parse story markdown held in memory.
    pub fn parse_str(input: &str) -> Result<Vec<IntentUnit>, ParseError> {
        Self::parse_reader(input.as_bytes())
    }

    /// Parse story markdown from any buffered reader. Lines keep their
    /// terminators; `\r\n` is read as `\n`.
    pub fn parse_reader<R: BufRead>(mut reader: R) -> Result<Vec<IntentUnit>, ParseError> {
        let mut state = ParserState::new();
        let mut buf = String::new();

        loop {
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                break;
            }
            if buf.ends_with("\r\n") {
                buf.truncate(buf.len() - 2);
                buf.push('\n');
            }
            state.apply(classify(&buf), &buf)?;
        }

        Ok(state.finish())
    }
}
