//! Front-matter extraction.
//!
//! A document may open with a YAML block fenced by two `---` lines:
//!
//! ```text
//! ---
//! title: Getting started
//! components: true
//! ---
//! # Getting started
//! ```
//!
//! Blank lines before the opening fence are ignored. Any other line before it
//! means the document has no front matter and everything is body. Once the
//! body starts, a `---` line is plain content (a thematic break in markdown).
//!
//! Body lines keep their original terminators so they can be scanned or written
//! back byte for byte.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// The line that opens and closes a front-matter block.
pub const SEPARATOR: &str = "---";

#[derive(Error, Debug)]
pub enum MetadataDecodeError {
    #[error("invalid YAML in front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter opened with `---` but never closed")]
    Unterminated,
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Decoded front matter of a document.
#[derive(Debug)]
pub enum Metadata {
    /// The document has no front-matter block.
    Absent,
    /// The block decoded cleanly. Usually a mapping, but YAML allows any value.
    Decoded(Value),
    /// The block is present but could not be decoded.
    Invalid(MetadataDecodeError),
}

impl Metadata {
    /// The decoded mapping, if the block decoded to one.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Metadata::Decoded(Value::Mapping(map)) => Some(map),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Metadata::Invalid(_))
    }
}

/// A document split into front matter and body.
#[derive(Debug)]
pub struct Document {
    pub metadata: Metadata,
    pub body: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unset,
    InFrontMatter,
    InBody,
}

/// Split raw document text into lines, keeping each line's terminator.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Strip any trailing `\r` and `\n` characters.
fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Parse a document given its raw lines (terminators included).
pub fn parse<S: AsRef<str>>(lines: &[S]) -> Document {
    let mut state = State::Unset;
    let mut yaml_lines: Vec<&str> = Vec::new();
    let mut body: Vec<String> = Vec::new();
    let mut saw_front_matter = false;

    for raw in lines {
        let raw = raw.as_ref();
        let line = strip_terminator(raw);
        match state {
            State::Unset => {
                if line == SEPARATOR {
                    state = State::InFrontMatter;
                    saw_front_matter = true;
                } else if !line.trim().is_empty() {
                    state = State::InBody;
                    body.push(raw.to_string());
                }
            }
            State::InFrontMatter => {
                if line == SEPARATOR {
                    state = State::InBody;
                } else {
                    yaml_lines.push(line);
                }
            }
            State::InBody => body.push(raw.to_string()),
        }
    }

    if !saw_front_matter {
        return Document {
            metadata: Metadata::Absent,
            body: lines.iter().map(|l| l.as_ref().to_string()).collect(),
        };
    }

    // The block swallowed the whole document. Hand the lines back as body so
    // marker detection still sees them.
    if state == State::InFrontMatter {
        return Document {
            metadata: Metadata::Invalid(MetadataDecodeError::Unterminated),
            body: lines.iter().map(|l| l.as_ref().to_string()).collect(),
        };
    }

    let metadata = match decode(&yaml_lines.join("\n")) {
        Ok(value) => Metadata::Decoded(value),
        Err(e) => Metadata::Invalid(e),
    };
    Document { metadata, body }
}

/// Parse a whole document from its text.
pub fn parse_str(text: &str) -> Document {
    parse(&split_lines(text))
}

/// Parse a document read straight from disk.
///
/// Text that is not UTF-8 still yields a body (with invalid sequences
/// replaced) so marker detection can run, but the metadata is reported as
/// undecodable.
pub fn parse_bytes(bytes: &[u8]) -> Document {
    match std::str::from_utf8(bytes) {
        Ok(text) => parse_str(text),
        Err(e) => Document {
            metadata: Metadata::Invalid(MetadataDecodeError::Utf8(e)),
            ..parse_str(&String::from_utf8_lossy(bytes))
        },
    }
}

fn decode(block: &str) -> Result<Value, MetadataDecodeError> {
    if block.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml::from_str(block)?)
}
