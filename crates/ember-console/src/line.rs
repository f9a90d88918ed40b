//! Input line tokenizer.
//!
//! Splits on runs of whitespace; there is no quoting or escaping, so a
//! literal containing whitespace cannot be passed as one argument. Both
//! bounds are hard: over-long lines and over-long parameter lists are
//! reported to the caller, never truncated.

use ember_types::error::{EmberError, Result};

/// Maximum accepted line length in bytes.
pub const MAX_LINE_LEN: usize = 256;

/// Maximum number of parameters after the command name.
pub const MAX_PARAMS: usize = 48;

/// One tokenized console line. Lives for a single console iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// First token; empty for a blank line.
    pub command: String,
    /// Remaining tokens, left-to-right as typed.
    pub params: Vec<String>,
}

impl ParsedLine {
    /// Whether the line carried no command at all.
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }

    /// Parameters as `&str` slices, the shape handlers take.
    pub fn args(&self) -> Vec<&str> {
        self.params.iter().map(String::as_str).collect()
    }
}

/// Tokenize a raw input line.
///
/// A line of only whitespace (or nothing) yields an empty command and zero
/// params; the console loop treats that as a no-op.
pub fn tokenize(line: &str) -> Result<ParsedLine> {
    if line.len() > MAX_LINE_LEN {
        return Err(EmberError::LineTooLong(MAX_LINE_LEN));
    }
    let mut tokens = line.split_whitespace();
    let command = tokens.next().unwrap_or("").to_string();
    let params: Vec<String> = tokens.map(str::to_string).collect();
    if params.len() > MAX_PARAMS {
        return Err(EmberError::TooManyParams(MAX_PARAMS));
    }
    Ok(ParsedLine { command, params })
}
