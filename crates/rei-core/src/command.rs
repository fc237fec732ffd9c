//! Free-text command parsing.
//!
//! A command string is a leading tool token followed by argument text. The
//! parser only resolves the tool; the argument tokens are handed to the tool
//! handler untouched, which decides whether they are an address, a city and
//! state, or a question.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Source, Tool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub tool: Tool,
    pub raw_args: Vec<String>,
    pub source: Source,
}

impl Command {
    pub fn new(tool: Tool, args: &str, source: Source) -> Self {
        Self {
            tool,
            raw_args: tokenize(args),
            source,
        }
    }

    pub fn help(source: Source) -> Self {
        Self {
            tool: Tool::Help,
            raw_args: Vec::new(),
            source,
        }
    }

    /// The argument tokens joined back into a single line.
    pub fn args_text(&self) -> String {
        self.raw_args.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl ParseError {
    /// The token the user typed, for help hints and audit records.
    pub fn token(&self) -> &str {
        match self {
            ParseError::UnknownCommand(t) => t,
        }
    }
}

/// Parse `raw` into a [`Command`].
///
/// Empty input and a bare `help` both resolve to the help tool with no
/// arguments. The tool token is matched case-insensitively.
pub fn parse(raw: &str, source: Source) -> Result<Command, ParseError> {
    let mut tokens = raw.split_whitespace();
    let Some(head) = tokens.next() else {
        return Ok(Command::help(source));
    };

    let tool: Tool = head
        .parse()
        .map_err(|_| ParseError::UnknownCommand(head.to_string()))?;
    if tool == Tool::Help {
        return Ok(Command::help(source));
    }

    Ok(Command {
        tool,
        raw_args: tokens.map(str::to_string).collect(),
        source,
    })
}

/// Split argument text into tokens, dropping surplus whitespace.
pub fn tokenize(args: &str) -> Vec<String> {
    args.split_whitespace().map(str::to_string).collect()
}
