//! Commands and their results.

use std::fmt;

use serde_json::Value;

use crate::transport::Encoding;

/// Execution context for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Lines are sent as-is; the first result is returned.
    Batch,

    /// One command run after `enable`.
    Privileged,

    /// Configuration lines applied after `enable` and `configure terminal`.
    Configuration,
}

/// A command to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    mode: Mode,
    encoding: Encoding,
    lines: Vec<String>,
}

impl Command {
    /// Status query lines sent without privilege escalation.
    pub fn batch<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: Mode::Batch,
            encoding: Encoding::Json,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// A privileged command with structured output.
    pub fn enable(line: impl Into<String>) -> Self {
        Self {
            mode: Mode::Privileged,
            encoding: Encoding::Json,
            lines: vec![line.into()],
        }
    }

    /// A privileged command returning the text the CLI would print.
    pub fn enable_text(line: impl Into<String>) -> Self {
        Self::enable(line).with_encoding(Encoding::Text)
    }

    /// Configuration lines.
    pub fn config<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: Mode::Configuration,
            encoding: Encoding::Json,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Override the output encoding.
    ///
    /// Configuration results are always structured; the encoding is ignored there.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("; "))
    }
}

/// Output of a successful command.
///
/// A failed command has no result at all (`None` from the dispatcher);
/// callers must not read absence as an empty or zero result.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Decoded JSON, in the command's own schema.
    Structured(Value),

    /// The command's terminal output.
    Text(String),
}

impl CommandResult {
    /// Borrow the structured value.
    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            CommandResult::Structured(value) => Some(value),
            CommandResult::Text(_) => None,
        }
    }

    /// Borrow the text output.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CommandResult::Text(text) => Some(text),
            CommandResult::Structured(_) => None,
        }
    }

    /// Take the structured value.
    pub fn into_structured(self) -> Option<Value> {
        match self {
            CommandResult::Structured(value) => Some(value),
            CommandResult::Text(_) => None,
        }
    }

    /// Take the text output.
    pub fn into_text(self) -> Option<String> {
        match self {
            CommandResult::Text(text) => Some(text),
            CommandResult::Structured(_) => None,
        }
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Structured(value) => write!(f, "{value:#}"),
            CommandResult::Text(text) => f.write_str(text),
        }
    }
}
