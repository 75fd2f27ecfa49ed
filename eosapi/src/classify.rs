//! Failure classification.
//!
//! Every failure the dispatcher sees lands in exactly one [`ErrorClass`].
//! Classes are checked in declaration order; only [`ErrorClass::Fatal`]
//! may end a host's workflow.

use std::fmt;

use serde_json::error::Category;

use crate::error::TransportError;

/// Closed failure taxonomy, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorClass {
    /// Name resolution or connection establishment failed.
    Fatal,

    /// The device rejected the command (syntax, privilege, device-side failure).
    CommandRejected,

    /// The response could not be parsed in the requested encoding.
    DecodeFailure,

    /// The response parsed, but an expected field was missing or mistyped.
    ShapeMismatch,

    /// Anything else.
    Unclassified,
}

impl ErrorClass {
    /// Whether this class aborts the workflow for the host.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorClass::Fatal)
    }

    /// Short label used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Fatal => "fatal",
            ErrorClass::CommandRejected => "command-rejected",
            ErrorClass::DecodeFailure => "decode-failure",
            ErrorClass::ShapeMismatch => "shape-mismatch",
            ErrorClass::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Low-level failure signal handed to the classifier.
#[derive(Debug)]
pub enum Failure {
    /// Reported by the transport.
    Transport(TransportError),

    /// Result decoded as JSON but not into the expected type.
    Shape(serde_json::Error),

    /// A text result had no `output` field, or a field the caller needs was absent.
    MissingField(&'static str),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Transport(err) => write!(f, "{err}"),
            Failure::Shape(err) => write!(f, "unexpected response shape: {err}"),
            Failure::MissingField(field) => write!(f, "missing field '{field}'"),
        }
    }
}

impl From<TransportError> for Failure {
    fn from(err: TransportError) -> Self {
        Failure::Transport(err)
    }
}

/// Map a failure onto its class.
pub fn classify(failure: &Failure) -> ErrorClass {
    match failure {
        Failure::Transport(err) => classify_transport(err),
        Failure::Shape(err) => classify_json(err),
        Failure::MissingField(_) => ErrorClass::ShapeMismatch,
    }
}

fn classify_transport(err: &TransportError) -> ErrorClass {
    match err {
        TransportError::Resolve { .. } | TransportError::ConnectionFailed { .. } => {
            ErrorClass::Fatal
        }
        TransportError::Command { .. } => ErrorClass::CommandRejected,
        TransportError::Status { status, .. } if matches!(status, 401 | 403) => {
            ErrorClass::CommandRejected
        }
        TransportError::Decode(err) => classify_json(err),
        TransportError::ShortResponse { .. } => ErrorClass::ShapeMismatch,
        TransportError::Timeout(_) | TransportError::Status { .. } | TransportError::Other(_) => {
            ErrorClass::Unclassified
        }
    }
}

/// Syntax and truncation errors are decode failures; a well-formed document
/// of the wrong shape is a shape mismatch.
fn classify_json(err: &serde_json::Error) -> ErrorClass {
    match err.classify() {
        Category::Syntax | Category::Eof => ErrorClass::DecodeFailure,
        Category::Data => ErrorClass::ShapeMismatch,
        Category::Io => ErrorClass::Unclassified,
    }
}
