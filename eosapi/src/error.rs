//! Error types for eosapi.

use std::time::Duration;

use thiserror::Error;

/// Main error type for eosapi operations.
///
/// Recoverable command failures never surface here: the dispatcher turns
/// them into an absent result plus a diagnostic. What remains are failures
/// that end the workflow for a host, or misuse of the typed APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// The transport for a host could not be constructed.
    #[error("Failed to build transport for {host}: {message}")]
    Connect { host: String, message: String },

    /// Name resolution or connection establishment failed; the host is unusable.
    #[error("Fatal transport failure on {host}: {reason}")]
    Fatal { host: String, reason: String },

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Counter snapshot errors
    #[error("Counter error: {0}")]
    Diff(#[from] DiffError),

    /// Typed operation errors
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    /// Diagnostic log persistence errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wire-level failures reported by a [`Transport`](crate::transport::Transport).
///
/// These are raw signals. Only the dispatcher looks at them, and it hands
/// them to [`classify`](crate::classify::classify) before anything else.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Host name could not be resolved
    #[error("Name resolution failed for {host}: {message}")]
    Resolve { host: String, message: String },

    /// TCP or TLS connection could not be established
    #[error("Connection failed to {host}:{port}: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        message: String,
    },

    /// Request timed out after the connection was up
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status from the management API
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON-RPC error object returned by the device
    #[error("Command error {code}: {message} {errors:?}")]
    Command {
        code: i64,
        message: String,
        errors: Vec<String>,
    },

    /// Response body was not a valid JSON-RPC envelope
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The device answered with fewer results than commands submitted
    #[error("Expected {expected} results, got {actual}")]
    ShortResponse { expected: usize, actual: usize },

    /// Anything else the HTTP stack reported
    #[error("Transport error: {0}")]
    Other(String),
}

/// Counter snapshot and diff errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// Snapshots of different counter kinds were compared
    #[error("Cannot diff {left} counters against {right} counters")]
    KindMismatch {
        left: &'static str,
        right: &'static str,
    },

    /// Ports present in the first snapshot are missing from the second
    #[error("Ports missing from second snapshot: {}", ports.join(", "))]
    MissingPort { ports: Vec<String> },

    /// A port was added twice to the same snapshot
    #[error("Duplicate port '{port}' in snapshot")]
    DuplicatePort { port: String },

    /// A sample had the wrong number of counters for its kind
    #[error("Port '{port}' has {actual} counters, expected {expected}")]
    Arity {
        port: String,
        expected: usize,
        actual: usize,
    },
}

/// Typed operation resolution errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// No operation registered under this name
    #[error("Unknown operation '{name}'")]
    Unknown { name: String },

    /// Operation name already registered
    #[error("Operation '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// Wrong number of arguments
    #[error("Operation '{name}' takes {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Argument failed validation
    #[error("Invalid argument '{value}' for {name}: {reason}")]
    InvalidArgument {
        name: String,
        value: String,
        reason: String,
    },
}

/// Result type alias using eosapi's Error.
pub type Result<T> = std::result::Result<T, Error>;
