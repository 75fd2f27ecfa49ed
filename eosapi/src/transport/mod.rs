//! eAPI transport layer.
//!
//! This module provides the wire side of a session: connection
//! configuration, the JSON-RPC envelope, and the HTTPS transport. The
//! [`Connector`] and [`Transport`] traits are the seam the session and
//! dispatcher are written against.

pub mod config;
mod http;
pub mod jsonrpc;

use std::future::Future;

use serde_json::Value;

pub use config::{Credentials, DEFAULT_TIMEOUT, EapiConfig, TransportKind};
pub use http::{HttpConnector, HttpTransport};
pub use jsonrpc::{Cmd, Encoding, RunCmds};

use crate::error::{Result, TransportError};

/// One live connection to one device.
pub trait Transport: Send + Sync {
    /// Submit a `runCmds` request and return one result per command.
    fn run_cmds(
        &self,
        request: &RunCmds,
    ) -> impl Future<Output = std::result::Result<Vec<Value>, TransportError>> + Send;
}

/// Builds transports from configuration.
///
/// A session keeps its connector so it can rebuild the transport for a
/// different host without asking the caller for anything again.
pub trait Connector: Send + Sync {
    /// Transport produced by this connector.
    type Transport: Transport;

    /// Construct a transport for `config.host`. Does not perform a round trip.
    fn connect(&self, config: &EapiConfig) -> Result<Self::Transport>;
}
