//! JSON-RPC envelope for the `runCmds` method.
//!
//! A request names the commands and the output format; the response holds
//! one result per submitted command, in order, or a single error object.
//!
//! ```text
//! -> {"jsonrpc":"2.0","method":"runCmds","id":"eosapi-1",
//!     "params":{"version":1,"format":"json","cmds":["show version"]}}
//! <- {"jsonrpc":"2.0","id":"eosapi-1","result":[{"version":"4.25.1F", ...}]}
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::TransportError;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Output format requested from the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Decoded JSON, command-specific schema.
    #[default]
    Json,

    /// The literal text the command prints at the CLI.
    Text,
}

/// One entry of the `cmds` array.
#[derive(Debug, Clone)]
pub enum Cmd {
    /// A plain command line.
    Line(String),

    /// `enable` carrying the enable secret as input.
    Enable(SecretString),
}

impl Serialize for Cmd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cmd::Line(line) => serializer.serialize_str(line),
            Cmd::Enable(secret) => {
                let mut cmd = serializer.serialize_struct("Cmd", 2)?;
                cmd.serialize_field("cmd", "enable")?;
                cmd.serialize_field("input", secret.expose_secret())?;
                cmd.end()
            }
        }
    }
}

/// A `runCmds` request.
#[derive(Debug, Clone, Serialize)]
pub struct RunCmds {
    jsonrpc: &'static str,
    method: &'static str,
    params: Params,
    id: String,
}

#[derive(Debug, Clone, Serialize)]
struct Params {
    version: u32,
    cmds: Vec<Cmd>,
    format: Encoding,
}

impl RunCmds {
    /// Build a request for the given commands.
    pub fn new(cmds: Vec<Cmd>, format: Encoding) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "runCmds",
            params: Params {
                version: 1,
                cmds,
                format,
            },
            id: format!("eosapi-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    /// Commands in submission order.
    pub fn cmds(&self) -> &[Cmd] {
        &self.params.cmds
    }

    /// Requested output format.
    pub fn format(&self) -> Encoding {
        self.params.format
    }

    /// Request id echoed back by the device.
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Vec<Value>,
}

impl RpcError {
    /// Per-command error strings the device attaches under `data[*].errors`.
    fn errors(&self) -> Vec<String> {
        self.data
            .iter()
            .filter_map(|entry| entry.get("errors"))
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }
}

/// Decode a response body into one result per submitted command.
pub fn decode_response(body: &Bytes, expected: usize) -> Result<Vec<Value>, TransportError> {
    let envelope: Envelope = serde_json::from_slice(body)?;

    if let Some(err) = envelope.error {
        let errors = err.errors();
        return Err(TransportError::Command {
            code: err.code,
            message: err.message,
            errors,
        });
    }

    let results = envelope.result.unwrap_or_default();
    if results.len() < expected {
        return Err(TransportError::ShortResponse {
            expected,
            actual: results.len(),
        });
    }
    Ok(results)
}
