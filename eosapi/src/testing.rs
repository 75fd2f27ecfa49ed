//! Scripted in-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use crate::error::{Result, TransportError};
use crate::transport::{Connector, EapiConfig, RunCmds, Transport};

/// One scripted answer to one request.
pub enum Reply {
    Results(Vec<Value>),
    Fail(TransportError),
}

impl Reply {
    pub fn results(results: Vec<Value>) -> Self {
        Reply::Results(results)
    }

    /// Privileged JSON reply: the `enable` result followed by `result`.
    pub fn enabled(result: Value) -> Self {
        Reply::Results(vec![json!({}), result])
    }

    /// Privileged text reply.
    pub fn enabled_text(output: &str) -> Self {
        Reply::Results(vec![json!({"output": ""}), json!({"output": output})])
    }

    pub fn rejected(message: &str) -> Self {
        Reply::Fail(TransportError::Command {
            code: 1002,
            message: message.to_string(),
            errors: vec!["Invalid input".to_string()],
        })
    }

    pub fn unresolvable(host: &str) -> Self {
        Reply::Fail(TransportError::Resolve {
            host: host.to_string(),
            message: "dns error: failed to lookup address information: Name or service not known"
                .to_string(),
        })
    }

    pub fn malformed() -> Self {
        let err = serde_json::from_str::<Value>("{\"result\": [").unwrap_err();
        Reply::Fail(TransportError::Decode(err))
    }

    pub fn timeout() -> Self {
        Reply::Fail(TransportError::Timeout(Duration::from_secs(180)))
    }
}

#[derive(Default)]
struct State {
    replies: HashMap<String, VecDeque<Reply>>,
    requests: HashMap<String, Vec<Value>>,
    connects: Vec<String>,
}

/// Connector whose transports answer from a per-host script.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    state: Arc<Mutex<State>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next request to `host`.
    pub fn push(&self, host: &str, reply: Reply) {
        self.state
            .lock()
            .unwrap()
            .replies
            .entry(host.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Request bodies sent to `host`, in order.
    pub fn requests(&self, host: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .requests
            .get(host)
            .cloned()
            .unwrap_or_default()
    }

    /// Hosts connected to, in order.
    pub fn connects(&self) -> Vec<String> {
        self.state.lock().unwrap().connects.clone()
    }
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    fn connect(&self, config: &EapiConfig) -> Result<ScriptedTransport> {
        self.state.lock().unwrap().connects.push(config.host.clone());
        Ok(ScriptedTransport {
            host: config.host.clone(),
            state: self.state.clone(),
        })
    }
}

pub struct ScriptedTransport {
    host: String,
    state: Arc<Mutex<State>>,
}

impl ScriptedTransport {
    fn answer(&self, request: &RunCmds) -> std::result::Result<Vec<Value>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state
            .requests
            .entry(self.host.clone())
            .or_default()
            .push(serde_json::to_value(request).unwrap());

        match state
            .replies
            .get_mut(&self.host)
            .and_then(VecDeque::pop_front)
        {
            Some(Reply::Results(results)) => Ok(results),
            Some(Reply::Fail(err)) => Err(err),
            None => Err(TransportError::Other(format!(
                "no scripted reply left for {}",
                self.host
            ))),
        }
    }
}

impl Transport for ScriptedTransport {
    async fn run_cmds(
        &self,
        request: &RunCmds,
    ) -> std::result::Result<Vec<Value>, TransportError> {
        self.answer(request)
    }
}

/// A `show version` result for the given release.
pub fn show_version(version: &str) -> Value {
    json!({
        "version": version,
        "modelName": "DCS-7280SR-48C6",
        "serialNumber": "JPE00000001",
        "hardwareRevision": "11.01",
        "systemMacAddress": "00:1c:73:aa:bb:cc",
        "uptime": 86400.0
    })
}
