//! Command dispatch.
//!
//! This is the only place raw transport and decode failures are handled.
//! Every failure is classified, recorded once in the caller's [`RunLog`],
//! and turned into an absent result. Callers above this layer see either a
//! result, `None`, or (through the `try_` variants) [`Error::Fatal`].

mod command;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use command::{Command, CommandResult, Mode};

use crate::classify::{ErrorClass, Failure, classify};
use crate::diagnostics::RunLog;
use crate::error::{Error, Result, TransportError};
use crate::session::Session;
use crate::transport::{Cmd, Connector, Encoding, RunCmds, Transport};

impl<C: Connector> Session<C> {
    /// Execute a command.
    ///
    /// Returns `None` for any failure, fatal ones included; check
    /// [`RunLog::fatal`] or use [`try_execute`](Self::try_execute) to stop
    /// on an unreachable host.
    pub async fn execute(&self, command: &Command, log: &mut RunLog) -> Option<CommandResult> {
        let outcome = self.dispatch(command).await;
        self.settle(command, outcome, log).ok().flatten()
    }

    /// Execute a command, returning `Err(Error::Fatal)` if the host is unreachable.
    pub async fn try_execute(
        &self,
        command: &Command,
        log: &mut RunLog,
    ) -> Result<Option<CommandResult>> {
        let outcome = self.dispatch(command).await;
        self.settle(command, outcome, log)
    }

    /// Execute a command and decode its structured result into `T`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        command: &Command,
        log: &mut RunLog,
    ) -> Option<T> {
        self.try_query(command, log).await.ok().flatten()
    }

    /// Like [`query`](Self::query), but surfaces fatal failures.
    pub async fn try_query<T: DeserializeOwned>(
        &self,
        command: &Command,
        log: &mut RunLog,
    ) -> Result<Option<T>> {
        let outcome = self.dispatch(command).await.and_then(|result| {
            let value = match result {
                CommandResult::Structured(value) => value,
                CommandResult::Text(text) => Value::String(text),
            };
            serde_json::from_value(value).map_err(Failure::Shape)
        });
        self.settle(command, outcome, log)
    }

    /// Execute a structured command and take one top-level key of its result.
    ///
    /// A missing key is a shape mismatch.
    pub async fn try_select(
        &self,
        command: &Command,
        key: &'static str,
        log: &mut RunLog,
    ) -> Result<Option<Value>> {
        let outcome = self.dispatch(command).await.and_then(|result| match result {
            CommandResult::Structured(Value::Object(mut map)) => {
                map.remove(key).ok_or(Failure::MissingField(key))
            }
            _ => Err(Failure::MissingField(key)),
        });
        self.settle(command, outcome, log)
    }

    /// Record a failure, if any, and decide whether it halts the workflow.
    fn settle<T>(
        &self,
        command: &Command,
        outcome: std::result::Result<T, Failure>,
        log: &mut RunLog,
    ) -> Result<Option<T>> {
        let failure = match outcome {
            Ok(value) => return Ok(Some(value)),
            Err(failure) => failure,
        };

        let class = classify(&failure);
        log.record(self.host(), command.to_string(), class, failure.to_string());

        match class {
            ErrorClass::Fatal => Err(Error::Fatal {
                host: self.host().to_string(),
                reason: failure.to_string(),
            }),
            _ => Ok(None),
        }
    }

    /// Build the request for the command's mode, send it, and pick out its result.
    async fn dispatch(&self, command: &Command) -> std::result::Result<CommandResult, Failure> {
        let lines = command.lines().iter().cloned().map(Cmd::Line);

        let (cmds, skip, encoding) = match command.mode() {
            Mode::Batch => (lines.collect::<Vec<_>>(), 0, command.encoding()),
            Mode::Privileged => {
                let mut cmds = vec![self.enable_cmd()];
                cmds.extend(lines.take(1));
                (cmds, 1, command.encoding())
            }
            Mode::Configuration => {
                let mut cmds = vec![
                    self.enable_cmd(),
                    Cmd::Line("configure terminal".to_string()),
                ];
                cmds.extend(lines);
                (cmds, 2, Encoding::Json)
            }
        };

        let expected = cmds.len();
        if expected == skip {
            return Err(TransportError::ShortResponse {
                expected: skip + 1,
                actual: skip,
            }
            .into());
        }

        let request = RunCmds::new(cmds, encoding);
        let mut results = self.transport().run_cmds(&request).await?;
        if results.len() < expected {
            return Err(TransportError::ShortResponse {
                expected,
                actual: results.len(),
            }
            .into());
        }

        if command.mode() == Mode::Configuration {
            return Ok(CommandResult::Structured(Value::Array(
                results.split_off(skip),
            )));
        }

        let result = results.swap_remove(skip);
        match encoding {
            Encoding::Json => Ok(CommandResult::Structured(result)),
            Encoding::Text => text_output(result).map(CommandResult::Text),
        }
    }

    fn enable_cmd(&self) -> Cmd {
        match &self.config().credentials.enable_secret {
            Some(secret) => Cmd::Enable(secret.clone()),
            None => Cmd::Line("enable".to_string()),
        }
    }
}

fn text_output(result: Value) -> std::result::Result<String, Failure> {
    match result {
        Value::Object(mut map) => match map.remove("output") {
            Some(Value::String(output)) => Ok(output),
            _ => Err(Failure::MissingField("output")),
        },
        _ => Err(Failure::MissingField("output")),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::session::SessionBuilder;
    use crate::testing::{Reply, ScriptedConnector};

    fn open(connector: &ScriptedConnector) -> Session<ScriptedConnector> {
        SessionBuilder::new("leaf1")
            .username("admin")
            .password("secret")
            .open_with(connector.clone())
            .unwrap()
    }

    #[derive(Debug, Deserialize)]
    struct Hostname {
        hostname: String,
    }

    #[tokio::test]
    async fn test_privileged_json() {
        let connector = ScriptedConnector::new();
        let show = json!({"hostname": "leaf1", "fqdn": "leaf1.lab"});
        connector.push("leaf1", Reply::enabled(show));
        let session = open(&connector);
        let mut log = RunLog::new("test");

        let result = session
            .execute(&Command::enable("show hostname"), &mut log)
            .await
            .unwrap();

        assert_eq!(result.as_structured().unwrap()["fqdn"], "leaf1.lab");
        let sent = &connector.requests("leaf1")[0];
        assert_eq!(sent["params"]["cmds"], json!(["enable", "show hostname"]));
        assert_eq!(sent["params"]["format"], "json");
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_privileged_text_with_enable_secret() {
        let connector = ScriptedConnector::new();
        connector.push("leaf1", Reply::enabled_text("Directory of flash:/\n"));
        let session = SessionBuilder::new("leaf1")
            .username("admin")
            .password("secret")
            .enable_secret("en4ble")
            .open_with(connector.clone())
            .unwrap();
        let mut log = RunLog::new("test");

        let result = session
            .execute(&Command::enable_text("dir flash:"), &mut log)
            .await
            .unwrap();

        assert_eq!(result.as_text(), Some("Directory of flash:/\n"));
        let sent = &connector.requests("leaf1")[0];
        assert_eq!(
            sent["params"]["cmds"],
            json!([{"cmd": "enable", "input": "en4ble"}, "dir flash:"])
        );
        assert_eq!(sent["params"]["format"], "text");
    }

    #[tokio::test]
    async fn test_batch_returns_first() {
        let connector = ScriptedConnector::new();
        connector.push(
            "leaf1",
            Reply::results(vec![json!({"hostname": "leaf1"}), json!({"upTime": 10})]),
        );
        let session = open(&connector);
        let mut log = RunLog::new("test");

        let result = session
            .execute(&Command::batch(["show hostname", "show uptime"]), &mut log)
            .await
            .unwrap();

        assert_eq!(result.as_structured().unwrap()["hostname"], "leaf1");
        assert_eq!(
            connector.requests("leaf1")[0]["params"]["cmds"],
            json!(["show hostname", "show uptime"])
        );
    }

    #[tokio::test]
    async fn test_configuration() {
        let connector = ScriptedConnector::new();
        connector.push("leaf1", Reply::results(vec![json!({}); 4]));
        let session = open(&connector);
        let mut log = RunLog::new("test");

        let result = session
            .execute(
                &Command::config(["interface Port-Channel10", "shutdown"]),
                &mut log,
            )
            .await
            .unwrap();

        assert_eq!(result, CommandResult::Structured(json!([{}, {}])));
        assert_eq!(
            connector.requests("leaf1")[0]["params"]["cmds"],
            json!([
                "enable",
                "configure terminal",
                "interface Port-Channel10",
                "shutdown",
            ])
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let connector = ScriptedConnector::new();
        connector.push("leaf1", Reply::unresolvable("leaf1"));
        let session = open(&connector);
        let mut log = RunLog::new("test");

        let result = session
            .execute(&Command::enable("show version"), &mut log)
            .await;

        assert!(result.is_none());
        assert_eq!(log.len(), 1);
        assert_eq!(log.count(ErrorClass::Fatal), 1);
        assert_eq!(log.fatal().unwrap().command, "show version");
    }

    #[tokio::test]
    async fn test_try_execute_surfaces_fatal() {
        let connector = ScriptedConnector::new();
        connector.push("leaf1", Reply::unresolvable("leaf1"));
        let session = open(&connector);
        let mut log = RunLog::new("test");

        let err = session
            .try_execute(&Command::enable("show version"), &mut log)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Fatal { ref host, .. } if host == "leaf1"));
        assert_eq!(log.count(ErrorClass::Fatal), 1);
    }

    #[tokio::test]
    async fn test_rejection_does_not_corrupt_session() {
        let connector = ScriptedConnector::new();
        let message = "CLI command 2 of 2 'show bogus' failed: invalid command";
        connector.push("leaf1", Reply::rejected(message));
        connector.push("leaf1", Reply::enabled(json!({"hostname": "leaf1"})));
        let session = open(&connector);
        let mut log = RunLog::new("test");

        let rejected = session
            .try_execute(&Command::enable("show bogus"), &mut log)
            .await
            .unwrap();
        assert!(rejected.is_none());
        assert_eq!(log.len(), 1);
        assert_eq!(log.count(ErrorClass::CommandRejected), 1);
        assert_eq!(log.entries()[0].command, "show bogus");

        let hostname: Hostname = session
            .query(&Command::enable("show hostname"), &mut log)
            .await
            .unwrap();
        assert_eq!(hostname.hostname, "leaf1");
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_recoverable_classes() {
        let connector = ScriptedConnector::new();
        connector.push("leaf1", Reply::malformed());
        connector.push("leaf1", Reply::enabled(json!({"fqdn": "leaf1.lab"})));
        connector.push("leaf1", Reply::enabled(json!({"nooutput": true})));
        connector.push("leaf1", Reply::timeout());
        let session = open(&connector);
        let mut log = RunLog::new("test");

        let hostname = Command::enable("show hostname");
        assert!(session.execute(&hostname, &mut log).await.is_none());
        let shape = session.try_query::<Hostname>(&hostname, &mut log).await;
        assert!(shape.unwrap().is_none());

        let clock = Command::enable_text("show clock");
        assert!(session.execute(&clock, &mut log).await.is_none());
        let clock = Command::enable("show clock");
        assert!(session.execute(&clock, &mut log).await.is_none());

        assert_eq!(log.count(ErrorClass::DecodeFailure), 1);
        assert_eq!(log.count(ErrorClass::ShapeMismatch), 2);
        assert_eq!(log.count(ErrorClass::Unclassified), 1);
        assert!(log.fatal().is_none());
    }

    #[tokio::test]
    async fn test_short_response() {
        let connector = ScriptedConnector::new();
        connector.push("leaf1", Reply::results(vec![json!({})]));
        let session = open(&connector);
        let mut log = RunLog::new("test");

        let version = Command::enable("show version");
        assert!(session.execute(&version, &mut log).await.is_none());
        assert_eq!(log.count(ErrorClass::ShapeMismatch), 1);
    }

    #[tokio::test]
    async fn test_empty_command_not_sent() {
        let connector = ScriptedConnector::new();
        let session = open(&connector);
        let mut log = RunLog::new("test");

        let empty: [&str; 0] = [];
        let command = Command::config(empty);
        assert!(session.execute(&command, &mut log).await.is_none());
        assert!(connector.requests("leaf1").is_empty());
        assert_eq!(log.count(ErrorClass::ShapeMismatch), 1);
    }
}
