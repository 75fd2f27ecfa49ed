//! Typed device operations.
//!
//! Higher-level actions that are not a single plain command are modelled
//! as a closed [`Operation`] enum. Callers that only have a name and string
//! arguments (a CLI, a job file) go through [`OperationTable`], which maps
//! each name to a parser that validates the arguments into an `Operation`.
//! Nothing is ever evaluated.
//!
//! ```
//! use eosapi::operations::{Operation, OperationTable};
//!
//! let table = OperationTable::builtin();
//! let op = table.resolve("set_lacp_timeout", &["Port-Channel10", "30"]).unwrap();
//! assert_eq!(op, Operation::SetLacpFallbackTimeout { port_channel: 10, seconds: 30 });
//! assert!(table.resolve("__import__", &[]).is_err());
//! ```

use std::collections::HashMap;

use crate::diagnostics::RunLog;
use crate::dispatch::{Command, CommandResult};
use crate::error::{OperationError, Result};
use crate::session::Session;
use crate::transport::Connector;

/// Valid range for the LACP fallback timeout, in seconds.
const LACP_FALLBACK_TIMEOUT: std::ops::RangeInclusive<u32> = 1..=300;

/// A device operation with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Set `port-channel lacp fallback timeout` on a port-channel.
    SetLacpFallbackTimeout { port_channel: u32, seconds: u32 },

    /// `copy running-config startup-config`
    CopyRunningToStartup,

    /// Remove a pending configuration session.
    RemoveConfigSession { name: String },
}

impl Operation {
    /// The command that carries out this operation.
    pub fn command(&self) -> Command {
        match self {
            Operation::SetLacpFallbackTimeout {
                port_channel,
                seconds,
            } => Command::config([
                format!("interface Port-Channel{port_channel}"),
                format!("port-channel lacp fallback timeout {seconds}"),
            ]),
            Operation::CopyRunningToStartup => {
                Command::enable("copy running-config startup-config")
            }
            Operation::RemoveConfigSession { name } => {
                Command::enable(format!("no configure session {name}"))
            }
        }
    }
}

/// Parses string arguments into an [`Operation`].
pub type OperationParser = fn(&[&str]) -> std::result::Result<Operation, OperationError>;

/// Name-to-parser dispatch table.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    parsers: HashMap<String, OperationParser>,
}

impl OperationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Table with the built-in operations registered.
    pub fn builtin() -> Self {
        let builtin: [(&str, OperationParser); 3] = [
            ("set_lacp_timeout", parse_set_lacp_timeout),
            ("copy_run_start", parse_copy_run_start),
            ("remove_config_session", parse_remove_config_session),
        ];
        Self {
            parsers: builtin
                .into_iter()
                .map(|(name, parser)| (name.to_string(), parser))
                .collect(),
        }
    }

    /// Register an operation parser.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        parser: OperationParser,
    ) -> std::result::Result<(), OperationError> {
        let name = name.into();
        if self.parsers.contains_key(&name) {
            return Err(OperationError::AlreadyRegistered { name });
        }
        self.parsers.insert(name, parser);
        Ok(())
    }

    /// Resolve a name and raw arguments into a validated operation.
    pub fn resolve(
        &self,
        name: &str,
        args: &[&str],
    ) -> std::result::Result<Operation, OperationError> {
        let parser = self.parsers.get(name).ok_or_else(|| OperationError::Unknown {
            name: name.to_string(),
        })?;
        parser(args)
    }

    /// Check if an operation is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    /// List all registered operation names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.parsers.keys()
    }
}

fn expect_args(
    name: &str,
    args: &[&str],
    expected: usize,
) -> std::result::Result<(), OperationError> {
    if args.len() != expected {
        return Err(OperationError::Arity {
            name: name.to_string(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

fn parse_set_lacp_timeout(args: &[&str]) -> std::result::Result<Operation, OperationError> {
    expect_args("set_lacp_timeout", args, 2)?;

    let raw = args[0].trim();
    let number = raw
        .strip_prefix("Port-Channel")
        .or_else(|| raw.strip_prefix("Po"))
        .unwrap_or(raw);
    let port_channel = number
        .parse::<u32>()
        .map_err(|_| OperationError::InvalidArgument {
            name: "port_channel".to_string(),
            value: raw.to_string(),
            reason: "expected a port-channel number".to_string(),
        })?;

    let seconds = args[1]
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|s| LACP_FALLBACK_TIMEOUT.contains(s))
        .ok_or_else(|| OperationError::InvalidArgument {
            name: "seconds".to_string(),
            value: args[1].to_string(),
            reason: format!(
                "expected {}-{} seconds",
                LACP_FALLBACK_TIMEOUT.start(),
                LACP_FALLBACK_TIMEOUT.end()
            ),
        })?;

    Ok(Operation::SetLacpFallbackTimeout {
        port_channel,
        seconds,
    })
}

fn parse_copy_run_start(args: &[&str]) -> std::result::Result<Operation, OperationError> {
    expect_args("copy_run_start", args, 0)?;
    Ok(Operation::CopyRunningToStartup)
}

fn parse_remove_config_session(args: &[&str]) -> std::result::Result<Operation, OperationError> {
    expect_args("remove_config_session", args, 1)?;

    let name = args[0].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(OperationError::InvalidArgument {
            name: "name".to_string(),
            value: args[0].to_string(),
            reason: "session names are a single word".to_string(),
        });
    }
    Ok(Operation::RemoveConfigSession {
        name: name.to_string(),
    })
}

impl<C: Connector> Session<C> {
    /// Carry out a typed operation.
    pub async fn invoke(
        &self,
        operation: &Operation,
        log: &mut RunLog,
    ) -> Result<Option<CommandResult>> {
        self.try_execute(&operation.command(), log).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::classify::ErrorClass;
    use crate::dispatch::Mode;
    use crate::session::SessionBuilder;
    use crate::testing::{Reply, ScriptedConnector};

    #[test]
    fn test_resolve_lacp() {
        let table = OperationTable::builtin();
        for arg in ["10", "Po10", "Port-Channel10"] {
            assert_eq!(
                table.resolve("set_lacp_timeout", &[arg, "90"]).unwrap(),
                Operation::SetLacpFallbackTimeout {
                    port_channel: 10,
                    seconds: 90
                }
            );
        }
    }

    #[test]
    fn test_resolve_rejects_bad_arguments() {
        let table = OperationTable::builtin();

        assert!(matches!(
            table.resolve("set_lacp_timeout", &["10"]),
            Err(OperationError::Arity { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            table.resolve("set_lacp_timeout", &["Ethernet1", "30"]),
            Err(OperationError::InvalidArgument { .. })
        ));
        assert!(matches!(
            table.resolve("set_lacp_timeout", &["10", "0"]),
            Err(OperationError::InvalidArgument { .. })
        ));
        assert!(matches!(
            table.resolve("set_lacp_timeout", &["10", "301"]),
            Err(OperationError::InvalidArgument { .. })
        ));
        assert!(matches!(
            table.resolve("remove_config_session", &["a b"]),
            Err(OperationError::InvalidArgument { .. })
        ));
        let name = "self.node.api('interfaces')";
        assert_eq!(
            table.resolve(name, &[]).unwrap_err(),
            OperationError::Unknown {
                name: name.to_string()
            }
        );
    }

    #[test]
    fn test_register() {
        fn parse_write_memory(_: &[&str]) -> std::result::Result<Operation, OperationError> {
            Ok(Operation::CopyRunningToStartup)
        }

        let mut table = OperationTable::builtin();
        assert!(table.register("write_memory", parse_write_memory).is_ok());
        assert!(table.contains("write_memory"));
        let duplicate = table.register("copy_run_start", parse_write_memory);
        assert_eq!(
            duplicate.unwrap_err(),
            OperationError::AlreadyRegistered {
                name: "copy_run_start".to_string()
            }
        );
        assert_eq!(table.names().count(), 4);
    }

    #[test]
    fn test_commands() {
        let cmd = Operation::SetLacpFallbackTimeout {
            port_channel: 10,
            seconds: 30,
        }
        .command();
        assert_eq!(cmd.mode(), Mode::Configuration);
        assert_eq!(
            cmd.lines(),
            ["interface Port-Channel10", "port-channel lacp fallback timeout 30"]
        );

        let cmd = Operation::RemoveConfigSession {
            name: "upgrade".to_string(),
        }
        .command();
        assert_eq!(cmd.mode(), Mode::Privileged);
        assert_eq!(cmd.lines(), ["no configure session upgrade"]);
    }

    #[tokio::test]
    async fn test_invoke() {
        let connector = ScriptedConnector::new();
        connector.push("leaf1", Reply::results(vec![json!({}); 4]));
        connector.push("leaf1", Reply::rejected("invalid command"));
        let session = SessionBuilder::new("leaf1")
            .username("admin")
            .password("secret")
            .open_with(connector.clone())
            .unwrap();
        let mut log = RunLog::new("test");

        let op = OperationTable::builtin()
            .resolve("set_lacp_timeout", &["10", "30"])
            .unwrap();
        assert!(session.invoke(&op, &mut log).await.unwrap().is_some());
        assert_eq!(
            connector.requests("leaf1")[0]["params"]["cmds"],
            json!([
                "enable",
                "configure terminal",
                "interface Port-Channel10",
                "port-channel lacp fallback timeout 30"
            ])
        );

        let outcome = session
            .invoke(&Operation::CopyRunningToStartup, &mut log)
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(log.count(ErrorClass::CommandRejected), 1);
    }
}
