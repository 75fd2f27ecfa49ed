//! HTTPS transport implementation using reqwest.

use std::error::Error as StdError;
use std::time::Duration;

use log::debug;
use memchr::memmem;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::config::EapiConfig;
use super::jsonrpc::{RunCmds, decode_response};
use super::{Connector, Transport};
use crate::error::{Error, Result, TransportError};

/// Substrings the resolver stack uses for lookup failures.
const RESOLVE_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "Name or service not known",
    "nodename nor servname",
    "No such host is known",
];

/// Connector producing [`HttpTransport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    type Transport = HttpTransport;

    fn connect(&self, config: &EapiConfig) -> Result<HttpTransport> {
        HttpTransport::new(config)
    }
}

/// JSON-RPC over HTTP(S) transport wrapping a reqwest client.
pub struct HttpTransport {
    /// The reqwest client; owns the connection pool for this host.
    client: reqwest::Client,

    /// `<scheme>://<host>:<port>/command-api`
    endpoint: String,

    host: String,
    port: u16,
    username: String,
    password: SecretString,
    timeout: Duration,
}

impl HttpTransport {
    /// Build the client. No request is sent until the first command.
    pub fn new(config: &EapiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| Error::Connect {
                host: config.host.clone(),
                message: error_chain(&e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            host: config.host.clone(),
            port: config.port,
            username: config.credentials.username.clone(),
            password: config.credentials.password.clone(),
            timeout: config.timeout,
        })
    }

    /// Map a reqwest failure onto the transport taxonomy.
    fn map_error(&self, err: reqwest::Error) -> TransportError {
        let message = error_chain(&err);

        if err.is_connect() {
            let haystack = message.as_bytes();
            let is_resolve = RESOLVE_MARKERS
                .iter()
                .any(|marker| memmem::find(haystack, marker.as_bytes()).is_some());
            if is_resolve {
                return TransportError::Resolve {
                    host: self.host.clone(),
                    message,
                };
            }
            return TransportError::ConnectionFailed {
                host: self.host.clone(),
                port: self.port,
                message,
            };
        }

        if err.is_timeout() {
            return TransportError::Timeout(self.timeout);
        }

        TransportError::Other(message)
    }
}

impl Transport for HttpTransport {
    async fn run_cmds(&self, request: &RunCmds) -> std::result::Result<Vec<Value>, TransportError> {
        debug!(
            "POST {} ({} command(s), format {:?})",
            self.endpoint,
            request.cmds().len(),
            request.format()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        decode_response(&body, request.cmds().len())
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ErrorClass, Failure, classify};
    use crate::diagnostics::RunLog;
    use crate::dispatch::Command;
    use crate::session::SessionBuilder;
    use crate::transport::config::{Credentials, TransportKind};
    use crate::transport::jsonrpc::{Cmd, Encoding};

    fn config(host: &str, port: u16) -> EapiConfig {
        EapiConfig {
            host: host.to_string(),
            port,
            transport: TransportKind::Http,
            credentials: Credentials::new("admin", "secret"),
            timeout: Duration::from_secs(5),
            verify_tls: false,
        }
    }

    fn show_version() -> RunCmds {
        RunCmds::new(
            vec![Cmd::Line("show version".to_string())],
            Encoding::Json,
        )
    }

    #[test]
    fn test_connect_does_not_touch_network() {
        let mut config = config("does-not-exist.invalid", 443);
        config.transport = TransportKind::Https;
        let transport = HttpConnector.connect(&config).unwrap();
        assert_eq!(
            transport.endpoint,
            "https://does-not-exist.invalid:443/command-api"
        );
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_fatal() {
        let transport = HttpConnector
            .connect(&config("does-not-exist.invalid", 80))
            .unwrap();

        let err = transport.run_cmds(&show_version()).await.unwrap_err();
        match &err {
            TransportError::Resolve { host, .. } => assert_eq!(host, "does-not-exist.invalid"),
            other => panic!("expected a resolve failure, got {other:?}"),
        }
        assert_eq!(classify(&Failure::from(err)), ErrorClass::Fatal);
    }

    #[tokio::test]
    async fn test_refused_connection_is_fatal() {
        let transport = HttpConnector.connect(&config("127.0.0.1", 1)).unwrap();

        let err = transport.run_cmds(&show_version()).await.unwrap_err();
        assert!(
            matches!(err, TransportError::ConnectionFailed { port: 1, .. }),
            "{err:?}"
        );
        assert_eq!(classify(&Failure::from(err)), ErrorClass::Fatal);
    }

    #[tokio::test]
    async fn test_session_records_refused_connection() {
        let session = SessionBuilder::new("127.0.0.1")
            .port(1)
            .transport(TransportKind::Http)
            .timeout(Duration::from_secs(5))
            .username("admin")
            .password("secret")
            .open()
            .unwrap();
        let mut log = RunLog::new("test");

        let result = session
            .execute(&Command::enable("show version"), &mut log)
            .await;
        assert!(result.is_none());
        assert_eq!(log.len(), 1);
        assert_eq!(log.count(ErrorClass::Fatal), 1);
    }

    #[test]
    fn test_error_chain() {
        let inner = std::io::Error::other("Name or service not known");
        let outer = std::io::Error::other(inner);
        assert!(error_chain(&outer).contains("Name or service not known"));
    }
}
