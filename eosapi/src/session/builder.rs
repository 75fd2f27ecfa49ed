//! Builder for opening sessions.

use std::time::Duration;

use super::Session;
use crate::error::{Error, Result};
use crate::transport::{
    Connector, Credentials, DEFAULT_TIMEOUT, EapiConfig, HttpConnector, TransportKind,
};

/// Builder for constructing sessions.
///
/// # Example
///
/// ```rust,no_run
/// use eosapi::SessionBuilder;
///
/// # fn example() -> Result<(), eosapi::Error> {
/// let session = SessionBuilder::new("leaf1.example.com")
///     .username("admin")
///     .password("secret")
///     .open()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: Option<u16>,
    transport: TransportKind,
    username: Option<String>,
    password: Option<String>,
    enable_secret: Option<String>,
    credentials: Option<Credentials>,
    timeout: Duration,
    verify_tls: bool,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().trim().to_string(),
            port: None,
            transport: TransportKind::Https,
            username: None,
            password: None,
            enable_secret: None,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            verify_tls: false,
        }
    }

    /// Set the management API port (default: 443 for HTTPS, 80 for HTTP).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the wire protocol.
    pub fn transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the enable secret sent ahead of privileged commands.
    pub fn enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(secret.into());
        self
    }

    /// Use pre-built credentials. Overrides `username`/`password`.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the per-request timeout (default: 180 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Verify the device certificate (default: off).
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Build the configuration without opening anything.
    pub fn config(self) -> Result<EapiConfig> {
        if self.host.is_empty() {
            return Err(Error::InvalidConfig {
                message: "Host is required".to_string(),
            });
        }

        let mut credentials = match (self.credentials, self.username, self.password) {
            (Some(credentials), _, _) => credentials,
            (None, Some(username), Some(password)) => Credentials::new(username, password),
            (None, None, _) => {
                return Err(Error::InvalidConfig {
                    message: "Username is required".to_string(),
                });
            }
            (None, Some(_), None) => {
                return Err(Error::InvalidConfig {
                    message: "Password is required".to_string(),
                });
            }
        };
        if let Some(secret) = self.enable_secret {
            credentials = credentials.with_enable_secret(secret);
        }

        Ok(EapiConfig {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.transport.default_port()),
            transport: self.transport,
            credentials,
            timeout: self.timeout,
            verify_tls: self.verify_tls,
        })
    }

    /// Open a session over HTTP(S).
    ///
    /// This constructs the transport but does not contact the device.
    pub fn open(self) -> Result<Session<HttpConnector>> {
        self.open_with(HttpConnector)
    }

    /// Open a session using a custom connector.
    pub fn open_with<C: Connector>(self, connector: C) -> Result<Session<C>> {
        Session::new(self.config()?, connector)
    }
}
