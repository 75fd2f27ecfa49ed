//! eAPI connection configuration.

use std::env;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{Error, Result};

/// Default per-request timeout, matching the management API client's default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Wire protocol used to reach the management API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// JSON-RPC over HTTPS (default).
    #[default]
    Https,

    /// JSON-RPC over plain HTTP. For labs with `protocol http` enabled.
    Http,
}

impl TransportKind {
    /// URL scheme for this transport.
    pub fn scheme(&self) -> &'static str {
        match self {
            TransportKind::Https => "https",
            TransportKind::Http => "http",
        }
    }

    /// Port used when none is configured.
    pub fn default_port(&self) -> u16 {
        match self {
            TransportKind::Https => 443,
            TransportKind::Http => 80,
        }
    }
}

/// Login credentials, supplied once by the caller and reused across reconnects.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Username for HTTP basic authentication.
    pub username: String,

    /// Password for HTTP basic authentication.
    pub password: SecretString,

    /// Secret sent with `enable` for privileged commands, if the device needs one.
    pub enable_secret: Option<SecretString>,
}

impl Credentials {
    /// Create credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            enable_secret: None,
        }
    }

    /// Set the enable secret.
    pub fn with_enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Read `<PREFIX>_USERNAME` and `<PREFIX>_PASSWORD` from the environment.
    ///
    /// Prompting for missing values is left to the caller.
    pub fn from_env(prefix: &str) -> Result<Self> {
        let read = |suffix: &str| {
            let key = format!("{prefix}_{suffix}");
            env::var(&key).map_err(|_| Error::InvalidConfig {
                message: format!("{key} is not set"),
            })
        };
        Ok(Self::new(read("USERNAME")?, read("PASSWORD")?))
    }
}

/// eAPI connection configuration.
#[derive(Debug, Clone)]
pub struct EapiConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Management API port.
    pub port: u16,

    /// Wire protocol.
    pub transport: TransportKind,

    /// Credentials for every request.
    pub credentials: Credentials,

    /// Upper bound for one request/response round trip.
    pub timeout: Duration,

    /// Verify the device's TLS certificate. EOS ships self-signed certificates.
    pub verify_tls: bool,
}

impl EapiConfig {
    /// Endpoint URL for JSON-RPC requests.
    pub fn endpoint(&self) -> String {
        format!(
            "{}://{}:{}/command-api",
            self.transport.scheme(),
            self.host,
            self.port
        )
    }

    /// Same configuration pointed at another host.
    pub fn for_host(&self, host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..self.clone()
        }
    }
}
