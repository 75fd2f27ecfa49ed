//! Sessions: one live connection to one device.
//!
//! A [`Session`] owns its transport, the connector that built it, and the
//! version information discovered on first use. Pivoting to another device
//! goes through [`Session::reconnect`], which consumes the session and
//! returns a fresh one for the new host with the same credentials.

mod builder;

use std::sync::OnceLock;

use log::debug;

pub use builder::SessionBuilder;

use crate::diagnostics::RunLog;
use crate::dispatch::Command;
use crate::error::Result;
use crate::models::ShowVersion;
use crate::transport::{Connector, EapiConfig, HttpConnector};
use crate::version::{Dialect, VersionInfo};

/// A connection to one device.
pub struct Session<C: Connector = HttpConnector> {
    /// Configuration used for this connection.
    config: EapiConfig,

    /// Builds the transport; kept for reconnects.
    connector: C,

    /// The live transport.
    transport: C::Transport,

    /// Set by the first successful `show version`; never changes afterwards.
    version: OnceLock<VersionInfo>,
}

impl<C: Connector> Session<C> {
    /// Create a session from configuration. No round trip is performed.
    pub fn new(config: EapiConfig, connector: C) -> Result<Self> {
        let transport = connector.connect(&config)?;
        debug!("Opened eAPI session to {}", config.endpoint());
        Ok(Self {
            config,
            connector,
            transport,
            version: OnceLock::new(),
        })
    }

    /// Tear this session down and open one to `host` with the same credentials.
    ///
    /// The returned session starts with no cached version; the dialect of the
    /// new device is discovered on its own.
    pub fn reconnect(self, host: impl Into<String>) -> Result<Self> {
        let host = host.into().trim().to_string();
        debug!("Reconnecting from {} to {}", self.config.host, host);

        let Self {
            config,
            connector,
            transport,
            ..
        } = self;
        drop(transport);

        Self::new(config.for_host(host), connector)
    }

    /// Target host.
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Connection configuration.
    pub fn config(&self) -> &EapiConfig {
        &self.config
    }

    /// The connector that built this session's transport.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub(crate) fn transport(&self) -> &C::Transport {
        &self.transport
    }

    /// Cached version information, if discovered.
    pub fn cached_version(&self) -> Option<&VersionInfo> {
        self.version.get()
    }

    /// Cached dialect, if the version has been discovered.
    pub fn dialect(&self) -> Option<Dialect> {
        self.version.get().map(|v| v.dialect)
    }

    /// Query `show version` once and cache the result.
    ///
    /// Later calls return the cached value without touching the device.
    /// Returns `Ok(None)` if the query failed recoverably; the failure is in
    /// `log`, and the next call will try again.
    pub async fn version(&self, log: &mut RunLog) -> Result<Option<&VersionInfo>> {
        if let Some(info) = self.version.get() {
            return Ok(Some(info));
        }

        let Some(show) = self
            .try_query::<ShowVersion>(&Command::enable("show version"), log)
            .await?
        else {
            return Ok(None);
        };

        let info = self.version.get_or_init(|| VersionInfo::from(show));
        debug!(
            "{} runs EOS {} ({} dialect)",
            self.config.host, info.raw_version, info.dialect
        );
        Ok(Some(info))
    }
}
