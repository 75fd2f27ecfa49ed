//! Firmware version and command dialect.
//!
//! Some commands changed text or response schema between EOS releases.
//! The [`Dialect`] is derived once from `show version` and then passed to
//! every call site that depends on it.

use std::fmt;
use std::time::Duration;

use crate::models::ShowVersion;

/// Release prefixes that still speak the legacy command syntax.
const LEGACY_PREFIXES: &[&str] = &["4.19", "4.20"];

/// Command-syntax generation spoken by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// EOS 4.19 / 4.20.
    Legacy,

    /// Everything newer.
    Current,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Legacy => f.write_str("legacy"),
            Dialect::Current => f.write_str("current"),
        }
    }
}

/// Classify a raw EOS version string.
///
/// ```
/// use eosapi::{Dialect, classify_version};
///
/// assert_eq!(classify_version("4.20.0F"), Dialect::Legacy);
/// assert_eq!(classify_version("4.25.1F"), Dialect::Current);
/// ```
pub fn classify_version(version: &str) -> Dialect {
    if LEGACY_PREFIXES
        .iter()
        .any(|prefix| version.starts_with(prefix))
    {
        Dialect::Legacy
    } else {
        Dialect::Current
    }
}

/// Device identity from `show version`, with its dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionInfo {
    pub raw_version: String,
    pub model: String,
    pub serial_number: String,
    pub hardware_revision: String,
    pub system_mac: String,
    pub uptime: Duration,
    pub dialect: Dialect,
}

impl From<ShowVersion> for VersionInfo {
    fn from(v: ShowVersion) -> Self {
        let dialect = classify_version(&v.version);
        Self {
            raw_version: v.version,
            model: v.model_name,
            serial_number: v.serial_number,
            hardware_revision: v.hardware_revision,
            system_mac: v.system_mac_address,
            uptime: Duration::try_from_secs_f64(v.uptime).unwrap_or_default(),
            dialect,
        }
    }
}
