//! Device queries used by the reporting tools.
//!
//! Each query is a thin wrapper over the dispatcher. They all return
//! `Ok(None)` when the command failed recoverably (the reason is in the
//! [`RunLog`]) and `Err` only when the host is unreachable.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::counters::{CounterKind, Snapshot};
use crate::diagnostics::RunLog;
use crate::dispatch::Command;
use crate::error::{OperationError, Result};
use crate::models::{
    LldpNeighbor, ShowConfigSessions, ShowHostname, ShowInterfaceDiscards, ShowInterfaceErrors,
    ShowLldpNeighbors, ShowMlag, ShowReloadCause, ShowSnmpLocation, ShowVrf,
};
use crate::operations::Operation;
use crate::session::Session;
use crate::transport::Connector;
use crate::version::Dialect;

static REVISION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"revision\s+(\S+)").expect("revision pattern")
});

static FLASH_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.\-]+(/[\w.\-]+)*$").expect("filename pattern")
});

/// Sections of `show inventory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventorySection {
    /// Transceiver slots.
    Interfaces,
    /// Power supply slots.
    Power,
    /// Storage devices.
    Storage,
    /// Chassis information.
    System,
    /// Line card slots.
    Linecards,
}

impl InventorySection {
    fn key(&self) -> &'static str {
        match self {
            InventorySection::Interfaces => "xcvrSlots",
            InventorySection::Power => "powerSupplySlots",
            InventorySection::Storage => "storageDevices",
            InventorySection::System => "systemInformation",
            InventorySection::Linecards => "cardSlots",
        }
    }
}

/// Which banner to read a revision marker from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Login,
    Motd,
}

impl BannerKind {
    fn command(&self) -> &'static str {
        match self {
            BannerKind::Login => "show banner login",
            BannerKind::Motd => "show banner motd",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            BannerKind::Login => "loginBanner",
            BannerKind::Motd => "motd",
        }
    }
}

/// Revision marker found in a banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerRevision {
    /// `revision <value>` was found.
    Revision(String),
    /// The banner is empty.
    Missing,
    /// The banner has text but no revision marker.
    Malformed,
}

impl BannerRevision {
    /// Parse a banner's text.
    pub fn parse(banner: &str) -> Self {
        if banner.trim().is_empty() {
            return BannerRevision::Missing;
        }
        match REVISION.captures(banner) {
            Some(caps) => BannerRevision::Revision(caps[1].to_string()),
            None => BannerRevision::Malformed,
        }
    }
}

/// VRF the management interface lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagementVrf {
    Management,
    Default,
}

impl ManagementVrf {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagementVrf::Management => "management",
            ManagementVrf::Default => "default",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShowPortChannels {
    port_channels: IndexMap<String, Value>,
}

impl<C: Connector> Session<C> {
    /// Short hostname from `show hostname`.
    pub async fn hostname(&self, log: &mut RunLog) -> Result<Option<String>> {
        let command = Command::enable("show hostname");
        let show: Option<ShowHostname> = self.try_query(&command, log).await?;
        Ok(show.map(|s| s.hostname))
    }

    /// `show interfaces counters errors`
    pub async fn interface_errors(
        &self,
        log: &mut RunLog,
    ) -> Result<Option<ShowInterfaceErrors>> {
        let command = Command::enable(CounterKind::Errors.command());
        self.try_query(&command, log).await
    }

    /// `show interfaces counters discards`
    pub async fn interface_discards(
        &self,
        log: &mut RunLog,
    ) -> Result<Option<ShowInterfaceDiscards>> {
        let command = Command::enable(CounterKind::Discards.command());
        self.try_query(&command, log).await
    }

    /// Read one counter set into a snapshot.
    ///
    /// `Ok(None)` means the read failed; it never stands in for all-zero counters.
    pub async fn poll_counters(
        &self,
        kind: CounterKind,
        log: &mut RunLog,
    ) -> Result<Option<Snapshot>> {
        Ok(match kind {
            CounterKind::Errors => self
                .interface_errors(log)
                .await?
                .map(|show| Snapshot::from_errors(&show)),
            CounterKind::Discards => self
                .interface_discards(log)
                .await?
                .map(|show| Snapshot::from_discards(&show)),
        })
    }

    /// `show interfaces status`, keyed by interface.
    pub async fn interfaces_status(&self, log: &mut RunLog) -> Result<Option<Value>> {
        let command = Command::enable("show interfaces status");
        self.try_select(&command, "interfaceStatuses", log).await
    }

    /// LLDP neighbors, optionally for one port only.
    pub async fn lldp_neighbors(
        &self,
        port: Option<&str>,
        log: &mut RunLog,
    ) -> Result<Option<Vec<LldpNeighbor>>> {
        let command = match port {
            Some(port) => Command::enable(format!("show lldp neighbors {port}")),
            None => Command::enable("show lldp neighbors"),
        };
        let show: Option<ShowLldpNeighbors> = self.try_query(&command, log).await?;
        Ok(show.map(|s| s.lldp_neighbors))
    }

    /// `show mlag`
    pub async fn mlag(&self, log: &mut RunLog) -> Result<Option<ShowMlag>> {
        self.try_query(&Command::enable("show mlag"), log).await
    }

    /// One section of `show inventory`.
    pub async fn inventory(
        &self,
        section: InventorySection,
        log: &mut RunLog,
    ) -> Result<Option<Value>> {
        let command = Command::enable("show inventory");
        self.try_select(&command, section.key(), log).await
    }

    /// `show environment power`, keyed by supply.
    pub async fn power_supplies(&self, log: &mut RunLog) -> Result<Option<Value>> {
        let command = Command::enable("show environment power");
        self.try_select(&command, "powerSupplies", log).await
    }

    /// `show reload cause`
    pub async fn reload_cause(&self, log: &mut RunLog) -> Result<Option<ShowReloadCause>> {
        let command = Command::enable("show reload cause");
        self.try_query(&command, log).await
    }

    /// IPv4 ARP entries.
    pub async fn arp(&self, log: &mut RunLog) -> Result<Option<Value>> {
        let command = Command::enable("show ip arp");
        self.try_select(&command, "ipV4Neighbors", log).await
    }

    /// IPv6 neighbor entries.
    pub async fn ipv6_neighbors(&self, log: &mut RunLog) -> Result<Option<Value>> {
        let command = Command::enable("show ipv6 neighbors");
        self.try_select(&command, "ipV6Neighbors", log).await
    }

    /// Installed extensions.
    pub async fn extensions(&self, log: &mut RunLog) -> Result<Option<Value>> {
        let command = Command::enable("show extensions");
        self.try_select(&command, "extensions", log).await
    }

    /// `show port-channel summary`, keyed by port-channel.
    pub async fn port_channel_summary(&self, log: &mut RunLog) -> Result<Option<Value>> {
        let command = Command::enable("show port-channel summary");
        self.try_select(&command, "portChannels", log).await
    }

    /// Details for one port-channel, e.g. `Port-Channel10`.
    ///
    /// `Ok(None)` also when the device has no such port-channel.
    pub async fn port_channel(&self, name: &str, log: &mut RunLog) -> Result<Option<Value>> {
        let number = name.strip_prefix("Port-Channel").unwrap_or(name);
        let command = Command::enable(format!("show port-channel {number}"));
        let show: Option<ShowPortChannels> = self.try_query(&command, log).await?;

        let key = format!("Port-Channel{number}");
        Ok(show.and_then(|mut s| s.port_channels.shift_remove(&key)))
    }

    /// `dir flash:` as printed by the CLI.
    pub async fn flash_listing(&self, log: &mut RunLog) -> Result<Option<String>> {
        self.try_text("dir flash:", log).await
    }

    /// Filesystem usage (`df -lh`) as printed by the shell.
    pub async fn storage_usage(&self, log: &mut RunLog) -> Result<Option<String>> {
        self.try_text("bash timeout 2 sudo df -lh", log).await
    }

    /// Overlay filesystem usage.
    pub async fn overlay_usage(&self, log: &mut RunLog) -> Result<Option<String>> {
        self.try_text("bash timeout 2 sudo df -lh /.overlay", log)
            .await
    }

    /// Modification date of a file on flash, as printed by `date -r`.
    pub async fn file_date(&self, filename: &str, log: &mut RunLog) -> Result<Option<String>> {
        if !FLASH_FILENAME.is_match(filename) || filename.contains("..") {
            return Err(OperationError::InvalidArgument {
                name: "filename".to_string(),
                value: filename.to_string(),
                reason: "expected a plain path under /mnt/flash".to_string(),
            }
            .into());
        }
        let command = format!("bash timeout 2 sudo date -r /mnt/flash/{filename}");
        let date = self.try_text(&command, log).await?;
        Ok(date.map(|d| d.trim().to_string()))
    }

    /// Run a CLI command on the peer supervisor and return its text output.
    pub async fn peer_supervisor(
        &self,
        command: &str,
        log: &mut RunLog,
    ) -> Result<Option<String>> {
        if command.contains(['"', '\\', '`', '$']) {
            return Err(OperationError::InvalidArgument {
                name: "command".to_string(),
                value: command.to_string(),
                reason: "shell metacharacters are not allowed".to_string(),
            }
            .into());
        }
        let line = format!("bash timeout 10 Cli -p15 -c \"session peer-supervisor {command}\"");
        self.try_text(&line, log).await
    }

    /// Which VRF holds management traffic.
    ///
    /// Legacy firmware only lists VRFs as text.
    pub async fn management_vrf(
        &self,
        dialect: Dialect,
        log: &mut RunLog,
    ) -> Result<Option<ManagementVrf>> {
        let has_management = match dialect {
            Dialect::Legacy => self
                .try_text("show vrf", log)
                .await?
                .map(|text| text.contains("management")),
            Dialect::Current => {
                let command = Command::enable("show vrf");
                let show: Option<ShowVrf> = self.try_query(&command, log).await?;
                show.map(|s| s.vrfs.contains_key("management"))
            }
        };
        Ok(has_management.map(|found| {
            if found {
                ManagementVrf::Management
            } else {
                ManagementVrf::Default
            }
        }))
    }

    /// Configured SNMP location.
    pub async fn snmp_location(
        &self,
        dialect: Dialect,
        log: &mut RunLog,
    ) -> Result<Option<String>> {
        let command = match dialect {
            Dialect::Legacy => Command::enable("show snmp location"),
            Dialect::Current => Command::enable("show snmp v2-mib location"),
        };
        let show: Option<ShowSnmpLocation> = self.try_query(&command, log).await?;
        Ok(show.map(|s| s.location))
    }

    /// Revision marker from the login or MOTD banner.
    pub async fn banner_revision(
        &self,
        kind: BannerKind,
        log: &mut RunLog,
    ) -> Result<Option<BannerRevision>> {
        let command = Command::enable(kind.command());
        let banner = self.try_select(&command, kind.key(), log).await?;
        Ok(banner.map(|value| match value.as_str() {
            Some(text) => BannerRevision::parse(text),
            None => BannerRevision::Missing,
        }))
    }

    /// `copy running-config startup-config`
    pub async fn copy_run_start(&self, log: &mut RunLog) -> Result<bool> {
        let result = self.invoke(&Operation::CopyRunningToStartup, log).await?;
        Ok(result.is_some())
    }

    /// Remove every pending configuration session. Returns how many were removed.
    pub async fn cleanup_config_sessions(&self, log: &mut RunLog) -> Result<Option<usize>> {
        let command = Command::enable("show configuration sessions");
        let show: Option<ShowConfigSessions> = self.try_query(&command, log).await?;
        let Some(show) = show else {
            return Ok(None);
        };

        let mut removed = 0;
        for name in show.sessions.keys() {
            let operation = Operation::RemoveConfigSession { name: name.clone() };
            if self.invoke(&operation, log).await?.is_some() {
                removed += 1;
            }
        }
        Ok(Some(removed))
    }

    async fn try_text(&self, command: &str, log: &mut RunLog) -> Result<Option<String>> {
        let command = Command::enable_text(command);
        let result = self.try_execute(&command, log).await?;
        Ok(result.and_then(|r| r.into_text()))
    }
}
