//! Response models for the eAPI commands the core decodes.
//!
//! Only the fields the library reads are modelled; everything else in a
//! response is ignored. A required field missing from a response is a
//! shape mismatch, reported by the dispatcher.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// `show version`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowVersion {
    pub version: String,
    pub model_name: String,
    pub serial_number: String,
    pub hardware_revision: String,
    pub system_mac_address: String,
    pub uptime: f64,
}

/// `show hostname`
#[derive(Debug, Clone, Deserialize)]
pub struct ShowHostname {
    pub hostname: String,
    #[serde(default)]
    pub fqdn: Option<String>,
}

/// `show interfaces counters errors`
#[derive(Debug, Clone, Deserialize)]
pub struct ShowInterfaceErrors {
    #[serde(rename = "interfaceErrorCounters")]
    pub interfaces: IndexMap<String, ErrorCounters>,
}

/// Per-port error counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCounters {
    pub fcs_errors: u64,
    pub alignment_errors: u64,
    pub symbol_errors: u64,
    pub in_errors: u64,
    pub frame_too_shorts: u64,
    pub frame_too_longs: u64,
    pub out_errors: u64,
}

/// `show interfaces counters discards`
#[derive(Debug, Clone, Deserialize)]
pub struct ShowInterfaceDiscards {
    pub interfaces: IndexMap<String, DiscardCounters>,
}

/// Per-port discard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardCounters {
    pub in_discards: u64,
    pub out_discards: u64,
}

/// `show lldp neighbors [<port>]`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowLldpNeighbors {
    pub lldp_neighbors: Vec<LldpNeighbor>,
}

/// One LLDP adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LldpNeighbor {
    pub port: String,
    pub neighbor_device: String,
    pub neighbor_port: String,
    #[serde(default)]
    pub ttl: Option<u32>,
}

/// `show mlag`
///
/// Only `state` is always present; a disabled MLAG omits the rest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowMlag {
    pub state: String,
    #[serde(default)]
    pub neg_status: Option<String>,
    #[serde(default)]
    pub local_intf_status: Option<String>,
    #[serde(default)]
    pub peer_link_status: Option<String>,
    #[serde(default)]
    pub peer_link: Option<String>,
    #[serde(default)]
    pub peer_address: Option<String>,
    #[serde(default)]
    pub config_sanity: Option<String>,
}

/// `show reload cause`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowReloadCause {
    pub reset_causes: Vec<ResetCause>,
}

/// One entry of the reload cause history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetCause {
    pub description: String,
    pub timestamp: f64,
    #[serde(default)]
    pub recommended_action: Option<String>,
    #[serde(default)]
    pub debug_info: Vec<String>,
}

/// `show configuration sessions`
#[derive(Debug, Clone, Deserialize)]
pub struct ShowConfigSessions {
    pub sessions: IndexMap<String, Value>,
}

/// `show vrf` (JSON form, current firmware only)
#[derive(Debug, Clone, Deserialize)]
pub struct ShowVrf {
    pub vrfs: IndexMap<String, Value>,
}

/// `show snmp location` / `show snmp v2-mib location`
#[derive(Debug, Clone, Deserialize)]
pub struct ShowSnmpLocation {
    pub location: String,
}
