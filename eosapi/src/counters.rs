//! Interface counter snapshots and two-sample diffs.
//!
//! A [`Snapshot`] is an immutable reading of one counter kind across all
//! ports. [`diff`] subtracts two snapshots port by port and
//! [`CounterDiff::alerts`] reports every port whose counters moved, field
//! by field.
//!
//! # Example
//!
//! ```
//! use eosapi::counters::{CounterKind, Snapshot, diff};
//!
//! # fn example() -> Result<(), eosapi::error::DiffError> {
//! let first = Snapshot::builder(CounterKind::Discards).port("Et5", [0, 0])?.build();
//! let second = Snapshot::builder(CounterKind::Discards).port("Et5", [0, 3])?.build();
//!
//! let alerts = diff(&first, &second)?.alerts();
//! assert_eq!(alerts.len(), 1);
//! assert_eq!(alerts[0].port, "Et5");
//! assert_eq!(alerts[0].changes[0].field, "Out");
//! assert_eq!(alerts[0].changes[0].delta, 3);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::ops::Neg;
use std::time::{Duration, SystemTime};

use indexmap::IndexMap;

use crate::error::DiffError;
use crate::models::{DiscardCounters, ErrorCounters, ShowInterfaceDiscards, ShowInterfaceErrors};

const ERROR_FIELDS: &[&str] = &["FCS", "Alignment", "Symbol", "Rx", "Runts", "Giants", "Tx"];
const DISCARD_FIELDS: &[&str] = &["In", "Out"];

/// Which counter set a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    /// `show interfaces counters errors`
    Errors,

    /// `show interfaces counters discards`
    Discards,
}

impl CounterKind {
    /// Field names, in sample order.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            CounterKind::Errors => ERROR_FIELDS,
            CounterKind::Discards => DISCARD_FIELDS,
        }
    }

    /// Number of counters per port.
    pub fn arity(&self) -> usize {
        self.fields().len()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKind::Errors => "errors",
            CounterKind::Discards => "discards",
        }
    }

    /// Command that reads this counter set.
    pub fn command(&self) -> &'static str {
        match self {
            CounterKind::Errors => "show interfaces counters errors",
            CounterKind::Discards => "show interfaces counters discards",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one port, in the order given by [`CounterKind::fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSample(Vec<u64>);

impl CounterSample {
    pub fn values(&self) -> &[u64] {
        &self.0
    }

    /// True if every counter is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }
}

impl From<ErrorCounters> for CounterSample {
    fn from(c: ErrorCounters) -> Self {
        CounterSample(vec![
            c.fcs_errors,
            c.alignment_errors,
            c.symbol_errors,
            c.in_errors,
            c.frame_too_shorts,
            c.frame_too_longs,
            c.out_errors,
        ])
    }
}

impl From<DiscardCounters> for CounterSample {
    fn from(c: DiscardCounters) -> Self {
        CounterSample(vec![c.in_discards, c.out_discards])
    }
}

/// An immutable, timestamped reading of one counter kind across ports.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    kind: CounterKind,
    taken_at: SystemTime,
    ports: IndexMap<String, CounterSample>,
}

impl Snapshot {
    /// Start building a snapshot taken now.
    pub fn builder(kind: CounterKind) -> SnapshotBuilder {
        SnapshotBuilder {
            kind,
            taken_at: SystemTime::now(),
            ports: IndexMap::new(),
        }
    }

    /// Snapshot of `show interfaces counters errors`.
    pub fn from_errors(show: &ShowInterfaceErrors) -> Self {
        Self {
            kind: CounterKind::Errors,
            taken_at: SystemTime::now(),
            ports: show
                .interfaces
                .iter()
                .map(|(port, counters)| (port.clone(), (*counters).into()))
                .collect(),
        }
    }

    /// Snapshot of `show interfaces counters discards`.
    pub fn from_discards(show: &ShowInterfaceDiscards) -> Self {
        Self {
            kind: CounterKind::Discards,
            taken_at: SystemTime::now(),
            ports: show
                .interfaces
                .iter()
                .map(|(port, counters)| (port.clone(), (*counters).into()))
                .collect(),
        }
    }

    pub fn kind(&self) -> CounterKind {
        self.kind
    }

    pub fn taken_at(&self) -> SystemTime {
        self.taken_at
    }

    /// Sample for one port.
    pub fn get(&self, port: &str) -> Option<&CounterSample> {
        self.ports.get(port)
    }

    /// Ports and samples, in device order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CounterSample)> {
        self.ports
            .iter()
            .map(|(port, sample)| (port.as_str(), sample))
    }

    /// Ports with at least one non-zero counter.
    pub fn nonzero(&self) -> impl Iterator<Item = (&str, &CounterSample)> {
        self.iter().filter(|(_, sample)| !sample.is_zero())
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

/// Builder for hand-assembled snapshots.
#[derive(Debug)]
pub struct SnapshotBuilder {
    kind: CounterKind,
    taken_at: SystemTime,
    ports: IndexMap<String, CounterSample>,
}

impl SnapshotBuilder {
    /// Override the timestamp.
    pub fn taken_at(mut self, at: SystemTime) -> Self {
        self.taken_at = at;
        self
    }

    /// Add a port. Rejects duplicates and samples of the wrong length.
    pub fn port(
        mut self,
        port: impl Into<String>,
        values: impl Into<Vec<u64>>,
    ) -> Result<Self, DiffError> {
        let port = port.into();
        let values = values.into();

        if values.len() != self.kind.arity() {
            return Err(DiffError::Arity {
                port,
                expected: self.kind.arity(),
                actual: values.len(),
            });
        }
        if self.ports.contains_key(&port) {
            return Err(DiffError::DuplicatePort { port });
        }

        self.ports.insert(port, CounterSample(values));
        Ok(self)
    }

    pub fn build(self) -> Snapshot {
        Snapshot {
            kind: self.kind,
            taken_at: self.taken_at,
            ports: self.ports,
        }
    }
}

/// Signed per-field change for one port.
///
/// Widened to `i128` so any pair of `u64` readings, a counter reset
/// included, subtracts exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta(Vec<i128>);

impl Delta {
    pub fn values(&self) -> &[i128] {
        &self.0
    }

    /// True if no field changed.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }
}

impl Neg for Delta {
    type Output = Delta;

    fn neg(self) -> Delta {
        Delta(self.0.into_iter().map(|v| -v).collect())
    }
}

/// Result of subtracting one snapshot from another.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterDiff {
    kind: CounterKind,
    interval: Option<Duration>,
    deltas: IndexMap<String, Delta>,
}

impl CounterDiff {
    pub fn kind(&self) -> CounterKind {
        self.kind
    }

    /// Time between the two snapshots, if the second was taken later.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Delta for one port.
    pub fn get(&self, port: &str) -> Option<&Delta> {
        self.deltas.get(port)
    }

    /// Ports and deltas, in the first snapshot's order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Delta)> {
        self.deltas
            .iter()
            .map(|(port, delta)| (port.as_str(), delta))
    }

    /// One alert per port whose counters changed.
    pub fn alerts(&self) -> Vec<Alert> {
        let fields = self.kind.fields();
        self.deltas
            .iter()
            .filter(|(_, delta)| !delta.is_zero())
            .map(|(port, delta)| Alert {
                port: port.clone(),
                kind: self.kind,
                changes: fields
                    .iter()
                    .zip(delta.values())
                    .filter(|(_, d)| **d != 0)
                    .map(|(&field, &delta)| FieldChange { field, delta })
                    .collect(),
            })
            .collect()
    }
}

/// A counter that moved between snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub delta: i128,
}

/// A port that needs attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub port: String,
    pub kind: CounterKind,
    pub changes: Vec<FieldChange>,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interface: {} saw new {}.", self.port, self.kind)?;
        for change in &self.changes {
            write!(f, " {}: {:+}", change.field, change.delta)?;
        }
        Ok(())
    }
}

/// Subtract `a` from `b` for every port in `a`.
///
/// Every port of `a` must be present in `b`; missing ports are reported
/// together as [`DiffError::MissingPort`]. Ports only in `b` are ignored.
/// Neither snapshot is modified.
pub fn diff(a: &Snapshot, b: &Snapshot) -> Result<CounterDiff, DiffError> {
    if a.kind != b.kind {
        return Err(DiffError::KindMismatch {
            left: a.kind.as_str(),
            right: b.kind.as_str(),
        });
    }

    let missing: Vec<String> = a
        .ports
        .keys()
        .filter(|port| !b.ports.contains_key(*port))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(DiffError::MissingPort { ports: missing });
    }

    let deltas = a
        .ports
        .iter()
        .filter_map(|(port, before)| {
            let after = b.ports.get(port)?;
            let delta = after
                .0
                .iter()
                .zip(&before.0)
                .map(|(&after, &before)| i128::from(after) - i128::from(before))
                .collect();
            Some((port.clone(), Delta(delta)))
        })
        .collect();

    Ok(CounterDiff {
        kind: a.kind,
        interval: b.taken_at.duration_since(a.taken_at).ok(),
        deltas,
    })
}
