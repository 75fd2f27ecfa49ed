//! # eosapi
//!
//! Async Arista eAPI client core for switch reporting tools.
//!
//! eosapi talks JSON-RPC to the management API of EOS switches and keeps
//! the failure handling of multi-host workflows in one place: every failed
//! command is classified, recorded once in a [`RunLog`], and returned as an
//! absent result so the workflow can move on.
//!
//! ## Features
//!
//! - One [`Session`] per host with cached firmware version and dialect
//! - Privileged, batch and configuration command modes
//! - Ordered failure classification ([`ErrorClass`])
//! - Interface counter snapshots and diffs ([`counters`])
//! - Typed device operations in place of dynamic invocation ([`operations`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eosapi::{RunLog, SessionBuilder};
//! use eosapi::counters::{CounterKind, diff};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), eosapi::Error> {
//!     let session = SessionBuilder::new("leaf1.lab")
//!         .username("admin")
//!         .password("secret")
//!         .open()?;
//!     let mut log = RunLog::new("discards");
//!
//!     let before = session.poll_counters(CounterKind::Discards, &mut log).await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(20)).await;
//!     let after = session.poll_counters(CounterKind::Discards, &mut log).await?;
//!
//!     if let (Some(before), Some(after)) = (before, after) {
//!         for alert in diff(&before, &after)?.alerts() {
//!             println!("{alert}");
//!         }
//!     }
//!
//!     log.finish(std::path::Path::new("."))?;
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod counters;
pub mod device;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod operations;
pub mod session;
pub mod transport;
pub mod version;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use classify::{ErrorClass, classify};
pub use counters::{CounterKind, Snapshot, diff};
pub use diagnostics::RunLog;
pub use dispatch::{Command, CommandResult, Mode};
pub use error::Error;
pub use operations::{Operation, OperationTable};
pub use session::{Session, SessionBuilder};
pub use transport::{Credentials, Encoding, TransportKind};
pub use version::{Dialect, VersionInfo, classify_version};
