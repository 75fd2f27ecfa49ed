//! Per-run diagnostics.
//!
//! A [`RunLog`] is created at the start of a workflow, passed by `&mut` to
//! every dispatcher call, and finished once at the end. Each entry is also
//! mirrored to the `log` facade as it is recorded.
//!
//! ```rust,no_run
//! use eosapi::RunLog;
//!
//! # fn example() -> Result<(), eosapi::Error> {
//! let mut log = RunLog::new("get_errors_and_discards");
//! // ... session.execute(&command, &mut log).await ...
//! if let Some(path) = log.finish(std::path::Path::new("/tmp"))? {
//!     println!("Diagnostics written to {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{error, warn};

use crate::classify::ErrorClass;
use crate::error::Result;

/// Timestamp in the log file name.
const FILE_TIMESTAMP: &str = "%Y_%m_%d_%H_%M_%S";

/// Timestamp at the start of each log line.
const LINE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// One recorded failure.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// When the failure was recorded, in local time.
    pub at: DateTime<Local>,

    /// Host the command was sent to.
    pub host: String,

    /// Command text, as submitted.
    pub command: String,

    /// Classified failure.
    pub class: ErrorClass,

    /// Underlying failure message.
    pub detail: String,
}

impl Diagnostic {
    /// `2024-03-05 10:00:00,123 WARNING  [class] ...`
    fn to_line(&self) -> String {
        let (level, what) = if self.class.is_fatal() {
            ("ERROR", "Connection failure")
        } else {
            ("WARNING", "Command failure")
        };
        format!(
            "{} {level:<8} [{}] {what} on {}: [{}] {}",
            self.at.format(LINE_TIMESTAMP),
            self.class,
            self.host,
            self.command,
            self.detail.replace('\n', " ")
        )
    }
}

/// Diagnostics collected over one run.
#[derive(Debug)]
pub struct RunLog {
    name: String,
    started: DateTime<Local>,
    entries: Vec<Diagnostic>,
}

impl RunLog {
    /// Start a log for the named workflow.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started: Local::now(),
            entries: Vec::new(),
        }
    }

    /// Record a classified failure.
    pub fn record(
        &mut self,
        host: impl Into<String>,
        command: impl Into<String>,
        class: ErrorClass,
        detail: impl Into<String>,
    ) {
        let entry = Diagnostic {
            at: Local::now(),
            host: host.into(),
            command: command.into(),
            class,
            detail: detail.into(),
        };

        if class.is_fatal() {
            error!(
                "{}: cannot reach eAPI for [{}]: {}",
                entry.host, entry.command, entry.detail
            );
        } else {
            warn!(
                "{} ({}) for [{}]: {}",
                entry.host, class, entry.command, entry.detail
            );
        }

        self.entries.push(entry);
    }

    /// Workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All entries in recording order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of a given class.
    pub fn count(&self, class: ErrorClass) -> usize {
        self.entries.iter().filter(|e| e.class == class).count()
    }

    /// The first fatal entry, if any.
    pub fn fatal(&self) -> Option<&Diagnostic> {
        self.entries.iter().find(|e| e.class.is_fatal())
    }

    /// Path the log would be written to under `dir`:
    /// `<name>_log_<YYYY_MM_DD_HH_MM_SS>.log`.
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        let stamp = self.started.format(FILE_TIMESTAMP);
        dir.join(format!("{}_log_{stamp}.log", self.name))
    }

    /// Persist the log under `dir`.
    ///
    /// Returns `None` without touching the filesystem when nothing was
    /// recorded. Otherwise the file is written next to its final name and
    /// renamed into place, so a reader never sees a partial log.
    pub fn finish(self, dir: &Path) -> Result<Option<PathBuf>> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(dir)?;
        let path = self.path_in(dir);
        let partial = path.with_extension("log.partial");

        let written = (|| {
            let mut file = fs::File::create(&partial)?;
            for entry in &self.entries {
                writeln!(file, "{}", entry.to_line())?;
            }
            file.sync_all()?;
            fs::rename(&partial, &path)
        })();

        if let Err(err) = written {
            let _ = fs::remove_file(&partial);
            return Err(err.into());
        }

        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    #[test]
    fn test_counts() {
        let mut log = RunLog::new("unit");
        assert!(log.is_empty());
        assert!(log.fatal().is_none());

        log.record(
            "leaf1",
            "show bogus",
            ErrorClass::CommandRejected,
            "invalid command",
        );
        log.record(
            "leaf1",
            "show version",
            ErrorClass::ShapeMismatch,
            "missing field",
        );
        log.record("leaf2", "show version", ErrorClass::Fatal, "dns error");

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(ErrorClass::CommandRejected), 1);
        assert_eq!(log.count(ErrorClass::DecodeFailure), 0);
        assert_eq!(log.fatal().unwrap().host, "leaf2");
    }

    #[test]
    fn test_empty_log_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new("empty");
        let expected = log.path_in(dir.path());

        assert!(log.finish(dir.path()).unwrap().is_none());
        assert!(!expected.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_finish_writes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::new("report");
        log.record(
            "leaf1",
            "show bogus",
            ErrorClass::CommandRejected,
            "invalid\ncommand",
        );

        let path = log.finish(dir.path()).unwrap().unwrap();
        let contents = fs::read_to_string(&path).unwrap();

        let file_name = path.file_name().unwrap().to_str().unwrap();
        let stamp = file_name
            .strip_prefix("report_log_")
            .and_then(|rest| rest.strip_suffix(".log"))
            .unwrap();
        assert!(NaiveDateTime::parse_from_str(stamp, FILE_TIMESTAMP).is_ok());

        assert_eq!(contents.lines().count(), 1);
        let line = contents.lines().next().unwrap();
        assert!(NaiveDateTime::parse_from_str(&line[..23], LINE_TIMESTAMP).is_ok());
        assert_eq!(&line[24..32], "WARNING ");
        assert!(contents.contains("[show bogus]"));
        assert!(contents.contains("invalid command"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::new("blocked");
        log.record(
            "leaf1",
            "show bogus",
            ErrorClass::CommandRejected,
            "invalid",
        );

        // A directory squatting on the final name makes the rename fail.
        let path = log.path_in(dir.path());
        let partial = path.with_extension("log.partial");
        fs::create_dir(&path).unwrap();

        assert!(log.finish(dir.path()).is_err());
        assert!(!partial.exists());
        assert!(path.is_dir());
        assert_eq!(fs::read_dir(&path).unwrap().count(), 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
