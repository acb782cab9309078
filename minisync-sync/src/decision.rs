//! Stale-side decisions and passive clock reconciliation.
//!
//! [`decide`] turns a clock comparison into a [`Verdict`]. It never starts a
//! transfer; callers decide what to do with the answer.
//!
//! [`reconcile`] detects local edits made outside the tool: the newest file
//! modification time under the client directory replaces the stored clock
//! when, and only when, it is strictly newer.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::time::SystemTime;

use serde::Serialize;
use walkdir::WalkDir;

use minisync_core::{compare, LogicalClock};

use crate::{error::io_err, SyncError};

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Three-way outcome of comparing this host's clock with the peer's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    /// This host is behind; `load` is indicated.
    MineOlder,
    /// No transfer is required.
    InSync,
    /// This host is ahead; `save` is indicated.
    MineNewer,
}

impl Verdict {
    pub fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Verdict::MineOlder,
            Ordering::Equal => Verdict::InSync,
            Ordering::Greater => Verdict::MineNewer,
        }
    }

    /// Human-readable summary for `status`.
    pub fn message(self) -> &'static str {
        match self {
            Verdict::MineOlder => "This host is outdated",
            Verdict::InSync => "Both hosts are in sync",
            Verdict::MineNewer => "This host is ahead of the remote",
        }
    }

    /// Operation that would resolve the difference, if any.
    pub fn suggested_operation(self) -> Option<&'static str> {
        match self {
            Verdict::MineOlder => Some("load"),
            Verdict::InSync => None,
            Verdict::MineNewer => Some("save"),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::MineOlder => write!(f, "mine-older"),
            Verdict::InSync => write!(f, "in-sync"),
            Verdict::MineNewer => write!(f, "mine-newer"),
        }
    }
}

/// Compare this host's clock (`mine`) against the peer's (`theirs`).
pub fn decide(mine: &LogicalClock, theirs: &LogicalClock) -> Verdict {
    Verdict::from_ordering(compare(mine, theirs))
}

// ---------------------------------------------------------------------------
// Passive reconciliation
// ---------------------------------------------------------------------------

/// Result of checking the filesystem against the stored clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// A file is newer than the stored clock; `to` replaces `from`.
    Advanced {
        from: LogicalClock,
        to: LogicalClock,
    },
    /// Files exist but none is newer than the stored clock.
    Unchanged { observed: LogicalClock },
    /// The directory holds no regular files (or does not exist).
    NoFiles,
}

impl Reconciliation {
    /// The clock to store after reconciliation.
    pub fn resulting_clock(&self, stored: LogicalClock) -> LogicalClock {
        match self {
            Reconciliation::Advanced { to, .. } => *to,
            Reconciliation::Unchanged { .. } | Reconciliation::NoFiles => stored,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, Reconciliation::Advanced { .. })
    }
}

/// Check `directory` for edits newer than `stored`.
pub fn reconcile(stored: &LogicalClock, directory: &Path) -> Result<Reconciliation, SyncError> {
    let Some(latest) = latest_modification(directory)? else {
        tracing::warn!(
            "no files under {}; keeping stored clock {stored}",
            directory.display()
        );
        return Ok(Reconciliation::NoFiles);
    };

    let observed = LogicalClock::from_modification_time(latest);
    if compare(&observed, stored) == Ordering::Greater {
        tracing::info!("local edits detected: clock {stored} -> {observed}");
        Ok(Reconciliation::Advanced {
            from: *stored,
            to: observed,
        })
    } else {
        tracing::debug!("newest local file ({observed}) is not newer than {stored}");
        Ok(Reconciliation::Unchanged { observed })
    }
}

/// Newest modification time of any regular file under `directory`.
///
/// Returns `None` for a missing directory or one without files.
pub fn latest_modification(directory: &Path) -> Result<Option<SystemTime>, SyncError> {
    if !directory.exists() {
        return Ok(None);
    }

    let mut latest: Option<SystemTime> = None;
    for entry in WalkDir::new(directory) {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| directory.to_path_buf());
            io_err(path, err.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .map_err(|err| io_err(entry.path(), err.into()))?
            .modified()
            .map_err(|err| io_err(entry.path(), err))?;
        latest = Some(latest.map_or(modified, |current| current.max(modified)));
    }
    Ok(latest)
}
