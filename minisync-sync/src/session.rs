//! Top-level operations shared by the CLI and the peer-side handlers.
//!
//! Each operation reads the configuration once and, if it mutates anything,
//! writes it once at the very end. A failure anywhere in between leaves the
//! stored document untouched.

use serde::Serialize;

use minisync_core::{ConfigStore, Configuration, LogicalClock};

use crate::decision::{decide, reconcile, Reconciliation, Verdict};
use crate::diff::{self, DiffReport};
use crate::exec::CommandRunner;
use crate::transfer::{self, TransferReport};
use crate::SyncError;

/// Both clocks and the verdict, as shown by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub mine: LogicalClock,
    pub theirs: LogicalClock,
    pub verdict: Verdict,
}

/// What `update` did to the stored clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// An encoded clock from the peer was adopted.
    Adopted {
        previous: LogicalClock,
        clock: LogicalClock,
    },
    /// The clock was re-derived from local modification times.
    Reconciled(Reconciliation),
}

/// A configuration store paired with a command runner.
pub struct Session<'a, R> {
    store: &'a ConfigStore,
    runner: R,
}

impl<'a, R: CommandRunner> Session<'a, R> {
    pub fn new(store: &'a ConfigStore, runner: R) -> Self {
        Self { store, runner }
    }

    pub fn store(&self) -> &ConfigStore {
        self.store
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Compare the stored clock with the peer's. Read-only.
    pub fn status(&mut self) -> Result<StatusReport, SyncError> {
        let config = self.read_validated()?;
        let theirs = transfer::fetch_remote_clock(&mut self.runner, &config)?;
        let verdict = decide(&config.time, &theirs);
        tracing::debug!("status: mine {} theirs {theirs} -> {verdict}", config.time);
        Ok(StatusReport {
            mine: config.time,
            theirs,
            verdict,
        })
    }

    /// Pull from the peer and adopt its clock.
    pub fn load(&mut self) -> Result<TransferReport, SyncError> {
        let mut config = self.read_validated()?;
        let report = transfer::load(&mut self.runner, &mut config)?;
        self.store.write(&config)?;
        Ok(report)
    }

    /// Push to the peer with a fresh clock.
    pub fn save(&mut self) -> Result<TransferReport, SyncError> {
        let mut config = self.read_validated()?;
        let report = transfer::save(&mut self.runner, &mut config)?;
        self.store.write(&config)?;
        Ok(report)
    }

    /// Dry-run the push mirror. Read-only.
    pub fn diff(&mut self) -> Result<DiffReport, SyncError> {
        let config = self.read_validated()?;
        diff::dry_run(&mut self.runner, &config)
    }

    /// Adopt `encoded` if given, otherwise reconcile with the filesystem.
    ///
    /// Only writes when the stored clock actually changes.
    pub fn update(&mut self, encoded: Option<&str>) -> Result<UpdateOutcome, SyncError> {
        let mut config = self.store.read()?;
        match encoded {
            Some(encoded) => {
                let clock = LogicalClock::decode(encoded)?;
                let previous = config.time;
                config.time = clock;
                self.store.write(&config)?;
                tracing::info!("adopted clock {clock} (was {previous})");
                Ok(UpdateOutcome::Adopted { previous, clock })
            }
            None => {
                let outcome = reconcile(&config.time, &config.client_directory)?;
                if outcome.changed() {
                    config.time = outcome.resulting_clock(config.time);
                    self.store.write(&config)?;
                }
                Ok(UpdateOutcome::Reconciled(outcome))
            }
        }
    }

    /// The stored clock, for the peer's `load`/`status`.
    pub fn report_time(&self) -> Result<LogicalClock, SyncError> {
        Ok(self.store.read()?.time)
    }

    fn read_validated(&self) -> Result<Configuration, SyncError> {
        let config = self.store.read()?;
        config.validate()?;
        Ok(config)
    }
}
