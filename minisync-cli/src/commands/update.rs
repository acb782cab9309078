//! `minisync update [ENCODED]`
//!
//! With an argument this is the peer side of `save`; without one it re-derives
//! the clock from local modification times.

use anyhow::{Context, Result};
use clap::Args;

use minisync_sync::{Reconciliation, Session, SystemRunner, UpdateOutcome};

use super::open_store;

/// Arguments for `minisync update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Clock produced by the remote's `save` (base64url JSON).
    pub encoded: Option<String>,
}

impl UpdateArgs {
    pub fn run(self) -> Result<()> {
        let store = open_store()?;
        let mut session = Session::new(&store, SystemRunner::new());
        let outcome = session
            .update(self.encoded.as_deref())
            .context("update failed")?;

        match outcome {
            UpdateOutcome::Adopted { previous, clock } => {
                println!("✓ clock set to {clock} (was {previous})");
            }
            UpdateOutcome::Reconciled(Reconciliation::Advanced { from, to }) => {
                println!("✓ local edits detected: clock {from} -> {to}");
            }
            UpdateOutcome::Reconciled(Reconciliation::Unchanged { observed }) => {
                println!("· no edits newer than the stored clock (newest file: {observed})");
            }
            UpdateOutcome::Reconciled(Reconciliation::NoFiles) => {
                println!("· no files found; clock unchanged");
            }
        }
        Ok(())
    }
}
