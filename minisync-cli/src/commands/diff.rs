//! `minisync diff` — what `save` would change on the remote.

use anyhow::{Context, Result};
use colored::Colorize;

use minisync_sync::{ChangeKind, Session, SystemRunner};

use super::open_store;

pub fn run() -> Result<()> {
    let store = open_store()?;
    let report = Session::new(&store, SystemRunner::new())
        .diff()
        .context("dry run failed")?;

    let mut count = 0usize;
    for entry in report.entries() {
        count += 1;
        let marker = match entry.kind {
            ChangeKind::Added => "+".green().bold(),
            ChangeKind::Deleted => "-".red().bold(),
            ChangeKind::Modified => "~".yellow().bold(),
        };
        let kind = entry.kind.to_string();
        println!("{marker} {kind:<8} {}", entry.path);
    }

    if count == 0 {
        println!("Nothing to synchronize.");
    }
    Ok(())
}
