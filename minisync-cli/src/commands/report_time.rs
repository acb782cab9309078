//! `minisync report-time` — the peer side of `load` and `status`.

use anyhow::{Context, Result};

use minisync_sync::{Session, SystemRunner};

use super::open_store;

pub fn run() -> Result<()> {
    let store = open_store()?;
    let clock = Session::new(&store, SystemRunner::new())
        .report_time()
        .context("failed to read stored clock")?;
    println!("{}", clock.to_json());
    Ok(())
}
