//! `minisync load` and `minisync save`.

use anyhow::{Context, Result};

use minisync_sync::{Session, SystemRunner, TransferReport};

use super::open_store;

pub fn load() -> Result<()> {
    let store = open_store()?;
    let report = Session::new(&store, SystemRunner::new())
        .load()
        .context("load failed")?;
    print_report("load", &report);
    Ok(())
}

pub fn save() -> Result<()> {
    let store = open_store()?;
    let report = Session::new(&store, SystemRunner::new())
        .save()
        .context("save failed")?;
    print_report("save", &report);
    Ok(())
}

fn print_report(operation: &str, report: &TransferReport) {
    print!("{}", report.output);
    if !report.output.is_empty() && !report.output.ends_with('\n') {
        println!();
    }
    println!(
        "✓ {operation} complete ({}), clock {}",
        report.direction, report.clock
    );
}
