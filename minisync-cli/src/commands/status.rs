//! `minisync status` — compare this host's clock with the remote's.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use minisync_sync::{Session, StatusReport, SystemRunner, Verdict};

use super::open_store;

/// Arguments for `minisync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let store = open_store()?;
        let report = Session::new(&store, SystemRunner::new())
            .status()
            .context("failed to query the remote clock")?;

        if self.json {
            print_json(&report)?;
        } else {
            print_table(&report);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusJson<'a> {
    #[serde(flatten)]
    report: &'a StatusReport,
    message: &'static str,
}

#[derive(Tabled)]
struct ClockRow {
    #[tabled(rename = "host")]
    host: &'static str,
    #[tabled(rename = "clock")]
    clock: String,
}

fn print_json(report: &StatusReport) -> Result<()> {
    let payload = StatusJson {
        report,
        message: report.verdict.message(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: &StatusReport) {
    let rows = vec![
        ClockRow {
            host: "this host",
            clock: report.mine.to_string(),
        },
        ClockRow {
            host: "remote",
            clock: report.theirs.to_string(),
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let message = report.verdict.message();
    let line = match report.verdict {
        Verdict::MineOlder => message.yellow().bold(),
        Verdict::InSync => message.green().bold(),
        Verdict::MineNewer => message.cyan().bold(),
    };
    println!("{line}");

    if let Some(operation) = report.verdict.suggested_operation() {
        println!("Run 'minisync {operation}' to reconcile.");
    }
}
