//! Dry-run change classification for `minisync diff`.
//!
//! `rsync --itemize-changes` prints one line per affected path. Lines are
//! matched against [`RULES`] in order and the first matching prefix wins, so
//! specific markers (`<f+++++++++`) must precede the generic ones (`<f`)
//! they extend.

use std::fmt;
use std::str::Lines;

use crate::exec::CommandRunner;
use crate::transfer::{self, Direction};
use crate::SyncError;
use minisync_core::Configuration;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "added"),
            ChangeKind::Deleted => write!(f, "deleted"),
            ChangeKind::Modified => write!(f, "modified"),
        }
    }
}

/// One classified line of a dry-run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub kind: ChangeKind,
    pub path: String,
}

impl ChangeEntry {
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// What to do with a line whose prefix matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    Classify(ChangeKind),
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixRule {
    pub prefix: &'static str,
    pub action: LineAction,
}

const fn rule(prefix: &'static str, action: LineAction) -> PrefixRule {
    PrefixRule { prefix, action }
}

/// Ordered classification rules; first match wins.
pub const RULES: &[PrefixRule] = &[
    rule("*deleting", LineAction::Classify(ChangeKind::Deleted)),
    rule("<f+++++++++", LineAction::Classify(ChangeKind::Added)),
    rule(">f+++++++++", LineAction::Classify(ChangeKind::Added)),
    rule("<f", LineAction::Classify(ChangeKind::Modified)),
    rule(">f", LineAction::Classify(ChangeKind::Modified)),
    rule("sending incremental file list", LineAction::Skip),
    rule("receiving incremental file list", LineAction::Skip),
];

/// Classify a single report line. Unmatched and skipped lines yield `None`.
pub fn classify_line(line: &str) -> Option<ChangeEntry> {
    let line = line.trim_end_matches('\r');
    let matched = RULES.iter().find(|r| line.starts_with(r.prefix))?;
    match matched.action {
        LineAction::Skip => None,
        LineAction::Classify(kind) => {
            let path = path_after_marker(&line[matched.prefix.len()..]);
            if path.is_empty() {
                return None;
            }
            Some(ChangeEntry::new(kind, path))
        }
    }
}

/// Drop the rest of the itemize code, then the separating whitespace.
fn path_after_marker(rest: &str) -> &str {
    rest.trim_start_matches(|c: char| !c.is_whitespace())
        .trim_start()
}

// ---------------------------------------------------------------------------
// Lazy sequence
// ---------------------------------------------------------------------------

/// Single-pass iterator over the classified lines of a report.
#[derive(Debug)]
pub struct ChangeLines<'a> {
    lines: Lines<'a>,
}

impl<'a> Iterator for ChangeLines<'a> {
    type Item = ChangeEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.by_ref().find_map(classify_line)
    }
}

/// Classify a whole dry-run report.
pub fn classify(output: &str) -> ChangeLines<'_> {
    ChangeLines {
        lines: output.lines(),
    }
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// Captured dry-run report; classify it with [`DiffReport::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport {
    pub command: String,
    pub output: String,
}

impl DiffReport {
    pub fn entries(&self) -> ChangeLines<'_> {
        classify(&self.output)
    }

    /// `true` when the report has no classified changes.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// Run the push-direction mirror in dry-run, itemized mode.
///
/// Shows what `save` would change on the peer. Nothing is copied.
pub fn dry_run<R: CommandRunner>(
    runner: &mut R,
    config: &Configuration,
) -> Result<DiffReport, SyncError> {
    let command = transfer::mirror_command(config, Direction::Push, true)?;
    let output = transfer::run_mirror(runner, &command)?;
    Ok(DiffReport {
        command,
        output: output.stdout,
    })
}
