//! Clock exchange and mirror transfers.
//!
//! ## `load` — pull
//!
//! 1. Run `<remote> report-time` on the peer and parse its clock.
//! 2. Adopt it unconditionally.
//! 3. Mirror remote → local with `--delete`.
//!
//! ## `save` — push
//!
//! 1. Capture the local wall clock and adopt it.
//! 2. Run `<remote> update <encoded>` on the peer.
//! 3. Mirror local → remote with `--delete`.
//!
//! Both directions delete destination-only files whatever the verdict says:
//! only one side is edited between syncs. The functions here mutate the
//! in-memory [`Configuration`]; persisting it is the caller's job.

use std::fmt;

use minisync_core::{Configuration, LogicalClock};

use crate::error::SyncError;
use crate::exec::{shell_quote, CommandOutput, CommandRunner, RemoteTarget};

/// Mirror program invoked for every transfer.
pub const MIRROR_PROGRAM: &str = "rsync";

// ---------------------------------------------------------------------------
// Direction and report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Remote → local.
    Pull,
    /// Local → remote.
    Push,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Pull => write!(f, "remote -> local"),
            Direction::Push => write!(f, "local -> remote"),
        }
    }
}

/// Outcome of a completed `load` or `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub direction: Direction,
    /// Clock both sides agree on after the transfer.
    pub clock: LogicalClock,
    /// Mirror command line as executed.
    pub command: String,
    /// Mirror standard output.
    pub output: String,
}

// ---------------------------------------------------------------------------
// Command lines
// ---------------------------------------------------------------------------

/// Build the mirror command line for `direction`.
///
/// ```text
/// rsync -az --delete [-n -i] -e ssh <src>/ <dst>/
/// ```
pub fn mirror_command(
    config: &Configuration,
    direction: Direction,
    dry_run: bool,
) -> Result<String, SyncError> {
    let remote = RemoteTarget::from_config(config)?;
    let remote_dir = format!(
        "{}:{}/",
        remote.address(),
        config.server_directory.trim_end_matches('/')
    );
    let local_dir = format!(
        "{}/",
        config.client_directory.to_string_lossy().trim_end_matches('/')
    );
    let (source, destination) = match direction {
        Direction::Pull => (remote_dir, local_dir),
        Direction::Push => (local_dir, remote_dir),
    };

    let mut command = format!("{MIRROR_PROGRAM} -az --delete");
    if dry_run {
        command.push_str(" -n -i");
    }
    command.push_str(" -e ssh ");
    command.push_str(&shell_quote(&source)?);
    command.push(' ');
    command.push_str(&shell_quote(&destination)?);
    Ok(command)
}

/// `<remote> report-time`
pub fn report_time_command(config: &Configuration) -> String {
    format!("{} report-time", config.remote_command)
}

/// `<remote> update <encoded>`
pub fn update_command(config: &Configuration, clock: &LogicalClock) -> Result<String, SyncError> {
    let encoded = clock.encode();
    Ok(format!(
        "{} update {}",
        config.remote_command,
        shell_quote(&encoded)?
    ))
}

// ---------------------------------------------------------------------------
// Clock exchange
// ---------------------------------------------------------------------------

/// Ask the peer for its stored clock.
///
/// The answer is judged by what was captured: a readable clock is accepted
/// even when the remote side exits nonzero.
pub fn fetch_remote_clock<R: CommandRunner>(
    runner: &mut R,
    config: &Configuration,
) -> Result<LogicalClock, SyncError> {
    let remote = RemoteTarget::from_config(config)?;
    let output = runner.run_remote(&remote, &report_time_command(config))?;
    if output.stdout.trim().is_empty() {
        return Err(SyncError::EmptyOutput {
            command: output.command,
        });
    }
    let clock = match LogicalClock::from_json(&output.stdout) {
        Ok(clock) => clock,
        Err(source) => {
            return Err(SyncError::Protocol {
                command: output.command,
                output: output.stdout,
                source,
            })
        }
    };
    if !output.success() {
        tracing::warn!(
            "`{}` exited with {} but returned a readable clock",
            output.command,
            output.status_label()
        );
    }
    Ok(clock)
}

/// Hand `clock` to the peer's `update` handler.
pub fn push_remote_clock<R: CommandRunner>(
    runner: &mut R,
    config: &Configuration,
    clock: &LogicalClock,
) -> Result<(), SyncError> {
    let remote = RemoteTarget::from_config(config)?;
    let output = runner.run_remote(&remote, &update_command(config, clock)?)?;
    require_success(output)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

/// Pull: adopt the peer's clock, then mirror remote → local.
pub fn load<R: CommandRunner>(
    runner: &mut R,
    config: &mut Configuration,
) -> Result<TransferReport, SyncError> {
    let command = mirror_command(config, Direction::Pull, false)?;
    let theirs = fetch_remote_clock(runner, config)?;
    tracing::info!("adopting remote clock {theirs} (was {})", config.time);
    config.time = theirs;

    let output = run_mirror(runner, &command)?;
    tracing::info!("load complete: {}", Direction::Pull);
    Ok(TransferReport {
        direction: Direction::Pull,
        clock: theirs,
        command,
        output: output.stdout,
    })
}

/// Push: stamp the local clock, hand it to the peer, then mirror local → remote.
pub fn save<R: CommandRunner>(
    runner: &mut R,
    config: &mut Configuration,
) -> Result<TransferReport, SyncError> {
    let command = mirror_command(config, Direction::Push, false)?;
    let mine = LogicalClock::from_now();
    config.time = mine;

    push_remote_clock(runner, config, &mine)?;
    tracing::info!("peer adopted clock {mine}");

    let output = run_mirror(runner, &command)?;
    tracing::info!("save complete: {}", Direction::Push);
    Ok(TransferReport {
        direction: Direction::Push,
        clock: mine,
        command,
        output: output.stdout,
    })
}

/// Run a mirror command line; a nonzero exit is a failure.
pub(crate) fn run_mirror<R: CommandRunner>(
    runner: &mut R,
    command: &str,
) -> Result<CommandOutput, SyncError> {
    let output = runner.run_local(command)?;
    require_success(output)
}

fn require_success(output: CommandOutput) -> Result<CommandOutput, SyncError> {
    if output.success() {
        return Ok(output);
    }
    tracing::error!("`{}` exited with {}", output.command, output.status_label());
    Err(SyncError::CommandFailed {
        status: output.status_label(),
        command: output.command,
        output: output.stdout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use crate::error::ExecError;

    /// Replays canned outputs and records every command line.
    #[derive(Default)]
    struct ScriptedRunner {
        replies: VecDeque<(i32, String)>,
        seen: Vec<String>,
    }

    impl ScriptedRunner {
        fn reply(mut self, status: i32, stdout: &str) -> Self {
            self.replies.push_back((status, stdout.to_string()));
            self
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run_local(&mut self, command_line: &str) -> Result<CommandOutput, ExecError> {
            self.seen.push(command_line.to_string());
            let (status, stdout) = self.replies.pop_front().unwrap_or((0, String::new()));
            Ok(CommandOutput {
                command: command_line.to_string(),
                stdout,
                status: Some(status),
            })
        }
    }

    fn config() -> Configuration {
        Configuration::new(
            "10.0.0.7",
            "alice",
            "/srv/notes/",
            "/home/alice/notes",
            LogicalClock::from_ymd_hms(2023, 6, 1, 0, 0, 0).expect("date"),
        )
    }

    #[test]
    fn push_and_pull_commands_mirror_each_other() {
        let cfg = config();
        assert_eq!(
            mirror_command(&cfg, Direction::Push, false).expect("push"),
            "rsync -az --delete -e ssh /home/alice/notes/ alice@10.0.0.7:/srv/notes/"
        );
        assert_eq!(
            mirror_command(&cfg, Direction::Pull, false).expect("pull"),
            "rsync -az --delete -e ssh alice@10.0.0.7:/srv/notes/ /home/alice/notes/"
        );
        assert_eq!(
            mirror_command(&cfg, Direction::Push, true).expect("dry"),
            "rsync -az --delete -n -i -e ssh /home/alice/notes/ alice@10.0.0.7:/srv/notes/"
        );
    }

    #[test]
    fn paths_with_spaces_are_quoted() {
        let mut cfg = config();
        cfg.client_directory = "/home/alice/my notes".into();
        let command = mirror_command(&cfg, Direction::Push, false).expect("push");
        assert!(command.contains("'/home/alice/my notes/'"), "{command}");
    }

    #[test]
    fn load_adopts_remote_clock_and_pulls() {
        let remote = LogicalClock::from_ymd_hms(2024, 1, 1, 0, 0, 0).expect("date");
        let mut runner = ScriptedRunner::default()
            .reply(0, &format!("{}\n", remote.to_json()))
            .reply(0, "");
        let mut cfg = config();

        let report = load(&mut runner, &mut cfg).expect("load");
        assert_eq!(cfg.time, remote);
        assert_eq!(report.clock, remote);
        assert_eq!(report.direction, Direction::Pull);
        assert_eq!(
            runner.seen,
            vec![
                "ssh alice@10.0.0.7 'minisync report-time'".to_string(),
                "rsync -az --delete -e ssh alice@10.0.0.7:/srv/notes/ /home/alice/notes/"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn load_adopts_even_an_older_remote_clock() {
        let remote = LogicalClock::from_ymd_hms(2000, 1, 1, 0, 0, 0).expect("date");
        let mut runner = ScriptedRunner::default().reply(0, &remote.to_json());
        let mut cfg = config();
        load(&mut runner, &mut cfg).expect("load");
        assert_eq!(cfg.time, remote);
    }

    #[test]
    fn save_sends_encoded_clock_before_mirroring() {
        let mut runner = ScriptedRunner::default();
        let mut cfg = config();
        let report = save(&mut runner, &mut cfg).expect("save");

        assert_eq!(cfg.time, report.clock);
        assert_eq!(runner.seen.len(), 2);
        let expected_update = format!(
            "ssh alice@10.0.0.7 'minisync update {}'",
            report.clock.encode()
        );
        assert_eq!(runner.seen[0], expected_update);
        assert!(runner.seen[1].starts_with("rsync -az --delete -e ssh /home/alice/notes/"));
    }

    #[test]
    fn unparseable_peer_clock_is_protocol_error() {
        let mut runner = ScriptedRunner::default().reply(0, "bash: minisync: command not found\n");
        let mut cfg = config();
        let before = cfg.time;
        let err = load(&mut runner, &mut cfg).unwrap_err();
        assert!(matches!(err, SyncError::Protocol { .. }), "got {err:?}");
        assert_eq!(cfg.time, before);
        assert_eq!(runner.seen.len(), 1, "mirror must not run");
    }

    #[test]
    fn empty_peer_output_is_rejected() {
        let mut runner = ScriptedRunner::default().reply(0, "  \n");
        let err = fetch_remote_clock(&mut runner, &config()).unwrap_err();
        assert!(matches!(err, SyncError::EmptyOutput { .. }), "got {err:?}");
    }

    #[test]
    fn readable_clock_is_accepted_despite_nonzero_exit() {
        let remote = LogicalClock::from_ymd_hms(2024, 2, 2, 7, 0, 0).expect("date");
        let mut runner = ScriptedRunner::default().reply(1, &remote.to_json());
        let clock = fetch_remote_clock(&mut runner, &config()).expect("clock");
        assert_eq!(clock, remote);
    }

    #[test]
    fn nonzero_exit_without_clock_is_still_rejected() {
        let mut runner = ScriptedRunner::default().reply(127, "sh: minisync: not found\n");
        let err = fetch_remote_clock(&mut runner, &config()).unwrap_err();
        assert!(matches!(err, SyncError::Protocol { .. }), "got {err:?}");

        let mut runner = ScriptedRunner::default().reply(255, "");
        let err = fetch_remote_clock(&mut runner, &config()).unwrap_err();
        assert!(matches!(err, SyncError::EmptyOutput { .. }), "got {err:?}");
    }

    #[test]
    fn load_continues_after_nonzero_report_time_with_clock() {
        let remote = LogicalClock::from_ymd_hms(2024, 2, 2, 7, 0, 0).expect("date");
        let mut runner = ScriptedRunner::default()
            .reply(1, &remote.to_json())
            .reply(0, "");
        let mut cfg = config();
        let report = load(&mut runner, &mut cfg).expect("load");
        assert_eq!(report.clock, remote);
        assert_eq!(runner.seen.len(), 2);
    }

    #[test]
    fn failed_peer_update_aborts_save() {
        let mut runner = ScriptedRunner::default().reply(127, "");
        let mut cfg = config();
        let err = save(&mut runner, &mut cfg).unwrap_err();
        match err {
            SyncError::CommandFailed { status, .. } => assert_eq!(status, "status 127"),
            other => panic!("expected command failure, got {other:?}"),
        }
        assert_eq!(runner.seen.len(), 1, "mirror must not run");
    }

    #[test]
    fn failed_mirror_reports_output() {
        let remote = LogicalClock::from_ymd_hms(2024, 1, 1, 0, 0, 0).expect("date");
        let mut runner = ScriptedRunner::default()
            .reply(0, &remote.to_json())
            .reply(23, "partial transfer\n");
        let err = load(&mut runner, &mut config()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("status 23"), "{msg}");
        assert!(msg.contains("partial transfer"), "{msg}");
    }

    #[test]
    fn missing_host_fails_before_any_command() {
        let mut runner = ScriptedRunner::default();
        let mut cfg = config();
        cfg.ip = String::new();
        let err = save(&mut runner, &mut cfg).unwrap_err();
        assert!(
            matches!(err, SyncError::Exec(ExecError::MissingRemote { field: "ip" })),
            "got {err:?}"
        );
        assert!(runner.seen.is_empty());
    }
}
