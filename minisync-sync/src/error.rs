//! Error types for minisync-sync.

use std::path::PathBuf;

use thiserror::Error;

use minisync_core::{ClockError, ConfigError};

/// Failures of the external-process capability itself.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The process could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The output pipe broke before end of stream.
    #[error("failed to read output of `{command}`: {source}")]
    Read {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the process to exit failed.
    #[error("failed to wait for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// `ip` or `hostName` is empty, so there is nothing to address.
    #[error("cannot address remote host: configuration field '{field}' is empty")]
    MissingRemote { field: &'static str },

    /// A value cannot be embedded in a remote command line.
    #[error("refusing to interpolate unsafe value {value:?} into a shell command")]
    UnsafeArgument { value: String },
}

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing, malformed, or unwritable configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A locally supplied encoded clock could not be decoded.
    #[error("clock error: {0}")]
    Clock(#[from] ClockError),

    /// The command could not be executed at all.
    #[error("execution error: {0}")]
    Exec(#[from] ExecError),

    /// The command ran but exited unsuccessfully.
    #[error("`{command}` exited with {status}{}", render_output(.output))]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    /// The peer answered with nothing at all.
    #[error("`{command}` produced no output")]
    EmptyOutput { command: String },

    /// The peer answered with something that is not a clock.
    #[error("peer returned an unreadable clock from `{command}`: {source}{}", render_output(.output))]
    Protocol {
        command: String,
        output: String,
        #[source]
        source: ClockError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

fn render_output(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}
