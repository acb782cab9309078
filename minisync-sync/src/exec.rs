//! External command execution, locally and over `ssh`.
//!
//! Everything here is synchronous: the caller blocks until the child exits.
//! There is no timeout and no retry.
//!
//! Remote commands follow a fixed wire shape:
//!
//! ```text
//! ssh <user>@<host> '<command>'
//! ```
//!
//! Values are escaped with [`shell_quote`] *before* they are interpolated.

use std::borrow::Cow;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use minisync_core::Configuration;

use crate::error::ExecError;

/// Initial capacity of the capture buffer; `Vec` doubles it as needed.
const CAPTURE_CAPACITY: usize = 4096;

// ---------------------------------------------------------------------------
// Captured output
// ---------------------------------------------------------------------------

/// Standard output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// The command line as executed.
    pub command: String,
    pub stdout: String,
    /// Exit code; `None` when the process was killed by a signal.
    pub status: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Exit status for messages: `status 3` or `a signal`.
    pub fn status_label(&self) -> String {
        match self.status {
            Some(code) => format!("status {code}"),
            None => "a signal".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Runner capability
// ---------------------------------------------------------------------------

/// Runs command lines and captures their standard output.
pub trait CommandRunner {
    /// Run `command_line` through the local shell.
    fn run_local(&mut self, command_line: &str) -> Result<CommandOutput, ExecError>;

    /// Run `command_line` on `remote` by wrapping it in `ssh`.
    fn run_remote(
        &mut self,
        remote: &RemoteTarget,
        command_line: &str,
    ) -> Result<CommandOutput, ExecError> {
        let wrapped = remote.wrap(command_line)?;
        self.run_local(&wrapped)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn run_local(&mut self, command_line: &str) -> Result<CommandOutput, ExecError> {
        (**self).run_local(command_line)
    }
}

/// Spawns real processes via `sh -c`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    shell: PathBuf,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::with_shell("sh")
    }

    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemRunner {
    fn run_local(&mut self, command_line: &str) -> Result<CommandOutput, ExecError> {
        tracing::debug!("exec: {command_line}");
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                command: command_line.to_string(),
                source,
            })?;

        let mut captured = Vec::with_capacity(CAPTURE_CAPACITY);
        if let Some(mut stdout) = child.stdout.take() {
            if let Err(source) = stdout.read_to_end(&mut captured) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecError::Read {
                    command: command_line.to_string(),
                    source,
                });
            }
        }

        let status = child.wait().map_err(|source| ExecError::Wait {
            command: command_line.to_string(),
            source,
        })?;
        tracing::debug!(
            "exec finished ({} bytes, status {:?}): {command_line}",
            captured.len(),
            status.code()
        );

        Ok(CommandOutput {
            command: command_line.to_string(),
            stdout: String::from_utf8_lossy(&captured).into_owned(),
            status: status.code(),
        })
    }
}

// ---------------------------------------------------------------------------
// Remote addressing
// ---------------------------------------------------------------------------

/// `user@host` pair taken from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    user: String,
    host: String,
}

impl RemoteTarget {
    /// Fails when `hostName` or `ip` is empty, or either could be read by
    /// `ssh` as an option.
    pub fn new(user: &str, host: &str) -> Result<Self, ExecError> {
        let user = user.trim();
        let host = host.trim();
        if host.is_empty() {
            return Err(ExecError::MissingRemote { field: "ip" });
        }
        if user.is_empty() {
            return Err(ExecError::MissingRemote { field: "hostName" });
        }
        for value in [user, host] {
            if value.starts_with('-') || value.contains(|c: char| c.is_whitespace() || c == '@') {
                return Err(ExecError::UnsafeArgument {
                    value: value.to_string(),
                });
            }
        }
        Ok(Self {
            user: user.to_string(),
            host: host.to_string(),
        })
    }

    pub fn from_config(config: &Configuration) -> Result<Self, ExecError> {
        Self::new(&config.host_name, &config.ip)
    }

    /// `user@host`
    pub fn address(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// `ssh user@host '<command_line>'`
    pub fn wrap(&self, command_line: &str) -> Result<String, ExecError> {
        Ok(format!(
            "ssh {} {}",
            self.address(),
            force_quote(checked(command_line)?)
        ))
    }
}

// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

/// Quote `value` for a POSIX shell.
///
/// Plain words are returned unchanged; anything else is wrapped in single
/// quotes with embedded `'` written as `'\''`. Newlines and NUL bytes cannot
/// cross the remote command line and are rejected.
pub fn shell_quote(value: &str) -> Result<Cow<'_, str>, ExecError> {
    let value = checked(value)?;
    if !value.is_empty() && value.chars().all(is_plain) {
        return Ok(Cow::Borrowed(value));
    }
    Ok(Cow::Owned(force_quote(value)))
}

fn checked(value: &str) -> Result<&str, ExecError> {
    if value.contains(['\n', '\r', '\0']) {
        return Err(ExecError::UnsafeArgument {
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn force_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '_' | '-')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
