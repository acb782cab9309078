//! Domain types for the minisync configuration document.
//!
//! Field names on disk are camelCase (`hostName`, `serverDirectory`, ...).
//! All five required fields must be present and correctly typed; serde
//! rejects anything else at load time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::clock::LogicalClock;
use crate::error::ConfigError;

/// Executable name used on the peer when `remoteCommand` is not set.
pub const DEFAULT_REMOTE_COMMAND: &str = "minisync";

fn default_remote_command() -> String {
    DEFAULT_REMOTE_COMMAND.to_owned()
}

fn is_default_remote_command(value: &str) -> bool {
    value == DEFAULT_REMOTE_COMMAND
}

/// The persisted state of one local ⇄ remote pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Address of the remote host.
    pub ip: String,
    /// Login name on the remote host.
    pub host_name: String,
    /// Directory on the remote host; never resolved locally.
    pub server_directory: String,
    /// Local directory being synchronized.
    pub client_directory: PathBuf,
    /// Clock of the last completed sync or observed local edit.
    pub time: LogicalClock,
    /// minisync executable on the peer.
    #[serde(
        default = "default_remote_command",
        skip_serializing_if = "is_default_remote_command"
    )]
    pub remote_command: String,
}

impl Configuration {
    /// Configuration with the default remote command.
    pub fn new(
        ip: impl Into<String>,
        host_name: impl Into<String>,
        server_directory: impl Into<String>,
        client_directory: impl Into<PathBuf>,
        time: LogicalClock,
    ) -> Self {
        Self {
            ip: ip.into(),
            host_name: host_name.into(),
            server_directory: server_directory.into(),
            client_directory: client_directory.into(),
            time,
            remote_command: default_remote_command(),
        }
    }

    /// Reject empty string fields; every sync operation needs all of them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, bool); 5] = [
            ("ip", self.ip.trim().is_empty()),
            ("hostName", self.host_name.trim().is_empty()),
            ("serverDirectory", self.server_directory.trim().is_empty()),
            ("clientDirectory", self.client_directory.as_os_str().is_empty()),
            ("remoteCommand", self.remote_command.trim().is_empty()),
        ];
        match checks.into_iter().find(|(_, empty)| *empty) {
            Some((field, _)) => Err(ConfigError::MissingField { field }),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
