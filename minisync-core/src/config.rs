//! JSON configuration store.
//!
//! # Storage layout
//!
//! ```text
//! ~/.config/minisync/
//!   config.jsonc  (mode 0600; directory mode 0700)
//! ```
//!
//! # API pattern
//!
//! - [`ConfigStore::at`] — explicit home; the CLI passes `dirs::home_dir()`,
//!   tests pass a `TempDir`
//! - [`ConfigStore::from_path`] — arbitrary file
//!
//! The file keeps the `.jsonc` name used by existing installs; the store reads
//! and writes plain JSON, which is a subset.
//!
//! Each operation performs one read and at most one write. Every write goes
//! through its own uniquely named temporary sibling and an atomic rename, so
//! concurrent readers and writers see either the old or the new document,
//! never a torn one.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::clock::LogicalClock;
use crate::error::ConfigError;
use crate::types::Configuration;

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.config/minisync/` — pure, no I/O.
pub fn config_dir_at(home: &Path) -> PathBuf {
    home.join(".config").join("minisync")
}

/// `<home>/.config/minisync/config.jsonc` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join("config.jsonc")
}

// ---------------------------------------------------------------------------
// 2. Defaults
// ---------------------------------------------------------------------------

/// Configuration written on first use.
///
/// Points both directories at `<home>/minisync` and the remote at the local
/// loopback, so a fresh install is self-consistent but needs editing before a
/// real sync.
pub fn default_config_at(home: &Path) -> Configuration {
    let user = std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "user".to_string());
    let sync_dir = home.join("minisync");
    Configuration::new(
        "127.0.0.1",
        user,
        sync_dir.to_string_lossy().into_owned(),
        sync_dir,
        LogicalClock::from_now(),
    )
}

// ---------------------------------------------------------------------------
// 3. Store
// ---------------------------------------------------------------------------

/// Handle on the configuration document. Holds a path, never a cached copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store rooted at an explicit home directory.
    pub fn at(home: &Path) -> Self {
        Self {
            path: config_path_at(home),
        }
    }

    /// Store backed by an arbitrary file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load and parse the document.
    ///
    /// Returns `ConfigError::ConfigNotFound` if absent,
    /// `ConfigError::Parse` (with path and serde context) if malformed or if
    /// any field is missing or wrong-typed.
    pub fn read(&self) -> Result<Configuration, ConfigError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::ConfigNotFound {
                    path: self.path.clone(),
                })
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Atomically replace the document.
    ///
    /// Write flow: serialize → unique `<name>.XXXXXX.tmp` sibling →
    /// `chmod 0600` → `rename`. The temporary file is removed if any step
    /// fails.
    pub fn write(&self, config: &Configuration) -> Result<(), ConfigError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            set_dir_permissions(dir)?;
        }
        let mut json = serde_json::to_string_pretty(config)?;
        json.push('\n');

        let mut tmp = tempfile::Builder::new()
            .prefix(&self.tmp_prefix())
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        set_file_permissions(tmp.path())?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }

    /// Write `defaults` unless a document already exists.
    ///
    /// Returns `true` when the defaults were written.
    pub fn bootstrap(&self, defaults: &Configuration) -> Result<bool, ConfigError> {
        if self.exists() {
            return Ok(false);
        }
        self.write(defaults)?;
        Ok(true)
    }

    /// Read, bootstrapping with `defaults` and retrying once if the document
    /// does not exist yet.
    pub fn read_or_bootstrap(
        &self,
        defaults: impl FnOnce() -> Configuration,
    ) -> Result<Configuration, ConfigError> {
        match self.read() {
            Err(ConfigError::ConfigNotFound { .. }) => {
                self.bootstrap(&defaults())?;
                self.read()
            }
            other => other,
        }
    }

    fn tmp_prefix(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{name}.")
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
