pub mod diff;
pub mod init;
pub mod report_time;
pub mod status;
pub mod transfer;
pub mod update;

use std::path::PathBuf;

use anyhow::{Context, Result};

use minisync_core::{config::default_config_at, ConfigStore};

/// Open the user's store, writing defaults first if none exists yet.
pub(crate) fn open_store() -> Result<ConfigStore> {
    let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
    let store = ConfigStore::at(&home);
    tracing::debug!(path = %store.path().display(), "opening configuration");
    if store
        .bootstrap(&default_config_at(&home))
        .context("failed to write default configuration")?
    {
        eprintln!(
            "Created default configuration at {}; edit it or run `minisync init`.",
            store.path().display()
        );
    }
    Ok(store)
}
