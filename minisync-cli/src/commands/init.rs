//! `minisync init [--ip ..] [--user ..] [--server-dir ..] [--client-dir ..]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use minisync_core::{config::default_config_at, ConfigStore};

/// Create the configuration file, or edit its connection fields.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Address of the remote host.
    #[arg(long)]
    pub ip: Option<String>,

    /// Login name on the remote host.
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// Directory on the remote host.
    #[arg(long, value_name = "PATH")]
    pub server_dir: Option<String>,

    /// Local directory to synchronize.
    #[arg(long, value_name = "PATH")]
    pub client_dir: Option<PathBuf>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let store = ConfigStore::at(&home);
        let existed = store.exists();
        let mut config = store
            .read_or_bootstrap(|| default_config_at(&home))
            .with_context(|| format!("failed to load {}", store.path().display()))?;

        let client_dir = match self.client_dir {
            Some(dir) if dir.is_relative() => Some(
                std::env::current_dir()
                    .context("cannot resolve current directory")?
                    .join(dir),
            ),
            other => other,
        };

        let edited = self.ip.is_some()
            || self.user.is_some()
            || self.server_dir.is_some()
            || client_dir.is_some();
        if let Some(ip) = self.ip {
            config.ip = ip;
        }
        if let Some(user) = self.user {
            config.host_name = user;
        }
        if let Some(dir) = self.server_dir {
            config.server_directory = dir;
        }
        if let Some(dir) = client_dir {
            config.client_directory = dir;
        }
        if edited {
            store
                .write(&config)
                .with_context(|| format!("failed to write {}", store.path().display()))?;
        }

        let verb = if !existed {
            "Created"
        } else if edited {
            "Updated"
        } else {
            "Unchanged"
        };
        println!("✓ {verb} {}", store.path().display());
        println!("  remote: {}@{}:{}", config.host_name, config.ip, config.server_directory);
        println!("  local:  {}", config.client_directory.display());
        println!("  clock:  {}", config.time);
        Ok(())
    }
}
