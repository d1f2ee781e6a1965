//! Application path management for dev, portable and installed modes.
//!
//! - **Dev mode** (debug builds): `config.yaml` in the current working
//!   directory wins.
//! - **Portable mode**: a `.portable` marker next to the executable keeps the
//!   config and logs in that directory.
//! - **Installed mode** (default): the platform data dir, e.g.
//!   `~/.local/share/PTZ Bridge` or `%APPDATA%\PTZ Bridge`.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Application name used for directories in installed mode
const APP_NAME: &str = "PTZ Bridge";

const CONFIG_FILE: &str = "config.yaml";
const EXAMPLE_CONFIG_FILE: &str = "config.example.yaml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config: PathBuf,
    pub logs_dir: PathBuf,
    /// Config lives next to the executable (or in the dev cwd)
    pub is_portable: bool,
}

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl AppPaths {
    /// Paths rooted in one directory, as used by dev and portable modes
    pub fn portable(base: &Path) -> Self {
        Self {
            config: base.join(CONFIG_FILE),
            logs_dir: base.join("logs"),
            is_portable: true,
        }
    }

    /// Detect the appropriate paths based on environment.
    ///
    /// Runs before logging is initialized, so diagnostics go to stderr.
    pub fn detect() -> Self {
        let exe_dir = exe_dir();

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join(CONFIG_FILE).exists() {
                eprintln!("[paths] Running in DEV mode (config.yaml in {})", cwd.display());
                return Self::portable(&cwd);
            }
        }

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode (.portable marker found)");
            return Self::portable(&exe_dir);
        }

        let app_data = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no platform data dir, falling back to exe dir");
                exe_dir.clone()
            })
            .join(APP_NAME);

        #[cfg(debug_assertions)]
        eprintln!("[paths] Running in INSTALLED mode (data dir: {})", app_data.display());

        Self {
            config: app_data.join(CONFIG_FILE),
            logs_dir: app_data.join("logs"),
            is_portable: false,
        }
    }

    /// Directory holding the config file
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Create the logs and config directories.
    ///
    /// In installed mode a missing config is seeded from
    /// `config.example.yaml` next to the executable or in the cwd.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if !self.logs_dir.exists() {
            debug!("Creating logs directory: {}", self.logs_dir.display());
            std::fs::create_dir_all(&self.logs_dir)
                .with_context(|| format!("Failed to create {}", self.logs_dir.display()))?;
        }

        if !self.is_portable {
            let base = self.base_dir();
            if !base.exists() {
                debug!("Creating config directory: {}", base.display());
                std::fs::create_dir_all(&base)?;
            }
            if !self.config.exists() {
                self.seed_config(&[exe_dir(), PathBuf::from(".")])?;
            }
        }

        Ok(())
    }

    /// Copy the first example config found in `search` to the config path
    fn seed_config(&self, search: &[PathBuf]) -> anyhow::Result<bool> {
        for dir in search {
            let example = dir.join(EXAMPLE_CONFIG_FILE);
            if example.exists() {
                info!("Copying example config to {}", self.config.display());
                std::fs::copy(&example, &self.config).with_context(|| {
                    format!(
                        "Failed to copy example config from {} to {}",
                        example.display(),
                        self.config.display()
                    )
                })?;
                return Ok(true);
            }
        }

        info!("No config found, please create {}", self.config.display());
        Ok(false)
    }
}
