use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = "ORLibrary";
const CONFIG_FILE: &str = "dashboard.json";

pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("config directory unavailable")?;
    Ok(base.join(APP_DIR_NAME))
}

/// Dashboard settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Descriptor file to load instead of the default one.
    #[serde(default)]
    pub modules_file: Option<PathBuf>,
    /// How long closing a problem window waits for it to finish.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
    #[serde(default)]
    pub log_filter: Option<String>,
    #[serde(default = "default_window_title")]
    pub window_title: String,
}

fn default_close_timeout_ms() -> u64 {
    2_000
}

fn default_window_title() -> String {
    "Operational Research Problems Library".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            modules_file: None,
            close_timeout_ms: default_close_timeout_ms(),
            log_filter: None,
            window_title: default_window_title(),
        }
    }
}

impl DashboardConfig {
    pub fn default_path() -> Result<PathBuf> {
        Ok(config_dir()?.join(CONFIG_FILE))
    }

    /// Read the config at `path`. A missing file yields the defaults; an
    /// unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read dashboard config {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parse dashboard config {}", path.display()))?;
        if let (Some(modules), Some(base)) = (config.modules_file.as_mut(), path.parent()) {
            if modules.is_relative() {
                *modules = base.join(&*modules);
            }
        }
        Ok(config)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}
