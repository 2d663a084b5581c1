use std::fs;
use std::path::PathBuf;

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

/// Per-resource cache lifetimes, in seconds. PR data tolerates a few
/// minutes of staleness; workflow status goes stale fastest.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheTtls {
    #[serde(default = "default_pr_secs")]
    pub pr_secs: u64,
    #[serde(default = "default_vcs_secs")]
    pub vcs_secs: u64,
    #[serde(default = "default_workflow_secs")]
    pub workflow_secs: u64,
}

fn default_pr_secs() -> u64 {
    300
}

fn default_vcs_secs() -> u64 {
    300
}

fn default_workflow_secs() -> u64 {
    120
}

impl Default for CacheTtls {
    fn default() -> Self {
        CacheTtls {
            pr_secs: default_pr_secs(),
            vcs_secs: default_vcs_secs(),
            workflow_secs: default_workflow_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Paths to scan for repositories; CLI arguments win over these.
    #[serde(default)]
    pub scan_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheTtls>,
}

impl Settings {
    /// Layered load: user config file, then a `repodash.toml` in the
    /// working directory as a local override. Both optional; a missing
    /// user config is written out with defaults so it's easy to edit.
    pub fn new() -> Result<Self, ConfigError> {
        let user_config = user_config_path();
        if !user_config.exists() {
            write_default_config(&user_config);
        }

        let mut builder = Config::builder();
        builder = builder.add_source(File::from(user_config).required(false));
        builder = builder.add_source(File::with_name("repodash.toml").required(false));
        builder.build()?.try_deserialize()
    }

    pub fn cache_ttls(&self) -> CacheTtls {
        self.cache.clone().unwrap_or_default()
    }

    /// Configured scan paths with `~` expanded.
    pub fn expanded_scan_paths(&self) -> Vec<PathBuf> {
        self.scan_paths
            .iter()
            .map(|p| PathBuf::from(shellexpand::tilde(p).to_string()))
            .collect()
    }
}

pub fn user_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("repodash");
    path.push("repodash.toml");
    path
}

/// Best effort; the dashboard runs fine without a config file.
fn write_default_config(path: &PathBuf) {
    let defaults = Settings {
        cache: Some(CacheTtls::default()),
        ..Settings::default()
    };
    let Ok(body) = toml::to_string_pretty(&defaults) else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let _ = fs::write(path, body);
}
