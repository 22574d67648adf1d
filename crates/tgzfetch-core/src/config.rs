use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/tgzfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgzConfig {
    /// Maximum number of concurrent tarball downloads per batch.
    pub max_concurrent_requests: usize,
    /// Connect timeout for every registry/tarball request, in seconds.
    pub connect_timeout_secs: u64,
    /// Total per-request timeout, in seconds. A hung transfer is abandoned
    /// (and recorded) rather than stalling the run forever.
    pub request_timeout_secs: u64,
}

impl Default for TgzConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 5,
            connect_timeout_secs: 15,
            request_timeout_secs: 600,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tgzfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TgzConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TgzConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: TgzConfig = toml::from_str(&data)?;
    Ok(cfg)
}
