use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Backoff for rendition downloads (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per download, including the first.
    pub max_attempts: u32,
    /// Base delay in seconds (e.g. 0.5 = 500ms), doubled per attempt.
    pub base_delay_secs: f64,
    /// Upper bound on a single backoff delay.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/vidrip/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VidripConfig {
    /// Manifest endpoint; `{id}` is replaced by the video identifier.
    pub manifest_url: String,
    /// Host that candidate URLs are synthesized against (scheme included).
    pub cdn_host: String,
    /// Probe worker threads.
    pub probe_workers: usize,
    /// Per-request timeout for probes and the manifest fetch.
    pub probe_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout for a rendition download.
    pub download_timeout_secs: u64,
    /// Largest body held in memory; archives are parsed whole, so this is
    /// also the archive size ceiling.
    pub max_archive_bytes: u64,
    /// Title characters kept in output file names.
    pub max_title_chars: usize,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for VidripConfig {
    fn default() -> Self {
        Self {
            manifest_url: "https://api.video.example/v1/videos/{id}/renditions".to_string(),
            cdn_host: "https://cdn.video.example".to_string(),
            probe_workers: 6,
            probe_timeout_secs: 10,
            connect_timeout_secs: 10,
            download_timeout_secs: 600,
            max_archive_bytes: 2 * 1024 * 1024 * 1024,
            max_title_chars: 100,
            retry: None,
        }
    }
}

impl VidripConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> crate::retry::RetryPolicy {
        self.retry
            .as_ref()
            .map(crate::retry::RetryPolicy::from_config)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vidrip")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VidripConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VidripConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path (e.g. `--config`).
pub fn load_from(path: &Path) -> Result<VidripConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: VidripConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    if !cfg.manifest_url.contains("{id}") {
        anyhow::bail!("manifest_url must contain an {{id}} placeholder");
    }
    Ok(cfg)
}
