//! Client settings: defaults, then an optional RON file, then command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use engine_logging::{engine_info, engine_warn};
use merger_engine::ClientSettings;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "merger.ron";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Optional overrides read from the settings file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub server: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_download_mb: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientSettings,
    pub output_dir: PathBuf,
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientSettings::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_level: None,
        }
    }
}

impl AppConfig {
    pub fn apply(&mut self, file: FileConfig) {
        if let Some(server) = file.server {
            self.client.base_url = server;
        }
        if let Some(ms) = file.poll_interval_ms {
            self.client.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = file.connect_timeout_secs {
            self.client.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.request_timeout_secs {
            self.client.request_timeout = Duration::from_secs(secs);
        }
        if let Some(mb) = file.max_download_mb {
            self.client.max_download_bytes = mb.saturating_mul(1024 * 1024);
        }
        if let Some(dir) = file.output_dir {
            self.output_dir = dir;
        }
        if file.log_level.is_some() {
            self.log_level = file.log_level;
        }
    }
}

/// Reads the settings file.
///
/// The default file is optional; an explicitly named one must exist.
pub fn load_file_config(path: Option<&Path>) -> anyhow::Result<FileConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
            return Ok(FileConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading settings from {:?}", path));
        }
    };

    match ron::from_str::<FileConfig>(&content) {
        Ok(config) => {
            engine_info!("Loaded settings from {:?}", path);
            Ok(config)
        }
        Err(err) if !required => {
            engine_warn!("Ignoring malformed settings in {:?}: {}", path, err);
            Ok(FileConfig::default())
        }
        Err(err) => Err(err).with_context(|| format!("parsing settings in {:?}", path)),
    }
}
