//! Layered runtime settings
//!
//! Precedence, low to high:
//! 1. Built-in defaults
//! 2. Settings file (explicit path, or `relaymesh.yaml` in the working directory)
//! 3. Environment variables (`RELAYMESH_*` prefix)
//! 4. CLI flags (handled by caller)

use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{RelaymeshSettings, Secret};

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "relaymesh.yaml";

/// Settings loader with file and environment layering
pub struct SettingsLoader {
    /// Explicit settings file; required to exist when set
    path: Option<Utf8PathBuf>,
}

impl SettingsLoader {
    /// Loader that looks for `relaymesh.yaml` in the working directory
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Loader reading a specific settings file
    pub fn with_file(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Load settings with file and environment overrides applied
    pub fn load(&self) -> Result<RelaymeshSettings> {
        let settings = match &self.path {
            Some(path) => Self::load_file(path)?,
            None => {
                let default_path = Utf8Path::new(SETTINGS_FILE_NAME);
                if default_path.exists() {
                    Self::load_file(default_path)?
                } else {
                    RelaymeshSettings::default()
                }
            }
        };

        apply_env_overrides(settings)
    }

    fn load_file(path: &Utf8Path) -> Result<RelaymeshSettings> {
        debug!("Loading settings from {}", path);
        let content = fs::read_to_string(path).map_err(|e| Error::config_read(path.as_str(), e))?;
        if content.trim().is_empty() {
            return Ok(RelaymeshSettings::default());
        }
        Ok(serde_yaml_ng::from_str(&content)?)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::invalid_settings(format!("{} must be a valid number", name)))
}

/// Apply `RELAYMESH_*` environment overrides
pub fn apply_env_overrides(mut settings: RelaymeshSettings) -> Result<RelaymeshSettings> {
    if let Ok(val) = env::var("RELAYMESH_CENTRAL_API_URL") {
        settings.central.api_url = Some(val);
    }
    if let Ok(val) = env::var("RELAYMESH_CENTRAL_AMQP_HOST") {
        settings.central.amqp_host = Some(val);
    }
    if let Ok(val) = env::var("RELAYMESH_CENTRAL_AMQP_PORT") {
        settings.central.amqp_port = parse_env("RELAYMESH_CENTRAL_AMQP_PORT", &val)?;
    }
    if let Ok(val) = env::var("RELAYMESH_CENTRAL_USER") {
        settings.central.username = val;
    }
    if let Ok(val) = env::var("RELAYMESH_CENTRAL_PASSWORD") {
        settings.central.password = Secret::new(val);
    }

    if let Ok(val) = env::var("RELAYMESH_SITE_AMQP_HOST") {
        settings.site.amqp_host = val;
    }
    if let Ok(val) = env::var("RELAYMESH_SITE_AMQP_PORT") {
        settings.site.amqp_port = parse_env("RELAYMESH_SITE_AMQP_PORT", &val)?;
    }
    if let Ok(val) = env::var("RELAYMESH_SITE_USER") {
        settings.site.username = val;
    }
    if let Ok(val) = env::var("RELAYMESH_SITE_PASSWORD") {
        settings.site.password = Secret::new(val);
    }

    if let Ok(val) = env::var("RELAYMESH_HTTP_TIMEOUT_SECS") {
        settings.network.http_timeout_secs = parse_env("RELAYMESH_HTTP_TIMEOUT_SECS", &val)?;
    }
    if let Ok(val) = env::var("RELAYMESH_CONCURRENCY") {
        settings.network.concurrency = parse_env("RELAYMESH_CONCURRENCY", &val)?;
    }
    if let Ok(val) = env::var("RELAYMESH_OUTPUT_DIR") {
        settings.output_dir = Utf8PathBuf::from(val);
    }

    if settings.network.concurrency == 0 {
        return Err(Error::invalid_settings("concurrency must be at least 1"));
    }

    Ok(settings)
}
