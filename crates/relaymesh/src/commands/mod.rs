//! CLI command implementations

pub mod plan;
pub mod push_site;
pub mod reconcile;
pub mod validate;

use anyhow::{Context, Result};
use camino::Utf8Path;
use relaymesh_core::{RelaymeshSettings, SettingsLoader};

/// Load layered settings, honouring an explicit `--settings` file
pub(crate) fn load_settings(path: Option<&Utf8Path>) -> Result<RelaymeshSettings> {
    let loader = match path {
        Some(path) => SettingsLoader::with_file(path),
        None => SettingsLoader::new(),
    };
    loader.load().context("Failed to load relaymesh settings")
}
