//! Definitions emission with content-hash gating
//!
//! Each site's document is written to `<output>/<site>-definitions.json`
//! with its input fingerprint beside it in `<site>-definitions.sha256`.
//! When the stored fingerprint matches and the document exists, nothing is
//! written at all.

use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use relaymesh_core::RelaymeshSettings;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{ReconcileError, Result};

/// Whether an emission touched the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitOutcome {
    Written,
    Unchanged,
}

impl std::fmt::Display for EmitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Written => write!(f, "written"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Fingerprint of everything a definitions document is rendered from
///
/// Covers the raw specification bytes plus the endpoint settings embedded
/// in the document. Passwords only enter as their own digest.
pub fn fingerprint(spec_bytes: &[u8], settings: &RelaymeshSettings) -> String {
    let mut secrets = Sha256::new();
    secrets.update(settings.site.password.expose().as_bytes());
    secrets.update([0u8]);
    secrets.update(settings.central.password.expose().as_bytes());

    let emission = format!(
        "site={}:{}:{}\ncentral={}:{}:{}\nsecrets={:x}\n",
        settings.site.amqp_host,
        settings.site.amqp_port,
        settings.site.username,
        settings.central.resolved_amqp_host().unwrap_or_default(),
        settings.central.amqp_port,
        settings.central.username,
        secrets.finalize(),
    );

    let mut hasher = Sha256::new();
    hasher.update(spec_bytes);
    hasher.update([0u8]);
    hasher.update(emission.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Writes definitions documents into one output directory
#[derive(Debug, Clone)]
pub struct DefinitionsWriter {
    output_dir: Utf8PathBuf,
    force: bool,
}

impl DefinitionsWriter {
    pub fn new(output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            force: false,
        }
    }

    /// Re-emit even when the fingerprint is unchanged
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    pub fn document_path(&self, site: &str) -> Utf8PathBuf {
        self.output_dir.join(format!("{}-definitions.json", site))
    }

    pub fn fingerprint_path(&self, site: &str) -> Utf8PathBuf {
        self.output_dir.join(format!("{}-definitions.sha256", site))
    }

    /// The document on disk was rendered from inputs with this fingerprint
    pub fn is_current(&self, site: &str, fingerprint: &str) -> bool {
        if !self.document_path(site).is_file() {
            return false;
        }
        fs::read_to_string(self.fingerprint_path(site))
            .map(|stored| stored.trim() == fingerprint)
            .unwrap_or(false)
    }

    /// Emit a site's document unless the stored fingerprint already matches
    ///
    /// `render` only runs when a write is needed. The fingerprint is written
    /// after the document, so an interrupted emission is redone next run.
    pub fn emit<T: Serialize>(
        &self,
        site: &str,
        fingerprint: &str,
        render: impl FnOnce() -> T,
    ) -> Result<EmitOutcome> {
        if !self.force && self.is_current(site, fingerprint) {
            debug!(site, "definitions unchanged, skipping emission");
            return Ok(EmitOutcome::Unchanged);
        }

        let document = render();
        let mut json = serde_json::to_string_pretty(&document).map_err(|source| {
            ReconcileError::Serialize {
                site: site.to_string(),
                source,
            }
        })?;
        json.push('\n');

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| ReconcileError::emit(self.output_dir.as_str(), e))?;

        let document_path = self.document_path(site);
        self.write_atomic(&document_path, json.as_bytes())?;
        self.write_atomic(&self.fingerprint_path(site), format!("{}\n", fingerprint).as_bytes())?;

        info!(site, path = %document_path, "definitions written");
        Ok(EmitOutcome::Written)
    }

    /// Write through a temporary file in the same directory, then rename over `path`
    fn write_atomic(&self, path: &Utf8Path, contents: &[u8]) -> Result<()> {
        let mut file = NamedTempFile::new_in(&self.output_dir)
            .map_err(|e| ReconcileError::emit(path.as_str(), e))?;
        file.write_all(contents)
            .and_then(|_| file.as_file().sync_all())
            .map_err(|e| ReconcileError::emit(path.as_str(), e))?;
        file.persist(path)
            .map_err(|e| ReconcileError::emit(path.as_str(), e.error))?;
        Ok(())
    }
}
