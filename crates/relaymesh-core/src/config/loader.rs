//! Site specification loading
//!
//! One document per site lives in the specification directory; the file
//! stem is the site name. Loading only decodes structure. Shape checks
//! belong to [`crate::normalize`].

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::fs;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{SiteDocument, SiteSpecification};

/// Encoding of a specification file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
}

impl SpecFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        match path.extension()?.to_ascii_lowercase().as_str() {
            "json" => Some(SpecFormat::Json),
            "yaml" | "yml" => Some(SpecFormat::Yaml),
            _ => None,
        }
    }
}

/// A specification file read from disk
///
/// The raw bytes are kept alongside the path because the definitions
/// emitter fingerprints exactly what was read.
#[derive(Debug, Clone)]
pub struct SiteSource {
    pub name: String,
    pub path: Utf8PathBuf,
    pub format: SpecFormat,
    pub contents: Vec<u8>,
}

impl SiteSource {
    /// Read a specification file
    pub fn read(name: impl Into<String>, path: &Utf8Path) -> Result<Self> {
        let format = SpecFormat::from_path(path).ok_or_else(|| {
            Error::config_parse(path.as_str(), "unsupported file extension")
        })?;
        let contents = fs::read(path).map_err(|e| Error::config_read(path.as_str(), e))?;

        Ok(Self {
            name: name.into(),
            path: path.to_owned(),
            format,
            contents,
        })
    }

    /// Decode the document into a site specification
    pub fn parse(&self) -> Result<SiteSpecification> {
        let doc: SiteDocument = match self.format {
            SpecFormat::Json => serde_json::from_slice(&self.contents)
                .map_err(|e| Error::config_parse(self.path.as_str(), e))?,
            SpecFormat::Yaml => serde_yaml_ng::from_slice(&self.contents)
                .map_err(|e| Error::config_parse(self.path.as_str(), e))?,
        };

        Ok(SiteSpecification::from_document(&self.name, doc))
    }
}

/// The specification file(s) found for one site name
///
/// More than one path means the site is defined twice, e.g. by both
/// `siteA.json` and `siteA.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    pub name: String,
    pub paths: Vec<Utf8PathBuf>,
}

impl SiteFile {
    /// The site's only specification file
    pub fn path(&self) -> Result<&Utf8Path> {
        match self.paths.as_slice() {
            [path] => Ok(path),
            paths => {
                let listed: Vec<&str> = paths.iter().map(|p| p.as_str()).collect();
                Err(Error::config_parse(
                    paths.first().map(|p| p.as_str()).unwrap_or(self.name.as_str()),
                    format!("site '{}' is defined by both {}", self.name, listed.join(" and ")),
                ))
            }
        }
    }
}

/// List the specification files of a directory, sorted by site name
///
/// Only an unreadable directory is an error here; a site defined twice is
/// returned as is and fails when its path is requested.
pub fn discover_sites(dir: &Utf8Path) -> Result<Vec<SiteFile>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::config_read(dir.as_str(), e))?;

    let mut sites: BTreeMap<String, Vec<Utf8PathBuf>> = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::config_read(dir.as_str(), e))?;
        let Ok(path) = Utf8PathBuf::try_from(entry.path()) else {
            debug!("Skipping non UTF-8 path {:?}", entry.path());
            continue;
        };
        if !path.is_file() || SpecFormat::from_path(&path).is_none() {
            debug!("Skipping {}", path);
            continue;
        }
        let Some(stem) = path.file_stem() else {
            continue;
        };
        sites.entry(stem.to_string()).or_default().push(path.clone());
    }

    Ok(sites
        .into_iter()
        .map(|(name, mut paths)| {
            paths.sort();
            SiteFile { name, paths }
        })
        .collect())
}

/// Load and decode every specification in a directory, keyed by site name
pub fn load_sites(dir: &Utf8Path) -> Result<BTreeMap<String, SiteSpecification>> {
    let mut specs = BTreeMap::new();
    for site in discover_sites(dir)? {
        let spec = SiteSource::read(&site.name, site.path()?)?.parse()?;
        specs.insert(site.name, spec);
    }
    Ok(specs)
}
