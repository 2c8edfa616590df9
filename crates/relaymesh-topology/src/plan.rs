//! Per-site plan: everything derived from one normalized site

use relaymesh_core::types::SiteSettings;
use relaymesh_core::{NormalizedSite, Result};
use serde::Serialize;

use crate::compile::{compile, CompiledTopology, Variant};
use crate::definitions::DefinitionsDocument;
use crate::relay::{plan_relays, RelayLinks, RelaySpec};

/// Compiled topologies and relay links of one site
#[derive(Debug, Clone, Serialize)]
pub struct SitePlan {
    pub site: String,
    pub vhost: String,
    /// Objects declared on the central broker under the site's vhost
    pub central: CompiledTopology,
    /// Objects declared on the site broker itself
    pub local: CompiledTopology,
    pub relays: Vec<RelaySpec>,
}

impl SitePlan {
    /// Definitions document for the site broker
    pub fn definitions(&self, admin: &SiteSettings) -> DefinitionsDocument {
        DefinitionsDocument::render(&self.site, &self.local, &self.relays, admin)
    }

    /// Copy safe to print: relay URI passwords masked
    pub fn redacted(&self) -> Self {
        Self {
            relays: self.relays.iter().map(RelaySpec::redacted).collect(),
            ..self.clone()
        }
    }
}

/// Compile both topology variants and plan the relays of a site
pub fn plan_site(site: &NormalizedSite, links: &RelayLinks) -> Result<SitePlan> {
    let central = compile(site, Variant::Central)?;
    let local = compile(site, Variant::Site)?;
    let relays = plan_relays(site, links)?;

    Ok(SitePlan {
        site: site.name.clone(),
        vhost: site.vhost.clone(),
        central,
        local,
        relays,
    })
}
