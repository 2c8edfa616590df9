//! Validate command

use anyhow::{bail, Context, Result};
use camino::Utf8Path;
use relaymesh_core::{discover_sites, normalize_site, SiteSource};
use relaymesh_topology::{plan_site, RelayLinks, SitePlan};

use crate::cli::ValidateArgs;
use crate::commands::load_settings;
use crate::output;

/// Host used for relay URIs when validating without a central broker configured
const PLACEHOLDER_CENTRAL_HOST: &str = "central.invalid";

pub fn run(args: ValidateArgs, settings_path: Option<&Utf8Path>) -> Result<()> {
    let mut settings = load_settings(settings_path)?;
    if settings.central.resolved_amqp_host().is_none() {
        settings.central.amqp_host = Some(PLACEHOLDER_CENTRAL_HOST.to_string());
    }
    let links = RelayLinks::from_settings(&settings)?;

    let sites = discover_sites(&args.spec_dir)
        .with_context(|| format!("Failed to read site specifications from {}", args.spec_dir))?;
    if sites.is_empty() {
        output::warning(&format!("No site specifications found in {}", args.spec_dir));
        return Ok(());
    }

    let mut failures = 0;
    for site in &sites {
        let name = site.name.as_str();
        let checked = site
            .path()
            .map_err(anyhow::Error::from)
            .and_then(|path| check_site(name, path, &links));
        match checked {
            Ok(plan) => output::success(&format!(
                "{}: {} central objects, {} site objects, {} relays",
                name,
                plan.central.object_count(),
                plan.local.object_count(),
                plan.relays.len()
            )),
            Err(e) => {
                failures += 1;
                output::error(&format!("{}: {:#}", name, e));
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} site(s) are invalid", failures, sites.len());
    }
    output::info(&format!("{} site(s) valid", sites.len()));
    Ok(())
}

fn check_site(name: &str, path: &Utf8Path, links: &RelayLinks) -> Result<SitePlan> {
    let source = SiteSource::read(name, path)?;
    let site = normalize_site(&source.parse()?)?;
    Ok(plan_site(&site, links)?)
}
