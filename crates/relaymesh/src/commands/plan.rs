//! Plan command

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use relaymesh_core::{discover_sites, normalize_site, SiteSource};
use relaymesh_topology::{plan_site, RelayLinks, SitePlan};

use crate::cli::PlanArgs;
use crate::commands::load_settings;

pub fn run(args: PlanArgs, settings_path: Option<&Utf8Path>) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let links = RelayLinks::from_settings(&settings).context("Cannot plan relay links")?;

    let mut sites = discover_sites(&args.spec_dir)
        .with_context(|| format!("Failed to read site specifications from {}", args.spec_dir))?;
    if let Some(only) = &args.site {
        sites.retain(|site| site.name == *only);
        if sites.is_empty() {
            return Err(anyhow!("No specification for site '{}' in {}", only, args.spec_dir));
        }
    }

    let mut plans: Vec<SitePlan> = Vec::with_capacity(sites.len());
    for site_file in sites {
        let name = site_file.name.as_str();
        let source = SiteSource::read(name, site_file.path()?)?;
        let site = normalize_site(&source.parse()?)
            .with_context(|| format!("Site '{}' is invalid", name))?;
        let plan = plan_site(&site, &links).with_context(|| format!("Cannot plan site '{}'", name))?;
        plans.push(plan.redacted());
    }

    println!("{}", serde_json::to_string_pretty(&plans)?);
    Ok(())
}
