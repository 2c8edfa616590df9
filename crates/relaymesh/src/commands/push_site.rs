//! Push-site command
//!
//! Applies one site's local topology and its four relay parameters to the
//! site broker's own management API.

use std::time::Duration;

use anyhow::{Context, Result};
use camino::Utf8Path;
use relaymesh_broker::{Applier, ClientConfig, ManagementClient};
use relaymesh_core::{normalize_site, SiteSource};
use relaymesh_topology::{plan_site, RelayLinks};

use crate::cli::PushSiteArgs;
use crate::commands::load_settings;
use crate::output;

pub async fn run(args: PushSiteArgs, settings_path: Option<&Utf8Path>) -> Result<()> {
    let settings = load_settings(settings_path)?;

    let name = args
        .spec_file
        .file_stem()
        .with_context(|| format!("Cannot derive a site name from {}", args.spec_file))?
        .to_string();
    let source = SiteSource::read(&name, &args.spec_file)?;
    let site = normalize_site(&source.parse()?).with_context(|| format!("Site '{}' is invalid", name))?;
    let links = RelayLinks::from_settings(&settings).context("Cannot plan relay links")?;
    let plan = plan_site(&site, &links).with_context(|| format!("Cannot plan site '{}'", name))?;

    let config = ClientConfig::new(
        args.api_url.clone(),
        settings.site.username.clone(),
        settings.site.password.clone(),
    )
    .with_timeout(Duration::from_secs(settings.network.http_timeout_secs))
    .with_retry(settings.retry.clone());
    let client = ManagementClient::new(config)?;

    output::info(&format!("Pushing site '{}' to {}", name, args.api_url));
    let summary = Applier::new(&client)
        .apply(&plan.local, &plan.relays)
        .await
        .with_context(|| format!("Failed to push site '{}'", name))?;

    output::success(&format!(
        "Site '{}' pushed: {} created, {} existing",
        name, summary.created, summary.existing
    ));
    Ok(())
}
