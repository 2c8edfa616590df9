//! Reconcile command

use anyhow::{bail, Context, Result};
use camino::Utf8Path;
use relaymesh_reconcile::{BatchRunner, PipelineOptions};
use tracing::warn;

use crate::cli::ReconcileArgs;
use crate::commands::load_settings;
use crate::output;

pub async fn run(args: ReconcileArgs, settings_path: Option<&Utf8Path>) -> Result<()> {
    let mut settings = load_settings(settings_path)?;
    if let Some(api_url) = args.api_url {
        settings.central.api_url = Some(api_url);
    }
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }
        settings.network.concurrency = concurrency;
    }
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }

    let options = PipelineOptions {
        skip_central: args.skip_central,
        skip_definitions: args.skip_definitions,
        force: args.force,
    };
    if options.skip_central && options.skip_definitions {
        output::warning("Both outputs skipped: sites are only loaded and compiled");
    }

    let runner = BatchRunner::new(settings, options).context("Cannot start reconciliation")?;

    let cancel = runner.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing started sites");
            cancel.cancel();
        }
    });

    let report = runner
        .run(&args.spec_dir)
        .await
        .with_context(|| format!("Failed to read site specifications from {}", args.spec_dir))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::site_summary(&report);
    }

    if report.has_failures() {
        bail!(
            "{} of {} site(s) failed",
            report.failure_count(),
            report.results.len()
        );
    }

    if !args.json {
        output::success(&format!("Reconciled {} site(s)", report.results.len()));
    }
    Ok(())
}
