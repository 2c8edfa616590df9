//! Bounded concurrent reconciliation of many sites
//!
//! Sites run as independent futures gated by a semaphore. Each one builds
//! its own management client; the only shared state is read-only settings
//! and the result list collected at the end.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8Path;
use futures::stream::{FuturesUnordered, StreamExt};
use relaymesh_broker::{BrokerApi, ClientConfig, ManagementClient};
use relaymesh_core::{discover_sites, Error, RelaymeshSettings, SiteFile};
use relaymesh_topology::RelayLinks;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::emit::DefinitionsWriter;
use crate::error::Result;
use crate::pipeline::{PipelineOptions, SitePipeline, SiteResult, Stage};

/// Reason reported for sites a cancelled run never started
pub const CANCELLED_REASON: &str = "run cancelled";

/// Shared flag stopping a run from starting further sites
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcomes of every site of a run, sorted by site name
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub results: Vec<SiteResult>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &SiteResult> {
        self.results.iter().filter(|r| r.is_failed())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Runs the site pipeline over a directory of specifications
pub struct BatchRunner {
    settings: RelaymeshSettings,
    links: RelayLinks,
    writer: DefinitionsWriter,
    options: PipelineOptions,
    client_config: Option<ClientConfig>,
    concurrency: usize,
    cancel: CancellationFlag,
}

impl BatchRunner {
    /// Validate settings for the requested outputs and prepare a run
    pub fn new(settings: RelaymeshSettings, options: PipelineOptions) -> Result<Self> {
        let links = RelayLinks::from_settings(&settings)?;

        let client_config = if options.skip_central {
            None
        } else {
            let api_url = settings.central.api_url.clone().ok_or_else(|| {
                Error::invalid_settings(
                    "central management API URL is not configured (set central.api-url or RELAYMESH_CENTRAL_API_URL)",
                )
            })?;
            let config = ClientConfig::new(
                api_url,
                settings.central.username.clone(),
                settings.central.password.clone(),
            )
            .with_timeout(Duration::from_secs(settings.network.http_timeout_secs))
            .with_retry(settings.retry.clone());
            // Fail on a bad URL before any site starts
            ManagementClient::new(config.clone())?;
            Some(config)
        };

        let writer = DefinitionsWriter::new(settings.output_dir.clone()).with_force(options.force);
        let concurrency = settings.network.concurrency.max(1);

        Ok(Self {
            settings,
            links,
            writer,
            options,
            client_config,
            concurrency,
            cancel: CancellationFlag::new(),
        })
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Discover and reconcile every site of `spec_dir`
    pub async fn run(&self, spec_dir: &Utf8Path) -> Result<BatchReport> {
        let sites = discover_sites(spec_dir)?;
        info!(
            dir = %spec_dir,
            sites = sites.len(),
            concurrency = self.concurrency,
            "starting reconciliation"
        );
        Ok(self.run_sites(sites).await)
    }

    /// Reconcile the given sites
    pub async fn run_sites(&self, sites: Vec<SiteFile>) -> BatchReport {
        let semaphore = Semaphore::new(self.concurrency);
        let mut futures = FuturesUnordered::new();
        for site in sites {
            futures.push(self.run_one(site, &semaphore));
        }

        let mut results = Vec::new();
        while let Some(result) = futures.next().await {
            results.push(result);
        }
        results.sort_by(|a, b| a.site.cmp(&b.site));

        let report = BatchReport { results };
        info!(
            sites = report.results.len(),
            failed = report.failure_count(),
            "reconciliation finished"
        );
        report
    }

    async fn run_one(&self, site: SiteFile, semaphore: &Semaphore) -> SiteResult {
        let name = site.name.clone();
        let _permit = match semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return SiteResult::failed(name, Stage::Pending, CANCELLED_REASON),
        };
        if self.cancel.is_cancelled() {
            warn!(site = %name, "run cancelled before site started");
            return SiteResult::failed(name, Stage::Pending, CANCELLED_REASON);
        }
        let path = match site.path() {
            Ok(path) => path,
            Err(e) => {
                warn!(site = %name, error = %e, "site failed");
                return SiteResult::failed(name, Stage::Loaded, e.to_string());
            }
        };

        let client = match &self.client_config {
            Some(config) => match ManagementClient::new(config.clone()) {
                Ok(client) => Some(client),
                Err(e) => return SiteResult::failed(name, Stage::CentralApplied, e.to_string()),
            },
            None => None,
        };

        let pipeline = SitePipeline::new(&self.settings, &self.links, &self.writer, self.options);
        pipeline
            .run(&name, path, client.as_ref().map(|c| c as &dyn BrokerApi))
            .await
    }
}
