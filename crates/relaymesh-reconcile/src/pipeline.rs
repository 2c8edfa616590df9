//! Per-site reconciliation pipeline
//!
//! `Loaded → Normalized → Compiled → {CentralApplied, DefinitionsWritten} → Done`
//!
//! The two output stages run concurrently from the same plan. A failure at
//! any stage ends only this site's pipeline.
//!
//! Definitions files are written from the blocking pool so file I/O never
//! stalls the central reconciliation running beside it.

use std::fmt;

use camino::Utf8Path;
use relaymesh_broker::{Applier, ApplySummary, BrokerApi};
use relaymesh_core::{normalize_site, RelaymeshSettings, SiteSource};
use relaymesh_topology::{plan_site, RelayLinks};
use serde::Serialize;
use tracing::{info, warn};

use crate::emit::{fingerprint, DefinitionsWriter, EmitOutcome};
use crate::error::ReconcileError;

/// Pipeline stages of one site
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Not started
    Pending,
    Loaded,
    Normalized,
    /// Topologies compiled and relays planned
    Compiled,
    CentralApplied,
    DefinitionsWritten,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::Loaded => "Loaded",
            Self::Normalized => "Normalized",
            Self::Compiled => "Compiled",
            Self::CentralApplied => "CentralApplied",
            Self::DefinitionsWritten => "DefinitionsWritten",
            Self::Done => "Done",
        };
        f.write_str(name)
    }
}

/// What a completed pipeline did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteReport {
    /// `None` when central reconciliation was skipped
    pub central: Option<ApplySummary>,
    /// `None` when emission was skipped
    pub definitions: Option<EmitOutcome>,
}

/// Terminal state of one site's pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SiteOutcome {
    Done(SiteReport),
    /// `stage` is the stage that could not be reached
    Failed { stage: Stage, reason: String },
}

/// One site's outcome, keyed by site name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteResult {
    pub site: String,
    pub outcome: SiteOutcome,
}

impl SiteResult {
    pub fn done(site: impl Into<String>, report: SiteReport) -> Self {
        Self {
            site: site.into(),
            outcome: SiteOutcome::Done(report),
        }
    }

    pub fn failed(site: impl Into<String>, stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            outcome: SiteOutcome::Failed {
                stage,
                reason: reason.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SiteOutcome::Failed { .. })
    }
}

/// Which outputs a run produces
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub skip_central: bool,
    pub skip_definitions: bool,
    /// Emit definitions even when the fingerprint is unchanged
    pub force: bool,
}

/// Shared, read-only context of every site pipeline in a run
pub struct SitePipeline<'a> {
    settings: &'a RelaymeshSettings,
    links: &'a RelayLinks,
    writer: &'a DefinitionsWriter,
    options: PipelineOptions,
}

impl<'a> SitePipeline<'a> {
    pub fn new(
        settings: &'a RelaymeshSettings,
        links: &'a RelayLinks,
        writer: &'a DefinitionsWriter,
        options: PipelineOptions,
    ) -> Self {
        Self {
            settings,
            links,
            writer,
            options,
        }
    }

    /// Run one site from its specification file to `Done` or `Failed`
    ///
    /// `api` is the site's own management client; without one, central
    /// reconciliation is skipped.
    pub async fn run(&self, name: &str, path: &Utf8Path, api: Option<&dyn BrokerApi>) -> SiteResult {
        let failed = |stage: Stage, err: &dyn fmt::Display| {
            warn!(site = name, %stage, error = %err, "site failed");
            SiteResult::failed(name, stage, err.to_string())
        };

        let source = match SiteSource::read(name, path) {
            Ok(source) => source,
            Err(e) => return failed(Stage::Loaded, &e),
        };
        let spec = match source.parse() {
            Ok(spec) => spec,
            Err(e) => return failed(Stage::Loaded, &e),
        };
        info!(site = name, stage = %Stage::Loaded, "site loaded");

        let site = match normalize_site(&spec) {
            Ok(site) => site,
            Err(e) => return failed(Stage::Normalized, &e),
        };
        info!(site = name, stage = %Stage::Normalized, "site normalized");

        let plan = match plan_site(&site, self.links) {
            Ok(plan) => plan,
            Err(e) => return failed(Stage::Compiled, &e),
        };
        info!(
            site = name,
            stage = %Stage::Compiled,
            central_objects = plan.central.object_count(),
            local_objects = plan.local.object_count(),
            relays = plan.relays.len(),
            "site compiled"
        );

        let central = async {
            match api {
                Some(api) if !self.options.skip_central => {
                    let result = Applier::new(api).apply(&plan.central, &[]).await;
                    if result.is_ok() {
                        info!(site = name, stage = %Stage::CentralApplied, "central broker reconciled");
                    }
                    Some(result.map_err(ReconcileError::from))
                }
                _ => None,
            }
        };
        let definitions = async {
            if self.options.skip_definitions {
                return None;
            }
            let fingerprint = fingerprint(&source.contents, self.settings);
            let writer = self.writer.clone();
            let site = name.to_string();
            let plan = plan.clone();
            let admin = self.settings.site.clone();
            let result = tokio::task::spawn_blocking(move || {
                writer.emit(&site, &fingerprint, || plan.definitions(&admin))
            })
            .await
            .unwrap_or_else(|e| Err(ReconcileError::blocking(name, e)));
            if let Ok(outcome) = &result {
                info!(site = name, stage = %Stage::DefinitionsWritten, %outcome, "definitions emitted");
            }
            Some(result)
        };
        let (central, definitions) = tokio::join!(central, definitions);

        let mut report = SiteReport::default();
        let mut failures = Vec::new();
        match central {
            Some(Ok(summary)) => report.central = Some(summary),
            Some(Err(e)) => failures.push((Stage::CentralApplied, e.to_string())),
            None => {}
        }
        match definitions {
            Some(Ok(outcome)) => report.definitions = Some(outcome),
            Some(Err(e)) => failures.push((Stage::DefinitionsWritten, e.to_string())),
            None => {}
        }

        if let Some((stage, _)) = failures.first() {
            let reason = failures
                .iter()
                .map(|(_, reason)| reason.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return failed(*stage, &reason);
        }

        info!(site = name, stage = %Stage::Done, "site reconciled");
        SiteResult::done(name, report)
    }
}
