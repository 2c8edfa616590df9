//! # relaymesh-reconcile
//!
//! Drives each site from its specification file to a reconciled central
//! broker and an emitted definitions document:
//! - [`emit`]: definitions documents with content-hash gating
//! - [`pipeline`]: the per-site stage sequence
//! - [`batch`]: bounded concurrent reconciliation of a directory of sites

pub mod batch;
pub mod emit;
pub mod error;
pub mod pipeline;

pub use batch::{BatchReport, BatchRunner, CancellationFlag};
pub use emit::{fingerprint, DefinitionsWriter, EmitOutcome};
pub use error::{ReconcileError, Result};
pub use pipeline::{PipelineOptions, SitePipeline, SiteOutcome, SiteReport, SiteResult, Stage};
