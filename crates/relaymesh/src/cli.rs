//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// relaymesh - compile site specifications into broker topology and relays
#[derive(Parser, Debug)]
#[command(name = "relaymesh")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to relaymesh.yaml settings file
    #[arg(short, long, global = true, env = "RELAYMESH_SETTINGS")]
    pub settings: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile the central broker and emit site definitions for every site
    Reconcile(ReconcileArgs),

    /// Print compiled topologies and relay links as JSON
    Plan(PlanArgs),

    /// Check that every site specification compiles
    Validate(ValidateArgs),

    /// Apply one site's topology and relay parameters to its own broker
    PushSite(PushSiteArgs),
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Directory holding one specification file per site
    pub spec_dir: Utf8PathBuf,

    /// Do not touch the central broker
    #[arg(long)]
    pub skip_central: bool,

    /// Do not emit definitions documents
    #[arg(long)]
    pub skip_definitions: bool,

    /// Emit definitions even for unchanged specifications
    #[arg(short, long)]
    pub force: bool,

    /// Number of sites reconciled concurrently
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Directory receiving definitions documents
    #[arg(short, long)]
    pub output_dir: Option<Utf8PathBuf>,

    /// Central broker management API URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Print the per-site results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Directory holding one specification file per site
    pub spec_dir: Utf8PathBuf,

    /// Only plan this site
    #[arg(long)]
    pub site: Option<String>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory holding one specification file per site
    pub spec_dir: Utf8PathBuf,
}

#[derive(Args, Debug)]
pub struct PushSiteArgs {
    /// Specification file of the site
    pub spec_file: Utf8PathBuf,

    /// Site broker management API URL
    #[arg(long)]
    pub api_url: String,
}
