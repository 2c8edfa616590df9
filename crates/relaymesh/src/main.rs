//! relaymesh - compiles per-site broker topology specifications and
//! reconciles them onto a central broker and site definitions files.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // reqwest's rustls backend needs a process-wide provider before the first handshake
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let settings = cli.settings.as_deref();
    match cli.command {
        Commands::Reconcile(args) => commands::reconcile::run(args, settings).await,
        Commands::Plan(args) => commands::plan::run(args, settings),
        Commands::Validate(args) => commands::validate::run(args, settings),
        Commands::PushSite(args) => commands::push_site::run(args, settings).await,
    }
}

/// `RUST_LOG` wins; otherwise `-q` / `-v` pick the level
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
