use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

pub mod app;
pub mod bus;
pub mod commands;
pub mod config;
pub mod error;
pub mod project;
pub mod services;
pub mod surfaces;
mod templates;
pub mod util;

pub use app::{App, AppContext, Collaborators};
pub use error::{AppError, Result};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "codecrafter")]
#[command(about = "Live-coding project core for CodeCrafter XR")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.codecrafter/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for persisted projects, overriding the config
    #[arg(long, global = true, value_name = "DIR")]
    pub storage: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: commands::Command,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let config_path = cli.config.clone().or_else(config::config_path);
    let mut config = config::load_or_default(config_path.as_deref());
    if let Some(dir) = &cli.storage {
        config.storage_dir = Some(dir.to_string_lossy().to_string());
    }
    cli.command.apply_overrides(&mut config);

    if !cli.command.needs_app() {
        return match &cli.command {
            commands::Command::Config { action } => {
                commands::config::run(action, config_path.as_deref(), &config)
                    .context("config command failed")
            }
            _ => commands::detect::detect(&config).context("detection failed"),
        };
    }

    // Everything runs on this thread; the surfaces share `Rc` state.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start runtime")?;

    let app = App::with_defaults(config)?;
    runtime.block_on(commands::execute(&app, cli.command))?;
    Ok(())
}

/// Logs go to stderr so command output on stdout stays parseable.
fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("CODECRAFTER_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("codecrafter_lib=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
