use clap::Subcommand;
use std::path::PathBuf;

use crate::app::App;
use crate::config::AppConfig;
use crate::error::Result;
use crate::project::BufferKind;

pub mod assistant;
pub mod config;
pub mod deploy;
pub mod detect;
pub mod preview;
pub mod project;

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new project from the default template
    New {
        /// Name for the new project
        #[arg(long)]
        name: Option<String>,
    },
    /// List saved projects
    List,
    /// Print the current project, or one of its buffers
    Show {
        /// Print only this buffer (html, css or js)
        #[arg(long)]
        kind: Option<BufferKind>,
    },
    /// Make a saved project current
    Load { id: String },
    /// Remove a project from the saved list
    Delete { id: String },
    /// Rename the current project
    Rename { name: String },
    /// Load a project file and make it current
    Import { file: PathBuf },
    /// Write the current project to a project file
    Export {
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Replace one source buffer of the current project
    Edit {
        /// html, css or js
        kind: BufferKind,
        /// Read the new text from a file
        #[arg(long, conflicts_with = "text", required_unless_present = "text")]
        file: Option<PathBuf>,
        /// Use this text
        #[arg(long)]
        text: Option<String>,
    },
    /// Ask the assistant to change the project
    Ask { prompt: String },
    /// Render the live preview document
    Preview {
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Publish the current project
    Deploy {
        /// Site name (defaults to my-xr-web-app)
        #[arg(long)]
        name: Option<String>,
        /// Override the simulated failure probability
        #[arg(long, value_name = "RATE")]
        fail_rate: Option<f64>,
    },
    /// Package the current project as a ZIP archive
    Archive {
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Print the XR scene layout and mirrored code panels
    Scene,
    /// Report XR support for a user agent
    Detect {
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Inspect or write the config file
    Config {
        #[command(subcommand)]
        action: config::ConfigAction,
    },
}

impl Command {
    /// Folds command-line overrides into the loaded config before bootstrap.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        match self {
            Command::Deploy {
                fail_rate: Some(rate),
                ..
            } => config.deploy.failure_rate = *rate,
            Command::Detect {
                user_agent: Some(ua),
            } => config.xr.user_agent = Some(ua.clone()),
            _ => {}
        }
    }

    /// Commands that only inspect the environment or the config run
    /// without a project.
    pub fn needs_app(&self) -> bool {
        !matches!(self, Command::Detect { .. } | Command::Config { .. })
    }
}

pub async fn execute(app: &App, command: Command) -> Result<()> {
    match command {
        Command::New { name } => project::new_project(app, name.as_deref()),
        Command::List => project::list(app),
        Command::Show { kind } => project::show(app, kind),
        Command::Load { id } => project::load(app, &id),
        Command::Delete { id } => project::delete(app, &id),
        Command::Rename { name } => project::rename(app, &name),
        Command::Import { file } => project::import(app, &file),
        Command::Export { out } => project::export(app, out),
        Command::Edit { kind, file, text } => project::edit(app, kind, file, text),
        Command::Ask { prompt } => assistant::ask(app, &prompt).await,
        Command::Preview { out } => preview::preview(app, out),
        Command::Deploy { name, .. } => deploy::deploy(app, name.as_deref()).await,
        Command::Archive { name, out } => deploy::archive(app, name.as_deref(), out).await,
        Command::Scene => detect::scene(app),
        Command::Detect { .. } => detect::detect(&app.context.config),
        Command::Config { action } => config::run(
            &action,
            crate::config::config_path().as_deref(),
            &app.context.config,
        ),
    }
}

/// Pretty JSON on stdout, the format every listing command prints.
pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `bytes` to `out`, or to `default_name` in the working directory.
pub(crate) fn write_output(
    out: Option<PathBuf>,
    default_name: &str,
    bytes: &[u8],
) -> Result<PathBuf> {
    let path = out.unwrap_or_else(|| PathBuf::from(default_name));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, bytes)?;
    Ok(path)
}
