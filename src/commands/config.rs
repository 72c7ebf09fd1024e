use clap::Subcommand;
use std::path::Path;

use super::print_json;
use crate::config::{load_config, save_config, AppConfig};
use crate::error::{AppError, Result};

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective config, command-line overrides included
    Show,
    /// Write the effective config to the config file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(action: &ConfigAction, path: Option<&Path>, config: &AppConfig) -> Result<()> {
    match action {
        ConfigAction::Show => print_json(config),
        ConfigAction::Init { force } => {
            let path = path.ok_or_else(|| {
                AppError::Custom("Could not find home directory; pass --config".into())
            })?;
            init(path, config, *force)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn init(path: &Path, config: &AppConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(AppError::Custom(format!(
            "{} already exists (use --force to replace it)",
            path.display()
        )));
    }
    save_config(path, config)?;
    tracing::info!(path = %path.display(), "config written");
    // Read it back so a file we cannot parse later fails here instead.
    load_config(path)
        .map(|_| ())
        .ok_or_else(|| AppError::Custom(format!("{} could not be read back", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::default();
        config.deploy.failure_rate = 0.25;
        config.storage_dir = Some("/srv/projects".into());

        run(&ConfigAction::Init { force: false }, Some(&path), &config).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.deploy.failure_rate, 0.25);
        assert_eq!(loaded.storage_dir.as_deref(), Some("/srv/projects"));
    }

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"deploy": {"failureRate": 1.0}}"#).unwrap();

        let config = AppConfig::default();
        assert!(init(&path, &config, false).is_err());
        assert_eq!(load_config(&path).unwrap().deploy.failure_rate, 1.0);

        init(&path, &config, true).unwrap();
        assert_eq!(
            load_config(&path).unwrap().deploy.failure_rate,
            config.deploy.failure_rate
        );
    }

    #[test]
    fn test_init_without_path_is_an_error() {
        let config = AppConfig::default();
        assert!(run(&ConfigAction::Init { force: false }, None, &config).is_err());
    }
}
