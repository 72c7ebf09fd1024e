use std::path::PathBuf;

use super::write_output;
use crate::app::App;
use crate::error::{AppError, Result};
use crate::surfaces::deploy::DeployStatus;
use crate::util::slugify;

pub async fn deploy(app: &App, name: Option<&str>) -> Result<()> {
    app.deploy.deploy(name).await;
    report(app.deploy.status())
}

pub async fn archive(app: &App, name: Option<&str>, out: Option<PathBuf>) -> Result<()> {
    let Some(bytes) = app.deploy.export_archive(name).await else {
        return report(app.deploy.status());
    };
    let default_name = format!("{}.zip", slugify(&app.deploy.project_name()));
    let path = write_output(out, &default_name, &bytes)?;
    report(app.deploy.status())?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Prints a finished status line; an error status fails the command.
fn report(status: DeployStatus) -> Result<()> {
    match status {
        DeployStatus::Error(message) => Err(AppError::Deploy(message)),
        DeployStatus::Idle => Ok(()),
        DeployStatus::Info(message) | DeployStatus::Success(message) => {
            println!("{message}");
            Ok(())
        }
    }
}
