use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

use super::Surface;
use crate::bus::Topic;
use crate::project::{ProjectRecord, ProjectStore};
use crate::services::Publisher;

pub const DEFAULT_DEPLOY_NAME: &str = "my-xr-web-app";

/// What the deploy panel's status line shows.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "message")]
pub enum DeployStatus {
    Idle,
    Info(String),
    Success(String),
    Error(String),
}

/// Deploy and export panel. Reads the current project, never writes it.
pub struct DeploySurface {
    store: Rc<ProjectStore>,
    publisher: Rc<dyn Publisher>,
    project_name: RefCell<String>,
    status: RefCell<DeployStatus>,
}

impl DeploySurface {
    pub fn new(store: Rc<ProjectStore>, publisher: Rc<dyn Publisher>) -> Rc<Self> {
        Rc::new(Self {
            store,
            publisher,
            project_name: RefCell::new(DEFAULT_DEPLOY_NAME.to_string()),
            status: RefCell::new(DeployStatus::Idle),
        })
    }

    pub fn status(&self) -> DeployStatus {
        self.status.borrow().clone()
    }

    pub fn project_name(&self) -> String {
        self.project_name.borrow().clone()
    }

    pub fn set_project_name(&self, name: impl Into<String>) {
        *self.project_name.borrow_mut() = name.into();
    }

    /// Publishes under `name`, or the panel's name field when `None`.
    /// Returns the live URL on success; failures only reach the status line.
    pub async fn deploy(&self, name: Option<&str>) -> Option<String> {
        let name = self.resolve_name(name);
        self.set_status(DeployStatus::Info("Deploying to GitHub Pages...".into()));

        match self.publisher.publish(&name).await {
            Ok(deployment) => {
                self.set_status(DeployStatus::Success(format!(
                    "Successfully deployed to GitHub Pages! Your app is live at: {}",
                    deployment.url
                )));
                Some(deployment.url)
            }
            Err(e) => {
                tracing::error!(error = %e, %name, "deployment failed");
                self.set_status(DeployStatus::Error(format!("Error: {e}")));
                None
            }
        }
    }

    /// Packages the current project as a ZIP archive.
    pub async fn export_archive(&self, name: Option<&str>) -> Option<Vec<u8>> {
        let name = self.resolve_name(name);
        self.set_status(DeployStatus::Info("Generating ZIP file...".into()));

        // Owned copy so no borrow of the live record spans the await.
        let record = self.store.current().borrow().clone();
        match self.publisher.archive_export(&name, &record).await {
            Ok(bytes) => {
                tracing::info!(%name, size = bytes.len(), "archive generated");
                self.set_status(DeployStatus::Success("ZIP file generated!".into()));
                Some(bytes)
            }
            Err(e) => {
                tracing::error!(error = %e, %name, "archive export failed");
                self.set_status(DeployStatus::Error(format!("Error: {e}")));
                None
            }
        }
    }

    fn resolve_name(&self, name: Option<&str>) -> String {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => {
                self.set_project_name(name);
                name.to_string()
            }
            None => self.project_name(),
        }
    }

    fn set_status(&self, status: DeployStatus) {
        *self.status.borrow_mut() = status;
    }
}

impl Surface for DeploySurface {
    fn name(&self) -> &'static str {
        "deploy"
    }

    // The panel only shows the name field and status line, neither of
    // which depends on buffer text.
    fn topics(&self) -> &'static [Topic] {
        &[Topic::ProjectChanged]
    }

    fn render(&self, _project: &ProjectRecord) {}
}
