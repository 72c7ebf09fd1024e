use futures_util::future::{FutureExt, LocalBoxFuture};
use serde::Serialize;
use std::io::{Cursor, Write};
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::DeployConfig;
use crate::error::{AppError, Result};
use crate::project::{export_file_name, ProjectRecord};
use crate::templates;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Deployment {
    pub url: String,
}

/// Remote publishing collaborator behind the deploy panel.
pub trait Publisher {
    fn publish<'a>(&'a self, name: &'a str) -> LocalBoxFuture<'a, Result<Deployment>>;

    fn archive_export<'a>(
        &'a self,
        name: &'a str,
        project: &'a ProjectRecord,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>>>;
}

/// Stand-in for GitHub Pages: waits, then fails with a rate limit at the
/// configured rate or reports a Pages URL.
pub struct SimulatedPublisher {
    latency: Duration,
    archive_latency: Duration,
    failure_rate: f64,
    pages_owner: String,
}

impl SimulatedPublisher {
    pub fn new(config: &DeployConfig) -> Self {
        Self {
            latency: Duration::from_millis(config.latency_ms),
            archive_latency: Duration::from_millis(config.archive_latency_ms),
            failure_rate: config.failure_rate.clamp(0.0, 1.0),
            pages_owner: config.pages_owner.clone(),
        }
    }

    pub fn pages_url(&self, name: &str) -> String {
        format!("https://{}.github.io/{}", self.pages_owner, name)
    }

    fn roll_failure(&self) -> bool {
        // random::<f64>() is in [0, 1), so a rate of 1.0 always fails and 0.0 never does.
        rand::random::<f64>() < self.failure_rate
    }
}

impl Publisher for SimulatedPublisher {
    fn publish<'a>(&'a self, name: &'a str) -> LocalBoxFuture<'a, Result<Deployment>> {
        async move {
            tokio::time::sleep(self.latency).await;
            if self.roll_failure() {
                return Err(AppError::RateLimit);
            }
            let url = self.pages_url(name);
            tracing::info!(%name, %url, "simulated GitHub Pages deployment");
            Ok(Deployment { url })
        }
        .boxed_local()
    }

    fn archive_export<'a>(
        &'a self,
        name: &'a str,
        project: &'a ProjectRecord,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>>> {
        async move {
            tokio::time::sleep(self.archive_latency).await;
            build_archive(name, project)
        }
        .boxed_local()
    }
}

/// Packages the project as a ZIP: the standalone page, the raw sources and
/// the project file itself.
pub fn build_archive(name: &str, project: &ProjectRecord) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let page = templates::standalone_document(&project.html, &project.css, &project.js);
    let project_json = serde_json::to_vec_pretty(project)?;
    let entries: [(String, &[u8]); 4] = [
        ("index.html".to_string(), page.as_bytes()),
        ("style.css".to_string(), project.css.as_bytes()),
        ("script.js".to_string(), project.js.as_bytes()),
        (export_file_name(name), project_json.as_slice()),
    ];

    for (path, bytes) in entries {
        zip.start_file(path, options)?;
        zip.write_all(bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn publisher(failure_rate: f64) -> SimulatedPublisher {
        SimulatedPublisher::new(&DeployConfig {
            failure_rate,
            pages_owner: "octo".into(),
            ..Default::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_success_builds_pages_url() {
        let deployment = publisher(0.0).publish("my-xr-web-app").await.unwrap();
        assert_eq!(deployment.url, "https://octo.github.io/my-xr-web-app");
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_failure_is_rate_limit() {
        let err = publisher(1.0).publish("my-xr-web-app").await.unwrap_err();
        assert!(matches!(err, AppError::RateLimit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_waits_for_latency() {
        let started = tokio::time::Instant::now();
        publisher(0.0).publish("app").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[test]
    fn test_failure_rate_is_clamped() {
        assert_eq!(publisher(7.0).failure_rate, 1.0);
        assert_eq!(publisher(-1.0).failure_rate, 0.0);
    }

    #[test]
    fn test_archive_contents() {
        let mut project = ProjectRecord::from_template();
        project.name = "Demo App".into();
        let bytes = build_archive(&project.name, &project).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["demo-app.ccxr.json", "index.html", "script.js", "style.css"]
        );

        let mut css = String::new();
        archive.by_name("style.css").unwrap().read_to_string(&mut css).unwrap();
        assert_eq!(css, project.css);

        let mut page = String::new();
        archive.by_name("index.html").unwrap().read_to_string(&mut page).unwrap();
        assert!(page.contains("<title>CodeCrafter XR Project</title>"));
        assert!(page.contains("<h1>Hello World</h1>"));
    }
}
