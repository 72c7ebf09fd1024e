use serde::Serialize;

use super::print_json;
use crate::app::App;
use crate::config::AppConfig;
use crate::error::Result;
use crate::project::BufferKind;
use crate::surfaces::xr::{PanelSpec, XrCapabilities};

/// Results from scanning the configured environment for XR support.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub os: String,
    #[serde(flatten)]
    pub xr: XrCapabilities,
}

pub fn detect_environment(config: &AppConfig) -> DetectionResult {
    DetectionResult {
        os: std::env::consts::OS.to_string(),
        xr: XrCapabilities::detect(&config.xr),
    }
}

pub fn detect(config: &AppConfig) -> Result<()> {
    print_json(&detect_environment(config))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PanelView<'a> {
    #[serde(flatten)]
    panel: &'a PanelSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneView<'a> {
    capabilities: &'a XrCapabilities,
    panels: Vec<PanelView<'a>>,
}

/// Prints the scene panels with the code each code panel currently shows.
pub fn scene(app: &App) -> Result<()> {
    let panels = app
        .xr
        .panels()
        .iter()
        .map(|panel| PanelView {
            panel,
            text: panel.buffer.map(|kind: BufferKind| app.xr.panel_text(kind)),
        })
        .collect();
    print_json(&SceneView {
        capabilities: app.xr.capabilities(),
        panels,
    })
}
