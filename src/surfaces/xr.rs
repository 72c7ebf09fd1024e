use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

use super::Surface;
use crate::config::XrConfig;
use crate::error::{AppError, Result};
use crate::project::{BufferKind, DocumentSnapshot, ProjectRecord};

// ── Environment detection ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum XrDevice {
    DedicatedHeadset,
    Mobile,
    Desktop,
}

const HEADSET_MARKERS: &[&str] = &[
    "OculusBrowser",
    "SamsungBrowser VR",
    "Windows Mixed Reality",
    "HTC_VR",
    "VRGlass",
];

const MOBILE_MARKERS: &[&str] = &["android", "iphone", "ipad", "ipod"];

/// Classifies the client from its user-agent string.
pub fn detect_device(user_agent: &str) -> XrDevice {
    if HEADSET_MARKERS.iter().any(|m| user_agent.contains(m)) {
        return XrDevice::DedicatedHeadset;
    }
    let lowered = user_agent.to_lowercase();
    if MOBILE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return XrDevice::Mobile;
    }
    XrDevice::Desktop
}

/// Results from probing the runtime for XR support.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XrCapabilities {
    pub supported: bool,
    pub device: XrDevice,
    pub notes: String,
}

impl XrCapabilities {
    pub fn detect(config: &XrConfig) -> Self {
        let device = config
            .user_agent
            .as_deref()
            .map(detect_device)
            .unwrap_or(XrDevice::Desktop);
        let notes = match device {
            XrDevice::DedicatedHeadset => "Dedicated VR/AR headset detected",
            XrDevice::Mobile => "Mobile device detected, WebXR may be supported",
            XrDevice::Desktop => {
                "Desktop device detected, WebXR may be supported with attached headsets"
            }
        };
        Self {
            supported: config.enabled,
            device,
            notes: notes.to_string(),
        }
    }

    /// Startup gate. Without XR nothing else is initialized.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.supported {
            Ok(())
        } else {
            Err(AppError::UnsupportedEnvironment(
                "Your browser does not support WebXR. Please try using a compatible browser like Chrome or Edge on a VR-ready device.".into(),
            ))
        }
    }
}

// ── Scene layout ────────────────────────────────────────────────────────────

/// A static panel entity in the 3D workspace. Positions are meters.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub position: [f32; 3],
    pub width: f32,
    pub height: f32,
    /// Which buffer the panel mirrors, for code panels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<BufferKind>,
}

pub fn scene_layout() -> Vec<PanelSpec> {
    let code_panel = |kind: BufferKind, title, x| PanelSpec {
        id: match kind {
            BufferKind::Html => "html-panel",
            BufferKind::Css => "css-panel",
            BufferKind::Js => "js-panel",
        },
        title,
        position: [x, 1.6, -1.0],
        width: 1.0,
        height: 0.7,
        buffer: Some(kind),
    };
    vec![
        code_panel(BufferKind::Html, "HTML", -0.5),
        code_panel(BufferKind::Css, "CSS", 0.5),
        code_panel(BufferKind::Js, "JS", 0.0),
        PanelSpec {
            id: "xr-llm-panel",
            title: "AI ASSISTANT",
            position: [0.0, 1.0, -1.0],
            width: 1.2,
            height: 0.6,
            buffer: None,
        },
        PanelSpec {
            id: "xr-preview-panel",
            title: "PREVIEW",
            position: [0.0, 1.6, -1.5],
            width: 1.6,
            height: 1.0,
            buffer: None,
        },
        PanelSpec {
            id: "xr-deploy-panel",
            title: "DEPLOY",
            position: [1.0, 1.0, -1.0],
            width: 0.6,
            height: 0.4,
            buffer: None,
        },
    ]
}

// ── Mirror surface ──────────────────────────────────────────────────────────

/// Mirrors the project into the 3D scene. The panels are decorative; only
/// the code text they carry follows the project.
pub struct XrMirrorSurface {
    capabilities: XrCapabilities,
    panels: Vec<PanelSpec>,
    mirrored: RefCell<DocumentSnapshot>,
}

impl XrMirrorSurface {
    pub fn new(capabilities: XrCapabilities) -> Rc<Self> {
        Rc::new(Self {
            capabilities,
            panels: scene_layout(),
            mirrored: RefCell::new(DocumentSnapshot::default()),
        })
    }

    pub fn capabilities(&self) -> &XrCapabilities {
        &self.capabilities
    }

    pub fn panels(&self) -> &[PanelSpec] {
        &self.panels
    }

    /// Text shown on the code panel for `kind`.
    pub fn panel_text(&self, kind: BufferKind) -> String {
        self.mirrored.borrow().get(kind).to_string()
    }
}

impl Surface for XrMirrorSurface {
    fn name(&self) -> &'static str {
        "xr-mirror"
    }

    fn render(&self, project: &ProjectRecord) {
        let mut mirrored = self.mirrored.borrow_mut();
        for kind in BufferKind::ALL {
            mirrored.set(kind, project.buffer(kind));
        }
    }
}
