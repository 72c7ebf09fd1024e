use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::{AppError, Result};
use crate::templates;
use crate::util::{generate_id, now};

/// The live project record. Every surface holds the same `Rc`, so an
/// in-place edit plus a bus event is all the synchronization there is.
pub type SharedProject = Rc<RefCell<ProjectRecord>>;

// ── Buffer kinds ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferKind {
    Html,
    Css,
    Js,
}

impl BufferKind {
    pub const ALL: [BufferKind; 3] = [BufferKind::Html, BufferKind::Css, BufferKind::Js];

    pub fn as_str(&self) -> &'static str {
        match self {
            BufferKind::Html => "html",
            BufferKind::Css => "css",
            BufferKind::Js => "js",
        }
    }
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BufferKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(BufferKind::Html),
            "css" => Ok(BufferKind::Css),
            "js" | "javascript" => Ok(BufferKind::Js),
            _ => Err(format!(
                "Invalid buffer '{}'. Must be one of: html, css, js",
                s
            )),
        }
    }
}

// ── Snapshots and patches ───────────────────────────────────────────────────

/// Owned copy of the three source buffers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub html: String,
    pub css: String,
    pub js: String,
}

impl DocumentSnapshot {
    pub fn get(&self, kind: BufferKind) -> &str {
        match kind {
            BufferKind::Html => &self.html,
            BufferKind::Css => &self.css,
            BufferKind::Js => &self.js,
        }
    }

    pub fn set(&mut self, kind: BufferKind, text: &str) {
        let slot = match kind {
            BufferKind::Html => &mut self.html,
            BufferKind::Css => &mut self.css,
            BufferKind::Js => &mut self.js,
        };
        if slot != text {
            slot.clear();
            slot.push_str(text);
        }
    }
}

/// Partial update to the source buffers. Absent fields are left alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js: Option<String>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.html.is_none() && self.css.is_none() && self.js.is_none()
    }

    /// Present fields, in html/css/js order.
    pub fn fields(&self) -> impl Iterator<Item = (BufferKind, &str)> {
        [
            (BufferKind::Html, self.html.as_deref()),
            (BufferKind::Css, self.css.as_deref()),
            (BufferKind::Js, self.js.as_deref()),
        ]
        .into_iter()
        .filter_map(|(kind, text)| text.map(|t| (kind, t)))
    }
}

// ── Project record ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub html: String,
    pub css: String,
    pub js: String,
}

impl ProjectRecord {
    /// Builds a record from the default template with a fresh id.
    pub fn from_template() -> Self {
        let ts = now();
        Self {
            id: generate_id("project"),
            name: templates::DEFAULT_PROJECT_NAME.to_string(),
            created: ts,
            modified: ts,
            html: templates::default_html().to_string(),
            css: templates::default_css().to_string(),
            js: templates::default_js().to_string(),
        }
    }

    pub fn into_shared(self) -> SharedProject {
        Rc::new(RefCell::new(self))
    }

    pub fn buffer(&self, kind: BufferKind) -> &str {
        match kind {
            BufferKind::Html => &self.html,
            BufferKind::Css => &self.css,
            BufferKind::Js => &self.js,
        }
    }

    pub fn set_buffer(&mut self, kind: BufferKind, text: String) {
        match kind {
            BufferKind::Html => self.html = text,
            BufferKind::Css => self.css = text,
            BufferKind::Js => self.js = text,
        }
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            html: self.html.clone(),
            css: self.css.clone(),
            js: self.js.clone(),
        }
    }
}

// ── Import document ─────────────────────────────────────────────────────────

/// A project file as read from disk. Only the three buffers are required.
#[derive(Clone, Debug, Deserialize)]
pub struct ProjectDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub css: Option<String>,
    #[serde(default)]
    pub js: Option<String>,
}

impl ProjectDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| AppError::Validation(format!("failed to parse project file: {e}")))
    }

    /// Checks the required buffers and fills in missing metadata.
    /// An empty buffer is accepted; a missing one is not.
    pub fn into_record(self) -> Result<ProjectRecord> {
        let missing: Vec<&str> = [
            ("html", self.html.is_none()),
            ("css", self.css.is_none()),
            ("js", self.js.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        let ts = now();
        Ok(ProjectRecord {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| generate_id("project")),
            name: self
                .name
                .unwrap_or_else(|| templates::DEFAULT_PROJECT_NAME.to_string()),
            created: self.created.unwrap_or(ts),
            modified: ts,
            html: self.html.unwrap_or_default(),
            css: self.css.unwrap_or_default(),
            js: self.js.unwrap_or_default(),
        })
    }
}
