use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::util::expand_tilde;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantConfig {
    /// Simulated thinking time of the canned assistant.
    pub delay_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self { delay_ms: 800 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployConfig {
    pub latency_ms: u64,
    pub archive_latency_ms: u64,
    /// Probability in `[0, 1]` that a publish fails with a rate limit.
    pub failure_rate: f64,
    /// GitHub account the Pages URL is built for.
    pub pages_owner: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            latency_ms: 2000,
            archive_latency_ms: 1500,
            failure_rate: 0.1,
            pages_owner: "username".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XrConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for XrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user_agent: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<String>,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub xr: XrConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            storage_dir: None,
            assistant: AssistantConfig::default(),
            deploy: DeployConfig::default(),
            xr: XrConfig::default(),
        }
    }
}

impl AppConfig {
    /// Directory holding the persisted project keys.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(PathBuf::from(expand_tilde(dir))),
            None => app_dir()
                .map(|d| d.join("storage"))
                .ok_or_else(|| AppError::Custom("Cannot find home directory".into())),
        }
    }
}

fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".codecrafter"))
}

pub fn config_path() -> Option<PathBuf> {
    app_dir().map(|d| d.join("config.json"))
}

/// Reads the config file. A missing or unparsable file yields `None`.
pub fn load_config(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
            None
        }
    }
}

pub fn load_or_default(path: Option<&Path>) -> AppConfig {
    path.and_then(load_config).unwrap_or_default()
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"version": 1, "deploy": {"failureRate": 1.0}}"#).unwrap();
        assert_eq!(config.deploy.failure_rate, 1.0);
        assert_eq!(config.deploy.latency_ms, 2000);
        assert_eq!(config.deploy.archive_latency_ms, 1500);
        assert_eq!(config.deploy.pages_owner, "username");
        assert_eq!(config.assistant.delay_ms, 800);
        assert!(config.xr.enabled);
        assert!(config.storage_dir.is_none());

        let config: AppConfig =
            serde_json::from_str(r#"{"xr": {"userAgent": "OculusBrowser"}}"#).unwrap();
        assert!(config.xr.enabled);
        assert_eq!(config.xr.user_agent.as_deref(), Some("OculusBrowser"));
    }

    #[test]
    fn test_storage_dir_survives_missing_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"storageDir": "/srv/x"}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.storage_dir.as_deref(), Some("/srv/x"));
        assert_eq!(load_or_default(Some(&path)).storage_dir.as_deref(), Some("/srv/x"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("config.json");
        let mut config = AppConfig::default();
        config.storage_dir = Some("/tmp/codecrafter".into());
        config.xr.user_agent = Some("OculusBrowser/20.0".into());

        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.storage_dir.as_deref(), Some("/tmp/codecrafter"));
        assert_eq!(loaded.xr.user_agent.as_deref(), Some("OculusBrowser/20.0"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"storageDir\""));
        assert!(raw.contains("\"failureRate\""));
    }

    #[test]
    fn test_missing_or_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert!(load_config(&path).is_none());

        std::fs::write(&path, "{ nope").unwrap();
        assert!(load_config(&path).is_none());
        assert_eq!(load_or_default(Some(&path)).version, 1);
    }

    #[test]
    fn test_explicit_storage_dir() {
        let config = AppConfig {
            storage_dir: Some("/srv/projects".into()),
            ..Default::default()
        };
        assert_eq!(config.storage_dir().unwrap(), PathBuf::from("/srv/projects"));
    }
}
