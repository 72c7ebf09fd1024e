use serde::Serialize;

/// All errors that can surface from the project core and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed project document on import.
    #[error("Invalid project file: {0}")]
    Validation(String),

    /// Persistence backend failure (quota, unreadable file, ...).
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Assistant(String),

    #[error("{0}")]
    Deploy(String),

    #[error("GitHub API rate limit exceeded. Please try again later.")]
    RateLimit,

    /// XR capability missing at startup. The only fatal error class.
    #[error("WebXR not supported: {0}")]
    UnsupportedEnvironment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{0}")]
    Custom(String),
}

// Status displays and `--json` output carry errors as plain strings.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
