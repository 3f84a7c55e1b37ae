//! Crate error type.

use std::path::PathBuf;

/// Errors reported by the fallible collaborators of the widgets: the
/// key-value store, settings loading and the task service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The key-value store file is not valid JSON.
    #[error("invalid store file: {0}")]
    Json(#[from] serde_json::Error),
    /// The settings file is not valid TOML.
    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
    /// The task service refused or failed a request.
    #[error("task {task_id}: {message}")]
    Task {
        /// Task the request was about.
        task_id: u64,
        /// Reason given by the service.
        message: String,
    },
    /// A quick action name that is not recognised.
    #[error("unknown action: {0}")]
    UnknownAction(String),
    /// A theme name other than `light` or `dark`.
    #[error("unknown theme: {0}")]
    UnknownTheme(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
