use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: credential rejected (HTTP {status}). Check AZURE_DEVOPS_PAT.")]
    Auth { status: u16 },

    #[error("Not found error: work item {0} does not exist or is not visible to this credential")]
    NotFound(u32),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input error: {0}")]
    Input(String),
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing_keys(keys: &[&str]) -> Self {
        Self::Config(format!(
            "missing required environment variable(s): {}",
            keys.join(", ")
        ))
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
