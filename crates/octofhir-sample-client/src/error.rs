use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the sample client
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Error reading last names from {}", .path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to connect to server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    ServerResponse { status: u16, message: String },

    #[error("Failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Batch task failed: {0}")]
    BatchTask(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SampleError {
    /// Create a new ResourceUnavailable error
    pub fn resource_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ResourceUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Create a new InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Failures coming from the network or the remote server
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ServerResponse { .. } | Self::Decode(_)
        )
    }

    /// HTTP status returned by the server, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerResponse { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SampleError>;
