use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Every failure the client can surface to a user.
///
/// None of these are fatal; retrying the user action is always valid.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally before any request was made.
    #[error("'{filename}' is not a supported document ({media_type}); use PDF, ODT, DOC or DOCX")]
    UnsupportedMediaType { filename: String, media_type: String },

    /// Network unreachable or a response that could not be decoded.
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-2xx response. `detail` is the server's message, verbatim.
    #[error("{detail}")]
    Server { status: u16, detail: String },

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Upload at least one document before asking questions")]
    NoDocuments,

    #[error("{0} is already in progress")]
    Busy(&'static str),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Transport(format!("malformed response: {err}"))
        } else {
            ClientError::Transport(err.to_string())
        }
    }

    /// HTTP status for server-reported errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
