use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One file in the server's registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub filename: String,
}

impl RegistryEntry {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }
}

/// A file picked or dropped by the user, read into memory for one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub name: String,
    pub media_type: String,
    pub content: Vec<u8>,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            content,
        }
    }
}

/// Candidates in the order the user supplied them.
pub type UploadBatch = Vec<UploadCandidate>;

/// "On file `current` of `total`, named `current_file`."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub current: usize,
    pub total: usize,
    pub current_file: String,
}

/// Answering strategy sent with every question. Opaque to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Vector,
    Combined,
}

impl QueryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryMode::Vector => "vector",
            QueryMode::Combined => "combined",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vector" => Ok(QueryMode::Vector),
            "combined" => Ok(QueryMode::Combined),
            other => Err(format!(
                "unknown mode '{other}', expected 'vector' or 'combined'"
            )),
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<RegistryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub chunks_added: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub question: &'a str,
    pub mode: QueryMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub files_used: Vec<String>,
}

/// Result of a server-side evaluation run; `results` is passed through untouched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvaluationResponse {
    pub message: String,
    #[serde(default)]
    pub results: serde_json::Value,
}

/// Error body of a non-2xx response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The user-facing message: a string detail verbatim, anything else as compact JSON.
    pub fn into_message(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}
