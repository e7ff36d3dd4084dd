use super::schema::{
    ErrorBody, EvaluationResponse, FileListResponse, MessageResponse, QueryMode, QueryRequest,
    QueryResponse, RegistryEntry, UploadCandidate, UploadResponse,
};
use crate::config::Config;
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("docqa/", env!("CARGO_PKG_VERSION"));

const UPLOAD_FALLBACK: &str = "Upload failed";
const DELETE_FALLBACK: &str = "Delete failed";
const QUERY_FALLBACK: &str = "Failed to get an answer";
const EVALUATE_FALLBACK: &str = "Evaluation failed";

/// The question-answering service, one method per endpoint.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// `GET /files`
    async fn list_files(&self) -> Result<Vec<RegistryEntry>>;

    /// `POST /upload`, multipart field `file`.
    async fn upload(&self, candidate: UploadCandidate) -> Result<UploadResponse>;

    /// `DELETE /files/{filename}`
    async fn delete_file(&self, filename: &str) -> Result<MessageResponse>;

    /// `DELETE /files`
    async fn delete_all(&self) -> Result<MessageResponse>;

    /// `POST /query`
    async fn query(&self, question: &str, mode: QueryMode) -> Result<QueryResponse>;

    /// `POST /evaluate`
    async fn evaluate(&self) -> Result<EvaluationResponse>;
}

/// `DocumentApi` over HTTP. No retries, no signing.
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self> {
        let base = reqwest::Url::parse(config.api_url.trim())
            .map_err(|e| ClientError::Config(format!("invalid api_url '{}': {e}", config.api_url)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "api_url must be http or https, got '{}'",
                base.scheme()
            )));
        }

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn file_url(&self, filename: &str) -> String {
        self.url(&format!("/files/{}", urlencoding::encode(filename)))
    }

    /// Decode a 2xx body, or turn the response into a `Server` error using
    /// its `detail`, falling back to `fallback`.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response, fallback: &str) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(ClientError::transport);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| fallback.to_string());
        tracing::debug!(status = status.as_u16(), %detail, "Server rejected request");
        Err(ClientError::Server {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl DocumentApi for HttpApi {
    async fn list_files(&self) -> Result<Vec<RegistryEntry>> {
        let response = self
            .http
            .get(self.url("/files"))
            .send()
            .await
            .map_err(ClientError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                detail: format!("HTTP error {}", status.as_u16()),
            });
        }
        let list: FileListResponse = response.json().await.map_err(ClientError::transport)?;
        Ok(list.files)
    }

    async fn upload(&self, candidate: UploadCandidate) -> Result<UploadResponse> {
        let UploadCandidate {
            name,
            media_type,
            content,
        } = candidate;
        tracing::debug!(file = %name, bytes = content.len(), "Uploading document");

        let part = Part::bytes(content)
            .file_name(name)
            .mime_str(&media_type)
            .map_err(ClientError::transport)?;
        let form = Form::new().part("file", part);
        let response = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(ClientError::transport)?;
        Self::decode(response, UPLOAD_FALLBACK).await
    }

    async fn delete_file(&self, filename: &str) -> Result<MessageResponse> {
        let response = self
            .http
            .delete(self.file_url(filename))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Self::decode(response, DELETE_FALLBACK).await
    }

    async fn delete_all(&self) -> Result<MessageResponse> {
        let response = self
            .http
            .delete(self.url("/files"))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Self::decode(response, DELETE_FALLBACK).await
    }

    async fn query(&self, question: &str, mode: QueryMode) -> Result<QueryResponse> {
        let response = self
            .http
            .post(self.url("/query"))
            .json(&QueryRequest { question, mode })
            .send()
            .await
            .map_err(ClientError::transport)?;
        Self::decode(response, QUERY_FALLBACK).await
    }

    async fn evaluate(&self) -> Result<EvaluationResponse> {
        let response = self
            .http
            .post(self.url("/evaluate"))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Self::decode(response, EVALUATE_FALLBACK).await
    }
}
