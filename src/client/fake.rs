//! In-memory `DocumentApi` used by the component tests.

use super::api::DocumentApi;
use super::schema::{
    EvaluationResponse, MessageResponse, QueryMode, QueryResponse, RegistryEntry,
    UploadCandidate, UploadProgress, UploadResponse,
};
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List,
    Upload(String),
    Delete(String),
    DeleteAll,
    Query(String, QueryMode),
    Evaluate,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    files: Mutex<Vec<RegistryEntry>>,
    calls: Mutex<Vec<Call>>,
    failing_uploads: Mutex<HashSet<String>>,
    list_fails: AtomicBool,
    answer: Mutex<Option<std::result::Result<String, String>>>,
    query_gate: Mutex<Option<Arc<Notify>>>,
    upload_gate: Mutex<Option<Arc<Notify>>>,
    progress_watch: Mutex<Option<watch::Receiver<Option<UploadProgress>>>>,
    observed_progress: Mutex<Vec<Option<UploadProgress>>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_files(names: &[&str]) -> Self {
        let api = Self::new();
        *api.files.lock() = names.iter().map(|n| RegistryEntry::new(*n)).collect();
        api
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn uploads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upload(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn fail_upload_of(&self, name: &str) {
        self.failing_uploads.lock().insert(name.to_string());
    }

    pub(crate) fn fail_listing(&self, fail: bool) {
        self.list_fails.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn answer_with(&self, answer: std::result::Result<&str, &str>) {
        *self.answer.lock() = Some(answer.map(str::to_string).map_err(str::to_string));
    }

    /// Hold every query until the gate is notified.
    pub(crate) fn gate_queries(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.query_gate.lock() = Some(gate.clone());
        gate
    }

    /// Hold every upload until the gate is notified.
    pub(crate) fn gate_uploads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.upload_gate.lock() = Some(gate.clone());
        gate
    }

    /// Record the published progress each time an upload request starts.
    pub(crate) fn watch_progress(&self, rx: watch::Receiver<Option<UploadProgress>>) {
        *self.progress_watch.lock() = Some(rx);
    }

    pub(crate) fn observed_progress(&self) -> Vec<Option<UploadProgress>> {
        self.observed_progress.lock().clone()
    }
}

#[async_trait]
impl DocumentApi for FakeApi {
    async fn list_files(&self) -> Result<Vec<RegistryEntry>> {
        self.calls.lock().push(Call::List);
        if self.list_fails.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("connection refused".into()));
        }
        Ok(self.files.lock().clone())
    }

    async fn upload(&self, candidate: UploadCandidate) -> Result<UploadResponse> {
        if let Some(rx) = self.progress_watch.lock().as_ref() {
            self.observed_progress.lock().push(rx.borrow().clone());
        }
        self.calls.lock().push(Call::Upload(candidate.name.clone()));
        let gate = self.upload_gate.lock().clone();
        match gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }

        if self.failing_uploads.lock().contains(&candidate.name) {
            return Err(ClientError::Server {
                status: 500,
                detail: format!("Processing error: cannot parse {}", candidate.name),
            });
        }
        self.files.lock().push(RegistryEntry::new(candidate.name.clone()));
        Ok(UploadResponse {
            message: format!("'{}' processed", candidate.name),
            filename: Some(candidate.name),
            chunks_added: 3,
        })
    }

    async fn delete_file(&self, filename: &str) -> Result<MessageResponse> {
        self.calls.lock().push(Call::Delete(filename.to_string()));
        let mut files = self.files.lock();
        let before = files.len();
        files.retain(|f| f.filename != filename);
        if files.len() == before {
            return Err(ClientError::Server {
                status: 404,
                detail: "File not found in session".into(),
            });
        }
        Ok(MessageResponse {
            message: format!("'{filename}' removed"),
        })
    }

    async fn delete_all(&self) -> Result<MessageResponse> {
        self.calls.lock().push(Call::DeleteAll);
        self.files.lock().clear();
        Ok(MessageResponse {
            message: "All files removed".into(),
        })
    }

    async fn query(&self, question: &str, mode: QueryMode) -> Result<QueryResponse> {
        self.calls.lock().push(Call::Query(question.to_string(), mode));
        let gate = self.query_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let answer = self.answer.lock().clone();
        match answer {
            Some(Ok(answer)) => Ok(QueryResponse {
                answer,
                files_used: Vec::new(),
            }),
            Some(Err(detail)) => Err(ClientError::Server { status: 500, detail }),
            None => Ok(QueryResponse {
                answer: format!("Answer to: {question}"),
                files_used: Vec::new(),
            }),
        }
    }

    async fn evaluate(&self) -> Result<EvaluationResponse> {
        self.calls.lock().push(Call::Evaluate);
        Ok(EvaluationResponse {
            message: "Evaluation complete".into(),
            results: serde_json::json!({"faithfulness": 1.0}),
        })
    }
}
