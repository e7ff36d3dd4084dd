//! Client for the document question-answering service.
//!
//! Each piece of client state has exactly one writer: the registry cache
//! belongs to [`FileRegistry`], upload progress to [`UploadOrchestrator`],
//! the question/answer turn to [`QueryController`] and the drag flag to
//! [`DragDropAdapter`].

pub mod api;
pub mod intake;
pub mod media;
pub mod notice;
pub mod query;
pub mod registry;
pub mod schema;
pub mod upload;

#[cfg(test)]
pub(crate) mod fake;

pub use api::{DocumentApi, HttpApi};
pub use intake::{DragDropAdapter, FileSelection, IntakeEvent};
pub use notice::{Notice, NoticeLog, NoticeSink};
pub use query::{QueryController, QuerySession, ERROR_MARKER};
pub use registry::{AlwaysConfirm, Confirm, Deletion, FileRegistry};
pub use schema::{
    EvaluationResponse, QueryMode, RegistryEntry, UploadBatch, UploadCandidate, UploadProgress,
};
pub use upload::{BatchReport, UploadOrchestrator};

use crate::error::{ClientError, Result};
use std::sync::Arc;

/// All client components wired to one service.
pub struct DocQa {
    api: Arc<dyn DocumentApi>,
    pub registry: Arc<FileRegistry>,
    pub uploads: Arc<UploadOrchestrator>,
    pub queries: QueryController,
    pub intake: DragDropAdapter,
}

impl DocQa {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        confirm: Arc<dyn Confirm>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        let registry = Arc::new(FileRegistry::new(api.clone(), confirm, notices.clone()));
        let uploads = Arc::new(UploadOrchestrator::new(
            api.clone(),
            registry.clone(),
            notices.clone(),
        ));
        Self {
            queries: QueryController::new(api.clone()),
            intake: DragDropAdapter::new(uploads.clone(), notices),
            api,
            registry,
            uploads,
        }
    }

    /// Ask a question, refused locally while no document is registered.
    pub async fn ask(&self, question: &str, mode: QueryMode) -> Result<String> {
        if !self.registry.can_ask() {
            return Err(ClientError::NoDocuments);
        }
        self.queries.submit(question, mode).await
    }

    /// Run the server-side evaluation over the uploaded corpus.
    pub async fn evaluate(&self) -> Result<EvaluationResponse> {
        let response = self.api.evaluate().await;
        match &response {
            Ok(r) => tracing::info!(message = %r.message, "Evaluation finished"),
            Err(e) => tracing::warn!(error = %e, "Evaluation failed"),
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fake::{Call, FakeApi};

    fn docqa(api: FakeApi) -> (Arc<FakeApi>, DocQa) {
        let api = Arc::new(api);
        let client = DocQa::new(api.clone(), Arc::new(AlwaysConfirm), Arc::new(NoticeLog::new()));
        (api, client)
    }

    #[tokio::test]
    async fn questions_are_gated_on_the_registry() {
        let (api, client) = docqa(FakeApi::new());

        let err = client.ask("Anything?", QueryMode::Vector).await.unwrap_err();
        assert!(matches!(err, ClientError::NoDocuments));
        assert!(api.calls().is_empty());

        client
            .uploads
            .submit_batch(vec![UploadCandidate::new("a.pdf", media::PDF, b"x".to_vec())])
            .await
            .unwrap();

        let answer = client.ask("Anything?", QueryMode::Combined).await.unwrap();
        assert_eq!(answer, "Answer to: Anything?");
        assert_eq!(
            api.calls().last(),
            Some(&Call::Query("Anything?".into(), QueryMode::Combined))
        );
    }

    #[tokio::test]
    async fn evaluate_is_forwarded() {
        let (api, client) = docqa(FakeApi::with_files(&["a.pdf"]));
        let response = client.evaluate().await.unwrap();
        assert_eq!(response.message, "Evaluation complete");
        assert_eq!(api.calls(), vec![Call::Evaluate]);
    }
}
