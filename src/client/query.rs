use super::api::DocumentApi;
use super::schema::QueryMode;
use crate::error::{ClientError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Prefix that marks a stored answer as an error message.
pub const ERROR_MARKER: &str = "❌ ";

/// The current question/answer turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySession {
    pub question: String,
    pub mode: QueryMode,
    pub answer: Option<String>,
    pub is_pending: bool,
}

impl QuerySession {
    pub fn is_error(&self) -> bool {
        self.answer
            .as_deref()
            .is_some_and(|a| a.starts_with(ERROR_MARKER))
    }
}

pub struct QueryController {
    api: Arc<dyn DocumentApi>,
    session: Mutex<QuerySession>,
}

impl QueryController {
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        Self {
            api,
            session: Mutex::new(QuerySession::default()),
        }
    }

    pub fn session(&self) -> QuerySession {
        self.session.lock().clone()
    }

    pub fn answer(&self) -> Option<String> {
        self.session.lock().answer.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.session.lock().is_pending
    }

    /// Ask one question.
    ///
    /// The previous answer is cleared before the request goes out. On
    /// failure the session holds the error text behind [`ERROR_MARKER`]
    /// and the error is also returned.
    pub async fn submit(&self, question: &str, mode: QueryMode) -> Result<String> {
        if question.trim().is_empty() {
            return Err(ClientError::EmptyQuestion);
        }
        {
            let mut session = self.session.lock();
            if session.is_pending {
                return Err(ClientError::Busy("A question"));
            }
            *session = QuerySession {
                question: question.to_string(),
                mode,
                answer: None,
                is_pending: true,
            };
        }

        tracing::info!(%mode, chars = question.chars().count(), "Submitting question");
        let result = self.api.query(question, mode).await;

        let mut session = self.session.lock();
        session.is_pending = false;
        match result {
            Ok(response) => {
                tracing::debug!(files_used = ?response.files_used, "Answer received");
                session.answer = Some(response.answer.clone());
                Ok(response.answer)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Question failed");
                session.answer = Some(format!("{ERROR_MARKER}{err}"));
                Err(err)
            }
        }
    }
}
