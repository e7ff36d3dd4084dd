use super::api::DocumentApi;
use super::notice::{Notice, NoticeSink};
use super::schema::RegistryEntry;
use crate::error::Result;
use parking_lot::RwLock;
use std::sync::Arc;

/// Blocking yes/no prompt in front of destructive actions.
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Answers yes without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
    /// The user declined; nothing was sent.
    Cancelled,
    /// The server's confirmation message.
    Deleted(String),
}

/// Local cache of the server's file registry.
///
/// The cache is only ever replaced wholesale by `refresh`, so it always
/// holds the last snapshot that was fetched successfully. It may lag the
/// server between a mutation and the refresh that follows it.
pub struct FileRegistry {
    api: Arc<dyn DocumentApi>,
    confirm: Arc<dyn Confirm>,
    notices: Arc<dyn NoticeSink>,
    cache: RwLock<Vec<RegistryEntry>>,
    error: RwLock<Option<String>>,
}

impl FileRegistry {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        confirm: Arc<dyn Confirm>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            api,
            confirm,
            notices,
            cache: RwLock::new(Vec::new()),
            error: RwLock::new(None),
        }
    }

    /// Re-fetch the registry and return the cache as it stands afterwards.
    ///
    /// Never fails: on error the previous snapshot stays and the message is
    /// readable through [`FileRegistry::error`].
    pub async fn refresh(&self) -> Vec<RegistryEntry> {
        match self.api.list_files().await {
            Ok(files) => {
                tracing::debug!(count = files.len(), "Registry refreshed");
                *self.cache.write() = files.clone();
                *self.error.write() = None;
                files
            }
            Err(err) => {
                tracing::warn!(error = %err, "Registry refresh failed, keeping last snapshot");
                let message = err.to_string();
                *self.error.write() = Some(message.clone());
                self.notices.notify(Notice::RegistryUnavailable { error: message });
                self.entries()
            }
        }
    }

    pub fn entries(&self) -> Vec<RegistryEntry> {
        self.cache.read().clone()
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Questions are allowed iff at least one document is registered.
    pub fn can_ask(&self) -> bool {
        !self.is_empty()
    }

    /// Message from the most recent failed refresh, cleared by a successful one.
    pub fn error(&self) -> Option<String> {
        self.error.read().clone()
    }

    /// Delete one file after confirmation, then refresh.
    ///
    /// On failure the cache is left as it was.
    pub async fn delete_one(&self, filename: &str) -> Result<Deletion> {
        if !self
            .confirm
            .confirm(&format!("Are you sure you want to delete \"{filename}\"?"))
        {
            tracing::debug!(file = %filename, "Delete cancelled");
            return Ok(Deletion::Cancelled);
        }

        match self.api.delete_file(filename).await {
            Ok(response) => {
                tracing::info!(file = %filename, "Deleted file");
                self.notices.notify(Notice::Deleted {
                    message: response.message.clone(),
                });
                self.refresh().await;
                Ok(Deletion::Deleted(response.message))
            }
            Err(err) => {
                tracing::warn!(file = %filename, error = %err, "Delete failed");
                self.notices.notify(Notice::DeleteFailed {
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Delete every file in one request after confirmation, then refresh.
    pub async fn delete_all(&self) -> Result<Deletion> {
        let prompt = format!(
            "Are you sure you want to delete all {} files?",
            self.len()
        );
        if !self.confirm.confirm(&prompt) {
            tracing::debug!("Delete-all cancelled");
            return Ok(Deletion::Cancelled);
        }

        match self.api.delete_all().await {
            Ok(response) => {
                tracing::info!("Deleted all files");
                self.notices.notify(Notice::Deleted {
                    message: response.message.clone(),
                });
                self.refresh().await;
                Ok(Deletion::Deleted(response.message))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Delete-all failed");
                self.notices.notify(Notice::DeleteFailed {
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }
}
