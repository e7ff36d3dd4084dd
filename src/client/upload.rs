use super::api::DocumentApi;
use super::media;
use super::notice::{Notice, NoticeSink};
use super::registry::FileRegistry;
use super::schema::{UploadBatch, UploadProgress};
use crate::error::{ClientError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Outcome of one batch, per file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub uploaded: Vec<String>,
    pub rejected: Vec<String>,
    pub failed: Vec<String>,
    pub chunks_added: u64,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }

    /// Fold a later report into this one, keeping file order.
    pub fn merge(&mut self, other: BatchReport) {
        self.total += other.total;
        self.uploaded.extend(other.uploaded);
        self.rejected.extend(other.rejected);
        self.failed.extend(other.failed);
        self.chunks_added += other.chunks_added;
    }
}

/// Ends the batch when dropped, even if the batch future is abandoned.
struct BatchGuard<'a> {
    orchestrator: &'a UploadOrchestrator,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.orchestrator.progress.send_replace(None);
        self.orchestrator.uploading.store(false, Ordering::SeqCst);
    }
}

/// Uploads a batch one file at a time.
///
/// File `i + 1` is not sent until file `i` has resolved. A rejected or
/// failed file never stops the rest of the batch, and the registry is
/// refreshed exactly once when the batch ends.
pub struct UploadOrchestrator {
    api: Arc<dyn DocumentApi>,
    registry: Arc<FileRegistry>,
    notices: Arc<dyn NoticeSink>,
    uploading: AtomicBool,
    progress: watch::Sender<Option<UploadProgress>>,
}

impl UploadOrchestrator {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        registry: Arc<FileRegistry>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        let (progress, _) = watch::channel(None);
        Self {
            api,
            registry,
            notices,
            uploading: AtomicBool::new(false),
            progress,
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    /// Current progress; `None` outside a batch.
    pub fn progress(&self) -> Option<UploadProgress> {
        self.progress.borrow().clone()
    }

    /// Every progress change, published before the matching request is sent.
    pub fn subscribe_progress(&self) -> watch::Receiver<Option<UploadProgress>> {
        self.progress.subscribe()
    }

    pub async fn submit_batch(&self, batch: UploadBatch) -> Result<BatchReport> {
        if batch.is_empty() {
            return Ok(BatchReport::default());
        }
        if self.uploading.swap(true, Ordering::SeqCst) {
            return Err(ClientError::Busy("An upload"));
        }
        let guard = BatchGuard { orchestrator: self };

        let total = batch.len();
        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };
        tracing::info!(total, "Starting upload batch");
        self.progress.send_replace(Some(UploadProgress {
            current: 0,
            total,
            current_file: String::new(),
        }));

        for (index, candidate) in batch.into_iter().enumerate() {
            let current = index + 1;
            self.progress.send_replace(Some(UploadProgress {
                current,
                total,
                current_file: candidate.name.clone(),
            }));

            if let Err(err) = media::validate(&candidate) {
                tracing::info!(file = %candidate.name, media_type = %candidate.media_type, "Rejected by type");
                self.notices.notify(Notice::Rejected {
                    filename: candidate.name.clone(),
                    reason: err.to_string(),
                });
                report.rejected.push(candidate.name);
                continue;
            }

            let name = candidate.name.clone();
            match self.api.upload(candidate).await {
                Ok(response) => {
                    tracing::info!(
                        file = %name,
                        chunks = response.chunks_added,
                        current,
                        total,
                        "Uploaded"
                    );
                    report.chunks_added += response.chunks_added;
                    self.notices.notify(Notice::Uploaded {
                        filename: name.clone(),
                        message: response.message,
                        chunks_added: response.chunks_added,
                    });
                    report.uploaded.push(name);
                }
                Err(err) => {
                    tracing::warn!(file = %name, error = %err, current, total, "Upload failed");
                    self.notices.notify(Notice::UploadFailed {
                        filename: name.clone(),
                        error: err.to_string(),
                    });
                    report.failed.push(name);
                }
            }
        }

        self.registry.refresh().await;
        drop(guard);
        tracing::info!(
            uploaded = report.uploaded.len(),
            rejected = report.rejected.len(),
            failed = report.failed.len(),
            "Upload batch finished"
        );
        Ok(report)
    }
}
