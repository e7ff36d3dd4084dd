use super::media::guess_media_type;
use super::notice::{Notice, NoticeSink};
use super::schema::{UploadBatch, UploadCandidate};
use super::upload::{BatchReport, UploadOrchestrator};
use crate::error::{ClientError, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Drag-and-drop events from the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeEvent {
    DragOver,
    DragLeave,
    Drop(Vec<PathBuf>),
}

/// Files chosen through the picker, kept until they are turned into a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    paths: Vec<PathBuf>,
}

impl FileSelection {
    /// Expand `~` and glob patterns, keeping the order the patterns were given in.
    ///
    /// A pattern without glob metacharacters is kept as a plain path even when
    /// it does not exist, so the failure is reported against that file.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut paths = Vec::new();
        for pattern in patterns {
            let expanded = shellexpand::tilde(pattern.as_ref()).into_owned();
            if !expanded.contains(['*', '?', '[']) {
                paths.push(PathBuf::from(expanded));
                continue;
            }
            let matches = glob::glob(&expanded)
                .map_err(|e| ClientError::Config(format!("bad pattern '{expanded}': {e}")))?;
            for entry in matches {
                match entry {
                    Ok(path) if path.is_file() => paths.push(path),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Skipping unreadable glob match"),
                }
            }
        }
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Hand over the selection and clear it, so the same files can be chosen again.
    pub fn take(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.paths)
    }
}

/// Read one local file into an upload candidate.
pub async fn read_candidate(path: &Path) -> Result<UploadCandidate> {
    let content = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = guess_media_type(&name);
    Ok(UploadCandidate {
        name,
        media_type,
        content,
    })
}

/// Split a line of pasted paths the way terminals write dropped files:
/// whitespace separated, with quotes or backslash escapes around spaces.
pub fn split_dropped_paths(line: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_token = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        paths.push(PathBuf::from(current));
    }
    paths
}

/// Turns picker selections and drops into batches for the orchestrator.
pub struct DragDropAdapter {
    uploads: Arc<UploadOrchestrator>,
    notices: Arc<dyn NoticeSink>,
    drag_active: AtomicBool,
}

impl DragDropAdapter {
    pub fn new(uploads: Arc<UploadOrchestrator>, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            uploads,
            notices,
            drag_active: AtomicBool::new(false),
        }
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active.load(Ordering::SeqCst)
    }

    /// File picker path. The selection is emptied before anything is read.
    pub async fn on_file_input(&self, selection: &mut FileSelection) -> Result<BatchReport> {
        let paths = selection.take();
        self.submit(paths).await
    }

    /// Drag-and-drop path. Only `Drop` produces a batch.
    pub async fn on_event(&self, event: IntakeEvent) -> Result<Option<BatchReport>> {
        match event {
            IntakeEvent::DragOver => {
                self.drag_active.store(true, Ordering::SeqCst);
                Ok(None)
            }
            IntakeEvent::DragLeave => {
                self.drag_active.store(false, Ordering::SeqCst);
                Ok(None)
            }
            IntakeEvent::Drop(paths) => {
                self.drag_active.store(false, Ordering::SeqCst);
                self.submit(paths).await.map(Some)
            }
        }
    }

    async fn submit(&self, paths: Vec<PathBuf>) -> Result<BatchReport> {
        if self.uploads.is_uploading() {
            return Err(ClientError::Busy("An upload"));
        }
        let (batch, unreadable) = self.load(paths).await;
        let mut report = BatchReport {
            total: unreadable.len(),
            failed: unreadable,
            ..BatchReport::default()
        };
        report.merge(self.uploads.submit_batch(batch).await?);
        Ok(report)
    }

    /// Read every path; files that cannot be read are returned by name.
    async fn load(&self, paths: Vec<PathBuf>) -> (UploadBatch, Vec<String>) {
        let mut batch = Vec::with_capacity(paths.len());
        let mut unreadable = Vec::new();
        for path in paths {
            match read_candidate(&path).await {
                Ok(candidate) => batch.push(candidate),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Could not read file");
                    let filename = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    self.notices.notify(Notice::UploadFailed {
                        filename: filename.clone(),
                        error: err.to_string(),
                    });
                    unreadable.push(filename);
                }
            }
        }
        (batch, unreadable)
    }
}
