use parking_lot::Mutex;
use std::fmt;

/// A user-visible message produced by a client operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Rejected { filename: String, reason: String },
    Uploaded { filename: String, message: String, chunks_added: u64 },
    UploadFailed { filename: String, error: String },
    Deleted { message: String },
    DeleteFailed { error: String },
    RegistryUnavailable { error: String },
}

impl Notice {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Notice::Uploaded { .. } | Notice::Deleted { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Rejected { reason, .. } => write!(f, "Skipped: {reason}"),
            Notice::Uploaded {
                filename,
                message,
                chunks_added,
            } => write!(f, "{filename}: {message} (chunks added: {chunks_added})"),
            Notice::UploadFailed { filename, error } => {
                write!(f, "Upload of '{filename}' failed: {error}")
            }
            Notice::Deleted { message } => f.write_str(message),
            Notice::DeleteFailed { error } => write!(f, "Delete failed: {error}"),
            Notice::RegistryUnavailable { error } => write!(f, "Could not load files: {error}"),
        }
    }
}

/// Where notices go. The terminal front-end prints them; tests record them.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Keeps every notice in arrival order.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }
}

impl NoticeSink for NoticeLog {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}
