use super::schema::UploadCandidate;
use crate::error::{ClientError, Result};

pub const PDF: &str = "application/pdf";
pub const ODT: &str = "application/vnd.oasis.opendocument.text";
pub const DOC: &str = "application/msword";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The only media types the server indexes. Matched exactly.
pub const ACCEPTED_MEDIA_TYPES: [&str; 4] = [PDF, ODT, DOC, DOCX];

pub fn is_accepted(media_type: &str) -> bool {
    ACCEPTED_MEDIA_TYPES.contains(&media_type)
}

/// Accept or reject a candidate by its declared media type.
pub fn validate(candidate: &UploadCandidate) -> Result<()> {
    if is_accepted(&candidate.media_type) {
        Ok(())
    } else {
        Err(ClientError::UnsupportedMediaType {
            filename: candidate.name.clone(),
            media_type: candidate.media_type.clone(),
        })
    }
}

/// Declared media type for a local file, from its extension.
pub fn guess_media_type(filename: &str) -> String {
    let ext = match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    };
    match ext.as_str() {
        "pdf" => PDF,
        "odt" => ODT,
        "doc" => DOC,
        "docx" => DOCX,
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "rtf" => "application/rtf",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "zip" => "application/zip",
        "exe" | "dll" => "application/x-msdownload",
        _ => "application/octet-stream",
    }
    .to_string()
}
