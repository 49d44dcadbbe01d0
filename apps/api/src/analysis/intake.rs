//! Intake — reads one uploaded file from a multipart form, validates it, and
//! bounds the cost of the whole upload-and-analyze operation.
//!
//! Validation order is fixed: presence, declared type, size. The type check
//! runs before any file bytes are read and the size check stops reading as soon
//! as the ceiling is crossed, so rejected uploads never reach base64 encoding.

use std::future::Future;
use std::time::Duration;

use axum::extract::{multipart::MultipartError, Multipart};
use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::errors::AppError;

/// Multipart field that carries the document.
pub const FILE_FIELD: &str = "file";

pub const PDF_MIME: &str = "application/pdf";
pub const DOC_MIME: &str = "application/msword";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The accepted document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    LegacyWord,
    WordXml,
}

impl DocumentKind {
    /// Matches a declared content type against the allow-list.
    /// Parameters (`; charset=...`) and case are ignored.
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            PDF_MIME => Some(DocumentKind::Pdf),
            DOC_MIME => Some(DocumentKind::LegacyWord),
            DOCX_MIME => Some(DocumentKind::WordXml),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_MIME,
            DocumentKind::LegacyWord => DOC_MIME,
            DocumentKind::WordXml => DOCX_MIME,
        }
    }

    /// MIME type declared to the model. Both Word formats are sent as DOCX.
    pub fn model_mime(self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_MIME,
            DocumentKind::LegacyWord | DocumentKind::WordXml => DOCX_MIME,
        }
    }
}

/// A validated upload. Lives only for the duration of one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Bytes,
    pub kind: DocumentKind,
    pub filename: String,
}

impl UploadedDocument {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn encode(&self) -> EncodedDocument {
        let base64 = STANDARD.encode(&self.bytes);
        debug!(
            "Encoded '{}' ({} bytes → {} base64 chars)",
            self.filename,
            self.len(),
            base64.len()
        );
        EncodedDocument {
            base64,
            kind: self.kind,
            filename: self.filename.clone(),
        }
    }
}

/// Base64 form handed to the analysis client.
#[derive(Debug, Clone)]
pub struct EncodedDocument {
    pub base64: String,
    pub kind: DocumentKind,
    /// Informational only.
    pub filename: String,
}

/// Pulls the `file` field out of the form and validates it.
pub async fn read_upload(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<UploadedDocument, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let kind = DocumentKind::from_mime(&content_type).ok_or_else(|| {
            warn!("Rejected upload '{filename}' with content type '{content_type}'");
            AppError::UnsupportedType(content_type.clone())
        })?;

        let mut buffer = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?
        {
            check_size(buffer.len() + chunk.len(), max_bytes)?;
            buffer.extend_from_slice(&chunk);
        }

        if buffer.is_empty() {
            return Err(AppError::MissingFile);
        }

        return Ok(UploadedDocument {
            bytes: buffer.freeze(),
            kind,
            filename,
        });
    }

    Err(AppError::MissingFile)
}

fn check_size(len: usize, max_bytes: usize) -> Result<(), AppError> {
    if len > max_bytes {
        warn!("Rejected upload larger than {max_bytes} bytes");
        return Err(AppError::file_too_large(max_bytes));
    }
    Ok(())
}

fn multipart_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::file_too_large(max_bytes)
    } else {
        AppError::Validation(format!("Malformed multipart body: {}", err.body_text()))
    }
}

/// Runs `work` under a wall-clock deadline. On expiry the future is dropped and
/// `Timeout` is returned, whatever state the work was in.
pub async fn with_deadline<T, F>(deadline: Duration, work: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(deadline, work).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Request exceeded {}s deadline", deadline.as_secs());
            Err(AppError::Timeout)
        }
    }
}
