//! Document bytes to plain text.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, warn};

use super::DocumentError;

/// How far into the payload the `%PDF-` marker may appear.
const PDF_MAGIC_WINDOW: usize = 1024;

/// Turns raw document bytes into plain text.
///
/// Implementations are synchronous and CPU-bound; async callers should run
/// them on a blocking thread.
pub trait TextExtractor: Send + Sync {
    /// Extracts the document's text.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Unreadable`] for undecodable input and
    /// [`DocumentError::NoText`] when the text is empty or whitespace.
    fn extract_text(&self, bytes: &[u8]) -> Result<String, DocumentError>;
}

/// [`TextExtractor`] for PDF documents, backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        if !has_pdf_magic(bytes) {
            return Err(DocumentError::unreadable("missing %PDF- header"));
        }

        // pdf-extract panics on some malformed inputs.
        let text = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
            .map_err(|payload| {
                let reason = panic_message(payload.as_ref());
                warn!(reason = %reason, "PDF decoder panicked");
                DocumentError::unreadable(reason)
            })?
            .map_err(|e| DocumentError::unreadable(e.to_string()))?;

        debug!(bytes = bytes.len(), chars = text.len(), "PDF text extracted");
        non_empty(text)
    }
}

/// Rejects whitespace-only text.
///
/// # Errors
///
/// Returns [`DocumentError::NoText`] when `text` has no visible characters.
pub fn non_empty(text: String) -> Result<String, DocumentError> {
    if text.trim().is_empty() {
        Err(DocumentError::NoText)
    } else {
        Ok(text)
    }
}

fn has_pdf_magic(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(PDF_MAGIC_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("decoder panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("decoder panicked: {message}")
    } else {
        "decoder panicked".to_string()
    }
}
