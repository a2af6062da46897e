//! Result documents: bytes to text to structured fields.

mod error;
mod result;
mod text;

pub use error::DocumentError;
pub use result::{ExamResult, PASSING_SCORE, extract_result};
pub use text::{PdfTextExtractor, TextExtractor, non_empty};

/// Extracts text from `bytes` with `extractor` and parses the result fields.
///
/// # Errors
///
/// Propagates the extractor's [`DocumentError`].
pub fn extract_document(
    extractor: &dyn TextExtractor,
    bytes: &[u8],
) -> Result<ExamResult, DocumentError> {
    let text = extractor.extract_text(bytes)?;
    Ok(extract_result(&text))
}
