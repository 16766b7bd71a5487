//! Document text extraction.

use tracing::warn;

/// External text-extraction capability. Unreadable input yields an empty string.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> String;
}

/// Text layer of a digital PDF, pages joined by newlines.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> String {
        // pdf-extract panics on some malformed inputs.
        let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));
        match result {
            Ok(Ok(pages)) => pages.join("\n"),
            Ok(Err(e)) => {
                warn!(error = %e, "pdf text extraction failed");
                String::new()
            }
            Err(_) => {
                warn!("pdf text extraction panicked");
                String::new()
            }
        }
    }
}
