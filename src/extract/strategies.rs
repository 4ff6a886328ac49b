//! Concrete PDF page-text strategies.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::debug;

use super::{ExtractionError, PageTextStrategy};

/// Layout-aware extraction via `pdf-extract`, which positions glyphs using
/// font metrics before emitting text.
#[derive(Debug, Default, Clone, Copy)]
pub struct LayoutStrategy;

impl PageTextStrategy for LayoutStrategy {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        // pdf-extract (and its font parsers) can panic on malformed glyph data
        match catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        })) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(ExtractionError::strategy(self.name(), e.to_string())),
            Err(_) => Err(ExtractionError::strategy(
                self.name(),
                "panicked while decoding the document, likely malformed fonts",
            )),
        }
    }
}

/// Plain page-by-page text reader over the `lopdf` object model.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageReaderStrategy;

impl PageTextStrategy for PageReaderStrategy {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ExtractionError::strategy(self.name(), e.to_string()))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        debug!(pages = page_numbers.len(), "lopdf loaded document");

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page_number in page_numbers {
            let text = catch_unwind(AssertUnwindSafe(|| doc.extract_text(&[page_number])))
                .map_err(|_| {
                    ExtractionError::strategy(
                        self.name(),
                        format!("panicked reading page {}", page_number),
                    )
                })?
                .map_err(|e| {
                    ExtractionError::strategy(
                        self.name(),
                        format!("page {}: {}", page_number, e),
                    )
                })?;
            pages.push(text);
        }
        Ok(pages)
    }
}
