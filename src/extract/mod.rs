//! Text extraction from uploaded PDF documents.
//!
//! Strategies run in order over the whole document. A strategy that errors
//! or yields only whitespace hands the document to the next one from the
//! start; there is no per-page mixing between strategies.

mod strategies;

use thiserror::Error;
use tracing::{debug, info, warn};

pub use strategies::{LayoutStrategy, PageReaderStrategy};

/// Default minimum number of characters worth sending for analysis.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 50;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No extraction strategies configured")]
    NoStrategies,

    #[error("{strategy} failed: {message}")]
    Strategy {
        strategy: &'static str,
        message: String,
    },

    #[error("Document contains no extractable text")]
    Empty,

    #[error("Extracted text too short: {length} characters (minimum {minimum})")]
    TooShort { length: usize, minimum: usize },
}

impl ExtractionError {
    pub fn strategy(strategy: &'static str, message: impl Into<String>) -> Self {
        ExtractionError::Strategy {
            strategy,
            message: message.into(),
        }
    }

    /// Extraction worked but the document is below the usable threshold.
    pub fn is_too_short(&self) -> bool {
        matches!(self, ExtractionError::TooShort { .. })
    }
}

/// Result of text extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Extracted text, trimmed.
    pub text: String,
    /// Length of `text` in characters.
    pub length: usize,
    /// Strategy that produced the text.
    pub method: &'static str,
    /// Number of pages the strategy read.
    pub page_count: usize,
}

impl ExtractionResult {
    fn new(text: String, method: &'static str, page_count: usize) -> Self {
        let length = text.chars().count();
        Self {
            text,
            length,
            method,
            page_count,
        }
    }

    /// Reject text shorter than `minimum` characters.
    pub fn require_min_length(self, minimum: usize) -> Result<Self, ExtractionError> {
        if self.length < minimum {
            return Err(ExtractionError::TooShort {
                length: self.length,
                minimum,
            });
        }
        Ok(self)
    }
}

/// One way of turning PDF bytes into per-page text.
pub trait PageTextStrategy: Send + Sync {
    /// Short name used in logs and results.
    fn name(&self) -> &'static str;

    /// Text of every page, in page order.
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// Text extractor with ordered fallback strategies.
pub struct TextExtractor {
    strategies: Vec<Box<dyn PageTextStrategy>>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self {
            strategies: vec![Box::new(LayoutStrategy), Box::new(PageReaderStrategy)],
        }
    }
}

impl TextExtractor {
    /// Create a new text extractor (layout-aware first, page reader fallback).
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom ordered list of strategies.
    pub fn with_strategies(strategies: Vec<Box<dyn PageTextStrategy>>) -> Self {
        Self { strategies }
    }

    /// Names of the configured strategies, in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract the full text of a document.
    pub fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        let mut last_error = ExtractionError::NoStrategies;

        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), bytes = bytes.len(), "Attempting text extraction");

            match strategy.page_texts(bytes) {
                Ok(pages) => {
                    let page_count = pages.len();
                    let text = join_pages(&pages);
                    if text.is_empty() {
                        warn!(
                            strategy = strategy.name(),
                            pages = page_count,
                            "Strategy yielded only whitespace"
                        );
                        last_error = ExtractionError::Empty;
                        continue;
                    }

                    let result = ExtractionResult::new(text, strategy.name(), page_count);
                    info!(
                        strategy = result.method,
                        pages = result.page_count,
                        chars = result.length,
                        "Text extraction complete"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "Text extraction strategy failed"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

/// Concatenate non-empty pages with newline separators and trim the result.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Build a one-page PDF showing `text` in Courier.
    pub(crate) fn single_page_pdf(text: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// Test strategy with a canned outcome that counts its invocations.
    struct Scripted {
        name: &'static str,
        pages: Option<Vec<&'static str>>,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn ok(
            name: &'static str,
            pages: Vec<&'static str>,
        ) -> (Box<dyn PageTextStrategy>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let strategy = Scripted {
                name,
                pages: Some(pages),
                calls: calls.clone(),
            };
            (Box::new(strategy), calls)
        }

        fn failing(name: &'static str) -> (Box<dyn PageTextStrategy>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let strategy = Scripted {
                name,
                pages: None,
                calls: calls.clone(),
            };
            (Box::new(strategy), calls)
        }
    }

    impl PageTextStrategy for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn page_texts(&self, _bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.pages {
                Some(pages) => Ok(pages.iter().map(|p| p.to_string()).collect()),
                None => Err(ExtractionError::strategy(self.name, "unreadable xref table")),
            }
        }
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let (primary, _) = Scripted::ok("primary", vec!["Page one", "", "Page three\n"]);
        let (secondary, secondary_calls) = Scripted::ok("secondary", vec!["unused"]);
        let extractor = TextExtractor::with_strategies(vec![primary, secondary]);

        let result = extractor.extract(b"%PDF-1.7").unwrap();
        assert_eq!(result.text, "Page one\nPage three");
        assert_eq!(result.method, "primary");
        assert_eq!(result.page_count, 3);
        assert_eq!(result.length, "Page one\nPage three".chars().count());
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fallback_returns_secondary_text() {
        let (primary, primary_calls) = Scripted::failing("primary");
        let (secondary, _) = Scripted::ok("secondary", vec!["Recovered by the fallback reader"]);
        let extractor = TextExtractor::with_strategies(vec![primary, secondary]);

        let result = extractor.extract(b"%PDF-1.4").unwrap();
        assert_eq!(result.text, "Recovered by the fallback reader");
        assert_eq!(result.method, "secondary");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_both_strategies_failing() {
        let (primary, _) = Scripted::failing("primary");
        let (secondary, _) = Scripted::failing("secondary");
        let extractor = TextExtractor::with_strategies(vec![primary, secondary]);

        match extractor.extract(b"junk") {
            Err(ExtractionError::Strategy { strategy, .. }) => assert_eq!(strategy, "secondary"),
            other => panic!("expected strategy failure, got {:?}", other),
        }
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let (primary, _) = Scripted::ok("primary", vec!["   ", "\n\t"]);
        let (secondary, secondary_calls) = Scripted::ok("secondary", vec![" "]);
        let extractor = TextExtractor::with_strategies(vec![primary, secondary]);

        assert!(matches!(extractor.extract(b"%PDF"), Err(ExtractionError::Empty)));
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_strategies() {
        let extractor = TextExtractor::with_strategies(Vec::new());
        assert!(matches!(
            extractor.extract(b"%PDF"),
            Err(ExtractionError::NoStrategies)
        ));
    }

    #[test]
    fn test_require_min_length() {
        let short = ExtractionResult::new("Too short".to_string(), "primary", 1);
        let err = short.clone().require_min_length(DEFAULT_MIN_TEXT_CHARS).unwrap_err();
        assert!(err.is_too_short());
        assert_eq!(
            err.to_string(),
            "Extracted text too short: 9 characters (minimum 50)"
        );

        assert!(short.require_min_length(9).is_ok());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let result = ExtractionResult::new("Zürich §4 Haftung".to_string(), "primary", 1);
        assert_eq!(result.length, 17);
    }

    #[test]
    fn test_default_extractor_reads_generated_pdf() {
        let extractor = TextExtractor::new();
        assert_eq!(extractor.strategy_names(), vec!["pdf-extract", "lopdf"]);

        let pdf = single_page_pdf("Hello World!");
        let result = extractor.extract(&pdf).unwrap();
        assert!(result.text.contains("Hello"));
        assert_eq!(result.page_count, 1);
    }
}
