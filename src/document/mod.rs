//! Page-text extraction for paginated documents
//!
//! A document is anything that can hand out ordered per-page text:
//! - PDF (.pdf) - extracted with the `pdf-extract` crate
//! - Plain text (.txt, .text, .md) - pages separated by form feeds

pub mod pdf_extractor;
pub mod text_source;

use std::path::Path;

use crate::error::{PageError, Result, SegmentError};

pub use pdf_extractor::PdfSource;
pub use text_source::TextSource;

/// Document-reading capability: ordered, 0-indexed page text.
pub trait PageSource {
    /// Document name used for output files (basename without extension)
    fn name(&self) -> &str;

    fn page_count(&self) -> usize;

    /// Plain text of a single page. An image-only page is `Ok("")`, not an error.
    fn page_text(&self, index: usize) -> std::result::Result<String, PageError>;
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
}

impl DocumentFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "txt" | "text" | "md" => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Open a document from disk, picking the source by extension.
///
/// Fails only when the document as a whole cannot be read.
pub fn open_document(path: &Path) -> Result<Box<dyn PageSource>> {
    match DocumentFormat::from_path(path) {
        Some(DocumentFormat::Pdf) => Ok(Box::new(PdfSource::open(path)?)),
        Some(DocumentFormat::PlainText) => Ok(Box::new(TextSource::open(path)?)),
        None => Err(SegmentError::UnsupportedFormat { path: path.to_path_buf() }),
    }
}

/// Basename without extension, falling back to "document"
pub fn document_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document")
        .to_string()
}

/// Result of running the extractor over every page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPages {
    pub pages: Vec<String>,
    /// All pages joined with '\n'
    pub raw_text: String,
}

impl ExtractedPages {
    pub fn new(pages: Vec<String>) -> Self {
        let raw_text = pages.join("\n");
        Self { pages, raw_text }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Extract every page in order. A page that fails becomes empty text.
pub fn extract_pages(source: &dyn PageSource) -> ExtractedPages {
    let count = source.page_count();
    tracing::info!(pages = count, "Extracting text from {}", source.name());

    let mut failed = 0usize;
    let pages: Vec<String> = (0..count)
        .map(|index| match source.page_text(index) {
            Ok(text) => text,
            Err(e) => {
                failed += 1;
                tracing::warn!(page = index, "No text extracted, using empty page: {}", e);
                String::new()
            }
        })
        .collect();

    if failed > 0 {
        tracing::warn!("{} of {} pages could not be read", failed, count);
    }
    tracing::info!("Successfully extracted {} pages", pages.len());

    ExtractedPages::new(pages)
}
