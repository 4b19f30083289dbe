//! PDF text extraction wrapper
//!
//! Wraps pdf-extract crate with error handling for:
//! - Missing or unreadable files
//! - Encrypted or corrupted PDFs
//! - Scanned/image-only pages (empty text, not an error)
//! - Single malformed pages (recorded per page, the rest still extract)

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use pdf_extract::{Document, PlainTextOutput};

use super::{document_name, PageSource};
use crate::error::{PageError, Result, SegmentError};

type PageResult = std::result::Result<String, PageError>;

/// PDF document with per-page text extracted up front
pub struct PdfSource {
    name: String,
    pages: Vec<PageResult>,
}

impl PdfSource {
    /// Read and parse a PDF from disk
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| open_error(path, e.to_string()))?;
        let pages = extract_pages_from_pdf(&bytes).map_err(|reason| open_error(path, reason))?;

        tracing::debug!(pages = pages.len(), "Parsed PDF {}", path.display());
        Ok(Self {
            name: document_name(path),
            pages,
        })
    }

    /// Parse a PDF already held in memory
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let pages = extract_pages_from_pdf(bytes)
            .map_err(|reason| open_error(Path::new(&name), reason))?;
        Ok(Self { name, pages })
    }
}

impl PageSource for PdfSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> PageResult {
        match self.pages.get(index) {
            Some(page) => page.clone(),
            None => Err(PageError::new(index, format!("document has {} pages", self.pages.len()))),
        }
    }
}

fn open_error(path: &Path, reason: String) -> SegmentError {
    SegmentError::DocumentOpen {
        path: PathBuf::from(path),
        reason,
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Load the document, then extract each page on its own.
///
/// Only a document that cannot be loaded or decrypted is an error. pdf-extract
/// panics on some malformed pages, so a panic fails that page alone.
fn extract_pages_from_pdf(pdf_bytes: &[u8]) -> std::result::Result<Vec<PageResult>, String> {
    if !pdf_bytes.starts_with(b"%PDF") {
        return Err("not a PDF file (missing %PDF header)".to_string());
    }

    let doc = match panic::catch_unwind(|| Document::load_mem(pdf_bytes)) {
        Ok(Ok(doc)) => doc,
        Ok(Err(e)) => return Err(format!("PDF parse error: {}", e)),
        Err(payload) => {
            return Err(format!(
                "PDF parser panicked on malformed input: {}",
                panic_reason(payload)
            ))
        }
    };
    let doc = decrypt_if_needed(doc)?;

    // Page numbers are 1-based and ordered
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let pages = page_numbers
        .iter()
        .enumerate()
        .map(|(index, &page_num)| extract_page(&doc, index, page_num))
        .collect();
    Ok(pages)
}

/// Documents encrypted with an empty user password open without one
fn decrypt_if_needed(mut doc: Document) -> std::result::Result<Document, String> {
    if doc.is_encrypted() {
        doc.decrypt("")
            .map_err(|e| format!("encrypted PDF could not be decrypted: {}", e))?;
    }
    Ok(doc)
}

fn extract_page(doc: &Document, index: usize, page_num: u32) -> PageResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut text = String::new();
        {
            let mut output = PlainTextOutput::new(&mut text);
            pdf_extract::output_doc_page(doc, &mut output, page_num)?;
        }
        Ok::<_, pdf_extract::OutputError>(text)
    }));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(PageError::new(index, e.to_string())),
        Err(payload) => Err(PageError::new(
            index,
            format!("PDF parser panicked: {}", panic_reason(payload)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::extract_pages;
    use pdf_extract::content::{Content, Operation};
    use pdf_extract::{Dictionary, Object, Stream};
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Build a PDF with one text line per page. Pages listed in `no_media_box`
    /// get no MediaBox anywhere in their inheritance chain.
    fn build_pdf(texts: &[&str], no_media_box: &[usize]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut font = Dictionary::new();
        font.set("Type", "Font");
        font.set("Subtype", "Type1");
        font.set("BaseFont", "Courier");
        let font_id = doc.add_object(font);

        let mut fonts = Dictionary::new();
        fonts.set("F1", font_id);
        let mut resources = Dictionary::new();
        resources.set("Font", fonts);
        let resources_id = doc.add_object(resources);

        let mut kids: Vec<Object> = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            let mut page = Dictionary::new();
            page.set("Type", "Page");
            page.set("Parent", pages_id);
            page.set("Contents", content_id);
            if !no_media_box.contains(&i) {
                let media_box: Vec<Object> = vec![0.into(), 0.into(), 612.into(), 792.into()];
                page.set("MediaBox", media_box);
            }
            kids.push(doc.add_object(page).into());
        }

        let mut pages = Dictionary::new();
        pages.set("Type", "Pages");
        pages.set("Count", texts.len() as i64);
        pages.set("Kids", kids);
        pages.set("Resources", resources_id);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", "Catalog");
        catalog.set("Pages", pages_id);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let err = extract_pages_from_pdf(b"hello world").unwrap_err();
        assert!(err.contains("%PDF"));
    }

    #[test]
    fn test_open_missing_file_is_document_open_error() {
        let err = PdfSource::open(Path::new("/nonexistent/book.pdf")).err().unwrap();
        assert!(matches!(err, SegmentError::DocumentOpen { .. }));
    }

    #[test]
    fn test_open_corrupt_file_is_document_open_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a pdf").unwrap();

        let err = PdfSource::open(file.path()).err().unwrap();
        match err {
            SegmentError::DocumentOpen { reason, .. } => assert!(reason.contains("not a PDF")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_bytes_reports_document_name() {
        let err = PdfSource::from_bytes("upload", b"plain text").err().unwrap();
        match err {
            SegmentError::DocumentOpen { path, .. } => assert_eq!(path, PathBuf::from("upload")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extracts_every_page_in_order() {
        let bytes = build_pdf(&["Chapter 1 opening", "middle page", "Chapter 2 closing"], &[]);
        let source = PdfSource::from_bytes("book", &bytes).unwrap();

        assert_eq!(source.name(), "book");
        assert_eq!(source.page_count(), 3);
        assert!(source.page_text(0).unwrap().contains("Chapter 1 opening"));
        assert!(source.page_text(1).unwrap().contains("middle page"));
        assert!(source.page_text(2).unwrap().contains("Chapter 2 closing"));
        assert!(source.page_text(3).is_err());
    }

    #[test]
    fn test_open_reads_pdf_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&build_pdf(&["only page"], &[])).unwrap();

        let source = PdfSource::open(file.path()).unwrap();
        assert_eq!(source.page_count(), 1);
        assert!(source.page_text(0).unwrap().contains("only page"));
    }

    #[test]
    fn test_broken_page_fails_alone() {
        let bytes = build_pdf(&["first good", "broken", "third good"], &[1]);
        let source = PdfSource::from_bytes("damaged", &bytes).unwrap();

        assert_eq!(source.page_count(), 3);
        assert!(source.page_text(0).unwrap().contains("first good"));
        let err = source.page_text(1).unwrap_err();
        assert_eq!(err.index, 1);
        assert!(source.page_text(2).unwrap().contains("third good"));
    }

    #[test]
    fn test_broken_first_page_keeps_page_count() {
        let bytes = build_pdf(&["broken", "second good", "third good"], &[0]);
        let extracted = extract_pages(&PdfSource::from_bytes("damaged", &bytes).unwrap());

        assert_eq!(extracted.len(), 3);
        assert_eq!(extracted.pages[0], "");
        assert!(extracted.pages[1].contains("second good"));
        assert!(extracted.pages[2].contains("third good"));
    }
}
