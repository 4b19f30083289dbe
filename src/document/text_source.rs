//! Plain-text documents
//!
//! Pages are separated by form feed ('\x0c'), the same break `pdftotext` emits.
//! A file with no form feeds is a single page.

use std::path::Path;

use super::{document_name, PageSource};
use crate::error::{PageError, Result, SegmentError};

pub const PAGE_BREAK: char = '\x0c';

pub struct TextSource {
    name: String,
    pages: Vec<String>,
}

impl TextSource {
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SegmentError::DocumentOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_text(document_name(path), &content))
    }

    pub fn from_text(name: impl Into<String>, content: &str) -> Self {
        // A trailing form feed closes the last page rather than opening an empty one
        let body = content.strip_suffix(PAGE_BREAK).unwrap_or(content);
        let pages = if body.is_empty() {
            Vec::new()
        } else {
            body.split(PAGE_BREAK).map(str::to_string).collect()
        };
        Self { name: name.into(), pages }
    }
}

impl PageSource for TextSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> std::result::Result<String, PageError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| PageError::new(index, "page index out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_splits_on_form_feed() {
        let source = TextSource::from_text("book", "first\x0csecond\x0cthird");
        assert_eq!(source.page_count(), 3);
        assert_eq!(source.page_text(1).unwrap(), "second");
    }

    #[test]
    fn test_trailing_form_feed_ignored() {
        let source = TextSource::from_text("book", "only page\x0c");
        assert_eq!(source.page_count(), 1);
    }

    #[test]
    fn test_no_form_feed_is_one_page() {
        let source = TextSource::from_text("book", "Chapter 1\nbody");
        assert_eq!(source.page_count(), 1);
        assert_eq!(source.page_text(0).unwrap(), "Chapter 1\nbody");
    }

    #[test]
    fn test_empty_text_has_no_pages() {
        assert_eq!(TextSource::from_text("book", "").page_count(), 0);
    }

    #[test]
    fn test_out_of_range_page_errors() {
        let source = TextSource::from_text("book", "a");
        assert!(source.page_text(5).is_err());
    }

    #[test]
    fn test_open_uses_file_stem_as_name() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"p1\x0cp2").unwrap();

        let source = TextSource::open(file.path()).unwrap();
        assert_eq!(source.page_count(), 2);
        assert!(!source.name().ends_with(".txt"));
    }

    #[test]
    fn test_open_invalid_utf8_fails() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(TextSource::open(file.path()), Err(SegmentError::DocumentOpen { .. })));
    }
}
