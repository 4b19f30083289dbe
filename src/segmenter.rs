//! Document segmenter
//!
//! Owns one document, extracts its pages once, and turns them into a chapter map
//! on demand. Detection can be re-run with different strategies; each run replaces
//! the previous map in a single assignment.
//!
//! All log events are emitted inside the segmenter's span. Callers that want the
//! events routed or labelled differently pass their own span with `with_span`.

use std::path::{Path, PathBuf};

use tracing::Span;

use crate::chapters::{
    ChapterMap, ChapterRanges, DetectedHeading, DetectionStrategy, HeadingPattern,
};
use crate::document::{self, ExtractedPages, PageSource};
use crate::error::Result;
use crate::export;

pub struct Segmenter {
    source: Box<dyn PageSource>,
    span: Span,
    pages: Option<ExtractedPages>,
    chapters: ChapterMap,
    headings: Vec<DetectedHeading>,
}

impl Segmenter {
    pub fn new(source: Box<dyn PageSource>) -> Self {
        let span = tracing::info_span!("segmenter", document = %source.name());
        Self {
            source,
            span,
            pages: None,
            chapters: ChapterMap::new(),
            headings: Vec::new(),
        }
    }

    /// Open a document from disk. Fails if the document cannot be read at all.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = document::open_document(path).inspect_err(|e| {
            tracing::error!("Error extracting text from {}: {}", path.display(), e);
        })?;
        Ok(Self::new(source))
    }

    /// Use a caller-supplied span for all events from this segmenter
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn document_name(&self) -> &str {
        self.source.name()
    }

    /// Extract page text, reusing the cached result after the first call
    pub fn extract_pages(&mut self) -> &ExtractedPages {
        let span = &self.span;
        let source = &self.source;
        self.pages.get_or_insert_with(|| {
            let _guard = span.enter();
            document::extract_pages(source.as_ref())
        })
    }

    /// Pages if they have been extracted already
    pub fn pages(&self) -> Option<&ExtractedPages> {
        self.pages.as_ref()
    }

    /// Run detection and replace the current chapter map
    pub fn detect(&mut self, strategy: &DetectionStrategy) -> &ChapterMap {
        let span = self.span.clone();
        let _guard = span.enter();
        let detection = strategy.detect(self.extract_pages());

        tracing::debug!(chapters = detection.chapters.len(), "Detection finished");
        self.chapters = detection.chapters;
        self.headings = detection.headings;
        &self.chapters
    }

    /// Detect chapters from an optional pattern and optional ranges.
    ///
    /// Non-empty ranges take precedence and the pattern is not run at all.
    pub fn detect_chapters(
        &mut self,
        pattern: Option<HeadingPattern>,
        ranges: Option<ChapterRanges>,
    ) -> &ChapterMap {
        let strategy = DetectionStrategy::resolve(pattern, ranges);
        self.detect(&strategy)
    }

    /// Chapters from the last detection run (empty before the first run)
    pub fn chapters(&self) -> &ChapterMap {
        &self.chapters
    }

    /// Heading anchors from the last pattern-mode run
    pub fn headings(&self) -> &[DetectedHeading] {
        &self.headings
    }

    /// Write chapters under `output_dir`, running default detection first if none has run.
    ///
    /// Returns the path of the JSON chapter map.
    pub fn save(&mut self, output_dir: &Path) -> Result<PathBuf> {
        if self.chapters.is_empty() {
            self.detect(&DetectionStrategy::default());
        }
        let _guard = self.span.enter();
        export::save_chapters(output_dir, self.source.name(), &self.chapters)
    }
}
