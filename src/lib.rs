//! Chapter Split Library
//!
//! Extracts per-page text from a document and partitions it into named chapters,
//! either by a heading pattern or by explicit page ranges.
//!
//! # Modules
//!
//! - `document`: page-text extraction (PDF, plain text) behind the `PageSource` trait
//! - `chapters`: chapter map types and the two detection strategies
//! - `export`: writing a chapter map to JSON plus one text file per chapter
//! - `segmenter`: ties one document to its cached pages and latest chapter map
//! - `settings`: JSON settings file with environment overrides

pub mod chapters;
pub mod document;
pub mod error;
pub mod export;
pub mod segmenter;
pub mod settings;
pub mod utils;

pub use chapters::{
    ChapterMap, ChapterRange, ChapterRanges, DetectedHeading, DetectionStrategy, HeadingPattern,
    DEFAULT_HEADING_PATTERN,
};
pub use document::{ExtractedPages, PageSource};
pub use error::{PageError, Result, SegmentError};
pub use segmenter::Segmenter;
pub use settings::Settings;
