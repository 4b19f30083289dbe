//! Error types for extraction, detection and persistence
//!
//! Only failures that make a whole call meaningless live here. Per-page and
//! per-range problems are absorbed where they happen and logged instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentError {
    /// Document missing, unreadable, or not parseable at all
    #[error("Failed to open document {}: {reason}", .path.display())]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("Unsupported document format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid heading pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Malformed chapter range input (not an out-of-bounds range, those are skipped)
    #[error("Invalid chapter ranges: {0}")]
    InvalidRanges(String),

    #[error("Failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize chapters: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to load settings from {}: {reason}", .path.display())]
    Settings { path: PathBuf, reason: String },

    /// A saved chapter map that cannot be read back
    #[error("Failed to read chapter map {}: {reason}", .path.display())]
    ChapterMapRead { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, SegmentError>;

/// A single page that could not be rendered to text.
///
/// Never fatal: the extractor substitutes an empty page.
#[derive(Debug, Clone, Error)]
#[error("page {index}: {reason}")]
pub struct PageError {
    pub index: usize,
    pub reason: String,
}

impl PageError {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self { index, reason: reason.into() }
    }
}
