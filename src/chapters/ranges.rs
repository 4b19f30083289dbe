//! Explicit page-range chapters
//!
//! Each entry names a chapter and an inclusive page range. Bad entries are
//! logged and skipped; they never abort the run or leave a partial chapter.

use std::fmt;

use super::{ChapterMap, ChapterRange, ChapterRanges};
use crate::document::ExtractedPages;

/// Why a range was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRejection {
    NegativeStart,
    StartPastEnd { page_count: usize },
    Inverted,
}

impl fmt::Display for RangeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeRejection::NegativeStart => f.write_str("start page is negative"),
            RangeRejection::StartPastEnd { page_count } => {
                write!(f, "start page is beyond the document ({} pages)", page_count)
            }
            RangeRejection::Inverted => f.write_str("start page is after end page"),
        }
    }
}

/// Resolve a range to concrete page indices, clamping `end_page` to the last page
pub fn resolve_range(range: ChapterRange, page_count: usize) -> Result<(usize, usize), RangeRejection> {
    if range.start_page < 0 {
        return Err(RangeRejection::NegativeStart);
    }
    let start = range.start_page as usize;
    if start >= page_count {
        return Err(RangeRejection::StartPastEnd { page_count });
    }
    if range.start_page > range.end_page {
        return Err(RangeRejection::Inverted);
    }
    let end = (range.end_page as usize).min(page_count - 1);
    Ok((start, end))
}

/// Build chapters from explicit ranges.
///
/// Overlapping ranges each get the full text of their pages. If every entry
/// is rejected, the whole document becomes a single chapter.
pub fn detect_by_ranges(pages: &ExtractedPages, ranges: &ChapterRanges) -> ChapterMap {
    tracing::info!("Using {} custom chapter ranges provided by user", ranges.len());

    let mut chapters = ChapterMap::new();
    for (name, range) in ranges.iter() {
        match resolve_range(range, pages.len()) {
            Ok((start, end)) => {
                if range.end_page as usize > end {
                    tracing::debug!(chapter = name, "End page {} clamped to {}", range.end_page, end);
                }
                chapters.insert(name, pages.pages[start..=end].join("\n"));
            }
            Err(reason) => {
                tracing::warn!(
                    "Invalid page range for {}: ({}, {}): {}",
                    name, range.start_page, range.end_page, reason
                );
            }
        }
    }

    if chapters.is_empty() {
        tracing::warn!("No valid chapter ranges. Treating entire document as a single chapter.");
        return ChapterMap::single(pages.raw_text.clone());
    }

    tracing::info!("Successfully extracted {} chapters", chapters.len());
    chapters
}
