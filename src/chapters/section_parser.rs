//! Heading-pattern chapter detection
//!
//! Pages are concatenated into one tagged string so a single regex pass can
//! find every heading and still tell which page it fell on:
//! - each page is prefixed with a marker line encoding its index, so `^` in
//!   multi-line patterns still matches at the top of a page
//! - pages are joined with '\n', so stripping the markers gives back the raw text
//! - chapter k runs from heading k up to heading k+1 (or the end of the text)

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use super::{ChapterMap, Detection, HeadingPattern, FALLBACK_CHAPTER};
use crate::document::ExtractedPages;

/// Private-use code points delimit the marker so it cannot collide with extracted prose
const MARKER_OPEN: char = '\u{E000}';
const MARKER_CLOSE: char = '\u{E001}';

static MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}PAGE_[0-9]+\u{E001}\n").unwrap());

/// A chapter boundary found by the heading pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedHeading {
    /// Sequential chapter name assigned to this heading
    pub chapter: String,
    /// Heading text as matched, markers removed
    pub heading: String,
    /// 0-indexed page the heading starts on
    pub page: usize,
    /// Byte offset of the match in the untagged text
    pub offset: usize,
}

/// Pages joined into one string, each prefixed with a page marker
#[derive(Debug, Clone)]
pub struct TaggedText {
    text: String,
    /// (marker start, marker end) byte offsets, one per page
    markers: Vec<(usize, usize)>,
}

impl TaggedText {
    pub fn build(pages: &[String]) -> Self {
        let capacity = pages.iter().map(|p| p.len() + 16).sum();
        let mut text = String::with_capacity(capacity);
        let mut markers = Vec::with_capacity(pages.len());

        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            let start = text.len();
            text.push(MARKER_OPEN);
            // Writing to a String cannot fail
            let _ = write!(text, "PAGE_{}", i);
            text.push(MARKER_CLOSE);
            text.push('\n');
            markers.push((start, text.len()));
            text.push_str(page);
        }

        Self { text, markers }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Page containing a byte offset. The '\n' between pages belongs to the earlier page.
    pub fn page_at(&self, offset: usize) -> usize {
        match self.markers.binary_search_by_key(&offset, |&(start, _)| start) {
            Ok(page) => page,
            Err(insert_at) => insert_at.saturating_sub(1),
        }
    }

    /// True if the offset lies strictly inside a marker token
    fn in_marker(&self, offset: usize) -> bool {
        let page = self.page_at(offset);
        self.markers
            .get(page)
            .is_some_and(|&(start, end)| offset > start && offset < end)
    }

    /// Offset in the text with all markers before `offset` removed
    fn untagged_offset(&self, offset: usize) -> usize {
        let marker_bytes: usize = self.markers
            .iter()
            .take_while(|(start, _)| *start < offset)
            .map(|(start, end)| end.min(&offset) - start)
            .sum();
        offset - marker_bytes
    }

    /// Text with every page marker removed
    pub fn strip(&self) -> String {
        strip_markers(&self.text)
    }
}

/// Remove page-marker tokens from a slice of tagged text
pub fn strip_markers(text: &str) -> String {
    MARKER_REGEX.replace_all(text, "").into_owned()
}

/// Split pages into chapters at every match of `pattern`.
///
/// Chapters are named by detection order, not by the numeral in the heading.
/// With no matches the whole document becomes a single chapter.
pub fn detect_by_pattern(pages: &ExtractedPages, pattern: &HeadingPattern) -> Detection {
    tracing::info!("Detecting chapters using pattern: {}", pattern);

    let tagged = TaggedText::build(&pages.pages);
    let text = tagged.as_str();

    let starts: Vec<(usize, usize)> = pattern
        .regex()
        .find_iter(text)
        .filter(|m| {
            // Empty matches and matches inside a marker would cut a marker in half
            let keep = !m.is_empty() && !tagged.in_marker(m.start());
            if !keep {
                tracing::debug!(offset = m.start(), "Ignoring empty or page-marker heading match");
            }
            keep
        })
        .map(|m| (m.start(), m.end()))
        .collect();

    if starts.is_empty() {
        tracing::warn!(
            "No chapters detected using the pattern. Treating entire document as a single chapter."
        );
        return Detection {
            chapters: ChapterMap::single(pages.raw_text.clone()),
            headings: Vec::new(),
        };
    }

    let front_matter = strip_markers(&text[..starts[0].0]);
    if !front_matter.is_empty() {
        tracing::debug!(bytes = front_matter.len(), "Text before first heading is not part of any chapter");
    }

    let mut chapters = ChapterMap::new();
    let mut headings = Vec::with_capacity(starts.len());

    for (i, &(start, match_end)) in starts.iter().enumerate() {
        let end = starts.get(i + 1).map(|&(next, _)| next).unwrap_or(text.len());
        let name = format!("Chapter {}", i + 1);

        headings.push(DetectedHeading {
            chapter: name.clone(),
            heading: strip_markers(&text[start..match_end]),
            page: tagged.page_at(start),
            offset: tagged.untagged_offset(start),
        });
        chapters.insert(name, strip_markers(&text[start..end]));
    }

    tracing::info!("Successfully extracted {} chapters", chapters.len());
    Detection { chapters, headings }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> ExtractedPages {
        ExtractedPages::new(texts.iter().map(|t| t.to_string()).collect())
    }

    fn concat(map: &ChapterMap) -> String {
        map.iter().map(|(_, text)| text).collect()
    }

    #[test]
    fn test_tagged_text_strips_to_raw_text() {
        let extracted = pages(&["alpha", "", "gamma\nmore"]);
        let tagged = TaggedText::build(&extracted.pages);
        assert_eq!(tagged.strip(), extracted.raw_text);
        assert!(tagged.as_str().contains("PAGE_2"));
    }

    #[test]
    fn test_page_at_maps_offsets() {
        let extracted = pages(&["first page", "second page"]);
        let tagged = TaggedText::build(&extracted.pages);
        let text = tagged.as_str();
        assert_eq!(tagged.page_at(text.find("first").unwrap()), 0);
        assert_eq!(tagged.page_at(text.find("second").unwrap()), 1);
        // The joining newline still belongs to page 0
        let join = text.find("first page").unwrap() + "first page".len();
        assert_eq!(&text[join..join + 1], "\n");
        assert_eq!(tagged.page_at(join), 0);
    }

    #[test]
    fn test_no_matches_falls_back_to_single_chapter() {
        let extracted = pages(&["Just some notes", "without any headings"]);
        let detection = detect_by_pattern(&extracted, &HeadingPattern::default());

        assert_eq!(detection.chapters.len(), 1);
        assert_eq!(detection.chapters.get(FALLBACK_CHAPTER), Some("Just some notes\nwithout any headings"));
        assert!(detection.headings.is_empty());
    }

    #[test]
    fn test_empty_document_yields_one_empty_chapter() {
        let detection = detect_by_pattern(&pages(&[]), &HeadingPattern::default());
        assert_eq!(detection.chapters.get(FALLBACK_CHAPTER), Some(""));
    }

    #[test]
    fn test_splits_at_each_heading() {
        let extracted = pages(&[
            "Chapter 1 Beginnings\nOnce upon a time.",
            "Still chapter one.\nChapter 2 Middle\nThings happen.",
            "CHAPTER III End\nThe end.",
        ]);
        let detection = detect_by_pattern(&extracted, &HeadingPattern::default());
        let chapters = &detection.chapters;

        assert_eq!(chapters.keys().collect::<Vec<_>>(), vec!["Chapter 1", "Chapter 2", "Chapter 3"]);
        assert_eq!(
            chapters.get("Chapter 1"),
            Some("Chapter 1 Beginnings\nOnce upon a time.\nStill chapter one.\n")
        );
        assert_eq!(chapters.get("Chapter 2"), Some("Chapter 2 Middle\nThings happen.\n"));
        assert_eq!(chapters.get("Chapter 3"), Some("CHAPTER III End\nThe end."));
        assert_eq!(concat(chapters), extracted.raw_text);
    }

    #[test]
    fn test_names_are_sequential_not_captured_numerals() {
        let extracted = pages(&["Chapter 7 Late start", "Chapter 12 Later"]);
        let detection = detect_by_pattern(&extracted, &HeadingPattern::default());
        assert_eq!(detection.chapters.keys().collect::<Vec<_>>(), vec!["Chapter 1", "Chapter 2"]);
        assert!(detection.chapters.get("Chapter 1").unwrap().starts_with("Chapter 7"));
    }

    #[test]
    fn test_repeated_heading_text_gets_distinct_chapters() {
        let extracted = pages(&["Chapter 1 a", "Chapter 1 b"]);
        let detection = detect_by_pattern(&extracted, &HeadingPattern::default());
        assert_eq!(detection.chapters.len(), 2);
    }

    #[test]
    fn test_front_matter_is_excluded() {
        let extracted = pages(&["Preface text", "Chapter 1\nBody"]);
        let detection = detect_by_pattern(&extracted, &HeadingPattern::default());
        assert_eq!(detection.chapters.len(), 1);
        assert_eq!(detection.chapters.get("Chapter 1"), Some("Chapter 1\nBody"));
    }

    #[test]
    fn test_headings_record_page_and_offset() {
        let extracted = pages(&["Intro", "Chapter 1 One", "text\nChapter 2 Two"]);
        let detection = detect_by_pattern(&extracted, &HeadingPattern::default());

        let pages_hit: Vec<usize> = detection.headings.iter().map(|h| h.page).collect();
        assert_eq!(pages_hit, vec![1, 2]);
        assert_eq!(detection.headings[0].heading, "Chapter 1");
        assert_eq!(
            &extracted.raw_text[detection.headings[1].offset..],
            "Chapter 2 Two"
        );
    }

    #[test]
    fn test_lowercase_heading_not_matched_by_default() {
        let extracted = pages(&["see chapter 4 for details"]);
        let detection = detect_by_pattern(&extracted, &HeadingPattern::default());
        assert_eq!(detection.chapters.get(FALLBACK_CHAPTER), Some("see chapter 4 for details"));
    }

    #[test]
    fn test_custom_pattern() {
        let pattern = HeadingPattern::new(r"(?m)^Part [A-Z]").unwrap();
        let extracted = pages(&["Part A\nalpha\nPart B\nbeta"]);
        let detection = detect_by_pattern(&extracted, &pattern);
        assert_eq!(detection.chapters.get("Chapter 1"), Some("Part A\nalpha\n"));
        assert_eq!(detection.chapters.get("Chapter 2"), Some("Part B\nbeta"));
    }

    #[test]
    fn test_pattern_matching_marker_text_is_ignored() {
        let pattern = HeadingPattern::new("PAGE_[0-9]+").unwrap();
        let extracted = pages(&["one", "two"]);
        let detection = detect_by_pattern(&extracted, &pattern);
        assert_eq!(detection.chapters.get(FALLBACK_CHAPTER), Some("one\ntwo"));
    }

    #[test]
    fn test_chapter_text_has_no_markers() {
        let extracted = pages(&["Chapter 1 start", "continues", "on and on"]);
        let detection = detect_by_pattern(&extracted, &HeadingPattern::default());
        let text = detection.chapters.get("Chapter 1").unwrap();
        assert!(!text.contains(MARKER_OPEN));
        assert!(!text.contains("PAGE_"));
        assert_eq!(text, "Chapter 1 start\ncontinues\non and on");
    }
}
