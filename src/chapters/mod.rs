//! Chapter detection
//!
//! Splits extracted pages into named chapters using either:
//! 1. A heading pattern matched across the whole document (`section_parser`)
//! 2. Caller-supplied inclusive page ranges (`ranges`)
//!
//! Both produce a `ChapterMap`, which is never empty after detection.

pub mod ranges;
pub mod section_parser;

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::document::ExtractedPages;
use crate::error::Result;

pub use section_parser::{DetectedHeading, TaggedText};

/// Matches "Chapter 3", "CHAPTER XII", ...
pub const DEFAULT_HEADING_PATTERN: &str = r"(?:Chapter|CHAPTER)\s+(\d+|[IVXLCDM]+)";

/// Name used for the whole-document fallback chapter
pub const FALLBACK_CHAPTER: &str = "Chapter 1";

static DEFAULT_HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_HEADING_PATTERN).unwrap());

/// Compiled heading pattern
#[derive(Debug, Clone)]
pub struct HeadingPattern(Regex);

impl HeadingPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self(Regex::new(pattern)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn regex(&self) -> &Regex {
        &self.0
    }
}

impl Default for HeadingPattern {
    fn default() -> Self {
        Self(DEFAULT_HEADING_REGEX.clone())
    }
}

impl fmt::Display for HeadingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Chapter map
// ============================================================================

/// Name-keyed entries kept in insertion order, with indexed lookup
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderedEntries<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for OrderedEntries<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> OrderedEntries<V> {
    /// Replaces the value of an existing name in place
    fn insert(&mut self, name: String, value: V) {
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    fn get(&self, name: &str) -> Option<&V> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Ordered chapter name -> chapter text.
///
/// Keys are unique; re-inserting a name replaces its text without moving it.
/// Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterMap {
    entries: OrderedEntries<String>,
}

impl ChapterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map holding the whole document as one chapter
    pub fn single(text: impl Into<String>) -> Self {
        let mut map = Self::new();
        map.insert(FALLBACK_CHAPTER, text);
        map
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(name.into(), text.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }
}

impl Serialize for ChapterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, text) in self.entries.iter() {
            map.serialize_entry(name, text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChapterMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ChapterMapVisitor;

        impl<'de> Visitor<'de> for ChapterMapVisitor {
            type Value = ChapterMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of chapter name to chapter text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<ChapterMap, A::Error> {
                let mut map = ChapterMap::new();
                while let Some((name, text)) = access.next_entry::<String, String>()? {
                    map.insert(name, text);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ChapterMapVisitor)
    }
}

// ============================================================================
// Explicit page ranges
// ============================================================================

/// Inclusive 0-indexed page range. Signed so bad caller input can be rejected rather than wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChapterRange {
    pub start_page: i64,
    pub end_page: i64,
}

impl ChapterRange {
    pub fn new(start_page: i64, end_page: i64) -> Self {
        Self { start_page, end_page }
    }
}

/// Accepts `[start, end]` or `{"start_page": .., "end_page": ..}`
#[derive(Deserialize)]
#[serde(untagged)]
enum RangeRepr {
    Pair(i64, i64),
    Named { start_page: i64, end_page: i64 },
}

impl From<RangeRepr> for ChapterRange {
    fn from(repr: RangeRepr) -> Self {
        match repr {
            RangeRepr::Pair(start, end) => ChapterRange::new(start, end),
            RangeRepr::Named { start_page, end_page } => ChapterRange::new(start_page, end_page),
        }
    }
}

impl<'de> Deserialize<'de> for ChapterRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        RangeRepr::deserialize(deserializer).map(Into::into)
    }
}

/// Ordered chapter name -> page range, in the order the caller gave them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterRanges {
    entries: OrderedEntries<ChapterRange>,
}

impl ChapterRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, range: ChapterRange) {
        self.entries.insert(name.into(), range);
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, start_page: i64, end_page: i64) -> Self {
        self.insert(name, ChapterRange::new(start_page, end_page));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ChapterRange)> {
        self.entries.iter().map(|(k, r)| (k, *r))
    }

    /// Parse a JSON object such as `{"Intro": [0, 2], "Part One": [3, 10]}`
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::error::SegmentError::InvalidRanges(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for ChapterRanges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RangesVisitor;

        impl<'de> Visitor<'de> for RangesVisitor {
            type Value = ChapterRanges;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of chapter name to page range")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<ChapterRanges, A::Error> {
                let mut ranges = ChapterRanges::new();
                while let Some((name, range)) = access.next_entry::<String, ChapterRange>()? {
                    ranges.insert(name, range);
                }
                Ok(ranges)
            }
        }

        deserializer.deserialize_map(RangesVisitor)
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// How chapter boundaries are found for one detection run
#[derive(Debug, Clone)]
pub enum DetectionStrategy {
    Pattern(HeadingPattern),
    ExplicitRanges(ChapterRanges),
}

impl Default for DetectionStrategy {
    fn default() -> Self {
        DetectionStrategy::Pattern(HeadingPattern::default())
    }
}

impl DetectionStrategy {
    /// Non-empty explicit ranges win over any pattern; an empty range set counts as absent.
    pub fn resolve(pattern: Option<HeadingPattern>, ranges: Option<ChapterRanges>) -> Self {
        match ranges {
            Some(ranges) if !ranges.is_empty() => DetectionStrategy::ExplicitRanges(ranges),
            _ => DetectionStrategy::Pattern(pattern.unwrap_or_default()),
        }
    }

    pub fn detect(&self, pages: &ExtractedPages) -> Detection {
        match self {
            DetectionStrategy::Pattern(pattern) => section_parser::detect_by_pattern(pages, pattern),
            DetectionStrategy::ExplicitRanges(ranges) => Detection {
                chapters: ranges::detect_by_ranges(pages, ranges),
                headings: Vec::new(),
            },
        }
    }
}

/// Output of one detection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub chapters: ChapterMap,
    /// Heading anchors; empty in range mode and for the fallback chapter
    pub headings: Vec<DetectedHeading>,
}
