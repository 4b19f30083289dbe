//! Chapter persistence
//!
//! Writes a detected chapter map to disk as:
//! - `<output_dir>/<document>_chapters.json` - every chapter, original names, detection order
//! - `<output_dir>/<document>/<sanitized name>.txt` - one raw text file per chapter

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chapters::ChapterMap;
use crate::error::{Result, SegmentError};
use crate::utils::sanitize_filename;

/// Used when a chapter name has no filesystem-safe characters at all
const UNNAMED_CHAPTER: &str = "chapter";

fn write_error(path: &Path, source: std::io::Error) -> SegmentError {
    SegmentError::OutputWrite {
        path: path.to_path_buf(),
        source,
    }
}

/// Path of the JSON chapter map for a document
pub fn chapters_json_path(output_dir: &Path, document_name: &str) -> PathBuf {
    output_dir.join(format!("{}_chapters.json", document_name))
}

/// One unique file name per chapter, in map order.
///
/// Names that sanitize to the same file get `_2`, `_3`, ... so no chapter overwrites another.
pub fn chapter_file_names(chapters: &ChapterMap) -> Vec<String> {
    let mut used = HashSet::new();
    chapters
        .keys()
        .map(|name| {
            let mut base = sanitize_filename(name);
            if base.is_empty() {
                base = UNNAMED_CHAPTER.to_string();
            }
            let mut candidate = base.clone();
            let mut n = 2;
            while !used.insert(candidate.to_lowercase()) {
                candidate = format!("{}_{}", base, n);
                n += 1;
            }
            format!("{}.txt", candidate)
        })
        .collect()
}

/// Save the chapters to JSON and individual text files.
///
/// Returns the path of the JSON file.
pub fn save_chapters(output_dir: &Path, document_name: &str, chapters: &ChapterMap) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|e| write_error(output_dir, e))?;

    let json_path = chapters_json_path(output_dir, document_name);
    let content = serde_json::to_string_pretty(chapters)?;
    fs::write(&json_path, content).map_err(|e| write_error(&json_path, e))?;

    let chapters_dir = output_dir.join(document_name);
    fs::create_dir_all(&chapters_dir).map_err(|e| write_error(&chapters_dir, e))?;

    for ((name, text), file_name) in chapters.iter().zip(chapter_file_names(chapters)) {
        let chapter_path = chapters_dir.join(&file_name);
        fs::write(&chapter_path, text).map_err(|e| write_error(&chapter_path, e))?;
        tracing::debug!(chapter = name, "Wrote {}", chapter_path.display());
    }

    tracing::info!(
        "Saved chapters to {} and individual files in {}",
        json_path.display(),
        chapters_dir.display()
    );
    Ok(json_path)
}

/// Read back a chapter map written by `save_chapters`
pub fn load_chapters(json_path: &Path) -> Result<ChapterMap> {
    let read_error = |reason: String| SegmentError::ChapterMapRead {
        path: json_path.to_path_buf(),
        reason,
    };
    let content = fs::read_to_string(json_path).map_err(|e| read_error(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| read_error(e.to_string()))
}
