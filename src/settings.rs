//! Segmenter settings storage
//!
//! Stores configuration like the heading pattern in a JSON file. Environment
//! variables take precedence over the file; CLI flags take precedence over both.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::chapters::{HeadingPattern, DEFAULT_HEADING_PATTERN};
use crate::error::{Result, SegmentError};

pub const PATTERN_ENV: &str = "CHAPTER_SPLIT_PATTERN";
pub const OUTPUT_DIR_ENV: &str = "CHAPTER_SPLIT_OUTPUT_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Regex used to find chapter headings
    #[serde(default = "default_heading_pattern")]
    pub heading_pattern: String,
    /// Where chapter files are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// tracing filter directive used when RUST_LOG is unset ("info", "debug", ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_heading_pattern() -> String {
    DEFAULT_HEADING_PATTERN.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            heading_pattern: default_heading_pattern(),
            output_dir: default_output_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Default settings file location (`<config dir>/chapter-split/settings.json`)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("chapter-split"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("settings.json")
    }

    /// Load settings from disk. A missing file yields defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let settings_error = |reason: String| SegmentError::Settings {
            path: path.to_path_buf(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| settings_error(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| settings_error(e.to_string()))
    }

    /// Save settings to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SegmentError::OutputWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, content).map_err(|source| SegmentError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment variable overrides (empty values are ignored)
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(PATTERN_ENV).ok(),
            std::env::var(OUTPUT_DIR_ENV).ok().map(PathBuf::from),
        )
    }

    /// Replace fields with any non-empty override
    pub fn with_overrides(mut self, heading_pattern: Option<String>, output_dir: Option<PathBuf>) -> Self {
        if let Some(pattern) = heading_pattern.filter(|p| !p.is_empty()) {
            self.heading_pattern = pattern;
        }
        if let Some(dir) = output_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.output_dir = dir;
        }
        self
    }

    /// Compile the configured heading pattern
    pub fn heading_pattern(&self) -> Result<HeadingPattern> {
        HeadingPattern::new(&self.heading_pattern)
    }
}
