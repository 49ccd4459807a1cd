pub mod markup;
pub mod range;
pub mod range_set;

pub use markup::{excluded_ranges, MarkupScanner};
pub use range::{find_next_unignored, find_ranges, RangeMatcher, RangeResult};
pub use range_set::{advance_cursor, denest, merge, RangeCursor, RangeSet};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// A half-open byte range `[start, end)` into one text snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {} after end {}", start, end);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position < self.end
    }

    /// True if `other` lies completely inside this span.
    pub fn encloses(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Span::new(start, end)
    }
}

/// How aggressively markup is excluded from checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScanLevel {
    /// Nothing is excluded.
    None,
    /// Templates, links, tables, comments, emphasis, tags, hyperlinks and quotations.
    #[default]
    Relaxed,
    /// Relaxed plus reference tags.
    WikiSkip,
    /// Everything, including list lines and trailing boilerplate sections.
    Full,
}

impl FromStr for ScanLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(ScanLevel::None),
            "relaxed" | "moderate" | "fast" => Ok(ScanLevel::Relaxed),
            "wiki-skip" | "wikiskip" => Ok(ScanLevel::WikiSkip),
            "full" => Ok(ScanLevel::Full),
            _ => Err(format!("Unknown scan level: {}", s)),
        }
    }
}

impl fmt::Display for ScanLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanLevel::None => write!(f, "none"),
            ScanLevel::Relaxed => write!(f, "relaxed"),
            ScanLevel::WikiSkip => write!(f, "wiki-skip"),
            ScanLevel::Full => write!(f, "full"),
        }
    }
}

/// One page of wiki markup, whatever it was loaded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub text: String,
}

impl PageText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            title: None,
            text: text.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Read a page from disk; the title is the file stem with underscores as spaces.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read page: {}", path.display()))?;
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.replace('_', " "));

        Ok(Self {
            id: None,
            title,
            text,
        })
    }

    /// 1-indexed line and column (in characters) of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = floor_char_boundary(&self.text, offset.min(self.text.len()));
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        (line, before[line_start..].chars().count() + 1)
    }

    /// Up to `margin` bytes of text on each side of a span, on a single line.
    pub fn context(&self, offset: usize, len: usize, margin: usize) -> String {
        let start = floor_char_boundary(&self.text, offset.saturating_sub(margin));
        let end = ceil_char_boundary(&self.text, (offset + len + margin).min(self.text.len()))
            .unwrap_or(self.text.len());
        let snippet = self.text[start..end].replace('\n', " ");

        match (start > 0, end < self.text.len()) {
            (true, true) => format!("...{}...", snippet.trim()),
            (true, false) => format!("...{}", snippet.trim()),
            (false, true) => format!("{}...", snippet.trim()),
            (false, false) => snippet.trim().to_string(),
        }
    }
}

/// Smallest char boundary at or after `position`, or `None` past the end.
pub(crate) fn ceil_char_boundary(text: &str, position: usize) -> Option<usize> {
    if position > text.len() {
        return None;
    }
    let mut p = position;
    while !text.is_char_boundary(p) {
        p += 1;
    }
    Some(p)
}

pub(crate) fn floor_char_boundary(text: &str, position: usize) -> usize {
    let mut p = position.min(text.len());
    while !text.is_char_boundary(p) {
        p -= 1;
    }
    p
}
