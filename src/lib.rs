pub mod checker;
pub mod cli;
pub mod config;
pub mod dict;
pub mod parser;

pub use checker::{BlacklistChecker, CheckSession, SpellChecker, SpellOracle};
pub use config::Config;
pub use parser::{PageText, ScanLevel, Span};

use serde::Serialize;

/// A word flagged on a page together with its proposed correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrongWord {
    /// Canonical form that was looked up.
    pub word: String,
    /// The word as written, with attached punctuation and markup.
    pub bigword: String,
    /// Proposed correction; empty if none is known.
    pub correct: String,
    /// Byte offset of `bigword` in the page.
    pub location: usize,
    pub suggestions: Vec<String>,
}

impl WrongWord {
    pub fn new(word: impl Into<String>, bigword: impl Into<String>, location: usize) -> Self {
        Self {
            word: word.into(),
            bigword: bigword.into(),
            correct: String::new(),
            location,
            suggestions: Vec::new(),
        }
    }

    pub fn with_correct(mut self, correct: impl Into<String>) -> Self {
        self.correct = correct.into();
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    pub error_count: usize,
    pub fixed_count: usize,
    pub errors: Vec<SpellError>,
}

impl CheckResult {
    pub fn from_errors(errors: Vec<SpellError>) -> Self {
        Self {
            error_count: errors.len(),
            fixed_count: 0,
            errors,
        }
    }
}

/// A flagged word placed in its page for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SpellError {
    pub word: String,
    pub correct: String,
    pub line: usize,
    pub column: usize,
    pub context: String,
    pub suggestions: Vec<String>,
}

impl SpellError {
    const CONTEXT_MARGIN: usize = 40;

    pub fn new(page: &PageText, wrong: &WrongWord) -> Self {
        let (line, column) = page.line_col(wrong.location);
        Self {
            word: wrong.word.clone(),
            correct: wrong.correct.clone(),
            line,
            column,
            context: page.context(wrong.location, wrong.bigword.len(), Self::CONTEXT_MARGIN),
            suggestions: wrong.suggestions.clone(),
        }
    }
}
