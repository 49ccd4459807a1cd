pub mod candidates;
pub mod dictionary;
pub mod replace;
pub mod rules;
pub mod suggestions;
pub mod tokenizer;

use crate::dict::Blacklist;
use crate::parser::{excluded_ranges, PageText, ScanLevel};
use crate::WrongWord;
use rules::LexicalFilter;
use std::collections::{HashMap, HashSet};
use suggestions::similarity_ratio;
use tokenizer::{is_all_uppercase, is_latin9, WordTokenizer};

/// Best suggestions below this similarity are treated as noise.
const MIN_SIMILARITY: f64 = 0.7;
/// Best suggestions further away than this are treated as noise.
const MAX_DISTANCE: usize = 5;

/// Dictionary lookup used by [`SpellChecker`] and the candidate matcher.
pub trait SpellOracle: Sync {
    /// True if the word is spelled correctly.
    fn accepts(&self, word: &str) -> bool;

    /// Possible corrections, best first.
    fn suggest(&self, word: &str) -> Vec<String>;
}

/// Decisions that outlive a single page check.
#[derive(Debug, Clone, Default)]
pub struct CheckSession {
    known_words: HashSet<String>,
    correct_per_page: HashMap<String, HashSet<String>>,
}

impl CheckSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known_words(mut self, words: impl IntoIterator<Item = String>) -> Self {
        self.known_words.extend(words);
        self
    }

    /// Accept a word everywhere.
    pub fn mark_known(&mut self, word: &str) {
        self.known_words.insert(word.to_string());
    }

    /// Accept a word on one page only.
    pub fn mark_correct_on_page(&mut self, title: &str, word: &str) {
        self.correct_per_page
            .entry(title.to_string())
            .or_default()
            .insert(word.to_string());
    }

    pub fn is_known(&self, word: &str) -> bool {
        self.known_words.contains(word)
    }

    /// True if the word was accepted globally or on the page with this title.
    pub fn is_ignored(&self, title: Option<&str>, word: &str) -> bool {
        if self.is_known(word) {
            return true;
        }
        title
            .and_then(|t| self.correct_per_page.get(t))
            .is_some_and(|words| words.contains(word))
    }
}

/// Flags words listed in a blacklist of known misspellings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlacklistChecker {
    level: ScanLevel,
}

impl BlacklistChecker {
    pub fn new(level: ScanLevel) -> Self {
        Self { level }
    }

    pub fn check(&self, page: &PageText, blacklist: &Blacklist) -> Vec<WrongWord> {
        let excluded = excluded_ranges(&page.text, self.level);
        let mut wrong = Vec::new();

        for token in WordTokenizer::new(&page.text, &excluded).with_title(page.title.as_deref()) {
            if token.word.is_empty() || is_all_uppercase(&token.word) {
                continue;
            }
            let Some(correct) = blacklist.get(&token.word) else {
                continue;
            };
            if correct == token.word {
                continue;
            }

            log::debug!("Blacklisted '{}' at {}", token.word, token.start);
            wrong.push(WrongWord::new(token.word, token.raw, token.start).with_correct(correct));
        }

        wrong
    }

    /// Every word of the page the checker would look at, in order.
    pub fn collect_words(&self, page: &PageText) -> Vec<String> {
        let excluded = excluded_ranges(&page.text, self.level);
        WordTokenizer::new(&page.text, &excluded)
            .with_title(page.title.as_deref())
            .map(|t| t.word)
            .filter(|w| !w.is_empty())
            .collect()
    }
}

/// Dictionary-driven checker: reports words the oracle does not know and the
/// lexical filter does not excuse.
pub struct SpellChecker<'a> {
    oracle: &'a dyn SpellOracle,
    filter: LexicalFilter,
    level: ScanLevel,
    remove_dissimilar: bool,
    suggest: bool,
}

impl<'a> SpellChecker<'a> {
    pub fn new(oracle: &'a dyn SpellOracle, filter: LexicalFilter) -> Self {
        Self {
            oracle,
            filter,
            level: ScanLevel::Full,
            remove_dissimilar: true,
            suggest: true,
        }
    }

    pub fn with_level(mut self, level: ScanLevel) -> Self {
        self.level = level;
        self
    }

    /// Drop words whose best suggestion is too far away to be a typo fix.
    pub fn with_remove_dissimilar(mut self, remove: bool) -> Self {
        self.remove_dissimilar = remove;
        self
    }

    pub fn with_suggestions(mut self, suggest: bool) -> Self {
        self.suggest = suggest;
        self
    }

    pub fn check(&self, page: &PageText, session: &CheckSession) -> Vec<WrongWord> {
        let text = &page.text;
        let excluded = excluded_ranges(text, self.level);
        let title = page.title.as_deref();

        // A word seen twice on a page is probably correct, a third time flags it again
        let mut unknown: HashSet<String> = HashSet::new();
        let mut wrong = Vec::new();

        for token in WordTokenizer::new(text, &excluded).with_context_rules(false) {
            let word = token.word.as_str();
            if word.is_empty() || is_all_uppercase(word) || !is_latin9(word) {
                continue;
            }
            if self.oracle.accepts(word) {
                continue;
            }
            if unknown.remove(word) {
                continue;
            }
            if session.is_ignored(title, word) || self.filter.should_skip(word, text, token.start)
            {
                continue;
            }

            let suggestions = if self.suggest {
                self.oracle.suggest(word)
            } else {
                Vec::new()
            };
            if suggestions.iter().any(|s| s == word) {
                continue;
            }

            let correct = suggestions.first().cloned().unwrap_or_default();
            if self.suggest && self.remove_dissimilar && is_dissimilar(&correct, word) {
                log::trace!("Dropping '{}', best suggestion '{}' is too far", word, correct);
                continue;
            }

            log::debug!("Unknown word '{}' at {}", word, token.start);
            unknown.insert(word.to_string());
            wrong.push(
                WrongWord::new(word, token.raw, token.start)
                    .with_correct(correct)
                    .with_suggestions(suggestions),
            );
        }

        wrong
    }
}

fn is_dissimilar(correct: &str, word: &str) -> bool {
    similarity_ratio(correct, word) < MIN_SIMILARITY || strsim::levenshtein(correct, word) > MAX_DISTANCE
}
