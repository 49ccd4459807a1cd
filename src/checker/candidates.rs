use crate::checker::suggestions::similarity_ratio;
use crate::checker::SpellOracle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Characters that mark a table row as an extraction artifact.
const ARTIFACTS: &[char] = &['\u{ad}', '(', ')', '´', '‡', '”', '™', '…'];

/// Weak adjective endings; a candidate that only differs in one of them is
/// usually a correct inflection.
const WEAK_ENDINGS: &[&str] = &["em", "es", "er", "en"];

/// One row of a word frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyEntry {
    pub word: String,
    pub occurrence: u64,
}

impl FrequencyEntry {
    pub fn new(word: impl Into<String>, occurrence: u64) -> Self {
        Self {
            word: word.into(),
            occurrence,
        }
    }
}

/// Selection of table rows by prefix, occurrence and length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyQuery {
    pub prefix: String,
    /// Required somewhere after the prefix.
    pub contains: Option<String>,
    /// Rows starting with this are left out.
    pub exclude_prefix: Option<String>,
    /// Rows must occur strictly less often than this.
    pub max_occurrence: u64,
    /// Accepted word lengths in characters.
    pub lengths: RangeInclusive<usize>,
}

impl FrequencyQuery {
    pub fn prefix(prefix: &str, max_occurrence: u64, lengths: RangeInclusive<usize>) -> Self {
        Self {
            prefix: prefix.to_string(),
            contains: None,
            exclude_prefix: None,
            max_occurrence,
            lengths,
        }
    }

    pub fn containing(mut self, infix: &str) -> Self {
        self.contains = Some(infix.to_string());
        self
    }

    pub fn excluding_prefix(mut self, prefix: &str) -> Self {
        self.exclude_prefix = Some(prefix.to_string());
        self
    }

    /// True if a row with this word and occurrence is selected.
    pub fn accepts(&self, word: &str, occurrence: u64) -> bool {
        let Some(rest) = word.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        occurrence < self.max_occurrence
            && self.lengths.contains(&word.chars().count())
            && self
                .exclude_prefix
                .as_deref()
                .map_or(true, |p| !word.starts_with(p))
            && self.contains.as_deref().map_or(true, |c| rest.contains(c))
    }
}

/// A table of word occurrence counts that can be searched by prefix.
pub trait FrequencySource {
    fn query(&self, query: &FrequencyQuery) -> Vec<FrequencyEntry>;

    /// Highest occurrence over all casings of `word`.
    fn max_case_occurrence(&self, word: &str) -> Option<u64>;
}

impl FrequencySource for [FrequencyEntry] {
    fn query(&self, query: &FrequencyQuery) -> Vec<FrequencyEntry> {
        self.iter()
            .filter(|e| query.accepts(&e.word, e.occurrence))
            .cloned()
            .collect()
    }

    fn max_case_occurrence(&self, word: &str) -> Option<u64> {
        let lower = word.to_lowercase();
        self.iter()
            .filter(|e| e.word.to_lowercase() == lower)
            .map(|e| e.occurrence)
            .max()
    }
}

impl FrequencySource for Vec<FrequencyEntry> {
    fn query(&self, query: &FrequencyQuery) -> Vec<FrequencyEntry> {
        self.as_slice().query(query)
    }

    fn max_case_occurrence(&self, word: &str) -> Option<u64> {
        self.as_slice().max_case_occurrence(word)
    }
}

/// Thresholds for [`CandidateMatcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateOptions {
    /// Candidates must occur less often than this, in any casing.
    pub occurrence_cutoff: u64,
    /// Candidates must be more similar than this.
    pub similarity_cutoff: f64,
    /// Candidates must be closer than this edit distance.
    pub max_distance: usize,
    /// Drop candidates that only differ in a weak adjective ending.
    pub suffix_filter: bool,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        Self {
            occurrence_cutoff: 20,
            similarity_cutoff: 0.8,
            max_distance: 6,
            suffix_filter: true,
        }
    }
}

/// Proposes rare words from a frequency table that look like misspellings of
/// a frequent, correct target word.
pub struct CandidateMatcher<'a, S: FrequencySource + ?Sized> {
    table: &'a S,
    options: CandidateOptions,
    oracle: Option<&'a dyn SpellOracle>,
}

impl<'a, S: FrequencySource + ?Sized> CandidateMatcher<'a, S> {
    pub fn new(table: &'a S) -> Self {
        Self {
            table,
            options: CandidateOptions::default(),
            oracle: None,
        }
    }

    pub fn with_options(mut self, options: CandidateOptions) -> Self {
        self.options = options;
        self
    }

    /// Candidates the oracle accepts as correctly spelled are dropped.
    pub fn with_oracle(mut self, oracle: &'a dyn SpellOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Candidate misspellings of `target`, least similar first.
    pub fn find(&self, target: &str) -> Vec<String> {
        let opts = &self.options;
        let chars: Vec<char> = target.chars().collect();
        let Some(&first) = chars.first() else {
            return Vec::new();
        };

        let len = chars.len();
        let lengths = len.saturating_sub(2)..=len + 2;
        let head: String = chars.iter().take(3).collect();
        let tail: String = chars[len.saturating_sub(3)..].iter().collect();

        let queries = [
            FrequencyQuery::prefix(&head, opts.occurrence_cutoff, lengths.clone())
                .excluding_prefix(target),
            FrequencyQuery::prefix(&first.to_string(), opts.occurrence_cutoff, lengths)
                .containing(&tail)
                .excluding_prefix(target),
        ];

        let mut found = BTreeSet::new();
        for query in &queries {
            for entry in self.table.query(query) {
                if self.keep(target, &entry.word) {
                    found.insert(entry.word);
                }
            }
        }
        log::debug!("{} candidates for '{}'", found.len(), target);

        let mut scored: Vec<(f64, String)> = found
            .into_iter()
            .map(|word| (similarity_ratio(target, &word), word))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, word)| word).collect()
    }

    fn keep(&self, target: &str, word: &str) -> bool {
        let opts = &self.options;

        if word == target
            || similarity_ratio(target, word) <= opts.similarity_cutoff
            || strsim::levenshtein(target, word) >= opts.max_distance
            || word.contains(ARTIFACTS)
        {
            return false;
        }

        if self.oracle.is_some_and(|o| o.accepts(word)) {
            return false;
        }

        // Frequent in another casing means it is a real word
        let occurrence = self.table.max_case_occurrence(word).unwrap_or(0);
        if occurrence >= opts.occurrence_cutoff {
            return false;
        }

        !(opts.suffix_filter && is_inflection_of(target, word))
    }
}

/// True if both words carry a different weak adjective ending.
fn is_inflection_of(target: &str, word: &str) -> bool {
    let weak = |w: &str| WEAK_ENDINGS.iter().find(|e| w.ends_with(*e)).copied();
    match (weak(target), weak(word)) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

/// Candidate misspellings of `target` with default filtering.
pub fn find_candidates<S: FrequencySource + ?Sized>(
    target: &str,
    table: &S,
    occurrence_cutoff: u64,
    similarity_cutoff: f64,
    max_distance: usize,
) -> Vec<String> {
    CandidateMatcher::new(table)
        .with_options(CandidateOptions {
            occurrence_cutoff,
            similarity_cutoff,
            max_distance,
            ..CandidateOptions::default()
        })
        .find(target)
}
