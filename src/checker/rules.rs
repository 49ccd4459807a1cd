use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Page language; only German and English have dedicated rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    German,
    English,
    Other,
}

impl Language {
    fn has_rules(self) -> bool {
        matches!(self, Language::German | Language::English)
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower.is_empty() {
            return Err("Empty language code".to_string());
        }
        if lower.starts_with("de") || lower == "german" {
            Ok(Language::German)
        } else if lower.starts_with("en") || lower == "english" {
            Ok(Language::English)
        } else {
            Ok(Language::Other)
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::German => write!(f, "de"),
            Language::English => write!(f, "en"),
            Language::Other => write!(f, "other"),
        }
    }
}

/// Tuning knobs for [`LexicalFilter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub language: Language,
    /// Words shorter than this are skipped.
    pub minimal_word_size: usize,
    /// Words occurring more often than this in the page are skipped.
    pub multiple_occurrence_tol: usize,
    /// Above 500 only the cheap rules run, above 1000 almost none.
    pub stringent: u32,
    /// Compound parts must be longer than this.
    pub composite_minlen: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            language: Language::German,
            minimal_word_size: 3,
            multiple_occurrence_tol: 1,
            stringent: 0,
            composite_minlen: 0,
        }
    }
}

const ROMANCE_DIACRITICS: &[char] = &['è', 'ê', 'é', 'ô', 'ò', 'ó', 'á', 'í', 'ø'];
const UMLAUTS: &[char] = &['ö', 'ä', 'ü'];
const FOREIGN_MARKS: &[char] = &['\'', '"', '+', '.', '&', '@', ':'];
const TLD_ENDINGS: &[&str] = &[".ch", ".de", ".com", ".at"];
const GERMAN_NUMBERS: &[&str] = &[
    "eins", "zwei", "drei", "vier", "fünf", "sechs", "sieben", "acht", "neun", "zehn",
];

/// Declension endings accepted after a known lowercase stem.
const ADJECTIVE_ENDINGS: &[&str] = &["n", "r", "s", "e", "en", "er", "es", "em"];
/// Declension endings accepted after a known capitalized stem.
const NOUN_ENDINGS: &[&str] = &["en", "ei", "e", "s"];
const STRONG_ONE: &[&str] = &["n", "r", "s", "e"];
const STRONG_TWO: &[&str] = &["en", "er", "es", "em"];

/// Heuristics deciding that an unknown word is probably fine after all.
///
/// Dictionaries miss names, compounds and declined forms; skipping these keeps
/// the number of false positives manageable.
#[derive(Debug, Clone, Default)]
pub struct LexicalFilter {
    config: FilterConfig,
    common_words: HashSet<String>,
    filter_words: HashSet<String>,
}

impl LexicalFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            common_words: HashSet::new(),
            filter_words: HashSet::new(),
        }
    }

    pub fn with_common_words(mut self, words: HashSet<String>) -> Self {
        self.common_words = words;
        self
    }

    pub fn with_filter_words(mut self, words: HashSet<String>) -> Self {
        self.filter_words = words;
        self
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn is_common(&self, word: &str) -> bool {
        self.common_words.contains(word)
    }

    fn is_known(&self, lower: &str) -> bool {
        self.common_words.contains(lower) || self.filter_words.contains(lower)
    }

    /// True if `word`, found at byte offset `location` of `text`, should not be
    /// reported.
    pub fn should_skip(&self, word: &str, text: &str, location: usize) -> bool {
        let cfg = &self.config;
        let lang = cfg.language;

        if word.trim().is_empty() {
            return true;
        }

        if word
            .chars()
            .any(|c| c.is_ascii_digit() || c == '(' || c == ')')
        {
            return true;
        }

        // Tail of a link like [[th]]is
        if location > 2 && text.get(location - 2..location) == Some("]]") {
            return true;
        }

        if cfg.stringent > 1000 {
            return false;
        }

        let lower = word.to_lowercase();
        if self.is_known(&lower) {
            return true;
        }

        let len = word.chars().count();
        // Plural or genitive of a known word
        if lang.has_rules()
            && len > 3
            && word.ends_with('s')
            && self.is_known(&lower[..lower.len() - 1])
        {
            return true;
        }

        if len < cfg.minimal_word_size {
            return true;
        }

        if cfg.stringent > 500 {
            return false;
        }

        if text.matches(word).count() > cfg.multiple_occurrence_tol {
            return true;
        }

        if len > 2 && word.chars().skip(1).any(char::is_uppercase) {
            return true;
        }

        if TLD_ENDINGS.iter().any(|tld| word.ends_with(tld)) {
            return true;
        }

        if word.contains(FOREIGN_MARKS) {
            return true;
        }

        if lang.has_rules() && word.contains(ROMANCE_DIACRITICS) {
            return true;
        }

        if lang == Language::English && word.contains(UMLAUTS) {
            return true;
        }

        if lang == Language::German && GERMAN_NUMBERS.iter().any(|n| word.starts_with(n)) {
            return true;
        }

        if self.has_known_affix(word) {
            return true;
        }

        if lang.has_rules() && cfg.stringent < 60 {
            return self.is_compound(word);
        }

        false
    }

    fn has_known_affix(&self, word: &str) -> bool {
        match self.config.language {
            Language::English => {
                let prefixed = ["de", "re"].iter().any(|p| {
                    word.strip_prefix(p)
                        .is_some_and(|rest| self.is_common(rest))
                });
                let suffixed = ["ization", "ly", "ee"].iter().any(|s| {
                    word.strip_suffix(s)
                        .is_some_and(|stem| self.is_common(stem))
                });
                prefixed || suffixed
            }
            Language::German => word
                .strip_prefix("un")
                .is_some_and(|rest| self.is_common(rest)),
            Language::Other => false,
        }
    }

    /// Try every split point and accept the word if it decomposes into known
    /// parts, allowing German linking `s` and declension endings.
    fn is_compound(&self, word: &str) -> bool {
        let lang = self.config.language;
        let minlen = self.config.composite_minlen;
        let chars: Vec<char> = word.chars().collect();
        let n = chars.len();
        let lower_of = |part: &[char]| part.iter().collect::<String>().to_lowercase();
        let initial = chars[0];

        for i in 2..n {
            let first = lower_of(&chars[..i]);
            let first_len = first.chars().count();

            if first_len <= minlen || !self.is_common(&first) {
                continue;
            }

            let other = lower_of(&chars[i..]);
            let other_len = other.chars().count();

            if lang == Language::English {
                if other == "ly" || self.is_common(&other) {
                    return true;
                }
                continue;
            }

            if first_len > 4 && other == "keit" {
                return true;
            }

            if other_len < 3 && first_len > 3 {
                if initial.is_lowercase() && ADJECTIVE_ENDINGS.contains(&other.as_str()) {
                    return true;
                }
                if initial.is_uppercase() && NOUN_ENDINGS.contains(&other.as_str()) {
                    return true;
                }
                continue;
            }

            if other == "ern" {
                continue;
            }

            if other_len <= minlen {
                continue;
            }

            if self.is_common(&other) {
                if needs_linking_s(&first) {
                    continue;
                }
                return true;
            }

            if i + 2 < n && chars[i] == 's' && first_len > 2 {
                if !forbids_linking_s(&first) && self.is_common(&lower_of(&chars[i + 1..])) {
                    return true;
                }
                continue;
            }

            // Truncated strong declension: stem + one or two letter ending
            if first_len > 2 && self.has_strong_ending(&other, other_len, 1, 5, STRONG_ONE) {
                return true;
            }
            if first_len > 2 && self.has_strong_ending(&other, other_len, 2, 6, STRONG_TWO) {
                return true;
            }
        }

        false
    }

    fn has_strong_ending(
        &self,
        other: &str,
        other_len: usize,
        ending_len: usize,
        min_len: usize,
        endings: &[&str],
    ) -> bool {
        if other_len <= min_len {
            return false;
        }
        let split = other
            .char_indices()
            .nth(other_len - ending_len)
            .map_or(other.len(), |(i, _)| i);
        let (stem, ending) = other.split_at(split);
        endings.contains(&ending) && self.is_common(stem)
    }
}

/// German compounds whose first part ends like this take a linking `s`.
fn needs_linking_s(first: &str) -> bool {
    let short_suffix = first.chars().count() > 3
        && ["tum", "ion", "tät", "ung"].iter().any(|s| first.ends_with(s));
    short_suffix
        || ["ling", "heit", "keit", "schaft", "sicht"]
            .iter()
            .any(|s| first.ends_with(s))
}

/// First parts that never take a linking `s`.
fn forbids_linking_s(first: &str) -> bool {
    ["er", "el", "en", "ss", "ß", "st", "tz", "sch", "s", "z"]
        .iter()
        .any(|s| first.ends_with(s))
}
