use crate::parser::{ceil_char_boundary, RangeCursor, RangeSet, Span};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Separators come first so a match always starts at the cursor
    static ref WORD: Regex = Regex::new(r"([\s=<>_/-]*)([^\s=<>_/-]+)").unwrap();
}

const NBSP: &str = "&nbsp;";
const EN_DASH: char = '–';

/// Punctuation stripped from both ends of a word besides ASCII punctuation.
const EXTRA_PUNCTUATION: &[char] = &['«', '»', '–', '−', '→', '“', '„', '‚', '‘', '’'];

/// Words shorter than this (in characters) are never checked.
const MIN_CONTEXT_LEN: usize = 3;

/// One word found in page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'t> {
    /// The word as written, including attached punctuation and brackets.
    pub raw: &'t str,
    /// Canonical form used for lookups; empty if the token cannot be a word.
    pub word: String,
    /// Byte offset of `raw` in the page.
    pub start: usize,
    /// Bytes consumed from `start`, including the break after the word.
    pub consumed: usize,
}

impl Token<'_> {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.start + self.raw.len())
    }
}

/// Single forward pass over a page yielding the words outside excluded spans.
pub struct WordTokenizer<'t> {
    text: &'t str,
    excluded: &'t RangeSet,
    cursor: RangeCursor,
    title: Option<&'t str>,
    context_rules: bool,
}

impl<'t> WordTokenizer<'t> {
    pub fn new(text: &'t str, excluded: &'t RangeSet) -> Self {
        Self {
            text,
            excluded,
            cursor: RangeCursor::default(),
            title: None,
            context_rules: true,
        }
    }

    /// Words equal to, inside of, or containing a title word are dropped.
    pub fn with_title(mut self, title: Option<&'t str>) -> Self {
        self.title = title;
        self
    }

    /// Toggle the surrounding-text discards (emphasis, abbreviations, case...).
    pub fn with_context_rules(mut self, enabled: bool) -> Self {
        self.context_rules = enabled;
        self
    }

    fn discard_by_context(&self, start: usize, word: &str) -> bool {
        let text = self.text;
        let at = |from: usize, to: usize| text.get(from..to);

        if word.chars().count() < MIN_CONTEXT_LEN {
            return true;
        }

        // Bold markup glued to the word
        if (start > 3 && at(start - 3, start) == Some("'''")) || at(start, start + 3) == Some("'''")
        {
            return true;
        }

        if start > 17 && at(start - 17, start) == Some("<nowiki></nowiki>") {
            return true;
        }

        if start > 2 && at(start - 2, start) == Some("]]") {
            return true;
        }

        let end = start + word.len();

        // Abbreviation: a dot followed by a lowercase word
        if end + 5 < text.len() && text.as_bytes()[end] == b'.' && at(end, end + 5) != Some("<ref>")
        {
            let lowercase_next = text
                .get(end + 1..)
                .and_then(|rest| rest.chars().nth(1))
                .is_some_and(char::is_lowercase);
            if lowercase_next {
                return true;
            }
        }

        if text.as_bytes().get(end) == Some(&b'-') {
            return true;
        }

        if start > 1 && at(start - 2, start) == Some(" -") {
            return true;
        }

        if word.chars().skip(1).any(char::is_uppercase) {
            return true;
        }

        if is_repeated_genitive(word, text) {
            return true;
        }

        if let Some(title) = self.title {
            for title_word in title.split_whitespace() {
                if title_word == word || word.contains(title_word) || title_word.contains(word) {
                    return true;
                }
            }
        }

        false
    }
}

impl<'t> Iterator for WordTokenizer<'t> {
    type Item = Token<'t>;

    fn next(&mut self) -> Option<Token<'t>> {
        let text = self.text;

        loop {
            let from = ceil_char_boundary(text, self.cursor.position)?;
            let caps = WORD.captures_at(text, from)?;
            let whole = caps.get(0)?;
            let separators = caps.get(1).map_or(0, |m| m.len());
            let body = caps.get(2)?.as_str();

            if self
                .cursor
                .skip_excluded(self.excluded.spans(), whole.start(), whole.end())
            {
                continue;
            }

            let start = whole.start() + separators;
            let (raw, consumed) = split_word(text, start, body);

            if self.excluded.ends_at(start) {
                // Glued to the end of markup, likely only half a word
                self.cursor.advance_to(start + consumed);
                continue;
            }

            self.cursor.advance_to(start);
            let word = canonical_form(raw);
            let discard = self.context_rules && self.discard_by_context(start, &word);
            self.cursor.advance_to(start + consumed);

            if discard {
                continue;
            }

            return Some(Token {
                raw,
                word,
                start,
                consumed,
            });
        }
    }
}

/// Tokenize `text`, skipping everything inside `excluded`.
pub fn tokenize<'t>(text: &'t str, excluded: &'t RangeSet) -> WordTokenizer<'t> {
    WordTokenizer::new(text, excluded)
}

/// Cut the matched body at the first `&nbsp;` or en dash. Returns the word and
/// the number of bytes to advance past it.
fn split_word<'t>(text: &'t str, start: usize, body: &'t str) -> (&'t str, usize) {
    if let Some(i) = body.find(NBSP) {
        let word = &body[..i];
        return (word, (word.len() + NBSP.len()).min(text.len() - start));
    }

    let word = body.split(EN_DASH).next().unwrap_or(body);
    let following = text[start + word.len()..]
        .chars()
        .next()
        .map_or(0, char::len_utf8);
    (word, word.len() + following)
}

fn is_word_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || EXTRA_PUNCTUATION.contains(&c)
}

/// Strip markup and punctuation from a raw token. Returns an empty string for
/// interwiki or category links, URLs and pure numbers.
pub fn canonical_form(raw: &str) -> String {
    let mut word = raw.to_string();

    if let (Some(open), Some(colon)) = (word.rfind("[["), word.rfind(':')) {
        if open < colon {
            return String::new();
        }
    }

    if let Some(bar) = word.rfind('|') {
        word = match word.rfind("[[") {
            Some(open) if open < bar => format!("{}{}", &word[..open], &word[bar + 1..]),
            _ => word[bar + 1..].to_string(),
        };
    }

    let word = word
        .replace(['[', ']'], "")
        .replace(NBSP, " ")
        .replace("nbsp;", " ");
    let word = word.trim_matches(is_word_punctuation);

    if word.starts_with("http://") || word.starts_with("https://") || word.starts_with("www.") {
        return String::new();
    }

    if word
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_punctuation())
    {
        return String::new();
    }

    word.to_string()
}

/// A capitalized word ending in `s` whose stem occurs more than once as a
/// whole word is most likely a genitive of a name.
fn is_repeated_genitive(word: &str, text: &str) -> bool {
    let mut chars = word.chars();
    if !chars.next().is_some_and(char::is_uppercase) || !word.ends_with('s') {
        return false;
    }

    let stem = &word[..word.len() - 1];
    if stem.is_empty() {
        return false;
    }
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices(stem)
        .filter(|&(i, _)| {
            !text[..i].chars().next_back().is_some_and(is_word_char)
                && !text[i + stem.len()..].chars().next().is_some_and(is_word_char)
        })
        .nth(1)
        .is_some()
}

/// True if the word has cased letters and all of them are uppercase.
pub fn is_all_uppercase(word: &str) -> bool {
    let mut cased = false;
    for c in word.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// True if the word can be represented in ISO-8859-15.
pub fn is_latin9(word: &str) -> bool {
    word.chars().all(|c| match c as u32 {
        0x00..=0xFF => !matches!(c, '¤' | '¦' | '¨' | '´' | '¸' | '¼' | '½' | '¾'),
        _ => matches!(c, '€' | 'Š' | 'š' | 'Ž' | 'ž' | 'Œ' | 'œ' | 'Ÿ'),
    })
}
