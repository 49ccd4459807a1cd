use crate::checker::suggestions::capitalize;
use crate::parser::ceil_char_boundary;
use crate::WrongWord;

/// An accepted correction ready to be spliced into page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Canonical wrong word, used in the edit summary.
    pub word: String,
    /// Raw text to look for.
    pub bigword: String,
    /// Raw text to put in its place.
    pub replacement: String,
    /// Byte offset where `bigword` was found when the page was checked.
    pub location: usize,
}

impl Replacement {
    /// Turn a flagged word into a replacement of its raw form. Returns `None`
    /// when there is no correction or it equals the word.
    pub fn from_wrong_word(wrong: &WrongWord) -> Option<Self> {
        if wrong.word.is_empty() || wrong.correct.is_empty() || wrong.word == wrong.correct {
            return None;
        }

        let correct = if wrong.word.chars().next().is_some_and(char::is_uppercase) {
            capitalize(&wrong.correct)
        } else {
            wrong.correct.clone()
        };

        Some(Self {
            word: wrong.word.clone(),
            replacement: rewrite_raw(&wrong.bigword, &wrong.word, &correct),
            bigword: wrong.bigword.clone(),
            location: wrong.location,
        })
    }
}

/// Replace the canonical word inside its raw form, keeping attached markup.
pub fn rewrite_raw(raw: &str, word: &str, correct: &str) -> String {
    if !word.is_empty() && raw.contains(word) {
        raw.replace(word, correct)
    } else {
        correct.to_string()
    }
}

/// Text after replacing, with an edit summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub text: String,
    /// `wrong => right` pairs joined by `, `.
    pub summary: String,
    pub applied: usize,
}

/// Splice replacements into `text`.
///
/// Each raw form is looked up at or after its recorded location (shifted by
/// the edits made so far), falling back to its first occurrence. Replacements
/// whose target is gone or already corrected are skipped.
pub fn apply_replacements(text: &str, replacements: &[Replacement]) -> ReplaceOutcome {
    let mut ordered: Vec<&Replacement> = replacements.iter().collect();
    ordered.sort_by_key(|r| r.location);

    let mut out = text.to_string();
    let mut delta: isize = 0;
    let mut pairs = Vec::new();

    for rep in ordered {
        if rep.bigword.is_empty() {
            continue;
        }

        let expected = (rep.location as isize + delta).max(0) as usize;
        let site = ceil_char_boundary(&out, expected)
            .and_then(|from| out[from..].find(&rep.bigword).map(|i| from + i))
            .or_else(|| out.find(&rep.bigword));
        let Some(site) = site else {
            log::debug!("'{}' not found any more, skipping", rep.bigword);
            continue;
        };

        if out[site..].starts_with(&rep.replacement) && !rep.bigword.contains(&rep.replacement) {
            log::debug!("'{}' already corrected at {}", rep.word, site);
            continue;
        }

        out.replace_range(site..site + rep.bigword.len(), &rep.replacement);
        delta += rep.replacement.len() as isize - rep.bigword.len() as isize;
        pairs.push(format!("{} => {}", rep.word, rep.replacement));
    }

    ReplaceOutcome {
        text: out,
        applied: pairs.len(),
        summary: pairs.join(", "),
    }
}
