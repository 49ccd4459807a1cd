use crate::checker::{suggestions, SpellOracle};
use crate::dict::{self, wordlist, DictError};
use fst::{Automaton, IntoStreamer, Set, SetBuilder, Streamer};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Suggestions returned per unknown word when used as an oracle.
const ORACLE_SUGGESTIONS: usize = 5;

/// Lowercase word set stored as an FST.
pub struct Dictionary {
    set: Set<Vec<u8>>,
    max_suggestions: usize,
}

impl Dictionary {
    /// Build an in-memory dictionary. Words are trimmed and lowercased; blank
    /// lines and `#` comments are ignored.
    pub fn from_words<I, S>(words: I) -> dict::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sorted: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty() && !w.starts_with('#'))
            .collect();

        Ok(Self::from_set(Set::from_iter(sorted)?))
    }

    /// Load a prebuilt `.fst` file, or build from a flat word list otherwise.
    pub fn load(path: &Path) -> dict::Result<Self> {
        let dict = if path.extension().and_then(|e| e.to_str()) == Some("fst") {
            Self::load_from_path(path)?
        } else {
            Self::from_words(wordlist::load(path)?)?
        };
        log::debug!("Loaded dictionary with {} words from {}", dict.len(), path.display());
        Ok(dict)
    }

    /// Load a dictionary written by [`Dictionary::build_from_words`].
    pub fn load_from_path(path: &Path) -> dict::Result<Self> {
        let bytes = fs::read(path).map_err(|e| DictError::io(path, e))?;
        Ok(Self::from_set(Set::new(bytes)?))
    }

    fn from_set(set: Set<Vec<u8>>) -> Self {
        Self {
            set,
            max_suggestions: ORACLE_SUGGESTIONS,
        }
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    /// Check if word exists in dictionary
    pub fn contains(&self, word: &str) -> bool {
        self.set.contains(word.as_bytes())
    }

    /// Get all words with a given prefix
    pub fn words_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut results = Vec::new();
        let mut stream = self
            .set
            .search(fst::automaton::Str::new(prefix).starts_with())
            .into_stream();

        while let Some(key) = stream.next() {
            if let Ok(word) = String::from_utf8(key.to_vec()) {
                results.push(word);
            }
        }

        results
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Write a word list as an FST file, lowercased, sorted and deduplicated.
    pub fn build_from_words(words: &[String], output_path: &Path) -> dict::Result<usize> {
        let sorted: BTreeSet<String> = words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let file = File::create(output_path).map_err(|e| DictError::io(output_path, e))?;
        let mut builder = SetBuilder::new(BufWriter::new(file))?;
        for word in &sorted {
            builder.insert(word)?;
        }
        builder.finish()?;

        log::info!("Wrote {} words to {}", sorted.len(), output_path.display());
        Ok(sorted.len())
    }
}

impl SpellOracle for Dictionary {
    fn accepts(&self, word: &str) -> bool {
        self.contains(word) || self.contains(&word.to_lowercase())
    }

    fn suggest(&self, word: &str) -> Vec<String> {
        suggestions::generate(word, self, self.max_suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_build_and_load_dictionary() {
        let dir = tempdir().unwrap();
        let dict_path = dir.path().join("test.fst");

        let words = vec![
            "hello".to_string(),
            "World".to_string(),
            "test".to_string(),
            "hello".to_string(),
        ];

        assert_eq!(Dictionary::build_from_words(&words, &dict_path).unwrap(), 3);

        let dict = Dictionary::load(&dict_path).unwrap();
        assert_eq!(dict.len(), 3);
        assert!(dict.contains("hello"));
        assert!(dict.contains("world"));
        assert!(!dict.contains("notfound"));
    }

    #[test]
    fn test_load_word_list() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# Wörter\nHaus\nGarten\n\nhaustür").unwrap();

        let dict = Dictionary::load(file.path()).unwrap();
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.words_with_prefix("haus"), vec!["haus", "haustür"]);
    }

    #[test]
    fn test_oracle_is_case_insensitive() {
        let dict = Dictionary::from_words(["Haus", "garten"]).unwrap();
        assert!(dict.accepts("Haus"));
        assert!(dict.accepts("GARTEN"));
        assert!(!dict.accepts("Hause"));
        assert_eq!(dict.suggest("Hause"), vec!["Haus"]);
    }

    #[test]
    fn test_invalid_fst_file() {
        let mut file = tempfile::Builder::new().suffix(".fst").tempfile().unwrap();
        file.write_all(b"not an fst").unwrap();
        assert!(matches!(
            Dictionary::load(file.path()),
            Err(DictError::Fst(_))
        ));
    }
}
