use crate::checker::candidates::CandidateOptions;
use crate::checker::rules::{FilterConfig, Language, LexicalFilter};
use crate::checker::CheckSession;
use crate::dict::wordlist;
use crate::parser::ScanLevel;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "wikispell";
const LOCAL_CONFIG: &str = ".wikispell.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub language: Language,
    pub level: ScanLevel,

    /// Word list or `.fst` file, or the name of an installed dictionary.
    pub dictionary: Option<PathBuf>,
    pub common_words: Option<PathBuf>,
    pub filter_words: Option<PathBuf>,
    pub known_words: Option<PathBuf>,
    pub blacklist: Option<PathBuf>,
    pub frequency_table: Option<PathBuf>,

    pub max_suggestions: usize,
    pub remove_dissimilar: bool,

    pub filter: FilterConfig,
    pub candidates: CandidateOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Language::German,
            level: ScanLevel::Relaxed,
            dictionary: None,
            common_words: None,
            filter_words: None,
            known_words: None,
            blacklist: None,
            frequency_table: None,
            max_suggestions: 5,
            remove_dissimilar: true,
            filter: FilterConfig::default(),
            candidates: CandidateOptions::default(),
        }
    }
}

impl Config {
    /// Load configuration with priority: explicit file > local config > global config > defaults.
    /// CLI flags are applied on top by the caller.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                log::debug!("Reading global config {}", global_path.display());
                config = config.merge(Self::from_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG);
        if local_path.exists() {
            log::debug!("Reading local config {}", local_path.display());
            config = config.merge(Self::from_file(&local_path)?);
        }

        if let Some(path) = explicit {
            config = config.merge(Self::from_file(path)?);
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Values of `other` that differ from the defaults override ours.
    fn merge(mut self, other: Self) -> Self {
        let defaults = Self::default();

        if other.language != defaults.language {
            self.language = other.language;
        }
        if other.level != defaults.level {
            self.level = other.level;
        }

        for (mine, theirs) in [
            (&mut self.dictionary, other.dictionary),
            (&mut self.common_words, other.common_words),
            (&mut self.filter_words, other.filter_words),
            (&mut self.known_words, other.known_words),
            (&mut self.blacklist, other.blacklist),
            (&mut self.frequency_table, other.frequency_table),
        ] {
            if theirs.is_some() {
                *mine = theirs;
            }
        }

        if other.max_suggestions != defaults.max_suggestions {
            self.max_suggestions = other.max_suggestions;
        }
        if other.remove_dissimilar != defaults.remove_dissimilar {
            self.remove_dissimilar = other.remove_dissimilar;
        }
        if other.filter != defaults.filter {
            self.filter = other.filter;
        }
        if other.candidates != defaults.candidates {
            self.candidates = other.candidates;
        }
        self
    }

    /// Filter settings with the page language applied.
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            language: self.language,
            ..self.filter.clone()
        }
    }

    /// Build the lexical filter, reading the configured word lists.
    pub fn lexical_filter(&self) -> Result<LexicalFilter> {
        Ok(LexicalFilter::new(self.filter_config())
            .with_common_words(read_set(self.common_words.as_deref())?)
            .with_filter_words(read_set(self.filter_words.as_deref())?))
    }

    /// A session seeded with the configured known words.
    pub fn session(&self) -> Result<CheckSession> {
        let known = read_set(self.known_words.as_deref())?;
        Ok(CheckSession::new().with_known_words(known))
    }

    /// Resolve the dictionary setting to a file: an existing path is used as
    /// is, anything else is looked up among installed dictionaries.
    pub fn dictionary_path(&self) -> Option<PathBuf> {
        let dictionary = self.dictionary.as_ref()?;
        if dictionary.exists() {
            return Some(dictionary.clone());
        }
        let name = dictionary.to_str()?;
        Self::installed_dictionary(name).filter(|p| p.exists())
    }

    pub fn installed_dictionary(name: &str) -> Option<PathBuf> {
        Self::data_dir().map(|dir| dir.join(format!("{}.fst", name)))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().to_path_buf())
    }
}

fn read_set(path: Option<&Path>) -> Result<HashSet<String>> {
    match path {
        Some(path) => wordlist::load_set(path)
            .with_context(|| format!("Failed to read word list: {}", path.display())),
        None => Ok(HashSet::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.language, Language::German);
        assert_eq!(config.level, ScanLevel::Relaxed);
        assert_eq!(config.max_suggestions, 5);
        assert!(config.remove_dissimilar);
        assert_eq!(config.candidates.occurrence_cutoff, 20);
    }

    #[test]
    fn test_merge_configs() {
        let base = Config {
            blacklist: Some(PathBuf::from("global.txt")),
            ..Default::default()
        };
        let override_config = Config {
            language: Language::English,
            level: ScanLevel::Full,
            dictionary: Some(PathBuf::from("en.fst")),
            ..Default::default()
        };

        let merged = base.merge(override_config);
        assert_eq!(merged.language, Language::English);
        assert_eq!(merged.level, ScanLevel::Full);
        assert_eq!(merged.dictionary, Some(PathBuf::from("en.fst")));
        assert_eq!(merged.blacklist, Some(PathBuf::from("global.txt")));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
language = "english"
level = "wiki-skip"
max_suggestions = 3

[filter]
minimal_word_size = 4
stringent = 70

[candidates]
similarity_cutoff = 0.9
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.language, Language::English);
        assert_eq!(config.level, ScanLevel::WikiSkip);
        assert_eq!(config.max_suggestions, 3);
        assert_eq!(config.filter.minimal_word_size, 4);
        assert_eq!(config.filter.multiple_occurrence_tol, 1);
        assert_eq!(config.candidates.similarity_cutoff, 0.9);
        assert_eq!(config.candidates.max_distance, 6);

        assert_eq!(config.filter_config().language, Language::English);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "level = \"everything\"").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_lexical_filter_from_word_lists() {
        let mut common = NamedTempFile::new().unwrap();
        writeln!(common, "haus\ntür").unwrap();

        let config = Config {
            common_words: Some(common.path().to_path_buf()),
            ..Default::default()
        };
        let filter = config.lexical_filter().unwrap();
        assert!(filter.is_common("haus"));
        assert!(filter.should_skip("Haustür", "Die Haustür ist zu.", 4));

        let missing = Config {
            known_words: Some(PathBuf::from("/nonexistent/known.txt")),
            ..Default::default()
        };
        assert!(missing.session().is_err());
    }
}
