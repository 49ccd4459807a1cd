use super::{DictError, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Known misspellings mapped to their correction.
///
/// Keys are stored lowercase so lookups are case-insensitive; corrections are
/// kept as written. The map is ordered, which makes written files sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    entries: BTreeMap<String, String>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `wrong;correct` lines. Lines without a separator or with an empty
    /// wrong word are skipped with a warning.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut blacklist = Self::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }

            match line.split_once(';') {
                Some((wrong, correct)) if !wrong.trim().is_empty() => {
                    blacklist.insert(wrong.trim(), correct.trim());
                }
                _ => log::warn!("Skipping malformed blacklist line {}: {:?}", number + 1, line),
            }
        }
        Ok(blacklist)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| DictError::io(path, e))?;
        let blacklist = Self::parse(BufReader::new(file))?;
        log::debug!(
            "Loaded {} blacklist entries from {}",
            blacklist.len(),
            path.display()
        );
        Ok(blacklist)
    }

    /// Write all entries as sorted `wrong;correct` lines.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for (wrong, correct) in &self.entries {
            writeln!(writer, "{};{}", wrong, correct)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| DictError::io(path, e))?;
        self.write_to(BufWriter::new(file))
    }

    pub fn insert(&mut self, wrong: &str, correct: &str) {
        self.entries
            .insert(wrong.to_lowercase(), correct.to_string());
    }

    /// Correction for `word`, matched case-insensitively.
    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries.get(&word.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Blacklist {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut blacklist = Blacklist::new();
        for (wrong, correct) in iter {
            blacklist.insert(wrong, correct);
        }
        blacklist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_lowercases_keys() {
        let input = "Mistake;mistake\r\nwasington;Washington\n\nbroken line\n;empty\n";
        let blacklist = Blacklist::parse(input.as_bytes()).unwrap();

        assert_eq!(blacklist.len(), 2);
        assert_eq!(blacklist.get("mistake"), Some("mistake"));
        assert_eq!(blacklist.get("MISTAKE"), Some("mistake"));
        assert_eq!(blacklist.get("Wasington"), Some("Washington"));
        assert_eq!(blacklist.get("broken line"), None);
    }

    #[test]
    fn test_save_writes_sorted_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blacklist.txt");

        let blacklist: Blacklist = [("zeitpunkt", "Zeitpunkt"), ("Aber", "aber")]
            .into_iter()
            .collect();
        blacklist.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "aber;aber\nzeitpunkt;Zeitpunkt\n");

        let reloaded = Blacklist::load(&path).unwrap();
        assert_eq!(reloaded, blacklist);
    }
}
