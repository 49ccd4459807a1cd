use super::{DictError, Result};
use crate::checker::candidates::{FrequencyEntry, FrequencyQuery, FrequencySource};
use fst::{Automaton, IntoStreamer, Map, Streamer};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Word occurrence counts backed by FST maps.
///
/// `counts` is keyed by the word as written; `folded` by its lowercase form
/// holding the highest count of any casing.
pub struct FrequencyTable {
    counts: Map<Vec<u8>>,
    folded: Map<Vec<u8>>,
}

impl FrequencyTable {
    /// Build a table from `(word, count)` pairs in any order. Repeated words
    /// keep their highest count.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for (word, count) in entries {
            let slot = counts.entry(word.into()).or_insert(0);
            *slot = (*slot).max(count);
        }
        Self::from_sorted(counts)
    }

    fn from_sorted(counts: BTreeMap<String, u64>) -> Result<Self> {
        let mut folded: BTreeMap<String, u64> = BTreeMap::new();
        for (word, &count) in &counts {
            let slot = folded.entry(word.to_lowercase()).or_insert(0);
            *slot = (*slot).max(count);
        }

        Ok(Self {
            counts: Map::from_iter(counts)?,
            folded: Map::from_iter(folded)?,
        })
    }

    /// Count every word of an iterator, e.g. words collected from pages.
    pub fn count_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for word in words {
            *counts.entry(word.into()).or_insert(0) += 1;
        }
        Self::from_sorted(counts)
    }

    /// Parse `word<whitespace>count` rows. Rows that are not UTF-8 or do not
    /// have exactly two fields with a numeric count are skipped.
    pub fn parse<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut entries = Vec::new();
        let mut skipped = 0usize;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let Ok(line) = std::str::from_utf8(&buf) else {
                skipped += 1;
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(word), Some(count), None) => match count.parse::<u64>() {
                    Ok(count) => entries.push((word.to_string(), count)),
                    Err(_) => skipped += 1,
                },
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} malformed frequency rows", skipped);
        }
        Self::from_entries(entries)
    }

    /// Load a table from a text file, or from an FST map written by
    /// [`FrequencyTable::save`] when the extension is `.fst`.
    pub fn load(path: &Path) -> Result<Self> {
        let table = if path.extension().and_then(|e| e.to_str()) == Some("fst") {
            let bytes = fs::read(path).map_err(|e| DictError::io(path, e))?;
            let map = Map::new(bytes)?;
            let mut counts = BTreeMap::new();
            let mut stream = map.stream();
            while let Some((key, count)) = stream.next() {
                counts.insert(String::from_utf8(key.to_vec())?, count);
            }
            Self::from_sorted(counts)?
        } else {
            let file = File::open(path).map_err(|e| DictError::io(path, e))?;
            Self::parse(BufReader::new(file))?
        };

        log::debug!(
            "Loaded frequency table with {} words from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Write the table as a binary FST map.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.counts.as_fst().as_bytes()).map_err(|e| DictError::io(path, e))
    }

    /// Write the table as sorted `word count` rows.
    pub fn write_text<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        let mut stream = self.counts.stream();
        while let Some((key, count)) = stream.next() {
            writer.write_all(key)?;
            writeln!(writer, " {}", count)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.counts.get(word)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FrequencySource for FrequencyTable {
    fn query(&self, query: &FrequencyQuery) -> Vec<FrequencyEntry> {
        let mut found = Vec::new();
        let mut stream = self
            .counts
            .search(fst::automaton::Str::new(&query.prefix).starts_with())
            .into_stream();

        while let Some((key, occurrence)) = stream.next() {
            let Ok(word) = std::str::from_utf8(key) else {
                continue;
            };
            if query.accepts(word, occurrence) {
                found.push(FrequencyEntry::new(word, occurrence));
            }
        }
        found
    }

    fn max_case_occurrence(&self, word: &str) -> Option<u64> {
        self.folded.get(word.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table() -> FrequencyTable {
        FrequencyTable::from_entries([
            ("Zeitpunkt", 900),
            ("Zeitpunkt", 1200),
            ("zeitpunkt", 3),
            ("Zeitpukt", 4),
            ("Zeitpunkte", 80),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicates_keep_highest_count() {
        let table = table();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get("Zeitpunkt"), Some(1200));
        assert_eq!(table.get("zeitpunkt"), Some(3));
        assert_eq!(table.max_case_occurrence("zeitpunkt"), Some(1200));
        assert_eq!(table.max_case_occurrence("ZEITPUKT"), Some(4));
        assert_eq!(table.max_case_occurrence("nirgends"), None);
    }

    #[test]
    fn test_parse_skips_bad_rows() {
        let mut input = b"Haus 12\nGarten\tseven\nTuer 3 extra\n\n".to_vec();
        input.extend_from_slice(b"Stra\xdfe 5\nBaum 7\n");

        let table = FrequencyTable::parse(&input[..]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Haus"), Some(12));
        assert_eq!(table.get("Baum"), Some(7));
    }

    #[test]
    fn test_query_by_prefix_and_occurrence() {
        let table = table();
        let query = FrequencyQuery::prefix("Zei", 100, 5..=12);
        let mut words: Vec<String> = table.query(&query).into_iter().map(|e| e.word).collect();
        words.sort();
        assert_eq!(words, vec!["Zeitpukt", "Zeitpunkte"]);
    }

    #[test]
    fn test_save_and_load_binary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counts.fst");

        table().save(&path).unwrap();
        let loaded = FrequencyTable::load(&path).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.get("Zeitpukt"), Some(4));
        assert_eq!(loaded.max_case_occurrence("ZEITPUNKT"), Some(1200));
    }

    #[test]
    fn test_write_text() {
        let table = FrequencyTable::count_words(["b", "a", "b"]).unwrap();
        let mut out = Vec::new();
        table.write_text(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a 1\nb 2\n");
    }
}
