use super::{DictError, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse a flat word list: one word per line, `#` comments and blank lines
/// ignored. Words are trimmed and lowercased; duplicates are kept.
pub fn parse<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut words = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let word = line.trim();
        if word.is_empty() || word.starts_with('#') {
            continue;
        }
        words.push(word.to_lowercase());
    }
    Ok(words)
}

/// Read a word list from disk.
pub fn load(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| DictError::io(path, e))?;
    let words = parse(BufReader::new(file))?;
    log::debug!("Read {} words from {}", words.len(), path.display());
    Ok(words)
}

/// Read a word list into a set, e.g. for the common-word list.
pub fn load_set(path: &Path) -> Result<HashSet<String>> {
    Ok(load(path)?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let input = "# common words\nHaus\n\n  Tür  \n#ignored\nhaus\n";
        let words = parse(input.as_bytes()).unwrap();
        assert_eq!(words, vec!["haus", "tür", "haus"]);
    }

    #[test]
    fn test_load_set() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Wohnung\nzimmer\nWohnung").unwrap();

        let set = load_set(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("wohnung"));
        assert!(set.contains("zimmer"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load(Path::new("/nonexistent/words.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/words.txt"));
    }
}
