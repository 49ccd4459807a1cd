use crate::checker::dictionary::Dictionary;
use crate::config::Config;
use crate::dict::wordlist;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

pub struct DictionaryInfo {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Installed `.fst` dictionaries in `dir`, sorted by name.
pub fn installed_in(dir: &Path) -> Result<Vec<DictionaryInfo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("fst") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        found.push(DictionaryInfo {
            name: name.to_string(),
            size_bytes: fs::metadata(&path)?.len(),
            path,
        });
    }
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found)
}

pub fn list_dictionaries() -> Result<()> {
    let data_dir = Config::data_dir().context("Failed to get data directory")?;
    let installed = installed_in(&data_dir)?;

    if installed.is_empty() {
        println!("{}", "No dictionaries installed.".yellow());
        println!(
            "Run {} to install one from a word list.",
            "wikispell dict install <WORDLIST> <NAME>".cyan()
        );
        return Ok(());
    }

    println!("{}", "Installed dictionaries:".bold());
    println!();
    for info in installed {
        println!(
            "  {} {} ({})",
            "✓".green(),
            info.name.cyan().bold(),
            format!("{}KB", info.size_bytes / 1024).dimmed()
        );
    }
    println!();
    println!("Data directory: {}", data_dir.display().to_string().dimmed());

    Ok(())
}

/// Build an FST dictionary from a word list.
pub fn build_dictionary(input: &Path, output: &Path) -> Result<usize> {
    let words = wordlist::load(input)
        .with_context(|| format!("Failed to read word list: {}", input.display()))?;
    let count = Dictionary::build_from_words(&words, output)
        .with_context(|| format!("Failed to build dictionary: {}", output.display()))?;
    Ok(count)
}

/// Build a dictionary from a word list into the data directory under `name`.
pub fn install_dictionary(input: &Path, name: &str) -> Result<PathBuf> {
    let data_dir = Config::data_dir().context("Failed to get data directory")?;
    fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

    let dict_path = data_dir.join(format!("{}.fst", name));
    let count = build_dictionary(input, &dict_path)?;

    println!(
        "{} Dictionary {} installed with {} words: {}",
        "✓".green().bold(),
        name.cyan(),
        count.to_string().yellow(),
        dict_path.display().to_string().dimmed()
    );
    Ok(dict_path)
}

pub fn show_info(name: &str) -> Result<()> {
    let dict_path = Config::installed_dictionary(name).context("Failed to get data directory")?;

    if !dict_path.exists() {
        println!("{} Dictionary {} not found.", "✗".red().bold(), name.yellow());
        return Ok(());
    }

    let metadata = fs::metadata(&dict_path)?;
    println!("{}", format!("Dictionary: {}", name).bold());
    println!("  Path: {}", dict_path.display());
    println!("  Size: {} KB", metadata.len() / 1024);
    println!("  Format: FST (Finite State Transducer)");

    match Dictionary::load_from_path(&dict_path) {
        Ok(dict) => println!("  Words: {}", dict.len().to_string().yellow()),
        Err(e) => println!("  {}: {}", "Error loading dictionary".red(), e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_build_and_list() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("words.txt");
        fs::write(&list, "Haus\nGarten\n# comment\nhaus\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a dictionary").unwrap();

        let count = build_dictionary(&list, &dir.path().join("de.fst")).unwrap();
        assert_eq!(count, 2);

        let installed = installed_in(dir.path()).unwrap();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].name, "de");
        assert!(installed[0].size_bytes > 0);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        assert!(installed_in(Path::new("/nonexistent/wikispell")).unwrap().is_empty());
    }
}
