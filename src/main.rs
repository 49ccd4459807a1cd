use anyhow::{bail, Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::*;
use env_logger::Builder;
use log::LevelFilter;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use wikispell::checker::candidates::CandidateMatcher;
use wikispell::checker::dictionary::Dictionary;
use wikispell::checker::replace::{apply_replacements, Replacement};
use wikispell::checker::rules::Language;
use wikispell::cli::output::{self, OutputFormat};
use wikispell::dict::{manager, Blacklist, FrequencyTable};
use wikispell::parser::{find_ranges, MarkupScanner};
use wikispell::{
    BlacklistChecker, CheckResult, Config, PageText, ScanLevel, SpellChecker, SpellError,
    WrongWord,
};

/// File extensions picked up when a directory is given.
const PAGE_EXTENSIONS: &[&str] = &["wiki", "mediawiki", "txt"];

#[derive(Parser, Debug)]
#[command(name = "wikispell")]
#[command(version, about = "A spell checker for MediaWiki pages", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Exit with code 0 even if errors are found
    #[arg(long, global = true)]
    no_fail: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Configuration file, applied over the global and local ones
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Flag known misspellings from a blacklist
    Blacklist {
        /// Pages or directories to check
        #[arg(value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Blacklist file with `wrong;correct` lines
        #[arg(short, long)]
        blacklist: Option<PathBuf>,

        /// Extra entry as `wrong;correct`
        #[arg(long = "word", value_name = "WRONG;CORRECT")]
        words: Vec<String>,

        /// Markup scan level (none, relaxed, wiki-skip, full)
        #[arg(long)]
        level: Option<ScanLevel>,

        /// Print the blacklist and exit
        #[arg(long)]
        list: bool,

        /// Write the merged blacklist to this file
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,

        /// Replace flagged words in place
        #[arg(short, long)]
        fix: bool,
    },

    /// Check pages against a dictionary
    Check {
        /// Pages or directories to check
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Word list, `.fst` file or installed dictionary name
        #[arg(short, long)]
        dictionary: Option<PathBuf>,

        /// Common words used to split composites
        #[arg(long)]
        common_words: Option<PathBuf>,

        /// Words that are always accepted
        #[arg(long)]
        known_words: Option<PathBuf>,

        /// Page language (de, en)
        #[arg(short, long)]
        language: Option<Language>,

        /// Markup scan level (none, relaxed, wiki-skip, full)
        #[arg(long)]
        level: Option<ScanLevel>,

        /// Report unknown words without looking for corrections
        #[arg(long)]
        no_suggestions: bool,

        /// Replace flagged words with their best suggestion in place
        #[arg(short, long)]
        fix: bool,
    },

    /// Find rare words in a frequency table that look like misspellings
    Candidates {
        /// Correctly spelled target words
        #[arg(value_name = "WORDS", required = true)]
        words: Vec<String>,

        /// Frequency table (`word count` rows or `.fst` map)
        #[arg(short, long)]
        frequency: Option<PathBuf>,

        /// Dictionary whose words are never candidates
        #[arg(short, long)]
        dictionary: Option<PathBuf>,

        /// Candidates must occur less often than this
        #[arg(long)]
        occurrence_cutoff: Option<u64>,

        /// Candidates must be more similar than this ratio
        #[arg(long)]
        similarity: Option<f64>,

        /// Candidates must be closer than this edit distance
        #[arg(long)]
        max_distance: Option<usize>,

        /// Keep candidates that only differ in an adjective ending
        #[arg(long)]
        no_suffix_filter: bool,

        /// Add the candidates as `candidate;word` entries to this blacklist
        #[arg(long, value_name = "FILE")]
        append_to: Option<PathBuf>,
    },

    /// Show the spans of a page that are excluded from checking
    Ranges {
        /// Page to scan
        file: PathBuf,

        /// Markup scan level (none, relaxed, wiki-skip, full)
        #[arg(long)]
        level: Option<ScanLevel>,

        /// Show spans as detected, without de-nesting or merging
        #[arg(long)]
        raw: bool,
    },

    /// Count checkable words of pages into a frequency table
    Count {
        /// Pages or directories to read
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Output file; `.fst` writes a binary map, stdout if omitted
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Markup scan level (none, relaxed, wiki-skip, full)
        #[arg(long)]
        level: Option<ScanLevel>,
    },

    /// Dictionary management
    Dict {
        #[command(subcommand)]
        action: DictCommands,
    },
}

#[derive(Subcommand, Debug)]
enum DictCommands {
    /// Build an FST dictionary from a word list
    Build {
        input: PathBuf,
        output: PathBuf,
    },
    /// Build a dictionary into the data directory
    Install {
        input: PathBuf,
        /// Name to refer to it by, e.g. `de`
        name: String,
    },
    /// List installed dictionaries
    List,
    /// Show dictionary info
    Info {
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(true) => std::process::exit(1),
        Ok(false) => {}
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(2);
        }
    }
}

fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

/// Run the command line; returns true when findings should fail the run.
fn run(cli: Cli) -> Result<bool> {
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "wikispell", &mut io::stdout());
        return Ok(false);
    }

    let Some(command) = cli.command else {
        bail!("No command given. Use --help for usage information.");
    };

    let mut config = Config::load(cli.config.as_deref())?;
    let ctx = RunContext {
        colored: !cli.no_color,
        format: cli.format,
    };

    let findings = match command {
        Commands::Blacklist {
            files,
            blacklist,
            words,
            level,
            list,
            save,
            fix,
        } => {
            let mut entries = match blacklist.or(config.blacklist.take()) {
                Some(path) => Blacklist::load(&path)
                    .with_context(|| format!("Failed to load blacklist: {}", path.display()))?,
                None => Blacklist::new(),
            };
            for entry in &words {
                let Some((wrong, correct)) = entry.split_once(';') else {
                    bail!("Invalid blacklist entry '{}', expected WRONG;CORRECT", entry);
                };
                entries.insert(wrong.trim(), correct.trim());
            }

            if let Some(path) = save {
                entries.save(&path)
                    .with_context(|| format!("Failed to write blacklist: {}", path.display()))?;
                log::info!("Saved {} blacklist entries to {}", entries.len(), path.display());
            }
            if list {
                for (wrong, correct) in entries.iter() {
                    println!("{};{}", wrong, correct);
                }
                return Ok(false);
            }
            if entries.is_empty() {
                bail!("The blacklist is empty. Pass --blacklist or --word.");
            }
            if files.is_empty() {
                bail!("No files specified. Use --help for usage information.");
            }

            let checker = BlacklistChecker::new(level.unwrap_or(config.level));
            run_pages(&files, fix, &ctx, |page| Ok(checker.check(page, &entries)))?
        }

        Commands::Check {
            files,
            dictionary,
            common_words,
            known_words,
            language,
            level,
            no_suggestions,
            fix,
        } => {
            if let Some(language) = language {
                config.language = language;
            }
            if let Some(level) = level {
                config.level = level;
            }
            config.dictionary = dictionary.or(config.dictionary);
            config.common_words = common_words.or(config.common_words);
            config.known_words = known_words.or(config.known_words);

            let dictionary = load_dictionary(&config)?
                .context("No dictionary configured. Pass --dictionary or set it in the config.")?
                .with_max_suggestions(config.max_suggestions);
            let session = config.session()?;
            let checker = SpellChecker::new(&dictionary, config.lexical_filter()?)
                .with_level(config.level)
                .with_remove_dissimilar(config.remove_dissimilar)
                .with_suggestions(!no_suggestions);

            run_pages(&files, fix, &ctx, |page| Ok(checker.check(page, &session)))?
        }

        Commands::Candidates {
            words,
            frequency,
            dictionary,
            occurrence_cutoff,
            similarity,
            max_distance,
            no_suffix_filter,
            append_to,
        } => {
            let Some(path) = frequency.or(config.frequency_table.take()) else {
                bail!("No frequency table configured. Pass --frequency or set it in the config.");
            };
            let table = FrequencyTable::load(&path)
                .with_context(|| format!("Failed to load frequency table: {}", path.display()))?;

            config.dictionary = dictionary.or(config.dictionary);
            let oracle = load_dictionary(&config)?;

            let mut options = config.candidates.clone();
            if let Some(cutoff) = occurrence_cutoff {
                options.occurrence_cutoff = cutoff;
            }
            if let Some(similarity) = similarity {
                options.similarity_cutoff = similarity;
            }
            if let Some(distance) = max_distance {
                options.max_distance = distance;
            }
            if no_suffix_filter {
                options.suffix_filter = false;
            }

            let mut matcher = CandidateMatcher::new(&table).with_options(options);
            if let Some(oracle) = &oracle {
                matcher = matcher.with_oracle(oracle);
            }

            let mut found = Vec::new();
            for word in &words {
                let candidates = matcher.find(word);
                output::print_candidates(word, &candidates, ctx.colored, &ctx.format);
                found.extend(candidates.into_iter().map(|c| (c, word.clone())));
            }

            if let Some(path) = append_to {
                let mut blacklist = if path.exists() {
                    Blacklist::load(&path)
                        .with_context(|| format!("Failed to load blacklist: {}", path.display()))?
                } else {
                    Blacklist::new()
                };
                for (candidate, word) in &found {
                    blacklist.insert(candidate, word);
                }
                blacklist.save(&path)
                    .with_context(|| format!("Failed to write blacklist: {}", path.display()))?;
                log::info!("Added {} entries to {}", found.len(), path.display());
            }
            false
        }

        Commands::Ranges { file, level, raw } => {
            let page = PageText::from_path(&file)?;
            let scanner = MarkupScanner::new(level.unwrap_or(config.level));
            let spans = if raw {
                scanner.raw().spans(&page.text)
            } else {
                scanner.scan(&page.text).spans().to_vec()
            };

            let mut unmatched = Vec::new();
            for (open, close) in [("{{", "}}"), ("[[", "]]"), ("{|", "|}")] {
                let result = find_ranges(open, close, &page.text);
                if !result.fully_matched {
                    unmatched.push((open, result.unmatched));
                }
            }

            let label = file.display().to_string();
            output::print_ranges(&label, &page, &spans, &unmatched, ctx.colored, &ctx.format);
            false
        }

        Commands::Count {
            files,
            output,
            level,
        } => {
            let checker = BlacklistChecker::new(level.unwrap_or(config.level));
            let pages = collect_pages(&files)?;
            let words = pages
                .par_iter()
                .map(|path| Ok(checker.collect_words(&PageText::from_path(path)?)))
                .collect::<Result<Vec<_>>>()?;

            let table = FrequencyTable::count_words(words.into_iter().flatten())?;
            log::info!("Counted {} distinct words in {} pages", table.len(), pages.len());

            match output {
                Some(path) if path.extension().and_then(|e| e.to_str()) == Some("fst") => {
                    table.save(&path)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                }
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    table.write_text(BufWriter::new(file))?;
                }
                None => table.write_text(io::stdout().lock())?,
            }
            false
        }

        Commands::Dict { action } => {
            match action {
                DictCommands::Build { input, output } => {
                    let count = manager::build_dictionary(&input, &output)?;
                    println!(
                        "{} Built {} with {} words",
                        "✓".green().bold(),
                        output.display(),
                        count.to_string().yellow()
                    );
                }
                DictCommands::Install { input, name } => {
                    manager::install_dictionary(&input, &name)?;
                }
                DictCommands::List => manager::list_dictionaries()?,
                DictCommands::Info { name } => manager::show_info(&name)?,
            }
            false
        }
    };

    Ok(findings && !cli.no_fail)
}

struct RunContext {
    colored: bool,
    format: OutputFormat,
}

/// A checked page with its findings, and the rewritten text in fix mode.
struct PageReport {
    path: PathBuf,
    result: CheckResult,
    fixed: Option<(String, String)>,
}

/// Check every page in parallel, then report in input order. Returns true if
/// anything was flagged and left unfixed.
fn run_pages<F>(files: &[PathBuf], fix: bool, ctx: &RunContext, check: F) -> Result<bool>
where
    F: Fn(&PageText) -> Result<Vec<WrongWord>> + Sync,
{
    let pages = collect_pages(files)?;
    if pages.is_empty() {
        bail!("No pages found in the given paths.");
    }

    let reports = pages
        .par_iter()
        .map(|path| check_page(path, fix, &check))
        .collect::<Result<Vec<_>>>()?;

    let mut total_errors = 0;
    let mut total_fixed = 0;
    for report in &reports {
        let label = report.path.display().to_string();
        total_errors += report.result.error_count;
        total_fixed += report.result.fixed_count;

        if let Some((text, summary)) = &report.fixed {
            fs::write(&report.path, text)
                .with_context(|| format!("Failed to write page: {}", label))?;
            output::print_fix_summary(&label, summary, ctx.colored);
        } else {
            output::print_errors(&label, &report.result, ctx.colored, &ctx.format);
        }
    }

    if ctx.format == OutputFormat::Text {
        if fix {
            output::print_total_fixed(total_fixed, reports.len(), ctx.colored);
        } else {
            output::print_check_summary(total_errors, reports.len(), ctx.colored);
        }
    }

    Ok(total_errors > 0 && !fix)
}

fn check_page<F>(path: &Path, fix: bool, check: &F) -> Result<PageReport>
where
    F: Fn(&PageText) -> Result<Vec<WrongWord>>,
{
    let page = PageText::from_path(path)?;
    let wrong = check(&page)?;
    let mut result = CheckResult::from_errors(wrong.iter().map(|w| SpellError::new(&page, w)).collect());

    let mut fixed = None;
    if fix {
        let replacements: Vec<Replacement> = wrong.iter().filter_map(Replacement::from_wrong_word).collect();
        let outcome = apply_replacements(&page.text, &replacements);
        if outcome.applied > 0 {
            log::info!("{}: {}", path.display(), outcome.summary);
            result.fixed_count = outcome.applied;
            fixed = Some((outcome.text, outcome.summary));
        }
    }

    Ok(PageReport {
        path: path.to_path_buf(),
        result,
        fixed,
    })
}

/// Expand directories into the page files below them, sorted by path.
fn collect_pages(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for path in files {
        if !path.exists() {
            bail!("File not found: {}", path.display());
        }
        if path.is_file() {
            pages.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| PAGE_EXTENSIONS.contains(&e))
            })
            .collect();
        found.sort();
        log::debug!("Found {} pages in {}", found.len(), path.display());
        pages.extend(found);
    }
    Ok(pages)
}

fn load_dictionary(config: &Config) -> Result<Option<Dictionary>> {
    let Some(name) = &config.dictionary else {
        return Ok(None);
    };
    let path = config
        .dictionary_path()
        .with_context(|| format!("Dictionary not found: {}", name.display()))?;
    let dictionary = Dictionary::load(&path)
        .with_context(|| format!("Failed to load dictionary: {}", path.display()))?;
    Ok(Some(dictionary))
}
