use crate::parser::{PageText, Span};
use crate::CheckResult;
use colored::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonError<'a> {
    page: &'a str,
    line: usize,
    column: usize,
    word: &'a str,
    correct: &'a str,
    suggestions: &'a [String],
    context: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    page: &'a str,
    total_errors: usize,
    fixed: usize,
    errors: Vec<JsonError<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonSpan<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonRanges<'a> {
    page: &'a str,
    spans: Vec<JsonSpan<'a>>,
    unmatched: Vec<JsonUnmatched<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonUnmatched<'a> {
    marker: &'a str,
    positions: &'a [usize],
}

#[derive(Debug, Serialize)]
struct JsonCandidates<'a> {
    word: &'a str,
    candidates: &'a [String],
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize output: {}", e),
    }
}

pub fn print_errors(page: &str, result: &CheckResult, colored_output: bool, format: &OutputFormat) {
    match format {
        OutputFormat::Text => print_text_errors(page, result, colored_output),
        OutputFormat::Json => print_json_errors(page, result),
    }
}

fn print_text_errors(page: &str, result: &CheckResult, colored_output: bool) {
    if result.errors.is_empty() {
        return;
    }

    if colored_output {
        println!("\n{}", page.bold().underline());
    } else {
        println!("\n{}", page);
    }

    for error in &result.errors {
        let line_info = format!("{}:{}", error.line, error.column);

        if colored_output {
            let correction = if error.correct.is_empty() {
                String::new()
            } else {
                format!("{} {}", "=>".dimmed(), error.correct.green().bold())
            };
            println!(
                "  {} {} {} {}",
                line_info.blue().bold(),
                error.word.red().bold(),
                correction,
                format_context(&error.context, &error.word, colored_output)
            );

            if error.suggestions.len() > 1 {
                let suggestions = error
                    .suggestions
                    .iter()
                    .map(|s| s.green().to_string())
                    .collect::<Vec<_>>()
                    .join(&", ".dimmed().to_string());
                println!("    {} {}", "→".dimmed(), suggestions);
            }
        } else {
            let correction = if error.correct.is_empty() {
                String::new()
            } else {
                format!("=> {}", error.correct)
            };
            println!("  {} {} {} {}", line_info, error.word, correction, &error.context);

            if error.suggestions.len() > 1 {
                println!("    → {}", error.suggestions.join(", "));
            }
        }
    }
}

fn print_json_errors(page: &str, result: &CheckResult) {
    let errors = result
        .errors
        .iter()
        .map(|e| JsonError {
            page,
            line: e.line,
            column: e.column,
            word: &e.word,
            correct: &e.correct,
            suggestions: &e.suggestions,
            context: &e.context,
        })
        .collect();

    print_json(&JsonOutput {
        page,
        total_errors: result.error_count,
        fixed: result.fixed_count,
        errors,
    });
}

fn format_context(context: &str, word: &str, colored: bool) -> String {
    if colored {
        context.replace(word, &word.red().bold().to_string())
    } else {
        context.to_string()
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

pub fn print_check_summary(total_errors: usize, pages: usize, colored: bool) {
    println!();
    if total_errors == 0 {
        if colored {
            println!("{}", "✓ No spelling errors found!".green().bold());
        } else {
            println!("✓ No spelling errors found!");
        }
        return;
    }

    let error_word = plural(total_errors, "error", "errors");
    let page_word = plural(pages, "page", "pages");
    if colored {
        println!(
            "{} {} {} found in {} {}",
            "✗".red().bold(),
            total_errors.to_string().red().bold(),
            error_word,
            pages,
            page_word
        );
    } else {
        println!("✗ {} {} found in {} {}", total_errors, error_word, pages, page_word);
    }
}

pub fn print_fix_summary(page: &str, summary: &str, colored: bool) {
    if summary.is_empty() {
        return;
    }
    if colored {
        println!("{} {}: {}", "✓".green().bold(), page.bold(), summary);
    } else {
        println!("✓ {}: {}", page, summary);
    }
}

pub fn print_total_fixed(total_fixed: usize, pages: usize, colored: bool) {
    println!();
    if total_fixed == 0 {
        if colored {
            println!("{}", "No corrections needed!".green().bold());
        } else {
            println!("No corrections needed!");
        }
        return;
    }

    let fix_word = plural(total_fixed, "correction", "corrections");
    let page_word = plural(pages, "page", "pages");
    if colored {
        println!(
            "{} {} {} applied to {} {}",
            "✓".green().bold(),
            total_fixed.to_string().green().bold(),
            fix_word,
            pages,
            page_word
        );
    } else {
        println!("✓ {} {} applied to {} {}", total_fixed, fix_word, pages, page_word);
    }
}

fn snippet<'t>(page: &'t PageText, span: &Span) -> &'t str {
    page.text.get(span.start..span.end).unwrap_or("")
}

/// Excluded spans of a page, with the markers that were left unbalanced.
pub fn print_ranges(
    label: &str,
    page: &PageText,
    spans: &[Span],
    unmatched: &[(&str, Vec<usize>)],
    colored: bool,
    format: &OutputFormat,
) {
    if *format == OutputFormat::Json {
        print_json(&JsonRanges {
            page: label,
            spans: spans
                .iter()
                .map(|span| JsonSpan {
                    start: span.start,
                    end: span.end,
                    text: snippet(page, span),
                })
                .collect(),
            unmatched: unmatched
                .iter()
                .map(|(marker, positions)| JsonUnmatched {
                    marker,
                    positions,
                })
                .collect(),
        });
        return;
    }

    if colored {
        println!("{}", label.bold().underline());
    } else {
        println!("{}", label);
    }
    for span in spans {
        let bounds = format!("{}..{}", span.start, span.end);
        let text = snippet(page, span).replace('\n', "⏎");
        if colored {
            println!("  {} {}", bounds.blue().bold(), text.dimmed());
        } else {
            println!("  {} {}", bounds, text);
        }
    }

    for (marker, positions) in unmatched {
        for &position in positions {
            let (line, column) = page.line_col(position);
            let message = format!("unbalanced {} at {}:{}", marker, line, column);
            if colored {
                println!("  {} {}", "!".yellow().bold(), message.yellow());
            } else {
                println!("  ! {}", message);
            }
        }
    }
}

/// Candidates as `candidate;word` blacklist lines in plain text.
pub fn print_candidates(word: &str, candidates: &[String], colored: bool, format: &OutputFormat) {
    if *format == OutputFormat::Json {
        print_json(&JsonCandidates { word, candidates });
        return;
    }

    if candidates.is_empty() {
        if colored {
            println!("{} {}", "No candidates for".yellow(), word.bold());
        } else {
            println!("No candidates for {}", word);
        }
        return;
    }

    for candidate in candidates {
        if colored {
            println!("{} {} {}", candidate.red(), "=>".dimmed(), word.green().bold());
        } else {
            println!("{};{}", candidate, word);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_format_context_plain() {
        assert_eq!(format_context("ein Fehlr hier", "Fehlr", false), "ein Fehlr hier");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "page", "pages"), "page");
        assert_eq!(plural(0, "page", "pages"), "pages");
    }
}
