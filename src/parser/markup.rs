use crate::parser::{denest, merge, RangeMatcher, RangeSet, ScanLevel, Span};
use lazy_static::lazy_static;
use regex::Regex;

/// Tags whose whole content is never checked.
const SKIPPED_TAGS: &[&str] = &[
    "nowiki",
    "math",
    "pre",
    "gallery",
    "source",
    "blockquote",
    "code",
    "sub",
    "imagemap",
    "poem",
    "syntaxhighlight",
];

/// Terminators that end a runaway quotation or emphasis.
const ALT_BREAKS: &[&str] = &["</ref", "\n", "}}"];
const QUOTE_BREAKS: &[&str] = &["</ref", "\n", "}}", "\"", "'", "\u{201d}", "\u{201c}"];

/// Characters widened around a `<!-- sic -->` comment.
const SIC_MARGIN: usize = 50;

lazy_static! {
    static ref MATH_BLOCK: Regex = Regex::new(r"(?s)<\s*math>.*?<\s*/math\s*>").unwrap();
    static ref NOWIKI_BLOCK: Regex = Regex::new(r"(?s)<\s*nowiki>.*?<\s*/nowiki\s*>").unwrap();
    static ref COMMENT_BLOCK: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref TAG_BLOCKS: Vec<Regex> = SKIPPED_TAGS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?s)<\s*{}.*?>.*?<\s*/{}\s*>", tag, tag)).unwrap())
        .collect();
    static ref REF_SELF_CLOSING: Regex = Regex::new(r"(?s)<ref\s+[^>]*\s*/>").unwrap();
    static ref REF_OPEN: Regex = Regex::new(r"<ref[^/>^]*>").unwrap();
    static ref REF_CLOSE: Regex = Regex::new(r"</ref\s*>").unwrap();
    static ref TRAILING_SECTION: Regex = Regex::new(
        r"(?i)==\s*(weblinks|quellen|einzelnachweise|references|further reading|external links)\s*=="
    )
    .unwrap();
    static ref CATEGORY_LINK: Regex = Regex::new(r"\[\[(Kategorie|Category):").unwrap();
}

/// Collects the spans of a page that hold markup rather than prose.
#[derive(Debug, Clone, Copy)]
pub struct MarkupScanner {
    level: ScanLevel,
    denest: bool,
    merge: bool,
}

impl MarkupScanner {
    pub fn new(level: ScanLevel) -> Self {
        Self {
            level,
            denest: true,
            merge: true,
        }
    }

    /// Return detector output as found, without de-nesting or merging.
    pub fn raw(mut self) -> Self {
        self.denest = false;
        self.merge = false;
        self
    }

    pub fn with_denest(mut self, denest: bool) -> Self {
        self.denest = denest;
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    pub fn level(&self) -> ScanLevel {
        self.level
    }

    pub fn scan(&self, text: &str) -> RangeSet {
        let mut spans = self.spans(text);
        if self.denest {
            spans = denest(spans);
        }
        if self.merge {
            spans = merge(spans);
        }
        RangeSet::new(spans)
    }

    /// All detector hits in detector order.
    pub fn spans(&self, text: &str) -> Vec<Span> {
        if self.level == ScanLevel::None {
            return Vec::new();
        }

        let mut spans = Vec::new();
        let ignore = ignored_blocks(text);

        for (open, close) in [("{{", "}}"), ("[[", "]]"), ("{|", "|}")] {
            spans.extend(RangeMatcher::new(open, close).ignoring(&ignore).find(text).spans);
        }
        spans.extend(RangeMatcher::new("<!--", "-->").find(text).spans);

        spans.extend(quotation_spans(text));

        for marker in ["''", "'''"] {
            spans.extend(
                RangeMatcher::new(marker, marker)
                    .with_alt_breaks(ALT_BREAKS)
                    .find(text)
                    .spans,
            );
        }

        spans.extend(hyperlink_spans(text));
        spans.extend(tag_spans(text));
        spans.extend(sic_comment_spans(text));

        if self.level >= ScanLevel::WikiSkip {
            spans.extend(reference_spans(text));
        }

        if self.level == ScanLevel::Full {
            spans.extend(list_spans(text));
            spans.extend(trailing_spans(text));
        }

        log::trace!(
            "Found {} excluded spans at level {} in {} bytes",
            spans.len(),
            self.level,
            text.len()
        );

        spans
    }
}

impl Default for MarkupScanner {
    fn default() -> Self {
        Self::new(ScanLevel::default())
    }
}

/// Normalized excluded spans of `text` at the given level.
pub fn excluded_ranges(text: &str, level: ScanLevel) -> RangeSet {
    MarkupScanner::new(level).scan(text)
}

/// Blocks whose content never opens or closes a template, link or table.
fn ignored_blocks(text: &str) -> RangeSet {
    [&*MATH_BLOCK, &*NOWIKI_BLOCK, &*COMMENT_BLOCK]
        .into_iter()
        .flat_map(|re| regex_spans(re, text))
        .collect()
}

fn regex_spans<'t>(re: &'t Regex, text: &'t str) -> impl Iterator<Item = Span> + 't {
    re.find_iter(text).map(|m| Span::new(m.start(), m.end()))
}

fn quotation_spans(text: &str) -> Vec<Span> {
    // Quotes are matched twice: once stopping early at any stray quote
    // character and once only at line-level breaks
    let passes: [(&str, &str, &[&str]); 5] = [
        ("\"", "\"", QUOTE_BREAKS),
        ("«", "»", ALT_BREAKS),
        ("\u{201e}", "\u{201c}", QUOTE_BREAKS),
        ("\u{201e}", "\u{201c}", ALT_BREAKS),
        ("\"", "\"", ALT_BREAKS),
    ];

    passes
        .iter()
        .flat_map(|&(open, close, breaks)| {
            RangeMatcher::new(open, close)
                .with_alt_breaks(breaks)
                .find(text)
                .spans
        })
        .collect()
}

/// Bare `http://` and `https://` links up to the next space or line break.
fn hyperlink_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut loc = 0;

    loop {
        let rest = &text[loc..];
        let first = match (rest.find("https://"), rest.find("http://")) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => break,
        };
        let start = loc + first;
        let end = text[start..]
            .find([' ', '\n'])
            .map_or(text.len(), |i| start + i);
        spans.push(Span::new(start, end));
        loc = end;
    }

    spans
}

fn tag_spans(text: &str) -> Vec<Span> {
    TAG_BLOCKS
        .iter()
        .flat_map(|re| regex_spans(re, text))
        .collect()
}

/// Comments marking a deliberate spelling protect their surroundings too.
fn sic_comment_spans(text: &str) -> Vec<Span> {
    regex_spans(&COMMENT_BLOCK, text)
        .filter(|span| {
            let comment = &text[span.start..span.end];
            comment.contains("sic") || comment.contains("Sic!")
        })
        .map(|span| {
            let start = text[..span.start]
                .char_indices()
                .rev()
                .nth(SIC_MARGIN - 1)
                .map_or(0, |(i, _)| i);
            let end = text[span.end..]
                .char_indices()
                .nth(SIC_MARGIN)
                .map_or(text.len(), |(i, _)| span.end + i);
            Span::new(start, end)
        })
        .collect()
}

/// `<ref ... />` tags and `<ref ...>` blocks up to the first closing tag.
fn reference_spans(text: &str) -> Vec<Span> {
    let mut spans: Vec<Span> = regex_spans(&REF_SELF_CLOSING, text).collect();

    for open in REF_OPEN.find_iter(text) {
        if let Some(close) = REF_CLOSE.find(&text[open.start()..]) {
            spans.push(Span::new(open.start(), open.start() + close.end()));
        }
    }

    spans
}

/// Lines that are list items or definitions, newline included.
fn list_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with(['*', '#', ':', ';']) {
            spans.push(Span::new(offset, offset + line.len()));
        }
        offset += line.len();
    }

    spans
}

/// Everything from the first boilerplate heading or category link to the end.
fn trailing_spans(text: &str) -> Vec<Span> {
    [&*TRAILING_SECTION, &*CATEGORY_LINK]
        .into_iter()
        .filter_map(|re| re.find(text))
        .map(|m| Span::new(m.start(), text.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(spans: &[Span]) -> Vec<(usize, usize)> {
        spans.iter().map(|s| (s.start, s.end)).collect()
    }

    fn excluded_text<'t>(text: &'t str, level: ScanLevel) -> Vec<&'t str> {
        excluded_ranges(text, level)
            .iter()
            .map(|s| &text[s.start..s.end])
            .collect()
    }

    #[test]
    fn test_templates() {
        let text = "{{test template }} TEXT {{test2 template}} MORE TEXT";
        let set = excluded_ranges(text, ScanLevel::Relaxed);
        assert_eq!(pairs(set.spans()), vec![(0, 18), (24, 42)]);

        let remaining = format!("{}{}", &text[18..24], &text[42..]);
        assert_eq!(remaining, " TEXT  MORE TEXT");
    }

    #[test]
    fn test_nested_template_variants() {
        let text = "{{test template }} TEXT {{test2 template param1 = {{template 3 param_internal = some }} | param2 = other }} MORE TEXT";

        let raw = MarkupScanner::new(ScanLevel::Full).raw().spans(text);
        assert_eq!(pairs(&raw), vec![(0, 18), (50, 87), (24, 107)]);

        let denested = MarkupScanner::new(ScanLevel::Full)
            .with_merge(false)
            .scan(text);
        assert_eq!(pairs(denested.spans()), vec![(0, 18), (24, 107)]);

        let full = excluded_ranges(text, ScanLevel::Full);
        assert_eq!(pairs(full.spans()), vec![(0, 18), (24, 107)]);
    }

    #[test]
    fn test_mixed_markup() {
        let text = "{{test template }} TEXT {{test2 param1 = [[test|test2]] }} MORE TEXT \"some quoted\" TEXT <!-- some comment --> FINAL";

        let mut raw = MarkupScanner::new(ScanLevel::Full).raw().spans(text);
        raw.sort();
        assert_eq!(
            pairs(&raw),
            vec![(0, 18), (24, 58), (41, 55), (69, 82), (69, 82), (88, 109)]
        );

        let set = excluded_ranges(text, ScanLevel::Full);
        assert_eq!(pairs(set.spans()), vec![(0, 18), (24, 58), (69, 82), (88, 109)]);
    }

    #[test]
    fn test_level_none_excludes_nothing() {
        let text = "{{template}} [[link]] ''italic'' <!-- comment -->";
        assert!(excluded_ranges(text, ScanLevel::None).is_empty());
    }

    #[test]
    fn test_emphasis_and_quotes() {
        let text = "plain ''italic'' and '''bold''' or «french» and „german“ done";
        let excluded = excluded_text(text, ScanLevel::Relaxed);
        assert!(excluded.contains(&"''italic''"));
        assert!(excluded.contains(&"'''bold'''"));
        assert!(excluded.contains(&"«french»"));
        assert!(excluded.contains(&"„german“"));
        assert!(!excluded.iter().any(|s| s.contains("plain") || s.contains("done")));
    }

    #[test]
    fn test_hyperlinks() {
        let text = "see http://example.org/a and https://example.com/b\nnext";
        let spans = hyperlink_spans(text);
        assert_eq!(
            spans.iter().map(|s| &text[s.start..s.end]).collect::<Vec<_>>(),
            vec!["http://example.org/a", "https://example.com/b"]
        );

        // Only spaces and line breaks end a link
        let tabbed = "http://example.org/a\tb c";
        assert_eq!(pairs(&hyperlink_spans(tabbed)), vec![(0, tabbed.find(' ').unwrap())]);
    }

    #[test]
    fn test_tag_blocks() {
        let text = "before <gallery mode=\"packed\">\nDatei:Deuschland.png|Karte\n</gallery> after <math>x^2</math>";
        let excluded = excluded_text(text, ScanLevel::Relaxed);
        assert!(excluded.iter().any(|s| s.starts_with("<gallery") && s.ends_with("</gallery>")));
        assert!(excluded.contains(&"<math>x^2</math>"));
        assert!(!excluded.iter().any(|s| s.contains("before") || s.contains("after")));
    }

    #[test]
    fn test_markers_inside_math_are_ignored() {
        let text = "{{outer <math>\\frac{{a}}{b}</math> tail}} rest";
        let set = excluded_ranges(text, ScanLevel::Relaxed);
        let end = text.find(" rest").unwrap();
        assert_eq!(pairs(set.spans()), vec![(0, end)]);
    }

    #[test]
    fn test_sic_comment_is_widened() {
        let text = format!("{}Visioen<!-- sic! -->{}", "x".repeat(60), "y".repeat(60));
        let comment_start = text.find("<!--").unwrap();
        let comment_end = text.find("-->").unwrap() + 3;
        let spans = sic_comment_spans(&text);
        assert_eq!(
            pairs(&spans),
            vec![(comment_start - SIC_MARGIN, comment_end + SIC_MARGIN)]
        );

        let short = "a<!--sic-->b";
        assert_eq!(pairs(&sic_comment_spans(short)), vec![(0, short.len())]);
    }

    #[test]
    fn test_sic_margin_counts_characters() {
        let text = format!("{}<!-- sic -->{}", "ü".repeat(40), "ö".repeat(60));
        let comment_end = text.find("-->").unwrap() + 3;
        let spans = sic_comment_spans(&text);
        assert_eq!(pairs(&spans), vec![(0, comment_end + 2 * SIC_MARGIN)]);

        let protected = &text[spans[0].start..spans[0].end];
        assert_eq!(protected.chars().filter(|&c| c == 'ü').count(), 40);
        assert_eq!(protected.chars().filter(|&c| c == 'ö').count(), SIC_MARGIN);
    }

    #[test]
    fn test_references_only_from_wiki_skip() {
        let text = "Text<ref name=\"a\" /> more<ref>Quelle Fehlr</ref> end";
        let relaxed = excluded_text(text, ScanLevel::Relaxed);
        assert!(!relaxed.iter().any(|s| s.contains("Quelle")));

        let skip = excluded_text(text, ScanLevel::WikiSkip);
        assert!(skip.contains(&"<ref name=\"a\" />"));
        assert!(skip.contains(&"<ref>Quelle Fehlr</ref>"));
    }

    #[test]
    fn test_lists_and_trailing_sections_only_at_full() {
        let text = "Intro line\n* list item\n  # numbered\nBody text\n== Weblinks ==\n* [http://x.org X]\n[[Kategorie:Test]]\n";
        let list_line = "* list item\n";
        let list_start = text.find(list_line).unwrap();

        let relaxed = excluded_ranges(text, ScanLevel::WikiSkip);
        assert!(!relaxed.contains(list_start));

        let full = excluded_ranges(text, ScanLevel::Full);
        assert!(full.contains(list_start));
        assert!(full.contains(text.find("# numbered").unwrap()));
        assert!(!full.contains(text.find("Intro").unwrap()));
        assert!(!full.contains(text.find("Body").unwrap()));
        let heading = text.find("== Weblinks").unwrap();
        assert!(full.contains(heading));
        assert_eq!(full.spans().last().map(|s| s.end), Some(text.len()));
    }

    #[test]
    fn test_trailing_heading_is_case_insensitive() {
        let text = "Prose\n==external Links==\nstuff";
        let spans = trailing_spans(text);
        assert_eq!(pairs(&spans), vec![(6, text.len())]);
    }
}
