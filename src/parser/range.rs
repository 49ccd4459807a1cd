use crate::parser::{ceil_char_boundary, RangeSet, Span};

/// Spans found between an opening and closing marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResult {
    /// Matched spans in discovery order (inner spans usually come first).
    pub spans: Vec<Span>,
    /// False if any opening or closing marker was left unmatched.
    pub fully_matched: bool,
    /// Positions of unmatched closing markers, then of unmatched openings.
    pub unmatched: Vec<usize>,
}

impl Default for RangeResult {
    fn default() -> Self {
        Self {
            spans: Vec::new(),
            fully_matched: true,
            unmatched: Vec::new(),
        }
    }
}

/// Finds all (possibly nested) spans delimited by an open/close marker pair.
///
/// Markup found in the wild is frequently unbalanced, so a scan never fails:
/// whatever could be paired is returned and the rest is reported in
/// [`RangeResult::unmatched`].
#[derive(Debug, Clone, Copy)]
pub struct RangeMatcher<'a> {
    open: &'a str,
    close: &'a str,
    start: usize,
    alt_breaks: &'a [&'a str],
    ignore: Option<&'a RangeSet>,
}

/// The next closing candidate. `key` is the position used to order it against
/// openings; for alternative breaks it is shifted so that `key + close.len()`
/// lands on the end of the break.
#[derive(Debug, Clone, Copy)]
struct Close {
    key: usize,
    end: usize,
}

impl<'a> RangeMatcher<'a> {
    pub fn new(open: &'a str, close: &'a str) -> Self {
        Self {
            open,
            close,
            start: 0,
            alt_breaks: &[],
            ignore: None,
        }
    }

    /// Begin scanning at a byte offset instead of the start of the text.
    pub fn starting_at(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    /// Extra markers that terminate a pending span as if they were `close`.
    pub fn with_alt_breaks(mut self, alt_breaks: &'a [&'a str]) -> Self {
        self.alt_breaks = alt_breaks;
        self
    }

    /// Markers starting inside any of these spans are treated as absent.
    pub fn ignoring(mut self, ignore: &'a RangeSet) -> Self {
        self.ignore = Some(ignore);
        self
    }

    pub fn find(&self, text: &str) -> RangeResult {
        if self.open.is_empty() || self.close.is_empty() {
            return RangeResult::default();
        }

        let mut loc = self.start;
        let mut stack: Vec<usize> = Vec::new();
        let mut spans = Vec::new();
        let mut unmatched = Vec::new();

        loop {
            let open = self.next(text, loc, self.open);
            let Some(close) = self.next_close(text, loc, open, !stack.is_empty()) else {
                break;
            };

            match open {
                Some(o) if o < close.key => {
                    // Another opening before this close means we go one level deeper
                    let deeper = self
                        .next(text, loc + 1, self.open)
                        .is_some_and(|n| n >= o && n < close.key);
                    if deeper {
                        stack.push(o);
                        loc = o + 1;
                    } else {
                        spans.push(Span::new(o, close.end));
                        loc = close.key + 1;
                    }
                }
                // Identical open and close markers (quotes, emphasis)
                Some(o) if o == close.key => {
                    if let Some(pending) = stack.pop() {
                        spans.push(Span::new(pending, close.end));
                        loc = close.end;
                    } else {
                        stack.push(o);
                        loc = o + self.open.len();
                    }
                }
                _ => {
                    if let Some(pending) = stack.pop() {
                        spans.push(Span::new(pending, close.end));
                    } else {
                        unmatched.push(close.key);
                    }
                    loc = close.end;
                }
            }
        }

        unmatched.extend(stack);

        RangeResult {
            spans,
            fully_matched: unmatched.is_empty(),
            unmatched,
        }
    }

    fn next(&self, text: &str, from: usize, pattern: &str) -> Option<usize> {
        find_next_unignored(text, from, pattern, self.ignore)
    }

    fn next_close(
        &self,
        text: &str,
        loc: usize,
        open: Option<usize>,
        pending: bool,
    ) -> Option<Close> {
        let close = self.next(text, loc, self.close).map(|c| Close {
            key: c,
            end: c + self.close.len(),
        });

        // An alternative break only counts once we are past an opening
        let mut best: Option<(usize, &str)> = None;
        for alt in self.alt_breaks {
            let Some(at) = self.next(text, loc, alt) else {
                continue;
            };
            let after_open = open.map_or(true, |o| at > o);
            if (after_open || pending) && best.map_or(true, |(b, _)| at < b) {
                best = Some((at, alt));
            }
        }

        match best {
            Some((at, alt)) if close.map_or(true, |c| at < c.key) => Some(Close {
                key: (at + alt.len()).saturating_sub(self.close.len()),
                end: at + alt.len(),
            }),
            _ => close,
        }
    }
}

/// Find `open`/`close` spans over the whole text with no extra options.
pub fn find_ranges(open: &str, close: &str, text: &str) -> RangeResult {
    RangeMatcher::new(open, close).find(text)
}

/// Next occurrence of `pattern` at or after `start` whose position is not
/// covered by `ignore`.
pub fn find_next_unignored(
    text: &str,
    start: usize,
    pattern: &str,
    ignore: Option<&RangeSet>,
) -> Option<usize> {
    let mut from = start;
    loop {
        let from_boundary = ceil_char_boundary(text, from)?;
        let at = from_boundary + text[from_boundary..].find(pattern)?;
        match ignore {
            Some(set) if set.contains(at) => from = at + 1,
            _ => return Some(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substrings<'t>(text: &'t str, result: &RangeResult) -> Vec<&'t str> {
        result.spans.iter().map(|s| &text[s.start..s.end]).collect()
    }

    #[test]
    fn test_simple_templates() {
        let text = "{{test template }} TEXT {{test2 template}} MORE TEXT";
        let result = find_ranges("{{", "}}", text);
        assert!(result.fully_matched);
        assert_eq!(result.spans, vec![Span::new(0, 18), Span::new(24, 42)]);
    }

    #[test]
    fn test_nested_templates() {
        let text = "{{test template }} TEXT {{test2 template param1 = {{template 3 param_internal = some }} | param2 = other }} MORE TEXT";
        let result = find_ranges("{{", "}}", text);
        assert!(result.fully_matched);
        assert_eq!(
            result.spans,
            vec![Span::new(0, 18), Span::new(50, 87), Span::new(24, 107)]
        );
        for s in substrings(text, &result) {
            assert!(s.starts_with("{{") && s.ends_with("}}"));
        }
    }

    #[test]
    fn test_deep_nesting() {
        let text = "a {{b {{c {{d}} e}} f}} g";
        let result = find_ranges("{{", "}}", text);
        assert!(result.fully_matched);
        assert_eq!(result.spans.len(), 3);
        assert_eq!(
            substrings(text, &result),
            vec!["{{d}}", "{{c {{d}} e}}", "{{b {{c {{d}} e}} f}}"]
        );
    }

    #[test]
    fn test_unmatched_opening() {
        let text = "{{Lorem ipsum dolor }} sit amet, {{ consectetur {{adipisicing elit, {{sed do eiusmod}} tempor incididunt ut laboreet dolore";
        let result = find_ranges("{{", "}}", text);
        assert!(!result.fully_matched);
        assert_eq!(result.unmatched, vec![33, 48]);
        assert_eq!(result.spans.len(), 2);
    }

    #[test]
    fn test_unmatched_closing() {
        let text = "{{Lorem ipsum dolor }} sit amet, }} consectetur {{adipisicing elit, }}sed do eiusmod}} tempor incididunt ut laboreet dolore  ";
        let result = find_ranges("{{", "}}", text);
        assert!(!result.fully_matched);
        assert_eq!(result.unmatched, vec![33, 84]);
    }

    #[test]
    fn test_identical_markers() {
        let text = "some \"quoted\" text and \"more\"";
        let result = find_ranges("\"", "\"", text);
        assert!(result.fully_matched);
        assert_eq!(substrings(text, &result), vec!["\"quoted\"", "\"more\""]);
    }

    #[test]
    fn test_alternative_break_stops_runaway_quote() {
        let text = "He said \"never closed\nnext paragraph \"quoted\" here";
        let result = RangeMatcher::new("\"", "\"")
            .with_alt_breaks(&["\n"])
            .find(text);
        let found = substrings(text, &result);
        assert_eq!(found[0], "\"never closed\n");
        assert!(found.contains(&"\"quoted\""));
    }

    #[test]
    fn test_alternative_break_before_open_is_ignored() {
        let text = "line one\n''italic'' rest";
        let result = RangeMatcher::new("''", "''")
            .with_alt_breaks(&["\n"])
            .find(text);
        assert_eq!(substrings(text, &result), vec!["''italic''"]);
    }

    #[test]
    fn test_ignored_positions() {
        let text = "{{a <math>{{x}}</math> b}}";
        let math_start = text.find("<math>").unwrap();
        let math_end = text.find("</math>").unwrap() + "</math>".len();
        let ignore = RangeSet::new(vec![Span::new(math_start, math_end)]);

        let plain = find_ranges("{{", "}}", text);
        assert_eq!(plain.spans.len(), 2);

        let ignoring = RangeMatcher::new("{{", "}}").ignoring(&ignore).find(text);
        assert_eq!(ignoring.spans, vec![Span::new(0, text.len())]);
    }

    #[test]
    fn test_start_offset() {
        let text = "{{skip}} {{keep}}";
        let result = RangeMatcher::new("{{", "}}").starting_at(3).find(text);
        assert_eq!(substrings(text, &result), vec!["{{keep}}"]);
    }

    #[test]
    fn test_multibyte_markers() {
        let text = "Er sagte „Grid Parity“ und ging.";
        let result = find_ranges("„", "“", text);
        assert!(result.fully_matched);
        assert_eq!(substrings(text, &result), vec!["„Grid Parity“"]);
    }

    #[test]
    fn test_find_next_unignored() {
        let text = "}} a }} b }}";
        let ignore = RangeSet::new(vec![Span::new(0, 2), Span::new(5, 6)]);
        assert_eq!(find_next_unignored(text, 0, "}}", Some(&ignore)), Some(10));
        assert_eq!(find_next_unignored(text, 0, "}}", None), Some(0));
        assert_eq!(find_next_unignored(text, 11, "}}", None), None);
        assert_eq!(find_next_unignored(text, 99, "}}", None), None);
    }
}
