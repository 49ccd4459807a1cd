use crate::parser::Span;

/// Sorted collection of excluded spans for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    spans: Vec<Span>,
    /// Span ends ascend along with the starts, so lookups can bisect.
    ends_sorted: bool,
}

impl RangeSet {
    /// Build a set from spans in any order. Overlaps are kept as given.
    pub fn new(mut spans: Vec<Span>) -> Self {
        spans.sort();
        let ends_sorted = spans.windows(2).all(|w| w[0].end <= w[1].end);
        Self { spans, ends_sorted }
    }

    /// Build a set with nested spans removed and touching spans merged.
    pub fn normalized(spans: Vec<Span>) -> Self {
        Self::new(merge(denest(spans)))
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }

    pub fn contains(&self, position: usize) -> bool {
        if self.ends_sorted {
            let i = self.spans.partition_point(|s| s.end <= position);
            return self.spans.get(i).is_some_and(|s| s.start <= position);
        }
        self.spans
            .iter()
            .take_while(|s| s.start <= position)
            .any(|s| s.end > position)
    }

    /// True if some span ends exactly at `position`.
    pub fn ends_at(&self, position: usize) -> bool {
        if self.ends_sorted {
            let i = self.spans.partition_point(|s| s.end < position);
            return self.spans.get(i).is_some_and(|s| s.end == position);
        }
        self.spans.iter().any(|s| s.end == position)
    }

    pub fn cursor(&self) -> RangeCursor {
        RangeCursor::default()
    }
}

impl FromIterator<Span> for RangeSet {
    fn from_iter<I: IntoIterator<Item = Span>>(iter: I) -> Self {
        RangeSet::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

/// Sort spans and drop every span enclosed by an earlier kept span.
pub fn denest(mut spans: Vec<Span>) -> Vec<Span> {
    // Enclosing spans first when starts are equal
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    let mut reach = 0;
    for span in spans {
        if !kept.is_empty() && span.end <= reach {
            continue;
        }
        reach = reach.max(span.end);
        kept.push(span);
    }
    kept
}

/// Sort spans and fuse those that overlap or are separated by at most one byte.
pub fn merge(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort();

    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(current) if span.start <= current.end + 1 => {
                current.end = current.end.max(span.end);
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Forward-only position over a sorted span list while walking a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeCursor {
    /// Index of the span currently ahead of or around the cursor.
    pub index: usize,
    /// Text position everything before which has been consumed.
    pub position: usize,
}

impl RangeCursor {
    pub fn new(index: usize, position: usize) -> Self {
        Self { index, position }
    }

    /// Returns true if the word `[word_start, word_end)` lies in an excluded
    /// span, moving the cursor past that span and every span it overlaps.
    pub fn skip_excluded(&mut self, spans: &[Span], word_start: usize, word_end: usize) -> bool {
        let middle2 = word_start + word_end;
        let covers = |span: &Span, position: usize| {
            (2 * span.start <= middle2 && middle2 < 2 * span.end) || span.contains(position)
        };

        if let Some(span) = spans.get(self.index) {
            if covers(span, self.position) {
                self.position = span.end;
                while let Some(next) = spans.get(self.index) {
                    if next.start >= self.position {
                        break;
                    }
                    self.position = self.position.max(next.end);
                    self.index += 1;
                }
                return true;
            }
        }

        let mut advanced = false;
        while spans
            .get(self.index)
            .is_some_and(|s| s.start < self.position)
        {
            self.index += 1;
            if let Some(span) = spans.get(self.index) {
                if covers(span, self.position) {
                    self.position = span.end;
                    advanced = true;
                }
            }
        }
        advanced
    }

    /// Move the cursor forward; it never moves back.
    pub fn advance_to(&mut self, position: usize) {
        self.position = self.position.max(position);
    }
}

/// Tuple form of [`RangeCursor::skip_excluded`].
pub fn advance_cursor(
    spans: &[Span],
    word_start: usize,
    word_end: usize,
    range_index: usize,
    cursor: usize,
) -> (usize, usize, bool) {
    let mut state = RangeCursor::new(range_index, cursor);
    let skip = state.skip_excluded(spans, word_start, word_end);
    (state.index, state.position, skip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(pairs: &[(usize, usize)]) -> Vec<Span> {
        pairs.iter().copied().map(Span::from).collect()
    }

    #[test]
    fn test_denest() {
        let input = spans(&[(0, 18), (50, 87), (24, 107)]);
        assert_eq!(denest(input), spans(&[(0, 18), (24, 107)]));

        let same_start = spans(&[(5, 10), (5, 20), (6, 8)]);
        assert_eq!(denest(same_start), spans(&[(5, 20)]));
    }

    #[test]
    fn test_merge() {
        let input = spans(&[(10, 20), (0, 5), (21, 30), (40, 50), (45, 60)]);
        assert_eq!(merge(input), spans(&[(0, 5), (10, 30), (40, 60)]));

        // Contained spans are absorbed by their container
        let contained = spans(&[(0, 18), (24, 107), (50, 87)]);
        assert_eq!(merge(contained), spans(&[(0, 18), (24, 107)]));
    }

    #[test]
    fn test_normalized_is_disjoint_and_sorted() {
        let raw = spans(&[(88, 109), (0, 18), (24, 58), (41, 55), (69, 82), (69, 82)]);
        let set = RangeSet::normalized(raw);
        assert_eq!(set.spans(), &spans(&[(0, 18), (24, 58), (69, 82), (88, 109)])[..]);
        for pair in set.spans().windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
    }

    #[test]
    fn test_contains_and_ends_at() {
        let set = RangeSet::new(spans(&[(0, 18), (24, 42)]));
        assert!(set.contains(0));
        assert!(set.contains(17));
        assert!(!set.contains(18));
        assert!(set.contains(30));
        assert!(!set.contains(50));
        assert!(set.ends_at(18));
        assert!(set.ends_at(42));
        assert!(!set.ends_at(24));
        assert!(RangeSet::default().is_empty());
    }

    #[test]
    fn test_advance_cursor_sequence() {
        let ranges = spans(&[(16, 40), (18, 131), (68, 81), (180, 200)]);

        let (index, cursor, skip) = advance_cursor(&ranges, 0, 5, 0, 0);
        assert_eq!((index, cursor, skip), (0, 0, false));

        let (index, cursor, skip) = advance_cursor(&ranges, 16, 17, index, cursor);
        assert_eq!((index, cursor, skip), (3, 131, true));

        let (index, cursor, skip) = advance_cursor(&ranges, 140, 150, index, cursor);
        assert_eq!((index, cursor, skip), (3, 131, false));

        let (index, cursor, skip) = advance_cursor(&ranges, 180, 190, index, cursor);
        assert_eq!((index, cursor, skip), (4, 200, true));
    }

    #[test]
    fn test_cursor_never_moves_back() {
        let mut cursor = RangeCursor::new(0, 50);
        cursor.advance_to(10);
        assert_eq!(cursor.position, 50);
        cursor.advance_to(60);
        assert_eq!(cursor.position, 60);
    }

    #[test]
    fn test_skip_after_stale_spans() {
        let ranges = spans(&[(0, 4), (10, 20)]);
        let mut cursor = RangeCursor::new(0, 12);
        // Span 0 is behind the cursor, span 1 holds it
        assert!(cursor.skip_excluded(&ranges, 12, 15));
        assert_eq!(cursor, RangeCursor::new(2, 20));
    }

    #[test]
    fn test_lookups_on_overlapping_and_normalized_sets() {
        let raw = spans(&[(12, 40), (0, 30), (5, 10)]);
        let overlapping = RangeSet::new(raw.clone());
        assert!(overlapping.ends_at(10));
        assert!(overlapping.ends_at(30));
        assert!(overlapping.ends_at(40));
        assert!(!overlapping.ends_at(12));
        assert!(overlapping.contains(35));

        let normalized = RangeSet::normalized(raw);
        assert_eq!(normalized.spans(), &spans(&[(0, 40)])[..]);
        assert!(normalized.ends_at(40));
        assert!(!normalized.ends_at(10));
        assert!(!normalized.ends_at(30));

        let disjoint = RangeSet::normalized(spans(&[(30, 35), (0, 4), (10, 20)]));
        for end in [4, 20, 35] {
            assert!(disjoint.ends_at(end));
        }
        for position in [0, 10, 21, 36] {
            assert!(!disjoint.ends_at(position));
        }
        assert!(disjoint.contains(3));
        assert!(disjoint.contains(10));
        assert!(!disjoint.contains(4));
        assert!(!disjoint.contains(20));
        assert!(!disjoint.contains(50));
    }

    #[test]
    fn test_cursor_walk_is_monotonic() {
        let set = RangeSet::normalized(spans(&[(5, 10), (20, 30), (40, 45)]));
        let words = [(0, 3), (6, 8), (12, 15), (25, 28), (31, 35), (41, 44), (50, 55)];
        let mut cursor = set.cursor();
        let mut skipped = Vec::new();

        for (start, end) in words {
            let before = cursor;
            skipped.push(cursor.skip_excluded(set.spans(), start, end));
            cursor.advance_to(end);
            assert!(cursor.position >= before.position);
            assert!(cursor.index >= before.index);
        }

        assert_eq!(skipped, vec![false, true, false, true, false, true, false]);
        assert_eq!(cursor, RangeCursor::new(3, 55));
    }
}
