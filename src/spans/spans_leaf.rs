use std::fmt::Debug;
use std::ops::{Add, AddAssign, Range, Sub, SubAssign};

use crate::rope::metrics::unit_newtype;
use crate::tree::{Leaf, Metric, MetricKind, Summary};

#[cfg(not(any(test, fuzzing, feature = "small_chunks")))]
pub(super) const MIN_SPANS: usize = 32;

#[cfg(any(test, fuzzing, feature = "small_chunks"))]
pub(super) const MIN_SPANS: usize = 2;

#[cfg(not(any(test, fuzzing, feature = "small_chunks")))]
pub(super) const MAX_SPANS: usize = 64;

#[cfg(any(test, fuzzing, feature = "small_chunks"))]
pub(super) const MAX_SPANS: usize = 4;

const _: () = assert!(MAX_SPANS >= 2 * MIN_SPANS);

/// A value tagged onto a half-open range of base units.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span<T> {
    pub range: Range<usize>,
    pub data: T,
}

impl<T> Span<T> {
    #[inline]
    pub fn new(range: Range<usize>, data: T) -> Self {
        Self { range, data }
    }

    #[inline]
    fn shifted_left(mut self, by: usize) -> Self {
        self.range = self.range.start - by..self.range.end - by;
        self
    }
}

/// A leaf of a [`Spans`](super::Spans) tree.
///
/// # Invariants
///
/// - the spans are non-empty, sorted and don't overlap;
///
/// - every span lies within `0..len`;
///
/// - two spans that touch never carry equal data.
#[derive(Clone)]
pub struct SpansLeaf<T> {
    pub(super) len: usize,
    pub(super) spans: Vec<Span<T>>,
}

impl<T> Default for SpansLeaf<T> {
    #[inline]
    fn default() -> Self {
        Self { len: 0, spans: Vec::new() }
    }
}

impl<T: Debug> Debug for SpansLeaf<T> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if !f.alternate() {
            f.debug_struct("SpansLeaf")
                .field("len", &self.len)
                .field("spans", &self.spans)
                .finish()
        } else {
            write!(f, "{}: ", self.len)?;
            f.debug_list()
                .entries(self.spans.iter().map(|s| (&s.range, &s.data)))
                .finish()
        }
    }
}

impl<T> SpansLeaf<T> {
    /// Returns the span containing `offset`, if any.
    #[inline]
    pub(super) fn span_containing(&self, offset: usize) -> Option<&Span<T>> {
        let idx = self.spans.partition_point(|s| s.range.end <= offset);
        self.spans.get(idx).filter(|s| s.range.start <= offset)
    }

    #[inline]
    pub fn spans(&self) -> &[Span<T>] {
        &self.spans
    }
}

impl<T: PartialEq> SpansLeaf<T> {
    /// Returns whether the last span of this leaf and the first span of
    /// `next` are two pieces of the same span.
    #[inline]
    pub(super) fn joins(&self, next: &Self) -> bool {
        match (self.spans.last(), next.spans.first()) {
            (Some(last), Some(first)) => {
                last.range.end == self.len
                    && first.range.start == 0
                    && last.data == first.data
            },
            _ => false,
        }
    }

    pub(super) fn assert_invariants(&self) {
        let mut prev_end = None;
        let mut prev_data = None;

        for span in &self.spans {
            assert!(
                span.range.start < span.range.end,
                "Empty span at {:?}",
                span.range
            );

            assert!(
                span.range.end <= self.len,
                "Span at {:?} overflows a leaf of length {}",
                span.range,
                self.len
            );

            if let Some(end) = prev_end {
                assert!(
                    end <= span.range.start,
                    "Span at {:?} overlaps the previous one",
                    span.range
                );

                if end == span.range.start {
                    assert!(
                        prev_data != Some(&span.data),
                        "Two touching spans at {end} carry the same data"
                    );
                }
            }

            prev_end = Some(span.range.end);
            prev_data = Some(&span.data);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpansSummary {
    /// The length of the subtree in base units.
    pub len: usize,

    /// The number of spans stored in the subtree.
    pub count: usize,

    /// The range from the start of the first span to the end of the last
    /// one, relative to the start of the subtree. Empty if there are no
    /// spans.
    pub covered: Range<usize>,
}

impl AddAssign for SpansSummary {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        if rhs.count > 0 {
            let end = self.len + rhs.covered.end;

            self.covered = if self.count == 0 {
                self.len + rhs.covered.start..end
            } else {
                self.covered.start..end
            };
        }

        self.len += rhs.len;
        self.count += rhs.count;
    }
}

impl Summary for SpansSummary {}

impl<T: Debug + Clone + PartialEq> Leaf for SpansLeaf<T> {
    type Summary = SpansSummary;

    const NEEDS_FIXUP_ON_APPEND: bool = true;

    #[inline]
    fn base_len(&self) -> usize {
        self.len
    }

    #[inline]
    fn summarize(&self) -> SpansSummary {
        let covered = match (self.spans.first(), self.spans.last()) {
            (Some(first), Some(last)) => first.range.start..last.range.end,
            _ => 0..0,
        };

        SpansSummary { len: self.len, count: self.spans.len(), covered }
    }

    #[inline]
    fn is_undersized(&self) -> bool {
        self.spans.len() < MIN_SPANS
    }

    #[inline]
    fn push_maybe_splitting(&mut self, other: &Self) -> Option<Self> {
        let mut rest = other.spans.iter();

        if self.joins(other) {
            let first = rest.next().expect("joins checked it");
            let last = self.spans.last_mut().expect("joins checked it");
            last.range.end = self.len + first.range.end;
        }

        let shift = self.len;

        self.spans.extend(rest.map(|span| Span {
            range: span.range.start + shift..span.range.end + shift,
            data: span.data.clone(),
        }));

        self.len += other.len;

        if self.spans.len() <= MAX_SPANS {
            return None;
        }

        // The first span of the right half starts after the end of the first
        // span of the left half, so neither half is empty.
        let split_idx = self.spans.len() / 2;
        let split_offset = self.spans[split_idx].range.start;

        let right = self
            .spans
            .split_off(split_idx)
            .into_iter()
            .map(|span| span.shifted_left(split_offset))
            .collect();

        let right = Self { len: self.len - split_offset, spans: right };

        self.len = split_offset;

        Some(right)
    }

    #[inline]
    fn slice(&self, range: Range<usize>) -> Self {
        let first = self.spans.partition_point(|s| s.range.end <= range.start);

        let spans = self.spans[first..]
            .iter()
            .take_while(|s| s.range.start < range.end)
            .map(|span| Span {
                range: span.range.start.max(range.start) - range.start
                    ..span.range.end.min(range.end) - range.start,
                data: span.data.clone(),
            })
            .collect();

        Self { len: range.len(), spans }
    }

    /// Two pieces of the same span are only joined when taking the piece
    /// out of `next` leaves it with at least `MIN_SPANS` spans, so that
    /// joining never undersizes a leaf. Readers join the remaining pieces
    /// back together.
    #[inline]
    fn needs_fixup(&self, next: &Self) -> bool {
        self.joins(next) && next.spans.len() > MIN_SPANS
    }

    #[inline]
    fn fixup(&mut self, next: &mut Self) -> bool {
        if !self.needs_fixup(next) {
            return true;
        }

        let moved = next.spans.remove(0);
        let shift = moved.range.end;

        let last = self.spans.last_mut().expect("needs_fixup checked it");
        last.range.end += shift;

        self.len += shift;
        next.len -= shift;

        for span in &mut next.spans {
            span.range = span.range.start - shift..span.range.end - shift;
        }

        true
    }
}

/// A metric counting spans, with a boundary at the end of every span.
///
/// A span stored in two pieces across a leaf boundary is counted twice.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpanMetric(pub usize);

unit_newtype!(SpanMetric);

impl<T: Debug + Clone + PartialEq> Metric<SpansLeaf<T>> for SpanMetric {
    const KIND: MetricKind = MetricKind::Trailing;

    const CAN_FRAGMENT: bool = false;

    #[inline]
    fn zero() -> Self {
        Self(0)
    }

    #[inline]
    fn measure(summary: &SpansSummary, _: usize) -> Self {
        Self(summary.count)
    }

    #[inline]
    fn to_base_units(leaf: &SpansLeaf<T>, units: Self) -> usize {
        leaf.spans
            .get(units.0 - 1)
            .map(|span| span.range.end)
            .unwrap_or(leaf.len)
    }

    #[inline]
    fn from_base_units(leaf: &SpansLeaf<T>, offset: usize) -> Self {
        Self(leaf.spans.partition_point(|s| s.range.end <= offset))
    }

    #[inline]
    fn is_boundary(leaf: &SpansLeaf<T>, offset: usize) -> bool {
        leaf.spans.iter().any(|s| s.range.end == offset)
    }

    #[inline]
    fn prev(leaf: &SpansLeaf<T>, offset: usize) -> Option<usize> {
        let idx = leaf.spans.partition_point(|s| s.range.end < offset);
        idx.checked_sub(1).map(|idx| leaf.spans[idx].range.end)
    }

    #[inline]
    fn next(leaf: &SpansLeaf<T>, offset: usize) -> Option<usize> {
        let idx = leaf.spans.partition_point(|s| s.range.end <= offset);
        leaf.spans.get(idx).map(|s| s.range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(len: usize, spans: &[(Range<usize>, char)]) -> SpansLeaf<char> {
        SpansLeaf {
            len,
            spans: spans
                .iter()
                .map(|(range, data)| Span::new(range.clone(), *data))
                .collect(),
        }
    }

    #[test]
    fn push_joins_touching_equal_spans() {
        let mut left = leaf(5, &[(1..5, 'a')]);
        let right = leaf(4, &[(0..2, 'a'), (3..4, 'b')]);

        assert!(left.push_maybe_splitting(&right).is_none());
        assert_eq!(left.len, 9);
        assert_eq!(left.spans, vec![Span::new(1..7, 'a'), Span::new(8..9, 'b')]);
        left.assert_invariants();
    }

    #[test]
    fn push_splits_at_a_span_start() {
        let mut left = leaf(6, &[(0..1, 'a'), (2..3, 'b'), (4..5, 'c')]);
        let right = leaf(6, &[(0..1, 'd'), (2..3, 'e'), (4..6, 'f')]);

        let split = left.push_maybe_splitting(&right).unwrap();

        assert_eq!(left.len + split.len, 12);
        assert_eq!(left.spans.len(), 3);
        assert_eq!(split.spans[0].range.start, 0);
        assert_eq!(split.spans.last().unwrap().range, 4..6);
        left.assert_invariants();
        split.assert_invariants();
    }

    #[test]
    fn slicing_clips_spans() {
        let l = leaf(10, &[(0..3, 'a'), (5..8, 'b')]);
        let s = l.slice(2..6);

        assert_eq!(s.len, 4);
        assert_eq!(s.spans, vec![Span::new(0..1, 'a'), Span::new(3..4, 'b')]);
    }

    #[test]
    fn fixup_moves_the_first_piece() {
        let mut prev = leaf(4, &[(2..4, 'x')]);
        let mut next =
            leaf(9, &[(0..3, 'x'), (4..5, 'y'), (6..7, 'z'), (8..9, 'w')]);

        assert!(prev.needs_fixup(&next));
        prev.fixup(&mut next);

        assert_eq!(prev.len, 7);
        assert_eq!(prev.spans, vec![Span::new(2..7, 'x')]);
        assert_eq!(next.len, 6);
        assert_eq!(next.spans[0], Span::new(1..2, 'y'));
        assert!(!prev.needs_fixup(&next));
    }

    #[test]
    fn summaries_add_up() {
        let mut s = leaf(4, &[]).summarize();
        s += leaf(6, &[(1..2, 'a'), (3..5, 'b')]).summarize();
        s += leaf(3, &[]).summarize();
        s += leaf(5, &[(0..1, 'c')]).summarize();

        assert_eq!(s.len, 18);
        assert_eq!(s.count, 3);
        assert_eq!(s.covered, 5..14);
    }

    #[test]
    fn span_metric() {
        let l = leaf(10, &[(1..3, 'a'), (5..8, 'b')]);

        assert_eq!(SpanMetric::to_base_units(&l, SpanMetric(1)), 3);
        assert_eq!(SpanMetric::to_base_units(&l, SpanMetric(2)), 8);
        assert_eq!(SpanMetric::from_base_units(&l, 7), SpanMetric(1));
        assert_eq!(SpanMetric::from_base_units(&l, 8), SpanMetric(2));
        assert_eq!(SpanMetric::prev(&l, 8), Some(3));
        assert_eq!(SpanMetric::next(&l, 3), Some(8));
        assert_eq!(SpanMetric::next(&l, 8), None);
    }
}
