use std::fmt::Debug;
use std::ops::{Range, RangeBounds};

use super::{Iter, Span, SpanMetric, SpansBuilder, SpansLeaf};
use crate::range_bounds_to_start_end;
use crate::tree::Tree;

#[cfg(not(any(test, feature = "arity_4")))]
pub(crate) const SPANS_ARITY: usize = 8;

#[cfg(any(test, feature = "arity_4"))]
pub(crate) const SPANS_ARITY: usize = 4;

/// A sorted set of non-overlapping spans over `0..len()`, each tagged with a
/// value of type `T`.
///
/// There can be gaps between spans, and touching spans always carry
/// different values. Cloning is cheap since the underlying tree is shared
/// until it's edited.
#[derive(Clone)]
pub struct Spans<T: Debug + Clone + PartialEq> {
    pub(super) tree: Tree<SPANS_ARITY, SpansLeaf<T>>,
}

impl<T: Debug + Clone + PartialEq> Debug for Spans<T> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Spans({}) ", self.len())?;
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T: Debug + Clone + PartialEq> Default for Spans<T> {
    #[inline]
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: Debug + Clone + PartialEq> PartialEq for Spans<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Debug + Clone + PartialEq> Spans<T> {
    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();

        for leaf in self.tree.leaves() {
            leaf.assert_invariants();
        }
    }

    /// Returns the value of the span containing `offset`, if there is one.
    ///
    /// # Panics
    ///
    /// Panics if the offset is out of bounds (i.e. greater than
    /// [`len()`](Self::len())).
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::SpansBuilder;
    /// #
    /// let mut builder = SpansBuilder::new(10);
    /// builder.add("bold", 2..5);
    /// let spans = builder.build();
    ///
    /// assert_eq!(spans.data_at(1), None);
    /// assert_eq!(spans.data_at(2), Some(&"bold"));
    /// assert_eq!(spans.data_at(5), None);
    /// ```
    #[track_caller]
    #[inline]
    pub fn data_at(&self, offset: usize) -> Option<&T> {
        self.check_offset(offset);
        let (leaf, leaf_offset) = self.tree.leaf_at_offset(offset);
        leaf.span_containing(offset - leaf_offset).map(|span| &span.data)
    }

    #[track_caller]
    #[inline]
    fn check_offset(&self, offset: usize) {
        assert!(
            offset <= self.len(),
            "Offset out of bounds: the offset is {} but the length is {}",
            offset,
            self.len()
        );
    }

    /// Returns `true` if there are no spans.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.summary().count == 0
    }

    /// Returns an iterator over all the spans.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self, 0..self.len())
    }

    /// Returns an iterator over the spans overlapping the given range,
    /// clipped to it.
    ///
    /// # Panics
    ///
    /// Panics if the start is greater than the end or if the end is out of
    /// bounds (i.e. greater than [`len()`](Self::len())).
    #[track_caller]
    #[inline]
    pub fn iter_range<R>(&self, range: R) -> Iter<'_, T>
    where
        R: RangeBounds<usize>,
    {
        let (start, end) = range_bounds_to_start_end(range, 0, self.len());

        assert!(start <= end, "Start {start} is greater than end {end}");
        self.check_offset(end);

        Iter::new(self, start..end)
    }

    /// Returns the length of the space the spans live in, i.e. one past the
    /// largest offset a span could end at.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.base_len()
    }

    /// Merges `self` with `other` into a new `Spans` of the same length.
    ///
    /// The two sets are swept together, and `transform` is called once for
    /// every maximal interval where at least one of them has a span and
    /// neither changes value. No span is created where `transform` returns
    /// `None`.
    ///
    /// # Panics
    ///
    /// Panics if the two `Spans` have different lengths.
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::SpansBuilder;
    /// #
    /// let mut fonts = SpansBuilder::new(10);
    /// fonts.add("serif", 0..10);
    /// let fonts = fonts.build();
    ///
    /// let mut bold = SpansBuilder::new(10);
    /// bold.add(true, 3..6);
    /// let bold = bold.build();
    ///
    /// let styles = fonts.merging(&bold, |font, bold| {
    ///     Some((font.copied(), bold.copied().unwrap_or(false)))
    /// });
    ///
    /// assert_eq!(styles.data_at(2), Some(&(Some("serif"), false)));
    /// assert_eq!(styles.data_at(3), Some(&(Some("serif"), true)));
    /// assert_eq!(styles.data_at(6), Some(&(Some("serif"), false)));
    /// assert_eq!(styles.span_count(), 3);
    /// ```
    #[track_caller]
    pub fn merging<U, O, F>(&self, other: &Spans<U>, mut transform: F) -> Spans<O>
    where
        U: Debug + Clone + PartialEq,
        O: Debug + Clone + PartialEq,
        F: FnMut(Option<&T>, Option<&U>) -> Option<O>,
    {
        assert_eq!(
            self.len(),
            other.len(),
            "Can't merge spans of different lengths"
        );

        let mut builder = SpansBuilder::new(self.len());

        let mut left = self.iter().peekable();
        let mut right = other.iter().peekable();

        let mut pos = 0;

        loop {
            let l = left.peek().map(|(r, d)| (r.start.max(pos)..r.end, *d));
            let r = right.peek().map(|(r, d)| (r.start.max(pos)..r.end, *d));

            let start = match (&l, &r) {
                (None, None) => break,
                (Some((l, _)), None) => l.start,
                (None, Some((r, _))) => r.start,
                (Some((l, _)), Some((r, _))) => l.start.min(r.start),
            };

            // A side is active if its span has started, otherwise its start
            // bounds the interval.
            let mut end = usize::MAX;

            let l_data = match &l {
                Some((range, data)) if range.start == start => {
                    end = end.min(range.end);
                    Some(*data)
                },
                Some((range, _)) => {
                    end = end.min(range.start);
                    None
                },
                None => None,
            };

            let r_data = match &r {
                Some((range, data)) if range.start == start => {
                    end = end.min(range.end);
                    Some(*data)
                },
                Some((range, _)) => {
                    end = end.min(range.start);
                    None
                },
                None => None,
            };

            if let Some(value) = transform(l_data, r_data) {
                builder.add(value, start..end);
            }

            pos = end;

            if l.is_some_and(|(range, _)| range.end == pos) {
                left.next();
            }

            if r.is_some_and(|(range, _)| range.end == pos) {
                right.next();
            }
        }

        builder.build()
    }

    /// Creates a new `Spans` of the given length without any spans.
    #[inline]
    pub fn new(len: usize) -> Self {
        SpansBuilder::new(len).build()
    }

    /// Returns the span containing `offset`, if there is one.
    ///
    /// # Panics
    ///
    /// Panics if the offset is out of bounds (i.e. greater than
    /// [`len()`](Self::len())).
    #[track_caller]
    #[inline]
    pub fn span_at(&self, offset: usize) -> Option<Span<&T>> {
        self.check_offset(offset);

        let (leaf, leaf_offset) = self.tree.leaf_at_offset(offset);

        let span = leaf.span_containing(offset - leaf_offset)?;

        let mut start = leaf_offset + span.range.start;

        if span.range.start == 0 && leaf_offset > 0 {
            start = self.extend_backward(leaf_offset, start, &span.data);
        }

        let mut end = leaf_offset + span.range.end;

        if span.range.end == leaf.len && end < self.len() {
            end = self.extend_forward(end, &span.data);
        }

        Some(Span::new(start..end, &span.data))
    }

    /// Returns the number of spans.
    ///
    /// This walks the leaves of the tree to join spans stored in two pieces,
    /// so it's linear in the number of leaves.
    #[inline]
    pub fn span_count(&self) -> usize {
        let mut leaves = self.tree.leaves();

        let Some(mut prev) = leaves.next() else { return 0 };

        let mut joined = 0;

        for leaf in leaves {
            joined += prev.joins(leaf) as usize;
            prev = leaf;
        }

        let SpanMetric(pieces) = self.tree.measure::<SpanMetric>();

        pieces - joined
    }

    /// Returns the start of the span whose piece starts at `leaf_start`,
    /// walking back over the leaves it continues from.
    #[inline]
    fn extend_backward(&self, leaf_start: usize, start: usize, data: &T) -> usize {
        let mut start = start;
        let mut leaf_end = leaf_start;

        for leaf in self.tree.leaves_in_range(0..leaf_start).rev() {
            let leaf_begin = leaf_end - leaf.len;

            match leaf.spans.last() {
                Some(last)
                    if last.range.end == leaf.len && last.data == *data =>
                {
                    start = leaf_begin + last.range.start;

                    if last.range.start > 0 {
                        break;
                    }
                },
                _ => break,
            }

            leaf_end = leaf_begin;
        }

        start
    }

    /// Returns the end of the span whose piece ends at `leaf_end`, walking
    /// forward over the leaves it continues into.
    #[inline]
    fn extend_forward(&self, leaf_end: usize, data: &T) -> usize {
        let mut end = leaf_end;
        let mut leaf_start = leaf_end;

        for leaf in self.tree.leaves_in_range(leaf_end..self.len()) {
            match leaf.spans.first() {
                Some(first) if first.range.start == 0 && first.data == *data => {
                    end = leaf_start + first.range.end;

                    if first.range.end < leaf.len {
                        break;
                    }
                },
                _ => break,
            }

            leaf_start += leaf.len;
        }

        end
    }
}

impl<'a, T: Debug + Clone + PartialEq> IntoIterator for &'a Spans<T> {
    type Item = (Range<usize>, &'a T);
    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_of(len: usize, spans: &[(Range<usize>, u32)]) -> Spans<u32> {
        let mut builder = SpansBuilder::new(len);
        for (range, data) in spans {
            builder.add(*data, range.clone());
        }
        builder.build()
    }

    #[test]
    fn empty() {
        let spans = Spans::<u32>::new(0);
        spans.assert_invariants();
        assert_eq!(spans.len(), 0);
        assert_eq!(spans.span_count(), 0);
        assert_eq!(spans.data_at(0), None);
        assert_eq!(spans.iter().count(), 0);
    }

    #[test]
    fn lookups_across_many_leaves() {
        let ranges = (0..50usize)
            .map(|i| (i * 3..i * 3 + 2, i as u32))
            .collect::<Vec<_>>();
        let spans = spans_of(150, &ranges);

        spans.assert_invariants();
        assert!(spans.tree.leaf_count() > 1);
        assert_eq!(spans.span_count(), 50);

        for i in 0..50usize {
            assert_eq!(spans.data_at(i * 3), Some(&(i as u32)));
            assert_eq!(spans.data_at(i * 3 + 1), Some(&(i as u32)));
            assert_eq!(spans.data_at(i * 3 + 2), None);
        }

        let span = spans.span_at(31).unwrap();
        assert_eq!(span.range, 30..32);
        assert_eq!(span.data, &10);
    }

    #[test]
    fn iter_range_clips() {
        let spans = spans_of(20, &[(0..5, 1), (8..12, 2), (15..20, 3)]);

        let clipped = spans.iter_range(3..16).collect::<Vec<_>>();

        assert_eq!(clipped, vec![(3..5, &1), (8..12, &2), (15..16, &3)]);
    }

    #[test]
    fn merging_with_gaps() {
        let a = spans_of(10, &[(0..4, 1), (6..8, 2)]);
        let b = spans_of(10, &[(2..7, 10)]);

        let merged = a.merging(&b, |l, r| match (l, r) {
            (None, None) => None,
            (l, r) => Some(l.copied().unwrap_or(0) + r.copied().unwrap_or(0)),
        });

        merged.assert_invariants();

        let got = merged.iter().map(|(r, d)| (r, *d)).collect::<Vec<_>>();

        assert_eq!(
            got,
            vec![(0..2, 1), (2..4, 11), (4..6, 10), (6..7, 12), (7..8, 2)]
        );
    }

    #[test]
    fn merging_can_drop_spans() {
        let a = spans_of(6, &[(0..6, 1)]);
        let b = spans_of(6, &[(2..4, 2)]);

        let merged = a.merging(&b, |l, r| if r.is_some() { None } else { l.copied() });

        let got = merged.iter().map(|(r, d)| (r, *d)).collect::<Vec<_>>();
        assert_eq!(got, vec![(0..2, 1), (4..6, 1)]);
    }
}
