use std::fmt::Debug;
use std::ops::Range;

use super::{Span, Spans, SpansLeaf};
use crate::tree::{Delta, DeltaRegion, Leaf, TreeBuilder};

/// A cache of values computed for ranges of a document, which stays valid
/// as the document is edited.
///
/// Every cached value covers a span. Edits invalidate the spans they touch
/// and shift the ones after them, so that a value is only ever returned for
/// content that hasn't changed since it was computed.
///
/// # Examples
///
/// ```
/// # use braid::{IntervalCache, Rope};
/// #
/// let mut rope = Rope::from("foo\nbar\nbaz\n");
///
/// let mut widths = IntervalCache::new(rope.byte_len());
/// widths.set(3, 0..4);
/// widths.set(3, 8..12);
///
/// let delta = rope.replace(4..7, "quux");
/// widths.invalidate_delta(&delta);
///
/// assert_eq!(widths.len(), rope.byte_len());
/// assert_eq!(widths.get(0), Some(&3));
/// assert_eq!(widths.get(5), None);
/// assert_eq!(widths.get(9), Some(&3));
/// ```
#[derive(Clone, PartialEq)]
pub struct IntervalCache<T: Debug + Clone + PartialEq> {
    spans: Spans<T>,
}

impl<T: Debug + Clone + PartialEq> Debug for IntervalCache<T> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("IntervalCache").field(&self.spans).finish()
    }
}

impl<T: Debug + Clone + PartialEq> Default for IntervalCache<T> {
    #[inline]
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: Debug + Clone + PartialEq> From<Spans<T>> for IntervalCache<T> {
    #[inline]
    fn from(spans: Spans<T>) -> Self {
        Self { spans }
    }
}

impl<T: Debug + Clone + PartialEq> IntervalCache<T> {
    /// Returns the cached value covering `offset`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the offset is out of bounds (i.e. greater than
    /// [`len()`](Self::len())).
    #[track_caller]
    #[inline]
    pub fn get(&self, offset: usize) -> Option<&T> {
        self.spans.data_at(offset)
    }

    /// Drops every cached value whose span overlaps `range`. An empty range
    /// overlaps the span containing its start.
    ///
    /// # Panics
    ///
    /// Panics if the start is greater than the end or if the end is out of
    /// bounds (i.e. greater than [`len()`](Self::len())).
    #[track_caller]
    #[inline]
    pub fn invalidate(&mut self, range: Range<usize>) {
        self.check_range(&range);

        let start = self
            .spans
            .span_at(range.start)
            .map_or(range.start, |span| span.range.start);

        let end = if range.is_empty() {
            range.end.max(
                self.spans
                    .span_at(range.start)
                    .map_or(range.end, |span| span.range.end),
            )
        } else {
            self.spans
                .span_at(range.end - 1)
                .map_or(range.end, |span| span.range.end)
        };

        if start == end {
            return;
        }

        tracing::trace!(?range, expanded = ?(start..end), "invalidating");

        let tree = &self.spans.tree;

        let mut builder = TreeBuilder::new();
        builder.push_slice(tree, 0..start);
        builder.push_leaf(gap(end - start));
        builder.push_slice(tree, end..tree.base_len());

        self.spans = Spans { tree: builder.build() };
    }

    /// Updates the cache after an edit described by `delta`, whose base
    /// must be as long as the cache.
    ///
    /// A span survives only if it lies entirely inside a range the delta
    /// copies, in which case it's moved to where that range ends up. Spans
    /// partially overlapping a copied range are dropped, and inserted
    /// regions start out uncached. The cache then has the length of the
    /// edited document.
    ///
    /// # Panics
    ///
    /// Panics if the delta's base length is different from the length of
    /// the cache.
    #[track_caller]
    pub fn invalidate_delta<const N: usize, L: Leaf>(
        &mut self,
        delta: &Delta<N, L>,
    ) {
        assert_eq!(
            delta.base_len(),
            self.len(),
            "The delta was computed on a document of different length"
        );

        let tree = &self.spans.tree;

        let mut builder = TreeBuilder::new();

        let mut dropped = 0;

        for region in delta.regions() {
            match region {
                DeltaRegion::Copy(range) => {
                    let inner = self.inner_range(range.clone());

                    if inner.start > range.start || inner.end < range.end {
                        dropped += 1;
                    }

                    builder.push_leaf(gap(inner.start - range.start));
                    builder.push_slice(tree, inner.clone());
                    builder.push_leaf(gap(range.end - inner.end));
                },

                DeltaRegion::Insert(len) => builder.push_leaf(gap(len)),
            }
        }

        let spans = Spans { tree: builder.build() };

        tracing::debug!(
            old_len = self.len(),
            new_len = spans.len(),
            partially_copied_regions = dropped,
            "invalidated cache through delta"
        );

        debug_assert_eq!(spans.len(), delta.new_len());

        self.spans = spans;
    }

    /// Returns the largest range inside `range` whose ends don't cut
    /// through a span.
    #[inline]
    fn inner_range(&self, range: Range<usize>) -> Range<usize> {
        if range.is_empty() {
            return range;
        }

        let start = match self.spans.span_at(range.start) {
            Some(Span { range: span, .. }) if span.start < range.start => {
                span.end.min(range.end)
            },
            _ => range.start,
        };

        let end = match self.spans.span_at(range.end - 1) {
            Some(Span { range: span, .. }) if span.end > range.end => {
                span.start.max(start)
            },
            _ => range.end,
        };

        start..end.max(start)
    }

    /// Returns `true` if the cache has length zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the length of the document the cache covers.
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Creates an empty cache for a document of length `len`.
    #[inline]
    pub fn new(len: usize) -> Self {
        Self { spans: Spans::new(len) }
    }

    /// Caches `value` for `range`, replacing whatever was cached there.
    /// Spans partially covered by the range keep the parts outside of it.
    ///
    /// # Panics
    ///
    /// Panics if the start is greater than the end or if the end is out of
    /// bounds (i.e. greater than [`len()`](Self::len())).
    #[track_caller]
    #[inline]
    pub fn set(&mut self, value: T, range: Range<usize>) {
        self.check_range(&range);

        if range.is_empty() {
            return;
        }

        let tree = &self.spans.tree;

        let leaf = SpansLeaf {
            len: range.len(),
            spans: vec![Span::new(0..range.len(), value)],
        };

        let mut builder = TreeBuilder::new();
        builder.push_slice(tree, 0..range.start);
        builder.push_leaf(leaf);
        builder.push_slice(tree, range.end..tree.base_len());

        self.spans = Spans { tree: builder.build() };
    }

    /// Returns the cached spans.
    #[inline]
    pub fn spans(&self) -> &Spans<T> {
        &self.spans
    }

    #[track_caller]
    #[inline]
    fn check_range(&self, range: &Range<usize>) {
        assert!(
            range.start <= range.end && range.end <= self.len(),
            "Invalid range {:?} for a cache of length {}",
            range,
            self.len()
        );
    }
}

/// A leaf with nothing cached in it.
#[inline]
fn gap<T>(len: usize) -> SpansLeaf<T> {
    SpansLeaf { len, spans: Vec::new() }
}
