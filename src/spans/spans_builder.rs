use std::fmt::Debug;
use std::ops::Range;

use super::spans::SPANS_ARITY;
use super::spans_leaf::MAX_SPANS;
use super::{Span, Spans, SpansLeaf};
use crate::tree::TreeBuilder;

/// An incremental [`Spans`] builder.
///
/// Spans have to be added in order, and a span added right after an equal
/// one is merged into it.
///
/// # Examples
///
/// ```
/// # use braid::SpansBuilder;
/// #
/// let mut builder = SpansBuilder::new(12);
///
/// builder.add('a', 0..3).add('a', 3..5).add('b', 8..10);
///
/// let spans = builder.build();
///
/// assert_eq!(spans.span_count(), 2);
/// assert_eq!(spans.span_at(4).unwrap().range, 0..5);
/// assert_eq!(spans.len(), 12);
/// ```
pub struct SpansBuilder<T: Debug + Clone + PartialEq> {
    tree_builder: TreeBuilder<SPANS_ARITY, SpansLeaf<T>>,

    /// The leaf being filled. Its spans are relative to `leaf_offset`, and
    /// its length is only set when it's pushed.
    leaf: SpansLeaf<T>,

    leaf_offset: usize,

    len: usize,
}

impl<T: Debug + Clone + PartialEq> SpansBuilder<T> {
    /// Adds a span with the given value.
    ///
    /// Empty ranges are ignored. If the range ends past the length the
    /// builder was created with, the length grows to fit it.
    ///
    /// # Panics
    ///
    /// Panics if the range starts before the end of the last added span.
    #[track_caller]
    #[inline]
    pub fn add(&mut self, data: T, range: Range<usize>) -> &mut Self {
        let last_end =
            self.leaf.spans.last().map_or(self.leaf_offset, |last| {
                self.leaf_offset + last.range.end
            });

        assert!(
            range.start >= last_end,
            "Spans must be added in order: {range:?} starts before the end \
             of the previous span at {last_end}"
        );

        if range.is_empty() {
            return self;
        }

        self.len = self.len.max(range.end);

        if let Some(last) = self.leaf.spans.last_mut() {
            if last_end == range.start && last.data == data {
                last.range.end = range.end - self.leaf_offset;
                return self;
            }
        }

        if self.leaf.spans.len() == MAX_SPANS {
            let mut leaf = std::mem::take(&mut self.leaf);
            leaf.len = range.start - self.leaf_offset;
            self.tree_builder.push_leaf(leaf);
            self.leaf_offset = range.start;
        }

        self.leaf.spans.push(Span::new(
            range.start - self.leaf_offset..range.end - self.leaf_offset,
            data,
        ));

        self
    }

    #[inline]
    pub fn build(mut self) -> Spans<T> {
        self.leaf.len = self.len - self.leaf_offset;
        self.tree_builder.push_leaf(self.leaf);
        Spans { tree: self.tree_builder.build() }
    }

    /// Creates a new builder for a `Spans` of length `len`.
    #[inline]
    pub fn new(len: usize) -> Self {
        Self {
            tree_builder: TreeBuilder::new(),
            leaf: SpansLeaf::default(),
            leaf_offset: 0,
            len,
        }
    }
}
