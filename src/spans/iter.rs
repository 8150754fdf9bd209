use std::fmt::Debug;
use std::ops::Range;

use super::spans::SPANS_ARITY;
use super::{Span, Spans, SpansLeaf};
use crate::tree::Leaves;

/// An iterator over the spans of a [`Spans`], yielding each span's range
/// and a reference to its data.
///
/// This struct is created by the [`iter`](Spans::iter) and
/// [`iter_range`](Spans::iter_range) methods on [`Spans`]. Spans are clipped
/// to the iterated range.
pub struct Iter<'a, T: Debug + Clone + PartialEq> {
    leaves: Leaves<'a, SPANS_ARITY, SpansLeaf<T>>,

    /// The spans of the current leaf we haven't looked at yet.
    current: &'a [Span<T>],

    /// The offset of the start of the current leaf.
    leaf_offset: usize,

    /// The offset of the start of the next leaf.
    next_leaf_offset: usize,

    range: Range<usize>,

    /// A piece read while looking for the end of the last yielded span.
    pending: Option<(Range<usize>, &'a T)>,
}

impl<T: Debug + Clone + PartialEq> Clone for Iter<'_, T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            leaves: self.leaves.clone(),
            current: self.current,
            leaf_offset: self.leaf_offset,
            next_leaf_offset: self.next_leaf_offset,
            range: self.range.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<'a, T: Debug + Clone + PartialEq> Iter<'a, T> {
    #[inline]
    pub(super) fn new(spans: &'a Spans<T>, range: Range<usize>) -> Self {
        let first_leaf_offset = if range.is_empty() {
            0
        } else {
            spans.tree.leaf_at_offset(range.start).1
        };

        Self {
            leaves: spans.tree.leaves_in_range(range.clone()),
            current: &[],
            leaf_offset: first_leaf_offset,
            next_leaf_offset: first_leaf_offset,
            range,
            pending: None,
        }
    }

    /// Returns the next piece of a span, clipped to the iterated range.
    #[inline]
    fn next_piece(&mut self) -> Option<(Range<usize>, &'a T)> {
        loop {
            if let Some((span, rest)) = self.current.split_first() {
                self.current = rest;

                let start = (self.leaf_offset + span.range.start)
                    .max(self.range.start);

                let end =
                    (self.leaf_offset + span.range.end).min(self.range.end);

                if start < end {
                    return Some((start..end, &span.data));
                }

                continue;
            }

            let leaf = self.leaves.next()?;
            self.leaf_offset = self.next_leaf_offset;
            self.next_leaf_offset += leaf.len;
            self.current = &leaf.spans;
        }
    }
}

impl<'a, T: Debug + Clone + PartialEq> Iterator for Iter<'a, T> {
    type Item = (Range<usize>, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (mut range, data) =
            self.pending.take().or_else(|| self.next_piece())?;

        while let Some((next_range, next_data)) = self.next_piece() {
            if next_range.start == range.end && next_data == data {
                range.end = next_range.end;
            } else {
                self.pending = Some((next_range, next_data));
                break;
            }
        }

        Some((range, data))
    }
}

impl<T: Debug + Clone + PartialEq> std::iter::FusedIterator for Iter<'_, T> {}
