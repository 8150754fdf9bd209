use std::ops::Range;

use super::{Leaf, Tree};

/// A single element of a [`Delta`].
#[derive(Clone)]
pub enum DeltaElement<const N: usize, L: Leaf> {
    /// Copies the given range of the base tree.
    Copy(usize, usize),

    /// Inserts the given tree.
    Insert(Tree<N, L>),
}

impl<const N: usize, L: Leaf> std::fmt::Debug for DeltaElement<N, L> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Copy(start, end) => write!(f, "Copy({start}..{end})"),
            Self::Insert(tree) => write!(f, "Insert({})", tree.base_len()),
        }
    }
}

/// The shape of a [`DeltaElement`], without the inserted content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaRegion {
    /// A range of the base tree that's kept.
    Copy(Range<usize>),

    /// New content of the given length.
    Insert(usize),
}

/// A description of an edit as a sequence of ranges copied from a base tree
/// interleaved with new content.
///
/// # Invariants
///
/// - the copied ranges are strictly increasing and non-overlapping;
///
/// - there are never two consecutive `Copy`s that could be joined into one,
/// nor any empty `Copy`s or `Insert`s.
#[derive(Clone)]
pub struct Delta<const N: usize, L: Leaf> {
    elements: Vec<DeltaElement<N, L>>,
    base_len: usize,
}

impl<const N: usize, L: Leaf> std::fmt::Debug for Delta<N, L> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Delta")
            .field("elements", &self.elements)
            .field("base_len", &self.base_len)
            .finish()
    }
}

impl<const N: usize, L: Leaf> Delta<N, L> {
    /// The length of the tree this delta applies to.
    #[inline]
    pub fn base_len(&self) -> usize {
        self.base_len
    }

    #[inline]
    pub fn elements(&self) -> &[DeltaElement<N, L>] {
        &self.elements
    }

    /// Returns `true` if applying this delta leaves the base tree unchanged.
    #[inline]
    pub fn is_empty(&self) -> bool {
        match self.elements.as_slice() {
            [] => self.base_len == 0,
            [DeltaElement::Copy(0, end)] => *end == self.base_len,
            _ => false,
        }
    }

    /// The length of the tree produced by applying this delta.
    #[inline]
    pub fn new_len(&self) -> usize {
        self.elements
            .iter()
            .map(|el| match el {
                DeltaElement::Copy(start, end) => end - start,
                DeltaElement::Insert(tree) => tree.base_len(),
            })
            .sum()
    }

    /// Returns the shapes of the elements of this delta.
    #[inline]
    pub fn regions(&self) -> impl Iterator<Item = DeltaRegion> + '_ {
        self.elements.iter().map(|el| match el {
            DeltaElement::Copy(start, end) => DeltaRegion::Copy(*start..*end),
            DeltaElement::Insert(tree) => DeltaRegion::Insert(tree.base_len()),
        })
    }

    /// Returns the range of the base tree that was replaced, and the length
    /// of the content it was replaced with.
    ///
    /// The copies at the start and at the end of the delta are excluded, so
    /// a delta that doesn't change anything reports an empty range at the
    /// end of the base tree and no new content.
    #[inline]
    pub fn summary(&self) -> (Range<usize>, usize) {
        let mut elements = self.elements.as_slice();

        let mut start = 0;

        if let [DeltaElement::Copy(0, end), rest @ ..] = elements {
            start = *end;
            elements = rest;
        }

        let mut end = self.base_len;

        if let [rest @ .., DeltaElement::Copy(copy_start, copy_end)] = elements {
            if *copy_end == self.base_len {
                end = *copy_start;
                elements = rest;
            }
        }

        let new_len = elements
            .iter()
            .map(|el| match el {
                DeltaElement::Copy(start, end) => end - start,
                DeltaElement::Insert(tree) => tree.base_len(),
            })
            .sum();

        (start..end, new_len)
    }
}

/// Builds a [`Delta`] from a sequence of non-overlapping edits in increasing
/// order.
pub struct DeltaBuilder<const N: usize, L: Leaf> {
    delta: Delta<N, L>,

    /// The offset in the base tree up to which edits have been added.
    last_offset: usize,
}

impl<const N: usize, L: Leaf> DeltaBuilder<N, L> {
    /// Finishes the delta, copying the rest of the base tree.
    #[inline]
    pub fn build(mut self) -> Delta<N, L> {
        let base_len = self.delta.base_len;
        self.push_copy(self.last_offset, base_len);
        self.delta
    }

    /// Deletes the given range of the base tree.
    ///
    /// # Panics
    ///
    /// Panics if the range starts before the end of the previous edit or
    /// ends past the end of the base tree.
    #[track_caller]
    #[inline]
    pub fn delete(&mut self, range: Range<usize>) {
        self.replace(range, Tree::default());
    }

    #[inline]
    pub fn new(base_len: usize) -> Self {
        Self { delta: Delta { elements: Vec::new(), base_len }, last_offset: 0 }
    }

    #[inline]
    fn push_copy(&mut self, start: usize, end: usize) {
        if start == end {
            return;
        }

        if let Some(DeltaElement::Copy(_, last_end)) =
            self.delta.elements.last_mut()
        {
            if *last_end == start {
                *last_end = end;
                return;
            }
        }

        self.delta.elements.push(DeltaElement::Copy(start, end));
    }

    /// Replaces the given range of the base tree with `tree`.
    ///
    /// # Panics
    ///
    /// Panics if the range starts before the end of the previous edit or
    /// ends past the end of the base tree.
    #[track_caller]
    #[inline]
    pub fn replace(&mut self, range: Range<usize>, tree: Tree<N, L>) {
        assert!(
            self.last_offset <= range.start,
            "edits must be added in order: the previous edit ended at {} but \
             this one starts at {}",
            self.last_offset,
            range.start
        );

        assert!(
            range.start <= range.end && range.end <= self.delta.base_len,
            "invalid edit range {:?} for a base of length {}",
            range,
            self.delta.base_len
        );

        self.push_copy(self.last_offset, range.start);

        if tree.base_len() > 0 {
            self.delta.elements.push(DeltaElement::Insert(tree));
        }

        self.last_offset = range.end;
    }
}
