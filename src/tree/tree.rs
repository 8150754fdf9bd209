use std::ops::Range;
use std::sync::Arc;

use super::*;

/// A persistent self-balancing tree with metadata stored in each node.
///
/// Cloning a `Tree` is `O(1)`: the two copies share all their nodes until
/// one of them is edited, at which point only the nodes on the paths to the
/// edited leaves are cloned.
pub struct Tree<const N: usize, L: Leaf> {
    pub(super) root: Arc<Node<N, L>>,
}

impl<const N: usize, L: Leaf> Clone for Tree<N, L> {
    #[inline]
    fn clone(&self) -> Self {
        Tree { root: Arc::clone(&self.root) }
    }
}

impl<const N: usize, L: Leaf> Default for Tree<N, L> {
    #[inline]
    fn default() -> Self {
        Tree { root: Arc::new(Node::default()) }
    }
}

impl<const N: usize, L: Leaf> std::fmt::Debug for Tree<N, L> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if !f.alternate() {
            f.debug_struct("Tree").field("root", &self.root).finish()
        } else {
            write!(f, "{:#?}", self.root)
        }
    }
}

impl<const N: usize, L: Leaf> From<L> for Tree<N, L> {
    #[inline]
    fn from(leaf: L) -> Self {
        Self::from_leaves(std::iter::once(leaf))
    }
}

impl<const N: usize, L: Leaf> Tree<N, L> {
    /// Appends `other` to the end of this tree.
    #[inline]
    pub fn append(&mut self, other: &Self) {
        let mut builder = TreeBuilder::new();
        builder.push(self);
        builder.push(other);
        *self = builder.build();
    }

    /// Returns a new tree obtained by applying `delta` to this one.
    ///
    /// # Panics
    ///
    /// Panics if the delta wasn't created for a tree of this length.
    #[track_caller]
    #[inline]
    pub fn applying(&self, delta: &Delta<N, L>) -> Self {
        assert_eq!(
            delta.base_len(),
            self.base_len(),
            "the delta was built for a tree of a different length"
        );

        let mut builder = TreeBuilder::new();

        for element in delta.elements() {
            match element {
                DeltaElement::Copy(start, end) => {
                    builder.push_slice(self, *start..*end)
                },
                DeltaElement::Insert(tree) => builder.push(tree),
            }
        }

        builder.build()
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.root.assert_invariants(true);

        if L::NEEDS_FIXUP_ON_APPEND {
            let mut leaves = self.leaves();

            let Some(mut prev) = leaves.next() else { return };

            assert!(
                !L::default().needs_fixup(prev),
                "The first leaf is out of sync with the start of the tree"
            );

            for next in leaves {
                assert!(
                    !prev.needs_fixup(next),
                    "Two adjacent leaves are out of sync: {prev:?} and \
                     {next:?}"
                );
                prev = next;
            }

            assert!(
                !prev.needs_fixup(&L::default()),
                "The last leaf is out of sync with the end of the tree"
            );
        }
    }

    /// Returns the length of the tree in base units.
    #[inline]
    pub fn base_len(&self) -> usize {
        self.root.base_len()
    }

    /// Returns the offset in base units of the `m`-th boundary of the `M`
    /// metric.
    ///
    /// NOTE: doesn't do bounds checks.
    #[inline]
    pub fn base_units<M: Metric<L>>(&self, m: M) -> usize {
        let BaseMetric(offset) = self.root.convert::<M, BaseMetric>(m);
        offset
    }

    /// Converts `m1` into the `M2` metric. See [`Metric`] for the meaning of
    /// the conversion.
    ///
    /// NOTE: doesn't do bounds checks.
    #[inline]
    pub fn convert<M1: Metric<L>, M2: Metric<L>>(&self, m1: M1) -> M2 {
        self.root.convert(m1)
    }

    /// Returns the number of boundaries of the `M` metric in
    /// `(0, up_through]`.
    ///
    /// NOTE: doesn't do bounds checks.
    #[inline]
    pub fn count<M: Metric<L>>(&self, up_through: usize) -> M {
        self.root.convert(BaseMetric(up_through))
    }

    /// Returns the number of boundaries of the `M` metric between `start`
    /// and `end`.
    ///
    /// # Panics
    ///
    /// Panics if `start > end` or if `end` is out of bounds.
    #[track_caller]
    #[inline]
    pub fn distance<M: Metric<L>>(&self, start: usize, end: usize) -> M {
        assert!(start <= end, "start {start} is greater than end {end}");
        self.check_bounds(end);
        self.count::<M>(end) - self.count::<M>(start)
    }

    #[track_caller]
    #[inline]
    fn check_bounds(&self, offset: usize) {
        assert!(
            offset <= self.base_len(),
            "offset out of bounds: the offset is {} but the length is {}",
            offset,
            self.base_len()
        );
    }

    /// Creates a new tree from a sequence of leaves.
    ///
    /// NOTE: if the iterator doesn't yield any non-empty leaves the tree
    /// will contain a single leaf with its default value.
    #[inline]
    pub fn from_leaves<I>(leaves: I) -> Self
    where
        I: IntoIterator<Item = L>,
    {
        let mut builder = TreeBuilder::new();

        for leaf in leaves {
            builder.push_leaf(leaf);
        }

        builder.build()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.root.height()
    }

    /// Returns the first boundary of the `M` metric after `position`.
    #[track_caller]
    #[inline]
    pub fn index_after<M: Metric<L>>(&self, position: usize) -> Option<usize> {
        self.index_at(position).next::<M>()
    }

    /// Returns an [`Index`] at the given position.
    ///
    /// # Panics
    ///
    /// Panics if `position` is out of bounds.
    #[track_caller]
    #[inline]
    pub fn index_at(&self, position: usize) -> Index<N, L> {
        self.check_bounds(position);
        Index::new(Arc::clone(&self.root), position)
    }

    /// Returns the last boundary of the `M` metric before `position`.
    #[track_caller]
    #[inline]
    pub fn index_before<M: Metric<L>>(&self, position: usize) -> Option<usize> {
        self.index_at(position).prev::<M>()
    }

    /// Returns the position `delta` boundaries of the `M` metric away from
    /// `position`, clamped to the first and last boundaries of the tree.
    ///
    /// If `position` isn't a boundary itself, it's first rounded down to the
    /// previous one.
    #[track_caller]
    #[inline]
    pub fn index_offset_by<M>(&self, position: usize, delta: isize) -> usize
    where
        M: Metric<L> + From<usize> + Into<usize>,
    {
        self.check_bounds(position);
        let here: usize = self.count::<M>(position).into();
        let total: usize = self.measure::<M>().into();
        let target = here.saturating_add_signed(delta).min(total);
        self.base_units(M::from(target))
    }

    /// Like [`index_offset_by()`](Self::index_offset_by) but returns `None`
    /// instead of clamping when the target is out of bounds.
    #[track_caller]
    #[inline]
    pub fn index_offset_by_limited<M>(
        &self,
        position: usize,
        delta: isize,
    ) -> Option<usize>
    where
        M: Metric<L> + From<usize> + Into<usize>,
    {
        self.check_bounds(position);
        let here: usize = self.count::<M>(position).into();
        let total: usize = self.measure::<M>().into();
        let target = here.checked_add_signed(delta).filter(|&t| t <= total)?;
        Some(self.base_units(M::from(target)))
    }

    /// Returns `position` if it's a boundary of the `M` metric, or the last
    /// boundary before it otherwise (or `0` if there isn't one).
    #[track_caller]
    #[inline]
    pub fn index_rounding_down<M: Metric<L>>(&self, position: usize) -> usize {
        let mut index = self.index_at(position);

        if index.is_boundary::<M>() {
            return position;
        }

        index.prev::<M>().unwrap_or(0)
    }

    /// Returns whether `position` is a boundary of the `M` metric.
    #[track_caller]
    #[inline]
    pub fn is_boundary<M: Metric<L>>(&self, position: usize) -> bool {
        self.index_at(position).is_boundary::<M>()
    }

    /// Returns the leaf containing the given offset, plus the offset of its
    /// start. An offset between two leaves is in the second one.
    ///
    /// NOTE: doesn't do bounds checks.
    #[inline]
    pub fn leaf_at_offset(&self, offset: usize) -> (&L, usize) {
        self.root.leaf_at_offset(offset)
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Returns an iterator over the leaves of this tree.
    #[inline]
    pub fn leaves(&self) -> Leaves<'_, N, L> {
        Leaves::from(self)
    }

    /// Returns an iterator over the leaves overlapping the given range of
    /// base units.
    ///
    /// # Panics
    ///
    /// Panics if the range is inverted or out of bounds.
    #[track_caller]
    #[inline]
    pub fn leaves_in_range(&self, range: Range<usize>) -> Leaves<'_, N, L> {
        assert!(
            range.start <= range.end,
            "start {} is greater than end {}",
            range.start,
            range.end
        );
        self.check_bounds(range.end);
        Leaves::in_range(self, range)
    }

    #[inline]
    pub fn measure<M: Metric<L>>(&self) -> M {
        self.root.measure()
    }

    /// Returns the mutation count of the root.
    #[inline]
    pub fn mutation_count(&self) -> u64 {
        self.root.mutation_count()
    }

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new tree with the contents in the given range of base
    /// units. The subtrees fully contained in the range are shared with
    /// this tree.
    ///
    /// # Panics
    ///
    /// Panics if the range is inverted or out of bounds.
    #[track_caller]
    #[inline]
    pub fn slice(&self, range: Range<usize>) -> Self {
        assert!(
            range.start <= range.end,
            "start {} is greater than end {}",
            range.start,
            range.end
        );

        self.check_bounds(range.end);

        let mut builder = TreeBuilder::new();
        builder.push_slice(self, range);
        builder.build()
    }

    #[inline]
    pub fn summary(&self) -> &L::Summary {
        self.root.summary()
    }

    /// Calls the closure with the leaf containing `offset` (with the same
    /// bias as [`leaf_at_offset()`](Self::leaf_at_offset)) and the offset of
    /// its start, then updates the tree's metadata.
    ///
    /// The closure must not change the length of the leaf nor make it
    /// undersized.
    #[inline]
    pub fn with_leaf_at_offset_mut<F, T>(&mut self, offset: usize, fun: F) -> T
    where
        F: FnOnce(&mut L, usize) -> T,
    {
        let (_, leaf_offset) = self.root.leaf_at_offset(offset);

        Node::with_leaf_at_offset_mut(&mut self.root, offset, |leaf| {
            let old_len = leaf.base_len();
            let ret = fun(leaf, leaf_offset);
            debug_assert_eq!(
                old_len,
                leaf.base_len(),
                "The length of a leaf changed in place. This is a logic bug \
                 in braid."
            );
            ret
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::test_leaf::{Bytes, ZeroMetric};

    fn tree(bytes: &[u8]) -> Tree<4, Bytes> {
        Tree::from_leaves(bytes.chunks(2).map(Bytes::from))
    }

    #[test]
    fn empty() {
        let tree = Tree::<4, Bytes>::new();
        assert_eq!(tree.base_len(), 0);
        assert_eq!(tree.leaves().count(), 0);
        assert_eq!(tree.count::<ZeroMetric>(0), ZeroMetric(0));
        tree.assert_invariants();
    }

    #[test]
    fn conversions() {
        let bytes = [0, 1, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1, 1, 1, 0, 1, 1];
        let tree = tree(&bytes);

        for up_through in 0..=bytes.len() {
            let zeros = bytes[..up_through].iter().filter(|&&b| b == 0).count();
            assert_eq!(tree.count::<ZeroMetric>(up_through), ZeroMetric(zeros));
        }

        let mut zeros = 0;
        for (idx, &byte) in bytes.iter().enumerate() {
            if byte == 0 {
                zeros += 1;
                assert_eq!(tree.base_units(ZeroMetric(zeros)), idx + 1);
            }
        }

        assert_eq!(tree.base_units(ZeroMetric(0)), 0);
        assert_eq!(tree.convert::<ZeroMetric, ZeroMetric>(ZeroMetric(3)), ZeroMetric(3));
    }

    #[test]
    fn offset_by() {
        let bytes = [1, 0, 1, 1, 0, 1, 0, 1, 1];
        let tree = tree(&bytes);

        assert_eq!(tree.index_offset_by::<ZeroMetric>(0, 1), 2);
        assert_eq!(tree.index_offset_by::<ZeroMetric>(3, 1), 5);
        assert_eq!(tree.index_offset_by::<ZeroMetric>(3, -1), 0);
        assert_eq!(tree.index_offset_by::<ZeroMetric>(3, 10), 7);
        assert_eq!(tree.index_offset_by_limited::<ZeroMetric>(3, 10), None);
        assert_eq!(tree.index_offset_by_limited::<ZeroMetric>(3, -2), None);
        assert_eq!(tree.index_offset_by_limited::<ZeroMetric>(9, -2), Some(2));
        assert_eq!(tree.distance::<ZeroMetric>(1, 9), ZeroMetric(3));
    }

    #[test]
    fn slice_shares_nodes() {
        let bytes = (0..=255u8).cycle().take(1000).collect::<Vec<_>>();
        let tree = tree(&bytes);

        let full = tree.slice(0..1000);
        assert!(Arc::ptr_eq(&tree.root, &full.root));

        for (start, end) in [(0, 1), (10, 990), (333, 334), (999, 1000)] {
            let slice = tree.slice(start..end);
            slice.assert_invariants();
            assert_eq!(slice.to_vec(), &bytes[start..end]);
        }
    }

    #[test]
    fn append() {
        let mut left = tree(&[1; 7]);
        let right = tree(&[2; 300]);
        left.append(&right);
        left.assert_invariants();
        assert_eq!(left.base_len(), 307);
        assert_eq!(&left.to_vec()[5..9], &[1, 1, 2, 2]);
    }

    #[test]
    fn copy_on_write() {
        let bytes = (0..100u8).collect::<Vec<_>>();
        let original = tree(&bytes);
        let mut edited = original.clone();

        edited.with_leaf_at_offset_mut(50, |leaf, offset| {
            leaf.set(50 - offset, 0);
        });

        assert_eq!(original.to_vec(), bytes);
        assert_eq!(edited.to_vec()[50], 0);
        assert_eq!(edited.measure::<ZeroMetric>(), ZeroMetric(2));
        assert!(!Arc::ptr_eq(&original.root, &edited.root));
    }

    #[test]
    #[should_panic(expected = "offset out of bounds")]
    fn index_out_of_bounds() {
        tree(&[1, 2, 3]).index_at(4);
    }
}
