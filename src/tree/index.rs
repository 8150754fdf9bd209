use std::sync::Arc;

use super::{Leaf, Metric, MetricKind, Node, Tree};

/// The reasons an [`Index`] can't be used with a given [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("the index was created on a different version of the tree")]
    Stale,

    #[error("the index is at offset {position} but the tree is only {len} long")]
    OutOfBounds { position: usize, len: usize },
}

/// A cursor at a position in a specific version of a [`Tree`].
///
/// An index holds on to the tree version it was created from, so creating
/// one is `O(log n)` and moving it to the next or previous boundary of a
/// metric is amortized `O(1)`. Editing the tree after creating an index
/// produces a new version, and using the index with it is an error.
pub struct Index<const N: usize, L: Leaf> {
    /// The root of the tree version this index was created on.
    root: Arc<Node<N, L>>,

    /// The root's mutation count at creation time.
    mutation_count: u64,

    /// The position of the index in base units.
    position: usize,

    /// The internal nodes from the root down to the parent of the current
    /// leaf, each paired with the index of the child we're in.
    path: Vec<(Arc<Node<N, L>>, usize)>,

    /// The leaf containing `position`.
    leaf: Arc<Node<N, L>>,

    /// The offset of the start of `leaf` in base units.
    offset_of_leaf: usize,
}

impl<const N: usize, L: Leaf> Clone for Index<N, L> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            mutation_count: self.mutation_count,
            position: self.position,
            path: self.path.clone(),
            leaf: Arc::clone(&self.leaf),
            offset_of_leaf: self.offset_of_leaf,
        }
    }
}

impl<const N: usize, L: Leaf> std::fmt::Debug for Index<N, L> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("position", &self.position)
            .field("offset_of_leaf", &self.offset_of_leaf)
            .field("depth", &self.path.len())
            .finish()
    }
}

impl<const N: usize, L: Leaf> Index<N, L> {
    /// Returns an error if this index can't be used with `tree`.
    #[inline]
    pub fn check(&self, tree: &Tree<N, L>) -> Result<(), IndexError> {
        if self.position > tree.base_len() {
            return Err(IndexError::OutOfBounds {
                position: self.position,
                len: tree.base_len(),
            });
        }

        if !Arc::ptr_eq(&self.root, &tree.root)
            || self.mutation_count != tree.root.mutation_count()
        {
            return Err(IndexError::Stale);
        }

        Ok(())
    }

    #[inline]
    fn doc_len(&self) -> usize {
        self.root.base_len()
    }

    /// Returns whether the current position is a boundary of the `M`
    /// metric.
    #[inline]
    pub fn is_boundary<M: Metric<L>>(&self) -> bool {
        let local = self.position - self.offset_of_leaf;

        if local == 0 {
            return self.leaf_start_is_boundary::<M>();
        }

        let (leaf, _) = self.read();

        if self.position == self.doc_len() {
            return match M::KIND {
                MetricKind::Atomic | MetricKind::Leading => true,
                MetricKind::Trailing => M::is_boundary(leaf, local),
            };
        }

        M::is_boundary(leaf, local)
    }

    /// Returns whether the start of the current leaf is a boundary of the
    /// `M` metric.
    #[inline]
    fn leaf_start_is_boundary<M: Metric<L>>(&self) -> bool {
        let (leaf, offset) = self.read();

        if offset == 0 {
            return match M::KIND {
                MetricKind::Atomic | MetricKind::Trailing => true,
                MetricKind::Leading => M::is_boundary(leaf, 0),
            };
        }

        if !M::CAN_FRAGMENT {
            return true;
        }

        match M::KIND {
            MetricKind::Atomic | MetricKind::Leading => M::is_boundary(leaf, 0),

            MetricKind::Trailing => match self.peek_prev_leaf() {
                Some(prev) => M::is_boundary(prev, prev.base_len()),
                None => true,
            },
        }
    }

    /// Moves to the start of the next leaf. Returns `false` if the index is
    /// already in the last leaf, in which case it's not moved.
    #[inline]
    pub fn next_leaf(&mut self) -> bool {
        let Some(depth) =
            self.path.iter().rposition(|(node, idx)| {
                idx + 1 < node.as_internal().len()
            })
        else {
            return false;
        };

        self.offset_of_leaf += self.leaf.base_len();

        self.path.truncate(depth + 1);

        let (node, idx) = &mut self.path[depth];
        *idx += 1;
        let mut child = Arc::clone(node.as_internal().child(*idx));

        while child.is_internal() {
            let first = Arc::clone(child.as_internal().first());
            self.path.push((child, 0));
            child = first;
        }

        self.leaf = child;
        self.position = self.offset_of_leaf;
        true
    }

    /// Moves to the first boundary of the `M` metric after the current
    /// position, returning it. If there isn't one the index isn't moved.
    #[inline]
    pub fn next<M: Metric<L>>(&mut self) -> Option<usize> {
        let start = self.position;

        let mut probe = self.clone();

        loop {
            let (leaf, offset) = probe.read();
            let local = probe.position - offset;

            if local < leaf.base_len() {
                if let Some(next) = M::next(leaf, local) {
                    probe.position = offset + next;
                    break;
                }
            }

            if !probe.next_leaf() {
                // The end of the document.
                let end = probe.doc_len();

                if end > start && M::KIND != MetricKind::Trailing {
                    probe.position = end;
                    break;
                }

                return None;
            }

            if probe.leaf_start_is_boundary::<M>() {
                break;
            }
        }

        *self = probe;
        Some(self.position)
    }

    /// Returns the leaf before the current one, if there is one.
    #[inline]
    fn peek_prev_leaf(&self) -> Option<&L> {
        let depth = self.path.iter().rposition(|&(_, idx)| idx > 0)?;
        let (node, idx) = &self.path[depth];
        Some(node.as_internal().child(idx - 1).last_leaf())
    }

    /// Returns the offset of the index in base units.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves to the last boundary of the `M` metric before the current
    /// position, returning it. If there isn't one the index isn't moved.
    #[inline]
    pub fn prev<M: Metric<L>>(&mut self) -> Option<usize> {
        let mut probe = self.clone();

        loop {
            let (leaf, offset) = probe.read();
            let local = probe.position - offset;

            if local > 0 {
                if let Some(prev) = M::prev(leaf, local) {
                    probe.position = offset + prev;
                    break;
                }

                if probe.leaf_start_is_boundary::<M>() {
                    probe.position = offset;
                    break;
                }
            }

            if !probe.prev_leaf() {
                return None;
            }
        }

        *self = probe;
        Some(self.position)
    }

    /// Moves to the end of the previous leaf. Returns `false` if the index
    /// is in the first leaf, in which case it's not moved.
    #[inline]
    pub fn prev_leaf(&mut self) -> bool {
        let Some(depth) = self.path.iter().rposition(|&(_, idx)| idx > 0)
        else {
            return false;
        };

        self.path.truncate(depth + 1);

        let (node, idx) = &mut self.path[depth];
        *idx -= 1;
        let mut child = Arc::clone(node.as_internal().child(*idx));

        while child.is_internal() {
            let last_idx = child.as_internal().len() - 1;
            let last = Arc::clone(child.as_internal().last());
            self.path.push((child, last_idx));
            child = last;
        }

        self.offset_of_leaf -= child.base_len();
        self.position = self.offset_of_leaf + child.base_len();
        self.leaf = child;
        true
    }

    /// Returns the current leaf and the offset of its start.
    #[inline]
    pub fn read(&self) -> (&L, usize) {
        (self.leaf.as_leaf().as_leaf(), self.offset_of_leaf)
    }

    /// Moves the index to `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position` is past the end of the tree.
    #[track_caller]
    #[inline]
    pub fn set(&mut self, position: usize) {
        assert!(
            position <= self.doc_len(),
            "position out of bounds: the position is {} but the length is {}",
            position,
            self.doc_len()
        );

        let (start, end) =
            (self.offset_of_leaf, self.offset_of_leaf + self.leaf.base_len());

        let is_last_leaf = end == self.doc_len();

        if start <= position && (position < end || is_last_leaf) {
            self.position = position;
            return;
        }

        *self = Self::new(Arc::clone(&self.root), position);
    }

    #[inline]
    pub(super) fn new(root: Arc<Node<N, L>>, position: usize) -> Self {
        let mut path = Vec::with_capacity(root.height());

        let mut offset_of_leaf = 0;

        let mut node = Arc::clone(&root);

        while node.is_internal() {
            let inode = node.as_internal();

            let last_idx = inode.len() - 1;

            let mut child_idx = last_idx;

            for (idx, child) in inode.children().iter().enumerate() {
                let len = child.base_len();
                if position < offset_of_leaf + len || idx == last_idx {
                    child_idx = idx;
                    break;
                }
                offset_of_leaf += len;
            }

            let child = Arc::clone(inode.child(child_idx));
            path.push((node, child_idx));
            node = child;
        }

        Self {
            mutation_count: root.mutation_count(),
            root,
            position,
            path,
            leaf: node,
            offset_of_leaf,
        }
    }

    /// Panics if this index can't be used with `tree`.
    #[track_caller]
    #[inline]
    pub fn validate(&self, tree: &Tree<N, L>) {
        if let Err(err) = self.check(tree) {
            panic!("invalid index: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::BaseMetric;
    use crate::tree::test_leaf::{Bytes, ZeroMetric};

    fn tree(bytes: &[u8]) -> Tree<4, Bytes> {
        Tree::from_leaves(bytes.chunks(3).map(Bytes::from))
    }

    #[test]
    fn walk_every_base_unit() {
        let bytes = (0..100u8).collect::<Vec<_>>();
        let tree = tree(&bytes);
        let mut index = tree.index_at(0);

        for pos in 1..=100 {
            assert_eq!(index.next::<BaseMetric>(), Some(pos));
        }

        assert_eq!(index.next::<BaseMetric>(), None);
        assert_eq!(index.position(), 100);

        for pos in (0..100).rev() {
            assert_eq!(index.prev::<BaseMetric>(), Some(pos));
        }

        assert_eq!(index.prev::<BaseMetric>(), None);
    }

    #[test]
    fn trailing_metric_boundaries() {
        // Boundaries are right after every zero byte.
        let bytes = [1, 0, 1, 1, 1, 1, 1, 0, 0, 1, 1, 1, 1, 1, 0];
        let tree = tree(&bytes);

        let mut index = tree.index_at(0);
        let mut found = Vec::new();
        while let Some(pos) = index.next::<ZeroMetric>() {
            found.push(pos);
        }
        assert_eq!(found, [2, 8, 9, 15]);

        let mut found = Vec::new();
        while let Some(pos) = index.prev::<ZeroMetric>() {
            found.push(pos);
        }
        assert_eq!(found, [9, 8, 2, 0]);

        assert!(tree.is_boundary::<ZeroMetric>(0));
        assert!(tree.is_boundary::<ZeroMetric>(9));
        assert!(!tree.is_boundary::<ZeroMetric>(3));
    }

    #[test]
    fn trailing_metric_end_is_not_a_boundary() {
        let bytes = [0, 1, 1, 1, 1, 1, 1];
        let tree = tree(&bytes);
        assert_eq!(tree.index_after::<ZeroMetric>(1), None);
        assert!(!tree.is_boundary::<ZeroMetric>(7));
        assert_eq!(tree.index_rounding_down::<ZeroMetric>(7), 1);
    }

    #[test]
    fn stale_after_edit() {
        let mut tree = tree(&[1; 30]);
        let index = tree.index_at(10);
        assert_eq!(index.check(&tree), Ok(()));

        let old = tree.clone();
        tree = tree.slice(0..20);

        assert_eq!(index.check(&tree), Err(IndexError::Stale));
        assert_eq!(index.check(&old), Ok(()));

        let index = old.index_at(25);
        assert_eq!(
            index.check(&tree),
            Err(IndexError::OutOfBounds { position: 25, len: 20 })
        );
    }

    #[test]
    #[should_panic(expected = "invalid index")]
    fn validate_panics_on_other_tree() {
        let tree = tree(&[1; 30]);
        let other = self::tree(&[1; 30]);
        tree.index_at(3).validate(&other);
    }

    #[test]
    fn set_moves_across_leaves() {
        let bytes = (0..60u8).collect::<Vec<_>>();
        let tree = tree(&bytes);
        let mut index = tree.index_at(0);

        for pos in [59, 3, 0, 60, 31, 32, 30] {
            index.set(pos);
            let (leaf, offset) = index.read();
            assert!(offset <= pos && pos <= offset + leaf.base_len());
            if pos < 60 {
                assert_eq!(leaf.bytes()[pos - offset], bytes[pos]);
            }
        }
    }
}
