use super::{Inode, Leaf, Node, Tree};

/// An iterator over the leaves of a [`Tree`].
///
/// This iterator is created via the [`leaves`](Tree::leaves) and
/// [`leaves_in_range`](Tree::leaves_in_range) methods on [`Tree`].
pub struct Leaves<'a, const N: usize, L: Leaf> {
    root: &'a Node<N, L>,

    /// The base offsets the first calls to `next` and `next_back` descend
    /// to.
    first_offset: usize,
    last_offset: usize,

    /// A path of internal nodes from the root down to the parent of the next
    /// leaf to yield. The second element in each tuple is the index of the
    /// child we're currently in.
    forward_path: Vec<(&'a Inode<N, L>, usize)>,

    /// Same as `forward_path` for `next_back`, except the indices point to
    /// the child containing the last yielded leaf.
    backward_path: Vec<(&'a Inode<N, L>, usize)>,

    /// The total number of leaves this iterator will yield.
    total_leaves: usize,

    /// The number of leaves yielded by calling `next`.
    yielded_forward: usize,

    /// The number of leaves yielded by calling `next_back`.
    yielded_backward: usize,
}

impl<const N: usize, L: Leaf> Clone for Leaves<'_, N, L> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            forward_path: self.forward_path.clone(),
            backward_path: self.backward_path.clone(),
            ..*self
        }
    }
}

impl<'a, const N: usize, L: Leaf> From<&'a Tree<N, L>> for Leaves<'a, N, L> {
    #[inline]
    fn from(tree: &'a Tree<N, L>) -> Leaves<'a, N, L> {
        Self::in_range(tree, 0..tree.base_len())
    }
}

impl<'a, const N: usize, L: Leaf> Leaves<'a, N, L> {
    /// Descends from `node` to the leaf containing `offset`, recording the
    /// path. See [`Node::leaf_at_offset`] for which leaf that is.
    #[inline]
    fn descend(
        path: &mut Vec<(&'a Inode<N, L>, usize)>,
        mut node: &'a Node<N, L>,
        mut offset: usize,
    ) -> &'a L {
        loop {
            match node {
                Node::Internal(inode) => {
                    let (idx, child_offset) = child_containing(inode, offset);
                    path.push((inode, idx));
                    offset -= child_offset;
                    node = &**inode.child(idx);
                },
                Node::Leaf(leaf) => return leaf.as_leaf(),
            }
        }
    }

    /// Returns an iterator over the leaves overlapping `range`. An empty
    /// range yields no leaves.
    #[inline]
    pub(super) fn in_range(
        tree: &'a Tree<N, L>,
        range: std::ops::Range<usize>,
    ) -> Self {
        let root = &*tree.root;

        let total_leaves = if range.start >= range.end {
            0
        } else {
            leaf_idx_at_offset(root, range.end - 1)
                - leaf_idx_at_offset(root, range.start)
                + 1
        };

        Self {
            root,
            first_offset: range.start,
            last_offset: range.end.saturating_sub(1),
            forward_path: Vec::new(),
            backward_path: Vec::new(),
            total_leaves,
            yielded_forward: 0,
            yielded_backward: 0,
        }
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.total_leaves - self.yielded_forward - self.yielded_backward
    }
}

/// Returns the index of the child of `inode` containing `offset` and the
/// offset of the child's start.
#[inline]
fn child_containing<const N: usize, L: Leaf>(
    inode: &Inode<N, L>,
    offset: usize,
) -> (usize, usize) {
    let last_idx = inode.len() - 1;

    let mut child_offset = 0;

    for (idx, child) in inode.children().iter().enumerate() {
        let len = child.base_len();

        if offset < child_offset + len || idx == last_idx {
            return (idx, child_offset);
        }

        child_offset += len;
    }

    unreachable!("internal nodes always have children")
}

/// Returns the index of the leaf containing `offset`.
#[inline]
fn leaf_idx_at_offset<const N: usize, L: Leaf>(
    mut node: &Node<N, L>,
    mut offset: usize,
) -> usize {
    let mut leaf_idx = 0;

    while let Node::Internal(inode) = node {
        let (idx, child_offset) = child_containing(inode, offset);

        leaf_idx += inode.children()[..idx]
            .iter()
            .map(|child| child.leaf_count())
            .sum::<usize>();

        offset -= child_offset;
        node = &**inode.child(idx);
    }

    leaf_idx
}

impl<'a, const N: usize, L: Leaf> Iterator for Leaves<'a, N, L> {
    type Item = &'a L;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining() == 0 {
            return None;
        }

        let leaf = if self.yielded_forward == 0 {
            Self::descend(
                &mut self.forward_path,
                self.root,
                self.first_offset,
            )
        } else {
            loop {
                let (inode, idx) = self
                    .forward_path
                    .last_mut()
                    .expect("there are leaves left to yield");

                let inode: &'a Inode<N, L> = *inode;

                if *idx + 1 < inode.len() {
                    *idx += 1;
                    let child = &**inode.child(*idx);
                    break Self::descend(&mut self.forward_path, child, 0);
                }

                self.forward_path.pop();
            }
        };

        self.yielded_forward += 1;

        Some(leaf)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl<'a, const N: usize, L: Leaf> DoubleEndedIterator for Leaves<'a, N, L> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining() == 0 {
            return None;
        }

        let leaf = if self.yielded_backward == 0 {
            Self::descend(
                &mut self.backward_path,
                self.root,
                self.last_offset,
            )
        } else {
            loop {
                let (inode, idx) = self
                    .backward_path
                    .last_mut()
                    .expect("there are leaves left to yield");

                let inode: &'a Inode<N, L> = *inode;

                if *idx > 0 {
                    *idx -= 1;
                    let child = &**inode.child(*idx);
                    let end = child.base_len() - 1;
                    break Self::descend(&mut self.backward_path, child, end);
                }

                self.backward_path.pop();
            }
        };

        self.yielded_backward += 1;

        Some(leaf)
    }
}

impl<const N: usize, L: Leaf> ExactSizeIterator for Leaves<'_, N, L> {}

impl<const N: usize, L: Leaf> std::iter::FusedIterator for Leaves<'_, N, L> {}

#[cfg(test)]
mod tests {
    use crate::tree::Tree;
    use crate::tree::test_leaf::Bytes;

    #[test]
    fn leaves_both_ways() {
        for n in [0u8, 1, 2, 3, 10, 37, 200] {
            let tree = Tree::<4, Bytes>::from_leaves(
                (0..n).map(|b| Bytes::from(&[b, b][..])),
            );

            let forward = tree
                .leaves()
                .flat_map(|l| l.bytes().iter().copied())
                .collect::<Vec<_>>();

            let mut backward = tree
                .leaves()
                .rev()
                .flat_map(|l| l.bytes().iter().rev())
                .copied()
                .collect::<Vec<_>>();

            backward.reverse();

            assert_eq!(forward, tree.to_vec());
            assert_eq!(backward, tree.to_vec());
        }
    }

    #[test]
    fn leaves_meeting_in_the_middle() {
        let tree = Tree::<4, Bytes>::from_leaves(
            (0..50u8).map(|b| Bytes::from(&[b, b][..])),
        );

        let mut leaves = tree.leaves();

        let total = leaves.len();

        let mut seen = 0;

        while let Some(_) = leaves.next() {
            seen += 1;
            if leaves.next_back().is_some() {
                seen += 1;
            }
        }

        assert_eq!(seen, total);
        assert!(leaves.next_back().is_none());
    }

    #[test]
    fn leaves_in_range() {
        let tree = Tree::<4, Bytes>::from_leaves(
            (0..40u8).map(|b| Bytes::from(&[b, b, b][..])),
        );

        let firsts = |range: std::ops::Range<usize>| {
            tree.leaves_in_range(range).map(|l| l.bytes()[0]).collect::<Vec<_>>()
        };

        assert_eq!(firsts(0..0), Vec::<u8>::new());
        assert_eq!(firsts(0..1), [0]);
        assert_eq!(firsts(3..6), [1]);
        assert_eq!(firsts(2..7), [0, 1, 2]);
        assert_eq!(firsts(59..61), [19, 20]);
        assert_eq!(firsts(0..120), (0..40).collect::<Vec<_>>());

        let backward = tree
            .leaves_in_range(31..95)
            .rev()
            .map(|l| l.bytes()[0])
            .collect::<Vec<_>>();

        assert_eq!(backward, (10..32).rev().collect::<Vec<_>>());
    }
}
