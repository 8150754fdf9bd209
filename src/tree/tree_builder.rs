use std::ops::Range;
use std::sync::Arc;

use super::node::concatenate;
use super::{Inode, Leaf, Node, Tree};

/// Builds a [`Tree`] by appending leaves and whole subtrees to the right of
/// what's been pushed so far.
///
/// Pushing `n` leaves takes amortized `O(n)` time, and pushing a subtree
/// takes time proportional to its height.
#[derive(Clone)]
pub struct TreeBuilder<const N: usize, L: Leaf> {
    /// A stack of levels, each one holding sibling nodes waiting to get a
    /// parent.
    ///
    /// # Invariants
    ///
    /// - no level is empty;
    ///
    /// - all the nodes within a level have the same height;
    ///
    /// - heights strictly decrease going from the bottom of the stack to its
    /// top;
    ///
    /// - every level holds less than `N` nodes;
    ///
    /// - only the first node of a level can be undersized, and only if it's
    /// the only node in that level.
    stack: Vec<Vec<Arc<Node<N, L>>>>,

    /// Whether the last leaf pushed so far was left in sync with the leaf
    /// it follows in its source tree. When it is, the next piece pushed from
    /// the same source doesn't need to be fixed up.
    in_sync: bool,
}

impl<const N: usize, L: Leaf> Default for TreeBuilder<N, L> {
    #[inline]
    fn default() -> Self {
        Self { stack: Vec::new(), in_sync: false }
    }
}

impl<const N: usize, L: Leaf> TreeBuilder<N, L> {
    /// Drains the stack into a [`Tree`].
    #[inline]
    pub fn build(mut self) -> Tree<N, L> {
        let mut root = match self.stack.pop() {
            Some(level) => fold(level),
            None => return Tree::default(),
        };

        while let Some(level) = self.stack.pop() {
            root = concatenate(fold(level), root);
        }

        while let Node::Internal(inode) = &*root {
            if inode.len() > 1 {
                break;
            }
            root = Arc::clone(inode.first());
        }

        if L::NEEDS_FIXUP_ON_APPEND && root.last_leaf().continues_into_next()
        {
            Node::with_last_leaf_mut(&mut root, |last| {
                last.fixup(&mut L::default())
            });
        }

        Tree { root }
    }

    /// Fixes up the seam between the content pushed so far and `node`,
    /// then keeps fixing up the leaves of `node` until their state
    /// converges with the one they already had.
    #[inline]
    fn fixup(&mut self, node: &mut Arc<Node<N, L>>, same_source: bool) {
        if !L::NEEDS_FIXUP_ON_APPEND || (same_source && self.in_sync) {
            return;
        }

        let converged_at_seam = match self.stack.last_mut() {
            Some(level) => {
                let prev = level
                    .last_mut()
                    .expect("levels are never empty");

                !prev.last_leaf().needs_fixup(node.first_leaf())
                    || Node::with_last_leaf_mut(prev, |prev| {
                        Node::with_first_leaf_mut(node, |next| {
                            prev.fixup(next)
                        })
                    })
            },

            None => {
                let mut start = L::default();

                !start.needs_fixup(node.first_leaf())
                    || Node::with_first_leaf_mut(node, |next| {
                        start.fixup(next)
                    })
            },
        };

        self.in_sync = converged_at_seam || fixup_leaves(node);
    }

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a whole tree. Its nodes are shared with the new tree.
    #[inline]
    pub fn push(&mut self, tree: &Tree<N, L>) {
        self.push_node(Arc::clone(&tree.root))
    }

    #[inline]
    pub(super) fn push_node(&mut self, node: Arc<Node<N, L>>) {
        self.push_from(node, false)
    }

    #[inline]
    fn push_from(&mut self, mut node: Arc<Node<N, L>>, same_source: bool) {
        if node.base_len() == 0 {
            return;
        }

        self.fixup(&mut node, same_source);

        loop {
            let Some(level) = self.stack.last_mut() else {
                self.stack.push(vec![node]);
                return;
            };

            let top_height = level[0].height();

            if top_height < node.height() {
                let level = self.stack.pop().expect("just checked");
                node = concatenate(fold(level), node);
                continue;
            }

            if top_height > node.height() {
                self.stack.push(vec![node]);
                return;
            }

            let top = level.last().expect("levels are never empty");

            if top.is_undersized() || node.is_undersized() {
                let top = level.pop().expect("levels are never empty");
                if level.is_empty() {
                    self.stack.pop();
                }
                node = concatenate(top, node);
                continue;
            }

            level.push(node);

            if level.len() < Inode::<N, L>::max_children() {
                return;
            }

            let level = self.stack.pop().expect("just checked");
            node = Arc::new(Node::Internal(Inode::from_children(level)));
        }
    }

    /// Appends a single leaf.
    #[inline]
    pub fn push_leaf(&mut self, leaf: L) {
        self.push_node(Arc::new(Node::from(leaf)));
    }

    /// Appends the contents of `tree` in the given range of base units.
    ///
    /// Fully covered subtrees are shared with `tree`, and only the leaves at
    /// the two ends of the range are copied.
    ///
    /// # Panics
    ///
    /// Panics if the range is inverted or out of bounds.
    #[track_caller]
    #[inline]
    pub fn push_slice(&mut self, tree: &Tree<N, L>, range: Range<usize>) {
        assert!(
            range.start <= range.end && range.end <= tree.base_len(),
            "invalid range {:?} for a tree of length {}",
            range,
            tree.base_len()
        );

        self.push_node_slice(&tree.root, range);
    }

    #[inline]
    pub(super) fn push_node_slice(
        &mut self,
        node: &Arc<Node<N, L>>,
        range: Range<usize>,
    ) {
        let mut is_first = true;
        self.push_slice_rec(node, range, &mut is_first);
    }

    fn push_slice_rec(
        &mut self,
        node: &Arc<Node<N, L>>,
        range: Range<usize>,
        is_first: &mut bool,
    ) {
        if range.start == range.end {
            return;
        }

        if range.start == 0 && range.end == node.base_len() {
            self.push_from(Arc::clone(node), !*is_first);
            *is_first = false;
            return;
        }

        match &**node {
            Node::Leaf(leaf) => {
                let slice = leaf.as_leaf().slice(range);
                self.push_from(Arc::new(Node::from(slice)), !*is_first);
                *is_first = false;
            },

            Node::Internal(inode) => {
                let mut offset = 0;

                for child in inode.children() {
                    let len = child.base_len();

                    if offset >= range.end {
                        break;
                    }

                    if offset + len > range.start {
                        let start = range.start.max(offset) - offset;
                        let end = range.end.min(offset + len) - offset;
                        self.push_slice_rec(child, start..end, is_first);
                    }

                    offset += len;
                }
            },
        }
    }
}

/// Concatenates the nodes of a stack level from left to right.
#[inline]
fn fold<const N: usize, L: Leaf>(
    level: Vec<Arc<Node<N, L>>>,
) -> Arc<Node<N, L>> {
    let mut nodes = level.into_iter();

    let first = nodes.next().expect("levels are never empty");

    nodes.fold(first, concatenate)
}

/// Walks the leaves of the subtree from left to right, fixing up every pair
/// until one reports its state converged.
///
/// Returns `false` if the last leaf was reached without converging.
#[inline]
fn fixup_leaves<const N: usize, L: Leaf>(node: &mut Arc<Node<N, L>>) -> bool {
    let leaf_count = node.leaf_count();

    for leaf_idx in 0..leaf_count.saturating_sub(1) {
        if !node.leaf(leaf_idx).needs_fixup(node.leaf(leaf_idx + 1)) {
            return true;
        }

        if leaf_idx > 0 {
            tracing::trace!(leaf_idx, leaf_count, "fixup walked past the seam");
        }

        let converged = Node::with_adjacent_leaves_mut(
            node,
            leaf_idx,
            |prev, next| prev.fixup(next),
        );

        if converged {
            return true;
        }
    }

    false
}
