use std::any::Any;
use std::sync::Arc;

use super::{Inode, Leaf, Lnode, Metric};

#[derive(Clone)]
pub(super) enum Node<const N: usize, L: Leaf> {
    Internal(Inode<N, L>),
    Leaf(Lnode<L>),
}

impl<const N: usize, L: Leaf> Default for Node<N, L> {
    #[inline]
    fn default() -> Self {
        Node::Leaf(Lnode::default())
    }
}

impl<const N: usize, L: Leaf> std::fmt::Debug for Node<N, L> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if !f.alternate() {
            match self {
                Self::Internal(inode) => {
                    f.debug_tuple("Internal").field(&inode).finish()
                },
                Self::Leaf(leaf) => {
                    f.debug_tuple("Leaf").field(&leaf).finish()
                },
            }
        } else {
            match self {
                Self::Internal(inode) => write!(f, "{:#?}", inode),
                Self::Leaf(leaf) => write!(f, "{:#?}", leaf),
            }
        }
    }
}

impl<const N: usize, L: Leaf> From<L> for Node<N, L> {
    #[inline]
    fn from(leaf: L) -> Self {
        Self::Leaf(Lnode::from(leaf))
    }
}

impl<const N: usize, L: Leaf> Node<N, L> {
    #[track_caller]
    #[inline]
    pub(super) fn as_internal(&self) -> &Inode<N, L> {
        match self {
            Node::Internal(inode) => inode,
            Node::Leaf(_) => unreachable!(
                "A node was expected to be an internal node but it's a \
                 leaf. This is a logic bug in braid."
            ),
        }
    }

    #[track_caller]
    #[inline]
    pub(super) fn as_leaf(&self) -> &Lnode<L> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => unreachable!(
                "A node was expected to be a leaf but it's an internal \
                 node. This is a logic bug in braid."
            ),
        }
    }

    pub(super) fn assert_invariants(&self, is_root: bool) {
        match self {
            Node::Internal(inode) => inode.assert_invariants(is_root),
            Node::Leaf(leaf) => {
                if !is_root {
                    assert!(
                        !leaf.is_undersized(),
                        "A non-root leaf is undersized: {:?}",
                        leaf.as_leaf()
                    );
                }
            },
        }
    }

    #[inline]
    pub(super) fn base_len(&self) -> usize {
        match self {
            Node::Internal(inode) => inode.base_len(),
            Node::Leaf(leaf) => leaf.base_len(),
        }
    }

    /// Converts `m1` into the `M2` metric, i.e. returns the `M2` measure of
    /// the content up to the `m1`-th `M1` boundary.
    ///
    /// NOTE: metrics are stateless unit values, so converting a metric to
    /// itself returns the input as is without walking the tree.
    ///
    /// NOTE: doesn't do bounds checks.
    #[inline]
    pub(super) fn convert<M1, M2>(&self, mut m1: M1) -> M2
    where
        M1: Metric<L>,
        M2: Metric<L>,
    {
        if m1.is_zero() {
            return M2::zero();
        }

        if let Some(&same) = (&m1 as &dyn Any).downcast_ref::<M2>() {
            return same;
        }

        let mut m2 = M2::zero();

        let mut node = self;

        'outer: loop {
            match node {
                Node::Internal(inode) => {
                    let last_idx = inode.len() - 1;

                    for (idx, child) in inode.children().iter().enumerate() {
                        let child_m1 = child.measure::<M1>();

                        if m1 <= child_m1 || idx == last_idx {
                            node = &**child;
                            continue 'outer;
                        }

                        m1 -= child_m1;
                        m2 += child.measure::<M2>();
                    }

                    unreachable!();
                },

                Node::Leaf(leaf) => {
                    let leaf = leaf.as_leaf();
                    let offset = M1::to_base_units(leaf, m1);
                    return m2 + M2::from_base_units(leaf, offset);
                },
            }
        }
    }

    #[inline]
    pub(super) fn first_leaf(&self) -> &L {
        let mut node = self;
        loop {
            match node {
                Node::Internal(inode) => node = &**inode.first(),
                Node::Leaf(leaf) => return leaf.as_leaf(),
            }
        }
    }

    #[inline]
    pub(super) fn height(&self) -> usize {
        match self {
            Node::Internal(inode) => inode.height(),
            Node::Leaf(_) => 0,
        }
    }

    #[inline]
    pub(super) fn is_internal(&self) -> bool {
        matches!(self, Node::Internal(_))
    }

    #[inline]
    pub(super) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    #[inline]
    pub(super) fn is_undersized(&self) -> bool {
        match self {
            Node::Internal(inode) => inode.is_undersized(),
            Node::Leaf(leaf) => leaf.is_undersized(),
        }
    }

    #[inline]
    pub(super) fn last_leaf(&self) -> &L {
        let mut node = self;
        loop {
            match node {
                Node::Internal(inode) => node = &**inode.last(),
                Node::Leaf(leaf) => return leaf.as_leaf(),
            }
        }
    }

    /// Returns the `leaf_idx`-th leaf of this subtree.
    ///
    /// NOTE: doesn't do bounds checks.
    #[inline]
    pub(super) fn leaf(&self, mut leaf_idx: usize) -> &L {
        let mut node = self;

        'outer: loop {
            match node {
                Node::Internal(inode) => {
                    for child in inode.children() {
                        if leaf_idx < child.leaf_count() {
                            node = &**child;
                            continue 'outer;
                        }
                        leaf_idx -= child.leaf_count();
                    }
                    node = &**inode.last();
                },

                Node::Leaf(leaf) => return leaf.as_leaf(),
            }
        }
    }

    /// Returns the leaf containing the given offset together with the offset
    /// of its start.
    ///
    /// An offset falling between two leaves is contained in the second one,
    /// and the end of the subtree is contained in its last leaf.
    #[inline]
    pub(super) fn leaf_at_offset(&self, offset: usize) -> (&L, usize) {
        let mut leaf_offset = 0;

        let mut node = self;

        'outer: loop {
            match node {
                Node::Internal(inode) => {
                    let last_idx = inode.len() - 1;

                    for (idx, child) in inode.children().iter().enumerate() {
                        let len = child.base_len();

                        if offset < leaf_offset + len || idx == last_idx {
                            node = &**child;
                            continue 'outer;
                        }

                        leaf_offset += len;
                    }
                },

                Node::Leaf(leaf) => return (leaf.as_leaf(), leaf_offset),
            }
        }
    }

    #[inline]
    pub(super) fn leaf_count(&self) -> usize {
        match self {
            Node::Internal(inode) => inode.leaf_count(),
            Node::Leaf(_) => 1,
        }
    }

    #[inline]
    pub(super) fn measure<M: Metric<L>>(&self) -> M {
        M::measure(self.summary(), self.base_len())
    }

    #[inline]
    pub(super) fn mutation_count(&self) -> u64 {
        match self {
            Node::Internal(inode) => inode.mutation_count(),
            Node::Leaf(leaf) => leaf.mutation_count(),
        }
    }

    #[inline]
    pub(super) fn summary(&self) -> &L::Summary {
        match self {
            Node::Internal(inode) => inode.summary(),
            Node::Leaf(leaf) => leaf.summary(),
        }
    }

    /// Calls the closure with the `leaf_idx`-th and `leaf_idx + 1`-th
    /// leaves of the subtree, cloning every node on the way down that is
    /// shared with another tree.
    ///
    /// # Panics
    ///
    /// Panics if the subtree doesn't have at least `leaf_idx + 2` leaves.
    #[inline]
    pub(super) fn with_adjacent_leaves_mut<F, T>(
        node: &mut Arc<Self>,
        leaf_idx: usize,
        fun: F,
    ) -> T
    where
        F: FnOnce(&mut L, &mut L) -> T,
    {
        let Node::Internal(inode) = Arc::make_mut(node) else {
            panic!("a single leaf has no adjacent leaves");
        };

        let mut leaves_before = 0;

        let mut child_idx = 0;

        for child in inode.children() {
            if leaf_idx < leaves_before + child.leaf_count() {
                break;
            }
            leaves_before += child.leaf_count();
            child_idx += 1;
        }

        let local_idx = leaf_idx - leaves_before;

        if local_idx + 1 < inode.child(child_idx).leaf_count() {
            inode.with_child_mut(child_idx, |child| {
                Self::with_adjacent_leaves_mut(child, local_idx, fun)
            })
        } else {
            inode.with_two_children_mut(child_idx, |left, right| {
                Self::with_last_leaf_mut(left, move |prev| {
                    Self::with_first_leaf_mut(right, move |next| {
                        fun(prev, next)
                    })
                })
            })
        }
    }

    #[inline]
    pub(super) fn with_first_leaf_mut<F, T>(node: &mut Arc<Self>, fun: F) -> T
    where
        F: FnOnce(&mut L) -> T,
    {
        match Arc::make_mut(node) {
            Node::Internal(inode) => inode.with_child_mut(0, |first| {
                Self::with_first_leaf_mut(first, fun)
            }),
            Node::Leaf(leaf) => leaf.with_mut(fun),
        }
    }

    #[inline]
    pub(super) fn with_last_leaf_mut<F, T>(node: &mut Arc<Self>, fun: F) -> T
    where
        F: FnOnce(&mut L) -> T,
    {
        match Arc::make_mut(node) {
            Node::Internal(inode) => {
                let last_idx = inode.len() - 1;
                inode.with_child_mut(last_idx, |last| {
                    Self::with_last_leaf_mut(last, fun)
                })
            },
            Node::Leaf(leaf) => leaf.with_mut(fun),
        }
    }

    /// Calls the closure with the leaf containing the given offset (using
    /// the same bias as [`leaf_at_offset()`](Self::leaf_at_offset)).
    #[inline]
    pub(super) fn with_leaf_at_offset_mut<F, T>(
        node: &mut Arc<Self>,
        offset: usize,
        fun: F,
    ) -> T
    where
        F: FnOnce(&mut L) -> T,
    {
        match Arc::make_mut(node) {
            Node::Internal(inode) => {
                let last_idx = inode.len() - 1;

                let mut child_offset = 0;

                let mut child_idx = 0;

                for (idx, child) in inode.children().iter().enumerate() {
                    let len = child.base_len();
                    if offset < child_offset + len || idx == last_idx {
                        child_idx = idx;
                        break;
                    }
                    child_offset += len;
                }

                inode.with_child_mut(child_idx, |child| {
                    Self::with_leaf_at_offset_mut(
                        child,
                        offset - child_offset,
                        fun,
                    )
                })
            },
            Node::Leaf(leaf) => leaf.with_mut(fun),
        }
    }
}

/// Joins two trees, returning the root of the resulting tree.
///
/// The trees can have different heights. The result only has an undersized
/// root if the two inputs together don't have enough content to fill it.
pub(super) fn concatenate<const N: usize, L: Leaf>(
    left: Arc<Node<N, L>>,
    right: Arc<Node<N, L>>,
) -> Arc<Node<N, L>> {
    let left_height = left.height();
    let right_height = right.height();

    if left_height == right_height {
        if !left.is_undersized() && !right.is_undersized() {
            return Arc::new(Node::Internal(Inode::from_children([
                left, right,
            ])));
        }

        if left_height == 0 {
            return merge_leaves(left, right);
        }

        return merge_nodes(
            left.as_internal().children(),
            right.as_internal().children(),
        );
    }

    if left_height < right_height {
        let children = right.as_internal().children();

        if left_height + 1 == right_height && !left.is_undersized() {
            return merge_nodes(&[left], children);
        }

        let joined = concatenate(left, Arc::clone(&children[0]));

        if joined.height() + 1 == right_height {
            merge_nodes(&[joined], &children[1..])
        } else {
            merge_nodes(joined.as_internal().children(), &children[1..])
        }
    } else {
        let children = left.as_internal().children();

        if right_height + 1 == left_height && !right.is_undersized() {
            return merge_nodes(children, &[right]);
        }

        let last_idx = children.len() - 1;

        let joined = concatenate(Arc::clone(&children[last_idx]), right);

        if joined.height() + 1 == left_height {
            merge_nodes(&children[..last_idx], &[joined])
        } else {
            merge_nodes(&children[..last_idx], joined.as_internal().children())
        }
    }
}

/// Puts the two lists of siblings under a common parent, or under two
/// parents if they don't fit in one.
#[inline]
fn merge_nodes<const N: usize, L: Leaf>(
    left: &[Arc<Node<N, L>>],
    right: &[Arc<Node<N, L>>],
) -> Arc<Node<N, L>> {
    let total = left.len() + right.len();

    let siblings = left.iter().chain(right).cloned();

    if total <= Inode::<N, L>::max_children() {
        return Arc::new(Node::Internal(Inode::from_children(siblings)));
    }

    let split_at = Inode::<N, L>::max_children()
        .min(total - Inode::<N, L>::min_children());

    let mut siblings = siblings;

    let first = Inode::from_children(siblings.by_ref().take(split_at));

    let second = Inode::from_children(siblings);

    Arc::new(Node::Internal(Inode::from_children([
        Arc::new(Node::Internal(first)),
        Arc::new(Node::Internal(second)),
    ])))
}

/// Joins two leaves, splitting the result in two if it's too big.
#[inline]
fn merge_leaves<const N: usize, L: Leaf>(
    mut left: Arc<Node<N, L>>,
    right: Arc<Node<N, L>>,
) -> Arc<Node<N, L>> {
    let split = {
        let Node::Leaf(left) = Arc::make_mut(&mut left) else {
            unreachable!("merge_leaves called on an internal node");
        };

        let right = right.as_leaf().as_leaf();

        left.with_mut(|left| left.push_maybe_splitting(right))
    };

    match split {
        Some(second) => Arc::new(Node::Internal(Inode::from_children([
            left,
            Arc::new(Node::from(second)),
        ]))),

        None => left,
    }
}
