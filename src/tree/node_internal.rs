use std::sync::Arc;

use super::{Leaf, Metric, Node};

#[derive(Clone)]
pub(super) struct Inode<const N: usize, L: Leaf> {
    children: Vec<Arc<Node<N, L>>>,
    summary: L::Summary,
    base_len: usize,
    height: usize,
    leaf_count: usize,
    mutation_count: u64,
}

impl<const N: usize, L: Leaf> std::fmt::Debug for Inode<N, L> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if !f.alternate() {
            f.debug_struct("Inode")
                .field("children", &self.children)
                .field("summary", &self.summary)
                .field("height", &self.height)
                .field("leaf_count", &self.leaf_count)
                .finish()
        } else {
            pretty_print_inode(self, &mut String::new(), "", 0, f)
        }
    }
}

impl<const N: usize, L: Leaf> Inode<N, L> {
    pub(super) fn assert_invariants(&self, is_root: bool) {
        let min = if is_root { 2 } else { Self::min_children() };

        assert!(
            self.len() >= min,
            "An internal node of height {} was supposed to contain at least \
             {} children but actually contains {}",
            self.height(),
            min,
            self.len()
        );

        assert!(
            self.len() <= Self::max_children(),
            "An internal node of height {} was supposed to contain at most {} \
             children but actually contains {}",
            self.height(),
            Self::max_children(),
            self.len()
        );

        let actual_leaves =
            self.children().iter().map(|c| c.leaf_count()).sum::<usize>();

        assert_eq!(
            self.leaf_count,
            actual_leaves,
            "An internal node of height {} thought it contained {} leaves in \
             its subtree, but actually contains {}",
            self.height(),
            self.leaf_count,
            actual_leaves
        );

        let actual_len =
            self.children().iter().map(|c| c.base_len()).sum::<usize>();

        assert_eq!(
            self.base_len, actual_len,
            "An internal node of height {} thought it was {} base units \
             long, but its children add up to {}",
            self.height, self.base_len, actual_len
        );

        for child in self.children() {
            assert_eq!(
                self.height(),
                child.height() + 1,
                "An internal node at height {} contains a node of height {}",
                self.height(),
                child.height()
            );

            child.assert_invariants(false);
        }
    }

    #[inline]
    pub(super) fn base_len(&self) -> usize {
        self.base_len
    }

    #[inline]
    pub(super) fn bump_mutation_count(&mut self) {
        self.mutation_count = self.mutation_count.wrapping_add(1);
    }

    #[inline]
    pub(super) fn child(&self, child_idx: usize) -> &Arc<Node<N, L>> {
        &self.children[child_idx]
    }

    #[inline]
    pub(super) fn children(&self) -> &[Arc<Node<N, L>>] {
        &self.children
    }

    #[inline]
    pub(super) fn first(&self) -> &Arc<Node<N, L>> {
        &self.children[0]
    }

    /// Creates a new inode from its children.
    ///
    /// # Panics
    ///
    /// Panics if the iterator yields no children or more than
    /// [`max_children()`](Self::max_children()). In debug builds it also
    /// panics if the children don't all have the same height.
    #[inline]
    pub(super) fn from_children<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Arc<Node<N, L>>>,
    {
        let children = children.into_iter().collect::<Vec<_>>();

        assert!(!children.is_empty() && children.len() <= N);

        debug_assert!(
            children.iter().all(|c| c.height() == children[0].height()),
            "Trying to create an inode from children of different heights. \
             This is a logic bug in braid."
        );

        let mut inode = Self {
            height: children[0].height() + 1,
            children,
            summary: L::Summary::default(),
            base_len: 0,
            leaf_count: 0,
            mutation_count: 0,
        };

        inode.recompute();
        inode
    }

    #[inline]
    pub(super) fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub(super) fn is_undersized(&self) -> bool {
        self.len() < Self::min_children()
    }

    #[inline]
    pub(super) fn last(&self) -> &Arc<Node<N, L>> {
        &self.children[self.len() - 1]
    }

    #[inline]
    pub(super) fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(super) fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    #[inline]
    pub(super) const fn max_children() -> usize {
        N
    }

    #[inline]
    pub fn measure<M: Metric<L>>(&self) -> M {
        M::measure(&self.summary, self.base_len)
    }

    #[inline]
    pub(super) const fn min_children() -> usize {
        N / 2
    }

    #[inline]
    pub(super) fn mutation_count(&self) -> u64 {
        self.mutation_count
    }

    /// Recomputes the summary, length and leaf count from the children.
    #[inline]
    fn recompute(&mut self) {
        let mut summary = L::Summary::default();
        let mut base_len = 0;
        let mut leaf_count = 0;

        for child in &self.children {
            summary += child.summary().clone();
            base_len += child.base_len();
            leaf_count += child.leaf_count();
        }

        self.summary = summary;
        self.base_len = base_len;
        self.leaf_count = leaf_count;
    }

    #[inline]
    pub(super) fn summary(&self) -> &L::Summary {
        &self.summary
    }

    /// Calls the closure with a mutable reference to the child at the given
    /// index, then recomputes this inode's metadata.
    #[inline]
    pub(super) fn with_child_mut<F, T>(&mut self, child_idx: usize, fun: F) -> T
    where
        F: FnOnce(&mut Arc<Node<N, L>>) -> T,
    {
        let ret = fun(&mut self.children[child_idx]);
        self.recompute();
        self.bump_mutation_count();
        ret
    }

    /// Like [`with_child_mut()`](Self::with_child_mut) but for two adjacent
    /// children at `child_idx` and `child_idx + 1`.
    #[inline]
    pub(super) fn with_two_children_mut<F, T>(
        &mut self,
        child_idx: usize,
        fun: F,
    ) -> T
    where
        F: FnOnce(&mut Arc<Node<N, L>>, &mut Arc<Node<N, L>>) -> T,
    {
        let (left, right) = self.children.split_at_mut(child_idx + 1);
        let ret = fun(&mut left[child_idx], &mut right[0]);
        self.recompute();
        self.bump_mutation_count();
        ret
    }
}

/// Recursively prints a tree-like representation of this node. Called by
/// the `Debug` impl of [`Inode`] when using the pretty-print modifier (i.e.
/// `{:#?}`).
#[inline]
fn pretty_print_inode<const N: usize, L: Leaf>(
    inode: &Inode<N, L>,
    shifts: &mut String,
    ident: &str,
    last_shift_byte_len: usize,
    f: &mut std::fmt::Formatter,
) -> std::fmt::Result {
    writeln!(
        f,
        "{}{}{:?}",
        &shifts[..shifts.len() - last_shift_byte_len],
        ident,
        inode.summary()
    )?;

    for (i, child) in inode.children().iter().enumerate() {
        let is_last = i + 1 == inode.len();
        let ident = if is_last { "└── " } else { "├── " };
        match &**child {
            Node::Internal(inode) => {
                let shift = if is_last { "    " } else { "│   " };
                shifts.push_str(shift);
                pretty_print_inode(inode, shifts, ident, shift.len(), f)?;
                shifts.truncate(shifts.len() - shift.len());
            },
            Node::Leaf(leaf) => {
                writeln!(f, "{}{}{:#?}", &shifts, ident, &leaf)?;
            },
        }
    }

    Ok(())
}
