use super::Leaf;

#[derive(Clone, Default)]
pub(super) struct Lnode<L: Leaf> {
    value: L,
    summary: L::Summary,
    base_len: usize,
    mutation_count: u64,
}

impl<L: Leaf> std::fmt::Debug for Lnode<L> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if !f.alternate() {
            f.debug_struct("Lnode")
                .field("value", &self.value)
                .field("summary", &self.summary)
                .finish()
        } else {
            write!(f, "{:?}", self.value)
        }
    }
}

impl<L: Leaf> From<L> for Lnode<L> {
    #[inline]
    fn from(value: L) -> Self {
        Self {
            summary: value.summarize(),
            base_len: value.base_len(),
            value,
            mutation_count: 0,
        }
    }
}

impl<L: Leaf> Lnode<L> {
    #[inline]
    pub(super) fn as_leaf(&self) -> &L {
        &self.value
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
    pub(super) fn is_undersized(&self) -> bool {
        self.value.is_undersized()
    }

    #[inline]
    pub(super) fn mutation_count(&self) -> u64 {
        self.mutation_count
    }

    #[inline]
    pub(super) fn summary(&self) -> &L::Summary {
        &self.summary
    }

    /// Calls the closure with a mutable reference to the leaf, then
    /// re-summarizes it.
    #[inline]
    pub(super) fn with_mut<F, T>(&mut self, fun: F) -> T
    where
        F: FnOnce(&mut L) -> T,
    {
        let ret = fun(&mut self.value);
        self.summary = self.value.summarize();
        self.base_len = self.value.base_len();
        self.bump_mutation_count();
        ret
    }
}
