use core::fmt::Debug;
use core::ops::{Add, AddAssign, Range, Sub, SubAssign};

/// An aggregate of the contents of a subtree.
///
/// Summaries form a monoid: [`Default`] gives the identity element and `+=`
/// folds the summary of the right sibling into the left one. The operation
/// has to be associative, but it doesn't have to be commutative.
pub trait Summary: Debug + Clone + Default + AddAssign {}

pub trait Leaf: Debug + Clone + Default {
    type Summary: Summary;

    /// Whether [`fixup()`](Self::fixup) has to be called every time two
    /// leaves end up next to each other in a tree.
    const NEEDS_FIXUP_ON_APPEND: bool = false;

    /// The length of the leaf in base units.
    fn base_len(&self) -> usize;

    fn summarize(&self) -> Self::Summary;

    /// Returns whether the leaf is too small to be on its own and should be
    /// merged with a neighbour.
    fn is_undersized(&self) -> bool;

    /// Appends `other` to this leaf. If the combined leaf would be too big
    /// it's split in two, and the right half is returned.
    fn push_maybe_splitting(&mut self, other: &Self) -> Option<Self>;

    /// Returns a new leaf with the contents in the given range of base
    /// units.
    fn slice(&self, range: Range<usize>) -> Self;

    /// Returns whether calling [`fixup()`](Self::fixup) with `next` would
    /// change either leaf.
    #[inline]
    fn needs_fixup(&self, _next: &Self) -> bool {
        false
    }

    /// Brings `next`, the leaf that directly follows this one, in sync with
    /// the contents of this leaf, possibly updating this leaf as well.
    ///
    /// Returns `true` if the state carried over from `self` has converged
    /// with the one `next` already had, meaning the leaves after `next`
    /// don't need to be fixed up.
    #[inline]
    fn fixup(&mut self, _next: &mut Self) -> bool {
        true
    }

    /// Returns whether the last unit of this leaf continues into the next
    /// leaf. The last leaf of a tree is fixed up against an empty leaf when
    /// this is true.
    #[inline]
    fn continues_into_next(&self) -> bool {
        false
    }
}

/// How a metric's boundaries relate to the units it counts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MetricKind {
    /// Boundaries are at the start of each unit. The end of a tree is
    /// always a boundary, its start only if the leaf says so.
    Leading,

    /// Boundaries are right after the end of each unit. The start of a tree
    /// is always a boundary, its end only if the leaf says so.
    Trailing,

    /// Units tile the whole tree, so both its start and its end are
    /// boundaries.
    Atomic,
}

/// A way of measuring the contents of a tree.
///
/// Implementors are unit newtypes (e.g. a count of lines), and every value
/// is a position in that unit system. A metric must not carry any state
/// besides its unit value: [`Node::convert`](super::Node) returns its input
/// unchanged when asked to convert a metric to itself.
///
/// All the offsets taken and returned by the leaf-level functions are in
/// base units relative to the start of the leaf.
pub trait Metric<L: Leaf>:
    Debug
    + Copy
    + PartialOrd
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + SubAssign
    + 'static
{
    const KIND: MetricKind;

    /// Whether a single unit can span more than one leaf. If it can't, the
    /// start of every leaf is a boundary.
    const CAN_FRAGMENT: bool;

    /// The identity element of this metric with respect to addition.
    fn zero() -> Self;

    /// Returns the measure of a subtree given its summary and its length in
    /// base units.
    fn measure(summary: &L::Summary, base_len: usize) -> Self;

    /// Returns the offset of the `units`-th boundary in the leaf, counting
    /// the boundaries in `(0, leaf.base_len()]`.
    ///
    /// `units` is always greater than zero and at most the leaf's measure.
    fn to_base_units(leaf: &L, units: Self) -> usize;

    /// Returns the measure of the leaf up to and including `offset`, i.e.
    /// the number of boundaries in `(0, offset]`.
    fn from_base_units(leaf: &L, offset: usize) -> Self;

    /// Returns whether `offset` is a boundary as far as the leaf can tell.
    fn is_boundary(leaf: &L, offset: usize) -> bool;

    /// Returns the last boundary in `[0, offset)` known to the leaf.
    ///
    /// `offset` is in `(0, leaf.base_len()]`.
    fn prev(leaf: &L, offset: usize) -> Option<usize>;

    /// Returns the first boundary in `(offset, leaf.base_len()]` known to
    /// the leaf.
    ///
    /// `offset` is in `[0, leaf.base_len())`.
    fn next(leaf: &L, offset: usize) -> Option<usize>;

    #[inline]
    fn is_zero(self) -> bool {
        self == Self::zero()
    }
}

/// The metric every tree has, measuring base units.
///
/// Every base unit is a boundary.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BaseMetric(pub usize);

impl Add for BaseMetric {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for BaseMetric {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for BaseMetric {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

impl SubAssign for BaseMetric {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0
    }
}

impl From<usize> for BaseMetric {
    #[inline]
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl From<BaseMetric> for usize {
    #[inline]
    fn from(BaseMetric(value): BaseMetric) -> usize {
        value
    }
}

impl<L: Leaf> Metric<L> for BaseMetric {
    const KIND: MetricKind = MetricKind::Atomic;

    const CAN_FRAGMENT: bool = false;

    #[inline]
    fn zero() -> Self {
        Self(0)
    }

    #[inline]
    fn measure(_: &L::Summary, base_len: usize) -> Self {
        Self(base_len)
    }

    #[inline]
    fn to_base_units(_: &L, units: Self) -> usize {
        units.0
    }

    #[inline]
    fn from_base_units(_: &L, offset: usize) -> Self {
        Self(offset)
    }

    #[inline]
    fn is_boundary(_: &L, _: usize) -> bool {
        true
    }

    #[inline]
    fn prev(_: &L, offset: usize) -> Option<usize> {
        debug_assert!(offset > 0);
        Some(offset - 1)
    }

    #[inline]
    fn next(leaf: &L, offset: usize) -> Option<usize> {
        debug_assert!(offset < leaf.base_len());
        Some(offset + 1)
    }
}
