//! braid is a persistent B-tree text storage engine.
//!
//! The core is a generic copy-on-write [`Tree`](tree::Tree) indexable by
//! any number of metrics. On top of it sit:
//!
//! - [`Rope`], a UTF-8 text rope that tracks grapheme cluster boundaries
//! across its chunks and hands back a [`RopeDelta`] for every edit;
//!
//! - [`Spans`], an interval map over the same offsets, and
//! [`IntervalCache`], which keeps cached spans valid across edits;
//!
//! - [`Heights`], a line height tree for mapping between lines and vertical
//! offsets;
//!
//! - [`LruCache`], a small bounded cache.
//!
//! # Examples
//!
//! ```
//! # use braid::Rope;
//! #
//! let mut rope = Rope::from("Hello, world!");
//! let old = rope.clone();
//!
//! let delta = rope.replace(7..12, "🌎");
//!
//! assert_eq!(rope, "Hello, 🌎!");
//! assert_eq!(old, "Hello, world!");
//! assert_eq!(old.applying(&delta), rope);
//! ```

#![allow(clippy::explicit_auto_deref)]
#![allow(clippy::module_inception)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

mod heights;
mod lru_cache;
mod rope;
pub mod spans;
pub mod tree;

pub mod iter {
    //! Iterators over [`Rope`](crate::Rope)s and
    //! [`Subrope`](crate::Subrope)s.

    pub use crate::rope::iterators::*;
}

pub mod metrics {
    //! The metrics a [`Rope`](crate::Rope) can be indexed by.

    pub use crate::rope::metrics::{
        ByteMetric,
        CharMetric,
        GraphemeMetric,
        LineMetric,
        Utf16Metric,
    };
}

pub use heights::{
    Heights,
    HeightsBaseMetric,
    HeightsLeaf,
    HeightsSummary,
    YOffsetMetric,
};
pub use lru_cache::LruCache;
pub use rope::{
    Chunk,
    GraphemeBreaker,
    Rope,
    RopeBuilder,
    RopeDelta,
    Subrope,
    TextSummary,
};
pub use spans::{IntervalCache, Spans, SpansBuilder};

/// Turns a range with possibly unbounded ends into a `(start, end)` pair,
/// using `lo` and `hi` for the unbounded ends.
#[inline]
pub(crate) fn range_bounds_to_start_end<B>(
    range: B,
    lo: usize,
    hi: usize,
) -> (usize, usize)
where
    B: core::ops::RangeBounds<usize>,
{
    use core::ops::Bound;

    let start = match range.start_bound() {
        Bound::Included(&n) => n,
        Bound::Excluded(&n) => n + 1,
        Bound::Unbounded => lo,
    };

    let end = match range.end_bound() {
        Bound::Included(&n) => n + 1,
        Bound::Excluded(&n) => n,
        Bound::Unbounded => hi,
    };

    (start, end)
}
