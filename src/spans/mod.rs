//! Interval maps over the same offsets a [`Rope`](crate::Rope) uses, for
//! tagging ranges of a document with styles or cached values.

mod interval_cache;
mod iter;
mod spans;
mod spans_builder;
mod spans_leaf;

pub use interval_cache::IntervalCache;
pub use iter::Iter;
pub use spans::Spans;
pub use spans_builder::SpansBuilder;
pub use spans_leaf::{Span, SpanMetric, SpansLeaf, SpansSummary};
