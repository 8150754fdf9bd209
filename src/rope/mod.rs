//! A UTF-8 text rope built on top of a [`Tree`](crate::tree::Tree) of
//! grapheme-aware chunks.

mod chunk;
mod grapheme_breaker;
pub(crate) mod iterators;
pub(crate) mod metrics;
#[allow(clippy::module_inception)]
mod rope;
mod rope_builder;
#[cfg(feature = "serde")]
mod serde_impl;
mod subrope;
mod utils;

pub use chunk::{Chunk, TextSummary};
pub use grapheme_breaker::GraphemeBreaker;
pub(crate) use rope::ROPE_ARITY;
pub use rope::{Rope, RopeDelta};
pub use rope_builder::RopeBuilder;
pub use subrope::Subrope;
