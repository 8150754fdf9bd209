//! A persistent B-tree with copy-on-write nodes, generic over its leaves and
//! indexable by any number of metrics.

mod delta;
mod index;
mod leaves;
mod node;
mod node_internal;
mod node_leaf;
mod traits;
#[allow(clippy::module_inception)]
mod tree;
mod tree_builder;

#[cfg(test)]
pub(crate) mod test_leaf;

pub use delta::{Delta, DeltaBuilder, DeltaElement, DeltaRegion};
pub use index::{Index, IndexError};
pub use leaves::Leaves;
use node::Node;
use node_internal::Inode;
use node_leaf::Lnode;
pub use traits::{BaseMetric, Leaf, Metric, MetricKind, Summary};
pub use tree::Tree;
pub use tree_builder::TreeBuilder;
