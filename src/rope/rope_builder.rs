use super::chunk::MAX_BYTES;
use super::rope::ROPE_ARITY;
use super::utils::adjust_split_point;
use super::{Chunk, Rope};
use crate::tree::TreeBuilder;

/// An incremental [`Rope`] builder.
#[derive(Clone, Default)]
pub struct RopeBuilder {
    tree_builder: TreeBuilder<ROPE_ARITY, Chunk>,

    /// Text that hasn't been turned into chunks yet. It's kept below
    /// `2 * MAX_BYTES` bytes after every call to `append`.
    buffer: String,
}

impl RopeBuilder {
    /// Appends `text` to the end of the `Rope` being built.
    #[inline]
    pub fn append<T>(&mut self, text: T) -> &mut Self
    where
        T: AsRef<str>,
    {
        self.buffer.push_str(text.as_ref());

        if self.buffer.len() >= 2 * MAX_BYTES {
            let flush_up_to = adjust_split_point::<false>(
                &self.buffer,
                self.buffer.len() - MAX_BYTES,
            );

            for chunk in Chunk::chunks_of(&self.buffer[..flush_up_to]) {
                self.tree_builder.push_leaf(chunk);
            }

            self.buffer.drain(..flush_up_to);
        }

        self
    }

    /// Completes the build, consuming the `RopeBuilder` and returning the
    /// `Rope`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::{Rope, RopeBuilder};
    /// #
    /// let mut builder = RopeBuilder::new();
    ///
    /// builder.append("ƒoo\n").append("bär\r\n").append("baz");
    ///
    /// let rope: Rope = builder.build();
    ///
    /// assert_eq!(rope, "ƒoo\nbär\r\nbaz");
    /// ```
    #[inline]
    pub fn build(mut self) -> Rope {
        for chunk in Chunk::chunks_of(&self.buffer) {
            self.tree_builder.push_leaf(chunk);
        }

        Rope { tree: self.tree_builder.build() }
    }

    /// Creates a new `RopeBuilder`.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}
