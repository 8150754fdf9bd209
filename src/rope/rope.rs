use std::ops::RangeBounds;

use super::iterators::{
    Bytes,
    Chars,
    Chunks,
    Graphemes,
    Lines,
    Utf16CodeUnits,
};
use super::metrics::{
    CharMetric,
    GraphemeMetric,
    LineMetric,
    Utf16Metric,
};
use super::utils::*;
use super::{Chunk, Subrope};
use crate::range_bounds_to_start_end;
use crate::tree::{Delta, DeltaBuilder, Index, Metric, Tree};

#[cfg(not(any(test, feature = "arity_4")))]
pub(crate) const ROPE_ARITY: usize = 8;

#[cfg(any(test, feature = "arity_4"))]
pub(crate) const ROPE_ARITY: usize = 4;

/// The edit returned by [`Rope::replace()`] and friends. Applying it to the
/// rope as it was before the edit gives the rope after the edit.
pub type RopeDelta = Delta<ROPE_ARITY, Chunk>;

/// A UTF-8 text rope.
///
/// Cloning a `Rope` is `O(1)` and the clones share their storage, so keeping
/// old versions of a document around is cheap.
#[derive(Clone, Default)]
pub struct Rope {
    pub(super) tree: Tree<ROPE_ARITY, Chunk>,
}

impl Rope {
    /// Appends `other` to the end of this `Rope`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::Rope;
    /// #
    /// let mut r = Rope::from("👨\u{200d}");
    /// r.append(&Rope::from("👩"));
    ///
    /// assert_eq!(r, "👨\u{200d}👩");
    /// assert_eq!(r.grapheme_len(), 1);
    /// ```
    #[inline]
    pub fn append(&mut self, other: &Self) {
        self.tree.append(&other.tree);
    }

    /// Returns the rope obtained by applying `delta` to this one.
    ///
    /// # Panics
    ///
    /// Panics if the delta wasn't built for a rope of this length.
    #[track_caller]
    #[inline]
    pub fn applying(&self, delta: &RopeDelta) -> Self {
        Self { tree: self.tree.applying(delta) }
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }

    /// Returns the byte at `byte_index`.
    ///
    /// # Panics
    ///
    /// Panics if the byte index is out of bounds (i.e. greater than or equal
    /// to [`byte_len()`](Self::byte_len())).
    #[track_caller]
    #[inline]
    pub fn byte(&self, byte_index: usize) -> u8 {
        self.byte_slice(..).byte(byte_index)
    }

    /// Returns the length of the `Rope` in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.tree.base_len()
    }

    /// Returns the byte offset of the given char offset.
    ///
    /// # Panics
    ///
    /// Panics if the char offset is out of bounds (i.e. greater than
    /// [`char_len()`](Self::char_len())).
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::Rope;
    /// #
    /// let r = Rope::from("ƒoo");
    ///
    /// assert_eq!(r.byte_of_char(1), 2);
    /// assert_eq!(r.byte_of_char(3), 4);
    /// ```
    #[track_caller]
    #[inline]
    pub fn byte_of_char(&self, char_offset: usize) -> usize {
        if char_offset > self.char_len() {
            char_offset_out_of_bounds(char_offset, self.char_len());
        }
        self.tree.base_units(CharMetric(char_offset))
    }

    /// Returns the byte offset of the start of the given grapheme.
    ///
    /// # Panics
    ///
    /// Panics if the grapheme offset is out of bounds (i.e. greater than
    /// [`grapheme_len()`](Self::grapheme_len())).
    #[track_caller]
    #[inline]
    pub fn byte_of_grapheme(&self, grapheme_offset: usize) -> usize {
        if grapheme_offset > self.grapheme_len() {
            let len = self.grapheme_len();
            grapheme_offset_out_of_bounds(grapheme_offset, len);
        }
        self.tree.base_units(GraphemeMetric(grapheme_offset))
    }

    /// Returns the byte offset of the start of the given line.
    ///
    /// # Panics
    ///
    /// Panics if the line offset is out of bounds (i.e. greater than
    /// [`line_len()`](Self::line_len())).
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::Rope;
    /// #
    /// let r = Rope::from("ƒoo\nbär\r\nbaz");
    ///
    /// assert_eq!(r.byte_of_line(0), 0);
    /// assert_eq!(r.byte_of_line(1), "ƒoo\n".len());
    /// assert_eq!(r.byte_of_line(3), r.byte_len());
    /// ```
    #[track_caller]
    #[inline]
    pub fn byte_of_line(&self, line_offset: usize) -> usize {
        self.byte_slice(..).byte_of_line(line_offset)
    }

    /// Returns the byte offset of the given UTF-16 code unit offset.
    ///
    /// # Panics
    ///
    /// Panics if the offset is out of bounds (i.e. greater than
    /// [`utf16_len()`](Self::utf16_len())).
    #[track_caller]
    #[inline]
    pub fn byte_of_utf16(&self, utf16_offset: usize) -> usize {
        if utf16_offset > self.utf16_len() {
            utf16_offset_out_of_bounds(utf16_offset, self.utf16_len());
        }
        self.tree.base_units(Utf16Metric(utf16_offset))
    }

    /// Returns an immutable view of the `Rope` in the given byte range.
    ///
    /// # Panics
    ///
    /// Panics if the start is greater than the end or if the end is out of
    /// bounds (i.e. greater than [`byte_len()`](Self::byte_len())).
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::Rope;
    /// #
    /// let r = Rope::from("Hello, world!");
    ///
    /// assert_eq!(r.byte_slice(7..12), "world");
    /// assert_eq!(r.byte_slice(..5).byte_len(), 5);
    /// ```
    #[track_caller]
    #[inline]
    pub fn byte_slice<R>(&self, byte_range: R) -> Subrope<'_>
    where
        R: RangeBounds<usize>,
    {
        let (start, end) =
            range_bounds_to_start_end(byte_range, 0, self.byte_len());

        if start > end {
            byte_start_after_end(start, end);
        }

        if end > self.byte_len() {
            byte_offset_out_of_bounds(end, self.byte_len());
        }

        Subrope { rope: self, start, end }
    }

    /// Returns an iterator over the bytes of this `Rope`.
    #[inline]
    pub fn bytes(&self) -> Bytes<'_> {
        Bytes::from(&self.byte_slice(..))
    }

    /// Returns the length of the `Rope` in Unicode scalar values.
    #[inline]
    pub fn char_len(&self) -> usize {
        self.tree.summary().chars
    }

    /// Returns the char offset of the given byte offset. An offset inside a
    /// multi-byte char is rounded down to the start of the char.
    ///
    /// # Panics
    ///
    /// Panics if the byte offset is out of bounds.
    #[track_caller]
    #[inline]
    pub fn char_of_byte(&self, byte_offset: usize) -> usize {
        self.check_byte_offset(byte_offset);
        let CharMetric(chars) = self.tree.count(byte_offset);
        chars
    }

    /// Returns an iterator over the [`char`]s of this `Rope`.
    #[inline]
    pub fn chars(&self) -> Chars<'_> {
        Chars::from(&self.byte_slice(..))
    }

    #[track_caller]
    #[inline]
    fn check_byte_offset(&self, byte_offset: usize) {
        if byte_offset > self.byte_len() {
            byte_offset_out_of_bounds(byte_offset, self.byte_len());
        }
    }

    /// Returns an iterator over the chunks of this `Rope`.
    #[inline]
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks::from(self)
    }

    /// Deletes the given byte range, rounding both of its ends down to
    /// grapheme boundaries. See [`replace()`](Self::replace).
    #[track_caller]
    #[inline]
    pub fn delete<R>(&mut self, byte_range: R) -> RopeDelta
    where
        R: RangeBounds<usize>,
    {
        self.replace(byte_range, "")
    }

    /// Returns the number of `M` units between two byte offsets.
    ///
    /// # Panics
    ///
    /// Panics if `start > end` or if `end` is out of bounds.
    #[track_caller]
    #[inline]
    pub fn distance<M: Metric<Chunk>>(&self, start: usize, end: usize) -> M {
        if start > end {
            byte_start_after_end(start, end);
        }
        self.check_byte_offset(end);
        self.tree.distance(start, end)
    }

    /// Returns the length of the `Rope` in extended grapheme clusters.
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::Rope;
    /// #
    /// let r = Rope::from("🇷🇸🇮🇴");
    ///
    /// assert_eq!(r.grapheme_len(), 2);
    /// assert_eq!(r.char_len(), 4);
    /// ```
    #[inline]
    pub fn grapheme_len(&self) -> usize {
        self.tree.summary().graphemes
    }

    /// Returns the number of graphemes that end at or before the given byte
    /// offset.
    ///
    /// # Panics
    ///
    /// Panics if the byte offset is out of bounds.
    #[track_caller]
    #[inline]
    pub fn grapheme_of_byte(&self, byte_offset: usize) -> usize {
        self.check_byte_offset(byte_offset);
        let GraphemeMetric(graphemes) = self.tree.count(byte_offset);
        graphemes
    }

    /// Returns an iterator over the extended grapheme clusters of this
    /// `Rope`.
    #[inline]
    pub fn graphemes(&self) -> Graphemes<'_> {
        Graphemes::from(&self.byte_slice(..))
    }

    /// Returns an [`Index`] at the given byte offset.
    ///
    /// # Panics
    ///
    /// Panics if the byte offset is out of bounds.
    #[track_caller]
    #[inline]
    pub fn index_at(&self, byte_offset: usize) -> Index<ROPE_ARITY, Chunk> {
        self.check_byte_offset(byte_offset);
        self.tree.index_at(byte_offset)
    }

    /// Returns the first `M` boundary after the given byte offset, if any.
    #[track_caller]
    #[inline]
    pub fn index_after<M: Metric<Chunk>>(
        &self,
        byte_offset: usize,
    ) -> Option<usize> {
        self.index_at(byte_offset).next::<M>()
    }

    /// Returns the last `M` boundary before the given byte offset, if any.
    #[track_caller]
    #[inline]
    pub fn index_before<M: Metric<Chunk>>(
        &self,
        byte_offset: usize,
    ) -> Option<usize> {
        self.index_at(byte_offset).prev::<M>()
    }

    /// Moves `delta` `M` units away from `byte_offset`, clamping the result
    /// to the bounds of the `Rope`.
    #[track_caller]
    #[inline]
    pub fn index_offset_by<M>(&self, byte_offset: usize, delta: isize) -> usize
    where
        M: Metric<Chunk> + From<usize> + Into<usize>,
    {
        self.check_byte_offset(byte_offset);
        self.tree.index_offset_by::<M>(byte_offset, delta)
    }

    /// Like [`index_offset_by()`](Self::index_offset_by) but returns `None`
    /// if the target is out of bounds.
    #[track_caller]
    #[inline]
    pub fn index_offset_by_limited<M>(
        &self,
        byte_offset: usize,
        delta: isize,
    ) -> Option<usize>
    where
        M: Metric<Chunk> + From<usize> + Into<usize>,
    {
        self.check_byte_offset(byte_offset);
        self.tree.index_offset_by_limited::<M>(byte_offset, delta)
    }

    /// Returns the byte offset if it's an `M` boundary, or the previous `M`
    /// boundary otherwise.
    #[track_caller]
    #[inline]
    pub fn index_rounding_down<M: Metric<Chunk>>(
        &self,
        byte_offset: usize,
    ) -> usize {
        self.check_byte_offset(byte_offset);
        self.tree.index_rounding_down::<M>(byte_offset)
    }

    /// Inserts `text` at the given byte offset, rounded down to a grapheme
    /// boundary. See [`replace()`](Self::replace).
    #[track_caller]
    #[inline]
    pub fn insert<T>(&mut self, byte_offset: usize, text: T) -> RopeDelta
    where
        T: AsRef<str>,
    {
        self.replace(byte_offset..byte_offset, text)
    }

    /// Returns whether the given byte offset is an `M` boundary.
    #[track_caller]
    #[inline]
    pub fn is_boundary<M: Metric<Chunk>>(&self, byte_offset: usize) -> bool {
        self.check_byte_offset(byte_offset);
        self.tree.is_boundary::<M>(byte_offset)
    }

    /// Returns whether the given byte offset lies on a char boundary.
    #[track_caller]
    #[inline]
    pub fn is_char_boundary(&self, byte_offset: usize) -> bool {
        self.is_boundary::<CharMetric>(byte_offset)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.byte_len() == 0
    }

    /// Returns whether the given byte offset lies on an extended grapheme
    /// cluster boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::Rope;
    /// #
    /// let r = Rope::from("🇷🇸🇮🇴");
    ///
    /// assert!(r.is_grapheme_boundary(0));
    /// assert!(!r.is_grapheme_boundary(4));
    /// assert!(r.is_grapheme_boundary(8));
    /// ```
    #[track_caller]
    #[inline]
    pub fn is_grapheme_boundary(&self, byte_offset: usize) -> bool {
        self.is_boundary::<GraphemeMetric>(byte_offset)
    }

    /// Returns the line at the given index, including its trailing line
    /// break.
    ///
    /// # Panics
    ///
    /// Panics if the line index is out of bounds (i.e. greater than or equal
    /// to [`line_len()`](Self::line_len())).
    #[track_caller]
    #[inline]
    pub fn line(&self, line_index: usize) -> Subrope<'_> {
        self.byte_slice(..).line(line_index)
    }

    /// Returns the number of lines in the `Rope`, which is one more than the
    /// number of line feeds.
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::Rope;
    /// #
    /// assert_eq!(Rope::from("").line_len(), 1);
    /// assert_eq!(Rope::from("a\nb").line_len(), 2);
    /// assert_eq!(Rope::from("a\nb\n").line_len(), 3);
    /// ```
    #[inline]
    pub fn line_len(&self) -> usize {
        self.tree.summary().newlines + 1
    }

    /// Returns the index of the line containing the given byte offset.
    ///
    /// # Panics
    ///
    /// Panics if the byte offset is out of bounds.
    #[track_caller]
    #[inline]
    pub fn line_of_byte(&self, byte_offset: usize) -> usize {
        self.check_byte_offset(byte_offset);
        let LineMetric(lines) = self.tree.count(byte_offset);
        lines
    }

    /// Returns an iterator over the lines of this `Rope`.
    #[inline]
    pub fn lines(&self) -> Lines<'_> {
        Lines::from(&self.byte_slice(..))
    }

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the text in the given byte range with `text`, returning the
    /// edit as a [`RopeDelta`].
    ///
    /// Both ends of the range are rounded down to grapheme boundaries first,
    /// so an edit never leaves half of a grapheme cluster behind.
    ///
    /// # Panics
    ///
    /// Panics if the start of the range is greater than its end, or if its
    /// end is out of bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::Rope;
    /// #
    /// let mut r = Rope::from("hello\nworld");
    /// let old = r.clone();
    ///
    /// let delta = r.replace(5..6, "");
    ///
    /// assert_eq!(r, "helloworld");
    /// assert_eq!(delta.summary(), (5..6, 0));
    /// assert_eq!(old.applying(&delta), r);
    /// ```
    #[track_caller]
    #[inline]
    pub fn replace<R, T>(&mut self, byte_range: R, text: T) -> RopeDelta
    where
        R: RangeBounds<usize>,
        T: AsRef<str>,
    {
        let (start, end) =
            range_bounds_to_start_end(byte_range, 0, self.byte_len());

        if start > end {
            byte_start_after_end(start, end);
        }

        self.check_byte_offset(end);

        let start = self.tree.index_rounding_down::<GraphemeMetric>(start);
        let end = self.tree.index_rounding_down::<GraphemeMetric>(end);

        let text = text.as_ref();

        tracing::debug!(start, end, inserted = text.len(), "replacing text");

        let mut builder = DeltaBuilder::new(self.byte_len());
        builder.replace(start..end, Rope::from(text).tree);
        let delta = builder.build();

        self.tree = self.tree.applying(&delta);

        delta
    }

    /// Returns the underlying tree.
    #[inline]
    pub fn tree(&self) -> &Tree<ROPE_ARITY, Chunk> {
        &self.tree
    }

    /// Returns the length of the `Rope` in UTF-16 code units.
    #[inline]
    pub fn utf16_len(&self) -> usize {
        self.tree.summary().utf16
    }

    /// Returns an iterator over the UTF-16 code units of this `Rope`.
    #[inline]
    pub fn utf16_code_units(&self) -> Utf16CodeUnits<'_> {
        Utf16CodeUnits::from(&self.byte_slice(..))
    }

    /// Returns the UTF-16 offset of the given byte offset. An offset inside a
    /// multi-byte char is rounded down to the start of the char.
    ///
    /// # Panics
    ///
    /// Panics if the byte offset is out of bounds.
    #[track_caller]
    #[inline]
    pub fn utf16_of_byte(&self, byte_offset: usize) -> usize {
        self.check_byte_offset(byte_offset);
        let Utf16Metric(units) = self.tree.count(byte_offset);
        units
    }
}

impl std::fmt::Debug for Rope {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Rope(\"")?;
        debug_chunks(self.chunks(), f)?;
        f.write_str("\")")
    }
}

impl std::fmt::Display for Rope {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl From<&str> for Rope {
    #[inline]
    fn from(s: &str) -> Self {
        Self { tree: Tree::from_leaves(Chunk::chunks_of(s)) }
    }
}

impl From<String> for Rope {
    #[inline]
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<std::borrow::Cow<'_, str>> for Rope {
    #[inline]
    fn from(s: std::borrow::Cow<'_, str>) -> Self {
        Self::from(&*s)
    }
}

impl From<Subrope<'_>> for Rope {
    #[inline]
    fn from(subrope: Subrope<'_>) -> Self {
        Self { tree: subrope.rope.tree.slice(subrope.start..subrope.end) }
    }
}

impl std::ops::Add for Rope {
    type Output = Self;

    #[inline]
    fn add(mut self, rhs: Self) -> Self {
        self.append(&rhs);
        self
    }
}

impl std::ops::AddAssign<&Rope> for Rope {
    #[inline]
    fn add_assign(&mut self, rhs: &Rope) {
        self.append(rhs);
    }
}

impl PartialEq<Rope> for Rope {
    #[inline]
    fn eq(&self, rhs: &Rope) -> bool {
        self.byte_len() == rhs.byte_len()
            && chunks_eq_chunks(self.chunks(), rhs.chunks())
    }
}

impl Eq for Rope {}

impl PartialEq<str> for Rope {
    #[inline]
    fn eq(&self, rhs: &str) -> bool {
        self.byte_len() == rhs.len() && chunks_eq_str(self.chunks(), rhs)
    }
}

impl PartialEq<Rope> for str {
    #[inline]
    fn eq(&self, rhs: &Rope) -> bool {
        rhs == self
    }
}

impl PartialEq<&str> for Rope {
    #[inline]
    fn eq(&self, rhs: &&str) -> bool {
        self == *rhs
    }
}

impl PartialEq<Rope> for &str {
    #[inline]
    fn eq(&self, rhs: &Rope) -> bool {
        rhs == *self
    }
}

impl PartialEq<String> for Rope {
    #[inline]
    fn eq(&self, rhs: &String) -> bool {
        self == rhs.as_str()
    }
}

impl PartialEq<Rope> for String {
    #[inline]
    fn eq(&self, rhs: &Rope) -> bool {
        rhs == self.as_str()
    }
}
