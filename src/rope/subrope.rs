use std::ops::{Range, RangeBounds};

use super::iterators::{
    Bytes,
    Chars,
    Chunks,
    Graphemes,
    Lines,
    Utf16CodeUnits,
};
use super::metrics::{CharMetric, GraphemeMetric, LineMetric, Utf16Metric};
use super::utils::*;
use super::Rope;
use crate::range_bounds_to_start_end;

/// An immutable view into a byte range of a [`Rope`].
///
/// Creating a `Subrope` doesn't copy or allocate anything. Use
/// [`Rope::from`] to turn one into a `Rope` sharing storage with the
/// original.
#[derive(Copy, Clone)]
pub struct Subrope<'a> {
    pub(super) rope: &'a Rope,
    pub(super) start: usize,
    pub(super) end: usize,
}

impl<'a> Subrope<'a> {
    /// Returns the byte at `byte_index`.
    ///
    /// # Panics
    ///
    /// Panics if the byte index is out of bounds (i.e. greater than or equal
    /// to [`byte_len()`](Self::byte_len())).
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::Rope;
    /// #
    /// let r = Rope::from("bar");
    /// let s = r.byte_slice(1..);
    ///
    /// assert_eq!(s.byte(0), b'a');
    /// assert_eq!(s.byte(1), b'r');
    /// ```
    #[track_caller]
    #[inline]
    pub fn byte(&self, byte_index: usize) -> u8 {
        if byte_index >= self.byte_len() {
            byte_index_out_of_bounds(byte_index, self.byte_len());
        }

        let offset = self.start + byte_index;

        let (chunk, chunk_offset) = self.rope.tree.leaf_at_offset(offset);

        chunk.as_bytes()[offset - chunk_offset]
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.end - self.start
    }

    /// Returns the byte offset of the start of the given line, relative to
    /// the start of the `Subrope`.
    ///
    /// # Panics
    ///
    /// Panics if the line offset is out of bounds (i.e. greater than
    /// [`line_len()`](Self::line_len())).
    #[track_caller]
    #[inline]
    pub fn byte_of_line(&self, line_offset: usize) -> usize {
        let line_len = self.line_len();

        if line_offset > line_len {
            line_offset_out_of_bounds(line_offset, line_len);
        }

        if line_offset == 0 {
            return 0;
        }

        if line_offset == line_len {
            return self.byte_len();
        }

        let LineMetric(lines_before) = self.rope.tree.count(self.start);

        let line_start =
            self.rope.tree.base_units(LineMetric(lines_before + line_offset));

        line_start - self.start
    }

    /// Returns the range of the [`Rope`] this `Subrope` is a view of.
    #[inline]
    pub fn byte_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns a sub-view of this `Subrope` in the given byte range,
    /// relative to its start.
    ///
    /// # Panics
    ///
    /// Panics if the start is greater than the end or if the end is out of
    /// bounds (i.e. greater than [`byte_len()`](Self::byte_len())).
    #[track_caller]
    #[inline]
    pub fn byte_slice<R>(&self, byte_range: R) -> Subrope<'a>
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

        Subrope {
            rope: self.rope,
            start: self.start + start,
            end: self.start + end,
        }
    }

    #[inline]
    pub fn bytes(&self) -> Bytes<'a> {
        Bytes::from(self)
    }

    #[inline]
    pub fn char_len(&self) -> usize {
        let CharMetric(chars) = self.rope.tree.distance(self.start, self.end);
        chars
    }

    #[inline]
    pub fn chars(&self) -> Chars<'a> {
        Chars::from(self)
    }

    #[inline]
    pub fn chunks(&self) -> Chunks<'a> {
        Chunks::from(self)
    }

    /// Returns the number of grapheme boundaries in the `Subrope`, which is
    /// its number of graphemes if both of its ends are grapheme boundaries.
    #[inline]
    pub fn grapheme_len(&self) -> usize {
        let GraphemeMetric(graphemes) =
            self.rope.tree.distance(self.start, self.end);
        graphemes
    }

    #[inline]
    pub fn graphemes(&self) -> Graphemes<'a> {
        Graphemes::from(self)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the line at the given index, including its trailing line
    /// break.
    ///
    /// # Panics
    ///
    /// Panics if the line index is out of bounds (i.e. greater than or equal
    /// to [`line_len()`](Self::line_len())).
    ///
    /// # Examples
    ///
    /// ```
    /// # use braid::Rope;
    /// #
    /// let r = Rope::from("foo\nbar\r\nbaz");
    ///
    /// assert_eq!(r.line(0), "foo\n");
    /// assert_eq!(r.line(1), "bar\r\n");
    /// assert_eq!(r.line(2), "baz");
    /// ```
    #[track_caller]
    #[inline]
    pub fn line(&self, line_index: usize) -> Subrope<'a> {
        let line_len = self.line_len();

        if line_index >= line_len {
            line_index_out_of_bounds(line_index, line_len);
        }

        let start = self.byte_of_line(line_index);
        let end = self.byte_of_line(line_index + 1);

        self.byte_slice(start..end)
    }

    /// Returns the number of lines in the `Subrope`, which is one more than
    /// the number of line feeds.
    #[inline]
    pub fn line_len(&self) -> usize {
        let LineMetric(newlines) =
            self.rope.tree.distance(self.start, self.end);
        newlines + 1
    }

    #[inline]
    pub fn lines(&self) -> Lines<'a> {
        Lines::from(self)
    }

    #[inline]
    pub fn utf16_code_units(&self) -> Utf16CodeUnits<'a> {
        Utf16CodeUnits::from(self)
    }

    #[inline]
    pub fn utf16_len(&self) -> usize {
        let Utf16Metric(units) = self.rope.tree.distance(self.start, self.end);
        units
    }
}

impl std::fmt::Debug for Subrope<'_> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Subrope(\"")?;
        debug_chunks(self.chunks(), f)?;
        f.write_str("\")")
    }
}

impl std::fmt::Display for Subrope<'_> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl PartialEq<Subrope<'_>> for Subrope<'_> {
    #[inline]
    fn eq(&self, rhs: &Subrope<'_>) -> bool {
        self.byte_len() == rhs.byte_len()
            && chunks_eq_chunks(self.chunks(), rhs.chunks())
    }
}

impl Eq for Subrope<'_> {}

impl PartialEq<Rope> for Subrope<'_> {
    #[inline]
    fn eq(&self, rhs: &Rope) -> bool {
        self.byte_len() == rhs.byte_len()
            && chunks_eq_chunks(self.chunks(), rhs.chunks())
    }
}

impl PartialEq<Subrope<'_>> for Rope {
    #[inline]
    fn eq(&self, rhs: &Subrope<'_>) -> bool {
        rhs == self
    }
}

impl PartialEq<str> for Subrope<'_> {
    #[inline]
    fn eq(&self, rhs: &str) -> bool {
        self.byte_len() == rhs.len() && chunks_eq_str(self.chunks(), rhs)
    }
}

impl PartialEq<&str> for Subrope<'_> {
    #[inline]
    fn eq(&self, rhs: &&str) -> bool {
        self == *rhs
    }
}

impl PartialEq<String> for Subrope<'_> {
    #[inline]
    fn eq(&self, rhs: &String) -> bool {
        self == rhs.as_str()
    }
}

impl PartialEq<Subrope<'_>> for &str {
    #[inline]
    fn eq(&self, rhs: &Subrope<'_>) -> bool {
        rhs == *self
    }
}
