use std::borrow::Cow;
use std::iter::{FlatMap, FusedIterator};

use super::rope::ROPE_ARITY;
use super::{Chunk, Rope, Subrope};
use crate::tree::Leaves;

/// An iterator over the chunks of a [`Rope`] or [`Subrope`].
///
/// This struct is created by the `chunks` method on [`Rope`] and
/// [`Subrope`]. See their documentation for more.
#[derive(Clone)]
pub struct Chunks<'a> {
    leaves: Leaves<'a, ROPE_ARITY, Chunk>,

    /// The byte offset in the first leaf where the range starts.
    start_in_first: usize,

    /// The byte offset in the last leaf where the range ends.
    end_in_last: usize,

    /// The total number of leaves overlapping the range.
    total: usize,

    yielded_forward: usize,
    yielded_backward: usize,
}

impl<'a> From<&'a Rope> for Chunks<'a> {
    #[inline]
    fn from(rope: &'a Rope) -> Self {
        Self::from(&rope.byte_slice(..))
    }
}

impl<'a> From<&Subrope<'a>> for Chunks<'a> {
    #[inline]
    fn from(subrope: &Subrope<'a>) -> Self {
        let tree = &subrope.rope.tree;

        let (start, end) = (subrope.start, subrope.end);

        let leaves = tree.leaves_in_range(start..end);

        let (start_in_first, end_in_last) = if start == end {
            (0, 0)
        } else {
            let (_, first_offset) = tree.leaf_at_offset(start);
            let (_, last_offset) = tree.leaf_at_offset(end - 1);
            (start - first_offset, end - last_offset)
        };

        Self {
            total: leaves.len(),
            leaves,
            start_in_first,
            end_in_last,
            yielded_forward: 0,
            yielded_backward: 0,
        }
    }
}

impl<'a> Chunks<'a> {
    /// Returns the byte range of the `idx`-th leaf that's inside the range.
    #[inline]
    fn trim(&self, chunk: &Chunk, idx: usize) -> std::ops::Range<usize> {
        let start = if idx == 0 { self.start_in_first } else { 0 };

        let end = if idx + 1 == self.total {
            self.end_in_last
        } else {
            chunk.len()
        };

        start..end
    }

    /// Like `next` but also returns the chunk the string was cut from and
    /// the offset of the string in it.
    #[inline]
    fn next_with_chunk(&mut self) -> Option<(&'a str, &'a Chunk, usize)> {
        let chunk = self.leaves.next()?;
        let range = self.trim(chunk, self.yielded_forward);
        self.yielded_forward += 1;
        Some((&chunk.as_str()[range.clone()], chunk, range.start))
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.next_with_chunk().map(|(s, _, _)| s)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.leaves.size_hint()
    }
}

impl DoubleEndedIterator for Chunks<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let chunk = self.leaves.next_back()?;
        let range = self.trim(chunk, self.total - 1 - self.yielded_backward);
        self.yielded_backward += 1;
        Some(&chunk.as_str()[range])
    }
}

impl ExactSizeIterator for Chunks<'_> {}

impl FusedIterator for Chunks<'_> {}

type ChunkBytes<'a> =
    FlatMap<Chunks<'a>, std::str::Bytes<'a>, fn(&'a str) -> std::str::Bytes<'a>>;

/// An iterator over the bytes of a [`Rope`] or [`Subrope`].
#[derive(Clone)]
pub struct Bytes<'a> {
    bytes: ChunkBytes<'a>,
    remaining: usize,
}

impl<'a> From<&Subrope<'a>> for Bytes<'a> {
    #[inline]
    fn from(subrope: &Subrope<'a>) -> Self {
        let chunks = Chunks::from(subrope);
        Self {
            bytes: chunks.flat_map(str::bytes as fn(&'a str) -> std::str::Bytes<'a>),
            remaining: subrope.byte_len(),
        }
    }
}

impl Iterator for Bytes<'_> {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        let byte = self.bytes.next()?;
        self.remaining -= 1;
        Some(byte)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Bytes<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<u8> {
        let byte = self.bytes.next_back()?;
        self.remaining -= 1;
        Some(byte)
    }
}

impl ExactSizeIterator for Bytes<'_> {}

impl FusedIterator for Bytes<'_> {}

type ChunkChars<'a> =
    FlatMap<Chunks<'a>, std::str::Chars<'a>, fn(&'a str) -> std::str::Chars<'a>>;

/// An iterator over the [`char`]s of a [`Rope`] or [`Subrope`].
#[derive(Clone)]
pub struct Chars<'a> {
    chars: ChunkChars<'a>,
}

impl<'a> From<&Subrope<'a>> for Chars<'a> {
    #[inline]
    fn from(subrope: &Subrope<'a>) -> Self {
        let chunks = Chunks::from(subrope);
        Self { chars: chunks.flat_map(str::chars as fn(&'a str) -> std::str::Chars<'a>) }
    }
}

impl Iterator for Chars<'_> {
    type Item = char;

    #[inline]
    fn next(&mut self) -> Option<char> {
        self.chars.next()
    }
}

impl DoubleEndedIterator for Chars<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<char> {
        self.chars.next_back()
    }
}

impl FusedIterator for Chars<'_> {}

/// An iterator over the UTF-16 code units of a [`Rope`] or [`Subrope`].
#[derive(Clone)]
pub struct Utf16CodeUnits<'a> {
    chunks: Chunks<'a>,
    current: std::str::EncodeUtf16<'a>,
    remaining: usize,
}

impl<'a> From<&Subrope<'a>> for Utf16CodeUnits<'a> {
    #[inline]
    fn from(subrope: &Subrope<'a>) -> Self {
        Self {
            chunks: Chunks::from(subrope),
            current: "".encode_utf16(),
            remaining: subrope.utf16_len(),
        }
    }
}

impl Iterator for Utf16CodeUnits<'_> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<u16> {
        loop {
            if let Some(unit) = self.current.next() {
                self.remaining -= 1;
                return Some(unit);
            }
            self.current = self.chunks.next()?.encode_utf16();
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Utf16CodeUnits<'_> {}

impl FusedIterator for Utf16CodeUnits<'_> {}

/// An iterator over the extended grapheme clusters of a [`Rope`] or
/// [`Subrope`].
///
/// Graphemes contained in a single chunk are borrowed, the ones spanning
/// chunk boundaries are collected into a `String`.
#[derive(Clone)]
pub struct Graphemes<'a> {
    chunks: Chunks<'a>,

    /// The piece of the current chunk that hasn't been yielded yet.
    current: &'a str,

    /// The chunk `current` is cut from and the offset of `current` in it.
    chunk: Option<(&'a Chunk, usize)>,
}

impl<'a> From<&Subrope<'a>> for Graphemes<'a> {
    #[inline]
    fn from(subrope: &Subrope<'a>) -> Self {
        Self { chunks: Chunks::from(subrope), current: "", chunk: None }
    }
}

impl<'a> Graphemes<'a> {
    /// Advances to the next chunk, returning `false` if there isn't one.
    #[inline]
    fn advance(&mut self) -> bool {
        match self.chunks.next_with_chunk() {
            Some((piece, chunk, offset)) => {
                self.current = piece;
                self.chunk = Some((chunk, offset));
                true
            },
            None => false,
        }
    }
}

impl<'a> Iterator for Graphemes<'a> {
    type Item = Cow<'a, str>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let mut grapheme = Cow::Borrowed("");

        loop {
            if self.current.is_empty() && !self.advance() {
                return (!grapheme.is_empty()).then_some(grapheme);
            }

            let (chunk, offset) = self.chunk.expect("just advanced");

            let boundary = chunk
                .next_grapheme_boundary(offset)
                .map(|boundary| boundary - offset);

            let (piece, is_complete) = match boundary {
                Some(len) if len <= self.current.len() => {
                    (&self.current[..len], true)
                },
                _ => (self.current, false),
            };

            self.current = &self.current[piece.len()..];
            self.chunk = Some((chunk, offset + piece.len()));

            if grapheme.is_empty() {
                grapheme = Cow::Borrowed(piece);
            } else {
                grapheme.to_mut().push_str(piece);
            }

            if is_complete {
                return Some(grapheme);
            }
        }
    }
}

impl FusedIterator for Graphemes<'_> {}

/// An iterator over the lines of a [`Rope`] or [`Subrope`].
///
/// Every line includes its trailing `\n`, and the line after the last
/// `\n` is always yielded, even if it's empty.
#[derive(Clone)]
pub struct Lines<'a> {
    subrope: Subrope<'a>,
    forward: usize,
    backward: usize,
}

impl<'a> From<&Subrope<'a>> for Lines<'a> {
    #[inline]
    fn from(subrope: &Subrope<'a>) -> Self {
        Self { subrope: *subrope, forward: 0, backward: subrope.line_len() }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Subrope<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.forward == self.backward {
            return None;
        }
        let line = self.subrope.line(self.forward);
        self.forward += 1;
        Some(line)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let exact = self.backward - self.forward;
        (exact, Some(exact))
    }
}

impl DoubleEndedIterator for Lines<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.forward == self.backward {
            return None;
        }
        self.backward -= 1;
        Some(self.subrope.line(self.backward))
    }
}

impl ExactSizeIterator for Lines<'_> {}

impl FusedIterator for Lines<'_> {}
