//! String helpers shared by `Rope`s, `Subrope`s and their `Chunk`s.

use super::iterators::Chunks;

/// Moves `candidate` to the closest offset that's both a char boundary of
/// `s` and not between a `\r` and a `\n`, going right if `RIGHT` is `true`
/// and left otherwise. The result is at most 3 bytes away from the
/// candidate, and offsets past the end are clamped to `s.len()`.
#[inline]
pub(super) fn adjust_split_point<const RIGHT: bool>(
    s: &str,
    candidate: usize,
) -> usize {
    if candidate >= s.len() {
        return s.len();
    }

    let step = |offset: usize| if RIGHT { offset + 1 } else { offset - 1 };

    let mut offset = candidate;

    while !s.is_char_boundary(offset) {
        offset = step(offset);
    }

    if is_splitting_crlf_pair(s, offset) {
        offset = step(offset);
    }

    offset
}

/// Compares the contents of `chunks` to `s`. The caller has already checked
/// that they have the same length.
#[inline]
pub(super) fn chunks_eq_str(chunks: Chunks<'_>, s: &str) -> bool {
    let mut rest = s.as_bytes();

    chunks.into_iter().all(|chunk| {
        let (head, tail) = rest.split_at(chunk.len());
        rest = tail;
        head == chunk.as_bytes()
    })
}

/// Compares the contents of two [`Chunks`] without allocating, even though
/// their chunk boundaries are generally in different places. The caller has
/// already checked that they yield the same number of bytes.
#[inline]
pub(super) fn chunks_eq_chunks(mut lhs: Chunks<'_>, mut rhs: Chunks<'_>) -> bool {
    let mut left: &[u8] = &[];
    let mut right: &[u8] = &[];

    loop {
        if left.is_empty() {
            match lhs.next() {
                Some(chunk) => left = chunk.as_bytes(),
                None => return true,
            }
        }

        if right.is_empty() {
            match rhs.next() {
                Some(chunk) => right = chunk.as_bytes(),
                None => return true,
            }
        }

        let common = left.len().min(right.len());

        if left[..common] != right[..common] {
            return false;
        }

        left = &left[common..];
        right = &right[common..];
    }
}

/// Writes the escaped contents of `chunks` to `f`, like `str`'s `Debug`
/// impl but without the surrounding quotes.
#[inline]
pub(super) fn debug_chunks(
    chunks: Chunks<'_>,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    use std::fmt::Write;

    for chunk in chunks {
        for ch in chunk.chars() {
            for escaped in ch.escape_debug() {
                f.write_char(escaped)?;
            }
        }
    }

    Ok(())
}

/// Returns whether `byte_offset` is between the `\r` and the `\n` of a
/// CRLF pair.
#[inline]
pub(super) fn is_splitting_crlf_pair(s: &str, byte_offset: usize) -> bool {
    let bytes = s.as_bytes();

    byte_offset > 0
        && byte_offset < bytes.len()
        && bytes[byte_offset - 1] == b'\r'
        && bytes[byte_offset] == b'\n'
}

pub(super) use panic_messages::*;

/// Messages for the panics caused by invalid arguments.
mod panic_messages {
    #[inline]
    pub(crate) fn byte_index_out_of_bounds(
        byte_index: usize,
        byte_len: usize,
    ) -> ! {
        debug_assert!(byte_index >= byte_len);

        panic!(
            "Byte index out of bounds: the index is {byte_index} but the \
             length is {byte_len}"
        );
    }

    #[inline]
    pub(crate) fn byte_offset_out_of_bounds(
        byte_offset: usize,
        byte_len: usize,
    ) -> ! {
        debug_assert!(byte_offset > byte_len);

        panic!(
            "Byte offset out of bounds: the offset is {byte_offset} but the \
             length is {byte_len}"
        );
    }

    #[inline]
    pub(crate) fn byte_start_after_end(
        byte_start: usize,
        byte_end: usize,
    ) -> ! {
        debug_assert!(byte_start > byte_end);

        panic!(
            "Byte start after end: the start is {byte_start} but the end is \
             {byte_end}"
        );
    }

    #[inline]
    pub(crate) fn line_index_out_of_bounds(
        line_index: usize,
        line_len: usize,
    ) -> ! {
        debug_assert!(line_index >= line_len);

        panic!(
            "Line index out of bounds: the index is {line_index} but the \
             length is {line_len}"
        );
    }

    #[inline]
    pub(crate) fn line_offset_out_of_bounds(
        line_offset: usize,
        line_len: usize,
    ) -> ! {
        debug_assert!(line_offset > line_len);

        panic!(
            "Line offset out of bounds: the offset is {line_offset} but the \
             length is {line_len}"
        );
    }

    #[inline]
    pub(crate) fn char_offset_out_of_bounds(
        char_offset: usize,
        char_len: usize,
    ) -> ! {
        debug_assert!(char_offset > char_len);

        panic!(
            "Char offset out of bounds: the offset is {char_offset} but the \
             length is {char_len}"
        );
    }

    #[inline]
    pub(crate) fn grapheme_offset_out_of_bounds(
        grapheme_offset: usize,
        grapheme_len: usize,
    ) -> ! {
        debug_assert!(grapheme_offset > grapheme_len);

        panic!(
            "Grapheme offset out of bounds: the offset is {grapheme_offset} \
             but the length is {grapheme_len}"
        );
    }

    #[inline]
    pub(crate) fn utf16_offset_out_of_bounds(
        utf16_offset: usize,
        utf16_len: usize,
    ) -> ! {
        debug_assert!(utf16_offset > utf16_len);

        panic!(
            "UTF-16 offset out of bounds: the offset is {utf16_offset} but \
             the length is {utf16_len}"
        );
    }
}
