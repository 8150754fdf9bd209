use std::ops::{AddAssign, Range};

use unicode_segmentation::UnicodeSegmentation;

use super::GraphemeBreaker;
use super::utils::adjust_split_point;
use crate::tree::{Leaf, Summary};

#[cfg(not(any(test, fuzzing, feature = "small_chunks")))]
pub(super) const MIN_BYTES: usize = 511;

#[cfg(any(test, fuzzing, feature = "small_chunks"))]
pub(super) const MIN_BYTES: usize = 4;

#[cfg(not(any(test, fuzzing, feature = "small_chunks")))]
pub(super) const MAX_BYTES: usize = 1024;

#[cfg(any(test, fuzzing, feature = "small_chunks"))]
pub(super) const MAX_BYTES: usize = 10;

const _: () = assert!(MAX_BYTES >= 2 * MIN_BYTES + 2);

/// A leaf of the rope: a piece of text plus the state needed to find its
/// grapheme boundaries without looking at the chunks around it.
///
/// # Invariants
///
/// - the text is at most `MAX_BYTES` long, and at least `MIN_BYTES` long
/// unless the chunk is the root of its tree;
///
/// - `breaker` is the state of a [`GraphemeBreaker`] that was fed all the
/// text before this chunk;
///
/// - `prefix_count` is the number of bytes at the start of the chunk that
/// continue a grapheme cluster begun in a previous chunk;
///
/// - `last_char_splits` is `true` if the last grapheme of the chunk continues
/// in the next one.
#[derive(Clone, Default)]
pub struct Chunk {
    text: String,
    prefix_count: usize,
    last_char_splits: bool,
    breaker: GraphemeBreaker,
}

impl std::fmt::Debug for Chunk {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if !f.alternate() {
            f.debug_struct("Chunk")
                .field("text", &self.text)
                .field("prefix_count", &self.prefix_count)
                .field("last_char_splits", &self.last_char_splits)
                .finish()
        } else {
            write!(f, "{:?}", self.text)
        }
    }
}

impl std::ops::Deref for Chunk {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.text
    }
}

impl Chunk {
    #[inline]
    pub(super) fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the state of a breaker fed all the text up to `offset`.
    #[inline]
    fn breaker_at(&self, offset: usize) -> GraphemeBreaker {
        if offset <= self.prefix_count {
            let mut breaker = self.breaker.clone();
            breaker.consume(&self.text[..offset]);
            return breaker;
        }

        let last_grapheme_start = self.text[self.prefix_count..offset]
            .grapheme_indices(true)
            .next_back()
            .map_or(self.prefix_count, |(idx, _)| self.prefix_count + idx);

        GraphemeBreaker::from_pending(&self.text[last_grapheme_start..offset])
    }

    /// Returns the state of a breaker fed all the text up to the end of
    /// this chunk.
    #[inline]
    pub(super) fn breaker_at_end(&self) -> GraphemeBreaker {
        self.breaker_at(self.text.len())
    }

    /// Returns the grapheme boundaries in `(0, len]`.
    #[inline]
    pub(super) fn grapheme_boundaries(
        &self,
    ) -> impl DoubleEndedIterator<Item = usize> + '_ {
        let prefix = self.prefix_count;

        let starts = if prefix < self.text.len() {
            Some(
                self.text[prefix..]
                    .grapheme_indices(true)
                    .map(move |(idx, _)| prefix + idx)
                    .filter(|&offset| offset > 0),
            )
        } else {
            None
        };

        starts.into_iter().flatten().chain(
            (!self.last_char_splits && !self.text.is_empty())
                .then_some(self.text.len()),
        )
    }

    #[inline]
    pub(super) fn grapheme_count(&self) -> usize {
        let len = self.text.len();

        if len == 0 {
            return 0;
        }

        let starts = if self.prefix_count < len {
            self.text[self.prefix_count..].graphemes(true).count()
        } else {
            0
        };

        starts - (self.prefix_count == 0) as usize
            + (!self.last_char_splits) as usize
    }

    /// Returns whether `offset` is a grapheme boundary.
    #[inline]
    pub(super) fn is_grapheme_boundary(&self, offset: usize) -> bool {
        use unicode_segmentation::GraphemeCursor;

        let len = self.text.len();

        if offset == 0 {
            return self.prefix_count == 0;
        }

        if offset == len {
            return !self.last_char_splits;
        }

        if offset < self.prefix_count || !self.text.is_char_boundary(offset) {
            return false;
        }

        if offset == self.prefix_count {
            return true;
        }

        let text = &self.text[self.prefix_count..];

        GraphemeCursor::new(offset - self.prefix_count, text.len(), true)
            .is_boundary(text, 0)
            .unwrap_or(false)
    }

    /// Returns the last grapheme boundary in `[0, offset)`.
    #[inline]
    pub(super) fn prev_grapheme_boundary(&self, offset: usize) -> Option<usize> {
        use unicode_segmentation::GraphemeCursor;

        let prefix = self.prefix_count;

        if offset <= prefix {
            return None;
        }

        let offset = ceil_char_boundary(&self.text, offset);

        let text = &self.text[prefix..];

        GraphemeCursor::new(offset - prefix, text.len(), true)
            .prev_boundary(text, 0)
            .ok()
            .flatten()
            .map(|boundary| prefix + boundary)
    }

    /// Returns the first grapheme boundary in `(offset, len]`.
    #[inline]
    pub(super) fn next_grapheme_boundary(&self, offset: usize) -> Option<usize> {
        use unicode_segmentation::GraphemeCursor;

        let prefix = self.prefix_count;

        let len = self.text.len();

        let boundary = if offset < prefix {
            prefix
        } else {
            let offset = floor_char_boundary(&self.text, offset);

            let text = &self.text[prefix..];

            GraphemeCursor::new(offset - prefix, text.len(), true)
                .next_boundary(text, 0)
                .ok()
                .flatten()
                .map_or(len, |boundary| prefix + boundary)
        };

        if boundary < len || !self.last_char_splits {
            Some(boundary)
        } else {
            None
        }
    }

    /// Creates a chunk that doesn't know anything about the text before it.
    #[inline]
    pub(super) fn new(text: String) -> Self {
        debug_assert!(text.len() <= MAX_BYTES);

        let prefix_count =
            GraphemeBreaker::new().first_break(&text).unwrap_or(text.len());

        Self {
            text,
            prefix_count,
            last_char_splits: false,
            breaker: GraphemeBreaker::new(),
        }
    }

    /// Splits `s` into chunks of valid sizes.
    #[inline]
    pub(super) fn chunks_of(s: &str) -> impl Iterator<Item = Chunk> + '_ {
        let mut rest = s;

        std::iter::from_fn(move || {
            if rest.is_empty() {
                return None;
            }

            let split_at = if rest.len() <= MAX_BYTES {
                rest.len()
            } else if rest.len() < MAX_BYTES + MIN_BYTES {
                adjust_split_point::<false>(rest, rest.len() / 2)
            } else {
                adjust_split_point::<false>(rest, MAX_BYTES)
            };

            let (chunk, remainder) = rest.split_at(split_at);

            rest = remainder;

            Some(Chunk::new(chunk.to_owned()))
        })
    }

    #[inline]
    pub(super) fn last_char_splits(&self) -> bool {
        self.last_char_splits
    }

    #[inline]
    pub(super) fn prefix_count(&self) -> usize {
        self.prefix_count
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextSummary {
    /// The number of UTF-16 code units.
    pub utf16: usize,

    /// The number of Unicode scalar values.
    pub chars: usize,

    /// The number of grapheme boundaries after the start of the text.
    pub graphemes: usize,

    /// The number of line feeds.
    pub newlines: usize,
}

impl AddAssign for TextSummary {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.utf16 += rhs.utf16;
        self.chars += rhs.chars;
        self.graphemes += rhs.graphemes;
        self.newlines += rhs.newlines;
    }
}

impl Summary for TextSummary {}

impl Leaf for Chunk {
    type Summary = TextSummary;

    const NEEDS_FIXUP_ON_APPEND: bool = true;

    #[inline]
    fn base_len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    fn summarize(&self) -> TextSummary {
        TextSummary {
            utf16: str_indices::utf16::count(&self.text),
            chars: str_indices::chars::count(&self.text),
            graphemes: self.grapheme_count(),
            newlines: str_indices::lines_lf::count_breaks(&self.text),
        }
    }

    #[inline]
    fn is_undersized(&self) -> bool {
        self.text.len() < MIN_BYTES
    }

    #[inline]
    fn push_maybe_splitting(&mut self, other: &Self) -> Option<Self> {
        let old_len = self.text.len();

        self.text.push_str(&other.text);

        if self.prefix_count == old_len {
            self.prefix_count = self
                .breaker
                .first_break(&self.text)
                .unwrap_or(self.text.len());
        }

        if self.text.len() <= MAX_BYTES {
            self.last_char_splits = other.last_char_splits;
            return None;
        }

        let split_at = split_point_for_merge(&self.text);

        let right_text = self.text.split_off(split_at);

        self.prefix_count = self.prefix_count.min(split_at);

        let breaker = self.breaker_at_end();

        let mut right = Chunk {
            prefix_count: breaker
                .first_break(&right_text)
                .unwrap_or(right_text.len()),
            text: right_text,
            last_char_splits: other.last_char_splits,
            breaker,
        };

        self.last_char_splits = right.prefix_count > 0;

        right.text.shrink_to_fit();

        Some(right)
    }

    #[inline]
    fn slice(&self, range: Range<usize>) -> Self {
        debug_assert!(
            self.text.is_char_boundary(range.start)
                && self.text.is_char_boundary(range.end),
            "Slicing a chunk at {range:?}, which is not a char boundary. \
             This is a logic bug in braid."
        );

        let breaker = self.breaker_at(range.start);

        let last_char_splits = if range.end < self.text.len() {
            !self.is_grapheme_boundary(range.end)
        } else {
            self.last_char_splits
        };

        let text = self.text[range].to_owned();

        Self {
            prefix_count: breaker.first_break(&text).unwrap_or(text.len()),
            text,
            last_char_splits,
            breaker,
        }
    }

    #[inline]
    fn needs_fixup(&self, next: &Self) -> bool {
        if next.text.is_empty() {
            return self.last_char_splits;
        }

        self.last_char_splits != (next.prefix_count > 0)
            || next.breaker != self.breaker_at_end()
    }

    #[inline]
    fn fixup(&mut self, next: &mut Self) -> bool {
        let mut new = self.breaker_at_end();

        if new == next.breaker {
            self.last_char_splits = next.prefix_count > 0;
            return true;
        }

        let mut old = std::mem::replace(&mut next.breaker, new.clone());

        let mut prefix_count = None;

        let mut converged = false;

        for (offset, ch) in next.text.char_indices() {
            let new_break = new.has_break_before(ch);

            if new_break && prefix_count.is_none() {
                prefix_count = Some(offset);
            }

            if !converged {
                let old_break = old.has_break_before(ch);
                converged = (old_break && new_break) || old == new;
            }

            if converged && prefix_count.is_some() {
                break;
            }
        }

        next.prefix_count = prefix_count.unwrap_or(next.text.len());

        self.last_char_splits = next.prefix_count > 0;

        converged
    }

    #[inline]
    fn continues_into_next(&self) -> bool {
        self.last_char_splits
    }
}

/// Returns the offset at which to split a string that's between
/// `MAX_BYTES + 1` and `2 * MAX_BYTES` bytes long so that both halves have
/// valid sizes, preferring to split right after a line feed.
#[inline]
fn split_point_for_merge(s: &str) -> usize {
    let len = s.len();

    let lo = MIN_BYTES.max(len.saturating_sub(MAX_BYTES));

    let hi = MAX_BYTES.min(len.saturating_sub(MIN_BYTES)).max(lo);

    let window = &s.as_bytes()[lo - 1..hi];

    if let Some(idx) = window.iter().rposition(|&b| b == b'\n') {
        return lo + idx;
    }

    let mid = (lo + hi) / 2;

    let before = adjust_split_point::<false>(s, mid);

    if before >= lo {
        return before;
    }

    let after = adjust_split_point::<true>(s, mid);

    if after <= hi {
        return after;
    }

    // There's no split giving two halves of valid sizes. Neither half can
    // grow past `MAX_BYTES`, even if that splits a CRLF pair.
    if before + MAX_BYTES >= len {
        before
    } else if after <= MAX_BYTES {
        after
    } else {
        floor_char_boundary(s, hi)
    }
}

#[inline]
fn ceil_char_boundary(s: &str, mut offset: usize) -> usize {
    while !s.is_char_boundary(offset) {
        offset += 1;
    }
    offset
}

#[inline]
fn floor_char_boundary(s: &str, mut offset: usize) -> usize {
    while !s.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
