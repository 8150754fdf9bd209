use std::ops::{Add, AddAssign, Sub, SubAssign};

use super::{Chunk, TextSummary};
use crate::tree::{BaseMetric, Metric, MetricKind};

/// The base metric of the rope: every byte offset is a boundary.
pub type ByteMetric = BaseMetric;

macro_rules! unit_newtype {
    ($name:ident) => {
        impl Add for $name {
            type Output = Self;

            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;

            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl AddAssign for $name {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $name {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(value: usize) -> Self {
                Self(value)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from($name(value): $name) -> usize {
                value
            }
        }
    };
}

pub(crate) use unit_newtype;

#[inline]
fn prev_char_boundary(text: &str, offset: usize) -> Option<usize> {
    (0..offset).rev().find(|&o| text.is_char_boundary(o))
}

#[inline]
fn next_char_boundary(text: &str, offset: usize) -> Option<usize> {
    (offset + 1..=text.len()).find(|&o| text.is_char_boundary(o))
}

#[inline]
fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Unicode scalar values.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CharMetric(pub usize);

unit_newtype!(CharMetric);

impl Metric<Chunk> for CharMetric {
    const KIND: MetricKind = MetricKind::Atomic;

    const CAN_FRAGMENT: bool = false;

    #[inline]
    fn zero() -> Self {
        Self(0)
    }

    #[inline]
    fn measure(summary: &TextSummary, _: usize) -> Self {
        Self(summary.chars)
    }

    #[inline]
    fn to_base_units(chunk: &Chunk, units: Self) -> usize {
        str_indices::chars::to_byte_idx(chunk, units.0)
    }

    #[inline]
    fn from_base_units(chunk: &Chunk, offset: usize) -> Self {
        Self(str_indices::chars::from_byte_idx(chunk, offset))
    }

    #[inline]
    fn is_boundary(chunk: &Chunk, offset: usize) -> bool {
        chunk.is_char_boundary(offset)
    }

    #[inline]
    fn prev(chunk: &Chunk, offset: usize) -> Option<usize> {
        prev_char_boundary(chunk, offset)
    }

    #[inline]
    fn next(chunk: &Chunk, offset: usize) -> Option<usize> {
        next_char_boundary(chunk, offset)
    }
}

/// UTF-16 code units. Chars outside the basic multilingual plane count as
/// two units, and the offset between the two halves of a surrogate pair
/// is not a boundary.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Utf16Metric(pub usize);

unit_newtype!(Utf16Metric);

impl Metric<Chunk> for Utf16Metric {
    const KIND: MetricKind = MetricKind::Atomic;

    const CAN_FRAGMENT: bool = false;

    #[inline]
    fn zero() -> Self {
        Self(0)
    }

    #[inline]
    fn measure(summary: &TextSummary, _: usize) -> Self {
        Self(summary.utf16)
    }

    #[inline]
    fn to_base_units(chunk: &Chunk, units: Self) -> usize {
        str_indices::utf16::to_byte_idx(chunk, units.0)
    }

    #[inline]
    fn from_base_units(chunk: &Chunk, offset: usize) -> Self {
        let offset = floor_char_boundary(chunk, offset);
        Self(str_indices::utf16::count(&chunk[..offset]))
    }

    #[inline]
    fn is_boundary(chunk: &Chunk, offset: usize) -> bool {
        chunk.is_char_boundary(offset)
    }

    #[inline]
    fn prev(chunk: &Chunk, offset: usize) -> Option<usize> {
        prev_char_boundary(chunk, offset)
    }

    #[inline]
    fn next(chunk: &Chunk, offset: usize) -> Option<usize> {
        next_char_boundary(chunk, offset)
    }
}

/// Extended grapheme clusters.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GraphemeMetric(pub usize);

unit_newtype!(GraphemeMetric);

impl Metric<Chunk> for GraphemeMetric {
    const KIND: MetricKind = MetricKind::Atomic;

    const CAN_FRAGMENT: bool = true;

    #[inline]
    fn zero() -> Self {
        Self(0)
    }

    #[inline]
    fn measure(summary: &TextSummary, _: usize) -> Self {
        Self(summary.graphemes)
    }

    #[inline]
    fn to_base_units(chunk: &Chunk, units: Self) -> usize {
        debug_assert!(units.0 > 0);

        chunk
            .grapheme_boundaries()
            .nth(units.0 - 1)
            .unwrap_or(chunk.len())
    }

    #[inline]
    fn from_base_units(chunk: &Chunk, offset: usize) -> Self {
        Self(
            chunk
                .grapheme_boundaries()
                .take_while(|&boundary| boundary <= offset)
                .count(),
        )
    }

    #[inline]
    fn is_boundary(chunk: &Chunk, offset: usize) -> bool {
        chunk.is_grapheme_boundary(offset)
    }

    #[inline]
    fn prev(chunk: &Chunk, offset: usize) -> Option<usize> {
        chunk.prev_grapheme_boundary(offset)
    }

    #[inline]
    fn next(chunk: &Chunk, offset: usize) -> Option<usize> {
        chunk.next_grapheme_boundary(offset)
    }
}

/// Line feeds. The boundaries are right after every `\n`, so the `n`-th
/// boundary is the start of the `n`-th line (counting from zero).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineMetric(pub usize);

unit_newtype!(LineMetric);

impl Metric<Chunk> for LineMetric {
    const KIND: MetricKind = MetricKind::Trailing;

    const CAN_FRAGMENT: bool = true;

    #[inline]
    fn zero() -> Self {
        Self(0)
    }

    #[inline]
    fn measure(summary: &TextSummary, _: usize) -> Self {
        Self(summary.newlines)
    }

    #[inline]
    fn to_base_units(chunk: &Chunk, units: Self) -> usize {
        str_indices::lines_lf::to_byte_idx(chunk, units.0)
    }

    #[inline]
    fn from_base_units(chunk: &Chunk, offset: usize) -> Self {
        let offset = floor_char_boundary(chunk, offset);
        Self(str_indices::lines_lf::count_breaks(&chunk[..offset]))
    }

    #[inline]
    fn is_boundary(chunk: &Chunk, offset: usize) -> bool {
        offset > 0 && chunk.as_bytes()[offset - 1] == b'\n'
    }

    #[inline]
    fn prev(chunk: &Chunk, offset: usize) -> Option<usize> {
        chunk.as_bytes()[..offset.saturating_sub(1)]
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|idx| idx + 1)
    }

    #[inline]
    fn next(chunk: &Chunk, offset: usize) -> Option<usize> {
        chunk.as_bytes()[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|idx| offset + idx + 1)
    }
}
