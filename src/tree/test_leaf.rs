//! A small leaf of raw bytes used to test the tree independently of the
//! rope.

use std::ops::{Add, AddAssign, Range, Sub, SubAssign};

use super::{Leaf, Metric, MetricKind, Summary, Tree};

const MIN_BYTES: usize = 2;
const MAX_BYTES: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Bytes(Vec<u8>);

#[derive(Debug, Clone, Default)]
pub(crate) struct BytesSummary {
    zeros: usize,
}

impl AddAssign for BytesSummary {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.zeros += rhs.zeros;
    }
}

impl Summary for BytesSummary {}

impl From<&[u8]> for Bytes {
    #[inline]
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Bytes {
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub(crate) fn set(&mut self, idx: usize, byte: u8) {
        self.0[idx] = byte;
    }
}

impl Leaf for Bytes {
    type Summary = BytesSummary;

    fn base_len(&self) -> usize {
        self.0.len()
    }

    fn summarize(&self) -> BytesSummary {
        BytesSummary { zeros: self.0.iter().filter(|&&b| b == 0).count() }
    }

    fn is_undersized(&self) -> bool {
        self.0.len() < MIN_BYTES
    }

    fn push_maybe_splitting(&mut self, other: &Self) -> Option<Self> {
        self.0.extend_from_slice(&other.0);

        if self.0.len() <= MAX_BYTES {
            return None;
        }

        let split_at = self.0.len() / 2;
        Some(Self(self.0.split_off(split_at)))
    }

    fn slice(&self, range: Range<usize>) -> Self {
        Self(self.0[range].to_vec())
    }
}

impl<const N: usize> Tree<N, Bytes> {
    pub(crate) fn to_vec(&self) -> Vec<u8> {
        self.leaves().flat_map(|leaf| leaf.0.iter().copied()).collect()
    }
}

/// A metric with a boundary right after every zero byte.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ZeroMetric(pub(crate) usize);

impl Add for ZeroMetric {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for ZeroMetric {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for ZeroMetric {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for ZeroMetric {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl From<usize> for ZeroMetric {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl From<ZeroMetric> for usize {
    fn from(ZeroMetric(value): ZeroMetric) -> usize {
        value
    }
}

impl Metric<Bytes> for ZeroMetric {
    const KIND: MetricKind = MetricKind::Trailing;

    const CAN_FRAGMENT: bool = true;

    fn zero() -> Self {
        Self(0)
    }

    fn measure(summary: &BytesSummary, _: usize) -> Self {
        Self(summary.zeros)
    }

    fn to_base_units(leaf: &Bytes, units: Self) -> usize {
        leaf.0
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b == 0)
            .nth(units.0 - 1)
            .map(|(idx, _)| idx + 1)
            .unwrap_or(leaf.0.len())
    }

    fn from_base_units(leaf: &Bytes, offset: usize) -> Self {
        Self(leaf.0[..offset].iter().filter(|&&b| b == 0).count())
    }

    fn is_boundary(leaf: &Bytes, offset: usize) -> bool {
        offset > 0 && leaf.0[offset - 1] == 0
    }

    fn prev(leaf: &Bytes, offset: usize) -> Option<usize> {
        (1..offset).rev().find(|&o| leaf.0[o - 1] == 0)
    }

    fn next(leaf: &Bytes, offset: usize) -> Option<usize> {
        (offset + 1..=leaf.0.len()).find(|&o| leaf.0[o - 1] == 0)
    }
}
