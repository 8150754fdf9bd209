use std::ops::{Add, AddAssign, Range, Sub, SubAssign};

use crate::Subrope;
use crate::rope::metrics::unit_newtype;
use crate::tree::{Leaf, Metric, MetricKind, Summary, Tree, TreeBuilder};

#[cfg(not(any(test, feature = "arity_4")))]
const HEIGHTS_ARITY: usize = 8;

#[cfg(any(test, feature = "arity_4"))]
const HEIGHTS_ARITY: usize = 4;

#[cfg(not(any(test, fuzzing, feature = "small_chunks")))]
const MIN_LINES: usize = 32;

#[cfg(any(test, fuzzing, feature = "small_chunks"))]
const MIN_LINES: usize = 2;

#[cfg(not(any(test, fuzzing, feature = "small_chunks")))]
const MAX_LINES: usize = 64;

#[cfg(any(test, fuzzing, feature = "small_chunks"))]
const MAX_LINES: usize = 4;

const _: () = assert!(MAX_LINES >= 2 * MIN_LINES);

/// The height of a line when nobody said otherwise.
const DEFAULT_LINE_HEIGHT: f64 = 14.0;

/// The vertical extent of every line of a document.
///
/// Lines are delimited by line feeds, which belong to the line they end. A
/// document always has one more line than it has line feeds, so the empty
/// document has a single empty line, and so does the end of a document
/// ending in a line feed.
///
/// Internally the last line is one unit longer than its text, so that no
/// line is ever empty.
///
/// # Examples
///
/// ```
/// # use braid::{Heights, Rope};
/// #
/// let rope = Rope::from("foo\nbar\nbaz");
/// let mut heights = Heights::from_rope(&rope, 10.0);
///
/// assert_eq!(heights.line_count(), 3);
/// assert_eq!(heights.content_height(), 30.0);
///
/// heights.set_line_height(4, 25.0);
///
/// assert_eq!(heights.y_offset(9), 35.0);
/// assert_eq!(heights.position_at(20.0), 4);
/// ```
#[derive(Clone)]
pub struct Heights {
    tree: Tree<HEIGHTS_ARITY, HeightsLeaf>,
    default_height: f64,
}

impl std::fmt::Debug for Heights {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Heights")
            .field("lines", &self.line_count())
            .field("content_height", &self.content_height())
            .field("default_height", &self.default_height)
            .finish()
    }
}

impl Default for Heights {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Heights {
    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();

        assert!(self.tree.base_len() > 0, "Heights without any lines");

        for leaf in self.tree.leaves() {
            leaf.assert_invariants();
        }
    }

    #[track_caller]
    #[inline]
    fn check_position(&self, position: usize) {
        assert!(
            position <= self.len(),
            "Position out of bounds: the position is {} but the length is {}",
            position,
            self.len()
        );
    }

    /// Returns the total height of all the lines.
    #[inline]
    pub fn content_height(&self) -> f64 {
        self.tree.summary().height
    }

    /// Returns the height given to lines created by
    /// [`replace()`](Self::replace()).
    #[inline]
    pub fn default_height(&self) -> f64 {
        self.default_height
    }

    /// Creates the heights of the lines of `rope`, all of them
    /// `default_height` tall.
    ///
    /// # Panics
    ///
    /// Panics if `default_height` isn't a positive number.
    #[track_caller]
    #[inline]
    pub fn from_rope(rope: &crate::Rope, default_height: f64) -> Self {
        check_height(default_height);

        let mut lengths = line_lengths(rope.chunks());

        *lengths.last_mut().expect("there's always a line") += 1;

        Self {
            tree: Tree::from_leaves(leaves_of(&lengths, default_height)),
            default_height,
        }
    }

    /// Returns the start and end of the line containing `offset`, with the
    /// end of the last line one past the end of the document.
    #[inline]
    fn line_bounds(&self, offset: usize) -> (usize, usize) {
        let (leaf, leaf_offset) = self.tree.leaf_at_offset(offset);
        let idx = leaf.line_containing(offset - leaf_offset);
        (leaf_offset + leaf.line_start(idx), leaf_offset + leaf.positions[idx])
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.tree.summary().lines
    }

    /// Returns the height of the line starting at `position`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds or if it isn't the start of a
    /// line.
    #[track_caller]
    #[inline]
    pub fn line_height(&self, position: usize) -> f64 {
        self.check_line_start(position);
        let (leaf, leaf_offset) = self.tree.leaf_at_offset(position);
        leaf.line_height(leaf.line_containing(position - leaf_offset))
    }

    #[track_caller]
    #[inline]
    fn check_line_start(&self, position: usize) {
        self.check_position(position);

        let (start, _) = self.line_bounds(position);

        assert!(
            start == position,
            "Position {position} is not the start of a line, the line \
             containing it starts at {start}"
        );
    }

    /// Returns the length of the document in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.base_len() - 1
    }

    /// Returns `true` if the document is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates the heights of an empty document.
    #[inline]
    pub fn new() -> Self {
        let leaf = HeightsLeaf {
            positions: vec![1],
            heights: vec![DEFAULT_LINE_HEIGHT],
        };

        Self { tree: Tree::from(leaf), default_height: DEFAULT_LINE_HEIGHT }
    }

    /// Returns the start of the line containing the vertical offset `y`. A
    /// `y` at the boundary between two lines is in the second one.
    ///
    /// Offsets above the first line map to its start, and offsets below the
    /// last line map to the start of the last line.
    #[inline]
    pub fn position_at(&self, y: f64) -> usize {
        if y.is_nan() || y <= 0.0 {
            return 0;
        }

        if y >= self.content_height() {
            let (start, _) = self.line_bounds(self.len());
            return start;
        }

        let end = self.tree.base_units(YOffsetMetric(y));

        let YOffsetMetric(bottom) = self.tree.count(end);

        if bottom <= y {
            end
        } else {
            let (start, _) = self.line_bounds(end - 1);
            start
        }
    }

    /// Updates the lines after the bytes in `range` were replaced with
    /// `text`.
    ///
    /// The lines touching the edited range are replaced by the lines of the
    /// new content, which get the default height. The other lines keep
    /// theirs.
    ///
    /// # Panics
    ///
    /// Panics if the start is greater than the end or if the end is out of
    /// bounds.
    #[track_caller]
    pub fn replace(&mut self, range: Range<usize>, text: Subrope<'_>) {
        assert!(
            range.start <= range.end && range.end <= self.len(),
            "Invalid range {:?} for a document of length {}",
            range,
            self.len()
        );

        let (start, _) = self.line_bounds(range.start);
        let (_, end) = self.line_bounds(range.end);

        let mut lengths = line_lengths(text.chunks());

        lengths[0] += range.start - start;

        *lengths.last_mut().expect("there's always a line") += end - range.end;

        tracing::trace!(
            ?range,
            lines = ?(start..end),
            new_lines = lengths.len(),
            "replacing line heights"
        );

        let mut builder = TreeBuilder::new();

        builder.push_slice(&self.tree, 0..start);

        for leaf in leaves_of(&lengths, self.default_height) {
            builder.push_leaf(leaf);
        }

        builder.push_slice(&self.tree, end..self.tree.base_len());

        self.tree = builder.build();
    }

    /// Sets the height of the line starting at `position`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds, if it isn't the start of a
    /// line or if `height` isn't a positive number.
    #[track_caller]
    #[inline]
    pub fn set_line_height(&mut self, position: usize, height: f64) {
        self.check_line_start(position);
        check_height(height);

        self.tree.with_leaf_at_offset_mut(position, |leaf, leaf_offset| {
            let idx = leaf.line_containing(position - leaf_offset);
            leaf.set_line_height(idx, height);
        });
    }

    /// Returns the vertical offset of the top of the line containing
    /// `position`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    #[track_caller]
    #[inline]
    pub fn y_offset(&self, position: usize) -> f64 {
        self.check_position(position);
        let (start, _) = self.line_bounds(position);
        let YOffsetMetric(y) = self.tree.count(start);
        y
    }
}

#[track_caller]
#[inline]
fn check_height(height: f64) {
    assert!(
        height.is_finite() && height > 0.0,
        "Line heights have to be positive, got {height}"
    );
}

/// Returns the length of every line of the text, including the line feed
/// ending it. There's always at least one line.
#[inline]
fn line_lengths<'a, I>(chunks: I) -> Vec<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut lengths = Vec::new();

    let mut current = 0;

    for chunk in chunks {
        let mut rest = chunk.as_bytes();

        while let Some(idx) = rest.iter().position(|&b| b == b'\n') {
            lengths.push(current + idx + 1);
            current = 0;
            rest = &rest[idx + 1..];
        }

        current += rest.len();
    }

    lengths.push(current);

    lengths
}

/// Groups lines of the given lengths into leaves.
#[inline]
fn leaves_of(
    lengths: &[usize],
    height: f64,
) -> impl Iterator<Item = HeightsLeaf> + '_ {
    lengths.chunks(MAX_LINES).map(move |lines| {
        let mut leaf = HeightsLeaf::default();

        for &len in lines {
            leaf.push_line(len, height);
        }

        leaf
    })
}

/// A leaf of the [`Heights`] tree.
///
/// # Invariants
///
/// - `positions` holds the end of every line relative to the start of the
/// leaf, and `heights` the bottom of every line relative to the top of the
/// leaf;
///
/// - both are strictly increasing and start above zero;
///
/// - they have the same length, which is at most `MAX_LINES`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightsLeaf {
    positions: Vec<usize>,
    heights: Vec<f64>,
}

impl HeightsLeaf {
    fn assert_invariants(&self) {
        assert_eq!(self.positions.len(), self.heights.len());
        assert!(!self.positions.is_empty(), "Empty heights leaf");
        assert!(self.positions.len() <= MAX_LINES);

        let mut prev = (0, 0.0);

        for (&pos, &height) in self.positions.iter().zip(&self.heights) {
            assert!(pos > prev.0, "Empty line in {:?}", self.positions);
            assert!(height > prev.1, "Flat line in {:?}", self.heights);
            prev = (pos, height);
        }
    }

    #[inline]
    fn height(&self) -> f64 {
        self.heights.last().copied().unwrap_or(0.0)
    }

    /// Returns the cumulative bottoms of the lines.
    #[inline]
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Returns the index of the line containing `offset`. The end of the
    /// leaf is in its last line.
    #[inline]
    fn line_containing(&self, offset: usize) -> usize {
        self.positions
            .partition_point(|&end| end <= offset)
            .min(self.positions.len() - 1)
    }

    #[inline]
    fn line_height(&self, idx: usize) -> f64 {
        self.heights[idx] - self.line_top(idx)
    }

    #[inline]
    fn line_start(&self, idx: usize) -> usize {
        if idx == 0 { 0 } else { self.positions[idx - 1] }
    }

    #[inline]
    fn line_top(&self, idx: usize) -> f64 {
        if idx == 0 { 0.0 } else { self.heights[idx - 1] }
    }

    /// Returns the cumulative ends of the lines.
    #[inline]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[inline]
    fn push_line(&mut self, len: usize, height: f64) {
        self.positions.push(self.base_len() + len);
        self.heights.push(self.height() + height);
    }

    #[inline]
    fn set_line_height(&mut self, idx: usize, height: f64) {
        let delta = height - self.line_height(idx);

        for bottom in &mut self.heights[idx..] {
            *bottom += delta;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightsSummary {
    pub lines: usize,
    pub height: f64,
}

impl AddAssign for HeightsSummary {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.lines += rhs.lines;
        self.height += rhs.height;
    }
}

impl Summary for HeightsSummary {}

impl Leaf for HeightsLeaf {
    type Summary = HeightsSummary;

    #[inline]
    fn base_len(&self) -> usize {
        self.positions.last().copied().unwrap_or(0)
    }

    #[inline]
    fn summarize(&self) -> HeightsSummary {
        HeightsSummary { lines: self.positions.len(), height: self.height() }
    }

    #[inline]
    fn is_undersized(&self) -> bool {
        self.positions.len() < MIN_LINES
    }

    #[inline]
    fn push_maybe_splitting(&mut self, other: &Self) -> Option<Self> {
        let len = self.base_len();
        let height = self.height();

        self.positions.extend(other.positions.iter().map(|&p| p + len));
        self.heights.extend(other.heights.iter().map(|&h| h + height));

        if self.positions.len() <= MAX_LINES {
            return None;
        }

        let split_idx = self.positions.len() / 2;
        let split_len = self.positions[split_idx - 1];
        let split_height = self.heights[split_idx - 1];

        let positions = self
            .positions
            .split_off(split_idx)
            .into_iter()
            .map(|p| p - split_len)
            .collect();

        let heights = self
            .heights
            .split_off(split_idx)
            .into_iter()
            .map(|h| h - split_height)
            .collect();

        Some(Self { positions, heights })
    }

    /// Keeps the lines overlapping the range, clipped to it.
    #[inline]
    fn slice(&self, range: Range<usize>) -> Self {
        let mut slice = Self::default();

        let first = self.positions.partition_point(|&end| end <= range.start);

        for idx in first..self.positions.len() {
            let start = self.line_start(idx);

            if start >= range.end {
                break;
            }

            let len =
                self.positions[idx].min(range.end) - start.max(range.start);

            slice.push_line(len, self.line_height(idx));
        }

        slice
    }
}

/// A metric counting lines, with a boundary at the end of every line (which
/// is also the start of the next one).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct HeightsBaseMetric(pub usize);

unit_newtype!(HeightsBaseMetric);

impl Metric<HeightsLeaf> for HeightsBaseMetric {
    const KIND: MetricKind = MetricKind::Trailing;

    const CAN_FRAGMENT: bool = false;

    #[inline]
    fn zero() -> Self {
        Self(0)
    }

    #[inline]
    fn measure(summary: &HeightsSummary, _: usize) -> Self {
        Self(summary.lines)
    }

    #[inline]
    fn to_base_units(leaf: &HeightsLeaf, units: Self) -> usize {
        leaf.positions[units.0 - 1]
    }

    #[inline]
    fn from_base_units(leaf: &HeightsLeaf, offset: usize) -> Self {
        Self(leaf.positions.partition_point(|&end| end <= offset))
    }

    #[inline]
    fn is_boundary(leaf: &HeightsLeaf, offset: usize) -> bool {
        leaf.positions.binary_search(&offset).is_ok()
    }

    #[inline]
    fn prev(leaf: &HeightsLeaf, offset: usize) -> Option<usize> {
        let idx = leaf.positions.partition_point(|&end| end < offset);
        idx.checked_sub(1).map(|idx| leaf.positions[idx])
    }

    #[inline]
    fn next(leaf: &HeightsLeaf, offset: usize) -> Option<usize> {
        let idx = leaf.positions.partition_point(|&end| end <= offset);
        leaf.positions.get(idx).copied()
    }
}

/// A metric measuring vertical offsets, with a boundary at the bottom of
/// every line.
#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd)]
pub struct YOffsetMetric(pub f64);

impl Add for YOffsetMetric {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for YOffsetMetric {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for YOffsetMetric {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for YOffsetMetric {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Metric<HeightsLeaf> for YOffsetMetric {
    const KIND: MetricKind = MetricKind::Trailing;

    const CAN_FRAGMENT: bool = false;

    #[inline]
    fn zero() -> Self {
        Self(0.0)
    }

    #[inline]
    fn measure(summary: &HeightsSummary, _: usize) -> Self {
        Self(summary.height)
    }

    /// Returns the end of the first line whose bottom is at or below `y`.
    #[inline]
    fn to_base_units(leaf: &HeightsLeaf, Self(y): Self) -> usize {
        let idx = leaf.heights.partition_point(|&bottom| bottom < y);
        leaf.positions[idx.min(leaf.positions.len() - 1)]
    }

    #[inline]
    fn from_base_units(leaf: &HeightsLeaf, offset: usize) -> Self {
        let idx = leaf.positions.partition_point(|&end| end <= offset);
        Self(leaf.line_top(idx))
    }

    #[inline]
    fn is_boundary(leaf: &HeightsLeaf, offset: usize) -> bool {
        HeightsBaseMetric::is_boundary(leaf, offset)
    }

    #[inline]
    fn prev(leaf: &HeightsLeaf, offset: usize) -> Option<usize> {
        HeightsBaseMetric::prev(leaf, offset)
    }

    #[inline]
    fn next(leaf: &HeightsLeaf, offset: usize) -> Option<usize> {
        HeightsBaseMetric::next(leaf, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rope;

    fn heights(text: &str) -> Heights {
        let h = Heights::from_rope(&Rope::from(text), 10.0);
        h.assert_invariants();
        h
    }

    #[test]
    fn empty_document() {
        let h = Heights::new();

        h.assert_invariants();
        assert_eq!(h.len(), 0);
        assert_eq!(h.line_count(), 1);
        assert_eq!(h.content_height(), DEFAULT_LINE_HEIGHT);
        assert_eq!(h.y_offset(0), 0.0);
        assert_eq!(h.line_height(0), DEFAULT_LINE_HEIGHT);
        assert_eq!(h.position_at(100.0), 0);
    }

    #[test]
    fn trailing_line_feed() {
        let h = heights("a\n");

        assert_eq!(h.line_count(), 2);
        assert_eq!(h.y_offset(1), 0.0);
        assert_eq!(h.y_offset(2), 10.0);
        assert_eq!(h.position_at(15.0), 2);
        assert_eq!(h.line_height(2), 10.0);
    }

    #[test]
    fn offsets_and_positions() {
        let h = heights("a\nbb\n\nccc");

        assert_eq!(h.line_count(), 4);
        assert_eq!(h.content_height(), 40.0);

        assert_eq!(h.y_offset(0), 0.0);
        assert_eq!(h.y_offset(1), 0.0);
        assert_eq!(h.y_offset(2), 10.0);
        assert_eq!(h.y_offset(5), 20.0);
        assert_eq!(h.y_offset(6), 30.0);
        assert_eq!(h.y_offset(9), 30.0);

        assert_eq!(h.position_at(0.0), 0);
        assert_eq!(h.position_at(9.5), 0);
        assert_eq!(h.position_at(10.0), 2);
        assert_eq!(h.position_at(25.0), 5);
        assert_eq!(h.position_at(30.0), 6);
        assert_eq!(h.position_at(1000.0), 6);
    }

    #[test]
    fn many_lines() {
        let text = "line\n".repeat(100);
        let mut h = heights(&text);

        assert_eq!(h.line_count(), 101);
        assert!(h.tree.leaf_count() > 1);

        let HeightsBaseMetric(lines) = h.tree.count(55);
        assert_eq!(lines, 11);
        assert_eq!(h.tree.base_units(HeightsBaseMetric(11)), 55);

        h.set_line_height(50, 30.0);
        h.assert_invariants();

        assert_eq!(h.y_offset(50), 100.0);
        assert_eq!(h.y_offset(55), 130.0);
        assert_eq!(h.position_at(125.0), 50);
        assert_eq!(h.position_at(130.0), 55);
        assert_eq!(h.content_height(), 1030.0);
    }

    #[test]
    fn replace_keeps_untouched_lines() {
        let mut rope = Rope::from("a\nbb\n\nccc");
        let mut h = Heights::from_rope(&rope, 10.0);

        h.set_line_height(0, 20.0);
        h.set_line_height(6, 5.0);

        rope.replace(3..4, "x\ny");
        h.replace(3..4, Rope::from("x\ny").byte_slice(..));

        h.assert_invariants();
        assert_eq!(rope, "a\nbx\ny\n\nccc");
        assert_eq!(h.len(), rope.byte_len());
        assert_eq!(h.line_count(), rope.line_len());
        assert_eq!(h.line_height(0), 20.0);
        assert_eq!(h.line_height(2), 10.0);
        assert_eq!(h.line_height(5), 10.0);
        assert_eq!(h.line_height(8), 5.0);
    }

    #[test]
    fn replace_at_the_end() {
        let mut h = heights("ab\n");

        h.replace(3..3, Rope::from("cd\n").byte_slice(..));
        h.assert_invariants();

        assert_eq!(h.len(), 6);
        assert_eq!(h.line_count(), 3);
        assert_eq!(h.y_offset(6), 20.0);

        h.replace(0..6, Rope::new().byte_slice(..));
        h.assert_invariants();

        assert_eq!(h.len(), 0);
        assert_eq!(h.line_count(), 1);
    }

    #[test]
    #[should_panic(expected = "is not the start of a line")]
    fn height_inside_a_line() {
        heights("abc\ndef").line_height(5);
    }
}
