#![no_main]

use braid::{Spans, SpansBuilder};
use libfuzzer_sys::fuzz_target;

type Pieces = Vec<(u8, u8, bool)>;

/// Builds spans from `(gap, len, value)` pieces laid out one after the other,
/// together with the value at every offset.
fn build(pieces: &[(u8, u8, bool)], len: usize) -> (Spans<bool>, Vec<Option<bool>>) {
    let mut builder = SpansBuilder::new(len);
    let mut values = Vec::new();

    for &(gap, piece_len, value) in pieces {
        let start = values.len() + gap as usize;
        let end = start + piece_len as usize;
        values.resize(start, None);
        values.resize(end, Some(value));
        builder.add(value, start..end);
    }

    values.resize(len, None);

    (builder.build(), values)
}

fn total_len(pieces: &[(u8, u8, bool)]) -> usize {
    pieces.iter().map(|&(gap, len, _)| gap as usize + len as usize).sum()
}

fuzz_target!(|data: (Pieces, Pieces)| {
    let (a, b) = data;

    let len = total_len(&a).max(total_len(&b));

    let (a, a_values) = build(&a, len);
    let (b, b_values) = build(&b, len);

    a.assert_invariants();
    b.assert_invariants();

    let merged = a.merging(&b, |a, b| match (a, b) {
        (Some(&a), Some(&b)) => Some(a ^ b),
        (a, b) => a.or(b).copied(),
    });

    merged.assert_invariants();

    for offset in 0..len {
        let expected = match (a_values[offset], b_values[offset]) {
            (Some(a), Some(b)) => Some(a ^ b),
            (a, b) => a.or(b),
        };
        assert_eq!(merged.data_at(offset).copied(), expected);
        assert_eq!(a.data_at(offset).copied(), a_values[offset]);
    }
});
