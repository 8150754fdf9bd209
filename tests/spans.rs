use braid::{IntervalCache, Rope, Spans, SpansBuilder};
use rand::Rng;

mod common;

use common::{lipsum, random_range, rng};

/// Builds random spans over `len` offsets, returning them together with the
/// value at every offset.
fn random_spans(rng: &mut impl Rng, len: usize) -> (Spans<u8>, Vec<Option<u8>>) {
    let mut builder = SpansBuilder::new(len);
    let mut values = vec![None; len];

    let mut offset = 0;

    while offset < len {
        let start = offset + rng.random_range(0..4);
        let end = (start + rng.random_range(1..8)).min(len);

        if start >= len {
            break;
        }

        let data = rng.random_range(0..3);

        builder.add(data, start..end);

        for value in &mut values[start..end] {
            *value = Some(data);
        }

        offset = end;
    }

    (builder.build(), values)
}

#[test]
fn builder_and_lookups() {
    let mut rng = rng();

    for _ in 0..20 {
        let len = rng.random_range(1..400);
        let (spans, values) = random_spans(&mut rng, len);

        spans.assert_invariants();
        assert_eq!(spans.len(), len);

        for (offset, value) in values.iter().enumerate() {
            assert_eq!(spans.data_at(offset), value.as_ref(), "{offset}");
        }

        for (range, data) in &spans {
            assert!(values[range.clone()].iter().all(|v| v == &Some(*data)));
        }
    }
}

#[test]
fn iter_yields_maximal_spans() {
    let mut rng = rng();

    let (spans, values) = random_spans(&mut rng, 500);

    let mut prev: Option<(std::ops::Range<usize>, u8)> = None;

    for (range, &data) in spans.iter() {
        if let Some((prev_range, prev_data)) = &prev {
            assert!(prev_range.end <= range.start);
            assert!(prev_range.end < range.start || *prev_data != data);
        }

        if range.start > 0 {
            assert_ne!(values[range.start - 1], Some(data));
        }
        if range.end < values.len() {
            assert_ne!(values[range.end], Some(data));
        }

        prev = Some((range, data));
    }
}

#[test]
fn span_at_covers_the_whole_span() {
    let mut builder = SpansBuilder::new(300);

    for start in (0..300).step_by(3) {
        builder.add(start / 60, start..start + 2);
        builder.add(9, start + 2..start + 3);
    }

    let spans = builder.build();

    spans.assert_invariants();

    let span = spans.span_at(62).unwrap();
    assert_eq!(span.range, 62..63);
    assert_eq!(*span.data, 9);

    assert_eq!(spans.span_at(61).unwrap().range, 60..62);
    assert_eq!(spans.iter_range(61..62).collect::<Vec<_>>(), [(61..62, &1)]);
}

#[test]
fn merging_applies_the_transform_pointwise() {
    let mut rng = rng();

    for _ in 0..20 {
        let len = rng.random_range(1..300);

        let (a, a_values) = random_spans(&mut rng, len);
        let (b, b_values) = random_spans(&mut rng, len);

        let transform = |a: Option<&u8>, b: Option<&u8>| match (a, b) {
            (None, None) => None,
            (Some(&a), None) => Some(a as u16),
            (None, Some(&b)) if b == 0 => None,
            (None, Some(&b)) => Some(b as u16 * 10),
            (Some(&a), Some(&b)) => Some(a as u16 * 100 + b as u16),
        };

        let merged = a.merging(&b, transform);

        merged.assert_invariants();
        assert_eq!(merged.len(), len);

        for offset in 0..len {
            assert_eq!(
                merged.data_at(offset).copied(),
                transform(a_values[offset].as_ref(), b_values[offset].as_ref()),
                "{offset}"
            );
        }
    }
}

#[test]
fn interval_cache_survives_random_edits() {
    let mut rng = rng();

    let mut rope = Rope::from(lipsum(120).as_str());

    // Caches the length of every line, with the line's text as the witness
    // of what was measured.
    let mut cache = IntervalCache::<(usize, String)>::new(rope.byte_len());

    for (idx, line) in rope.lines().enumerate() {
        let start = rope.byte_of_line(idx);
        let end = start + line.byte_len();
        cache.set((line.byte_len(), line.to_string()), start..end);
    }

    for _ in 0..100 {
        let text = rope.to_string();
        let range = random_range(&mut rng, &text);
        let inserted = if rng.random_bool(0.5) { "foo" } else { "bar\nbaz" };

        let delta = rope.replace(range, inserted);
        cache.invalidate_delta(&delta);

        cache.spans().assert_invariants();
        assert_eq!(cache.len(), rope.byte_len());

        let (replaced, new_len) = delta.summary();
        let inserted_at = replaced.start..replaced.start + new_len;

        for (span, (len, witness)) in cache.spans() {
            assert_eq!(span.len(), *len);
            assert_eq!(rope.byte_slice(span.clone()), witness.as_str());
            assert!(
                span.end <= inserted_at.start || span.start >= inserted_at.end,
                "{span:?} overlaps the inserted text at {inserted_at:?}"
            );
        }

        if rng.random_bool(0.3) {
            let range = random_range(&mut rng, &rope.to_string());
            cache.invalidate(range.clone());
            for (span, _) in cache.spans() {
                assert!(
                    span.end <= range.start || span.start >= range.end,
                    "{span:?} overlaps the invalidated {range:?}"
                );
            }
        }
    }
}

#[test]
fn interval_cache_keeps_untouched_spans() {
    let mut rope = Rope::from("aaaa\nbbbb\ncccc\n");
    let mut cache = IntervalCache::new(rope.byte_len());

    cache.set('a', 0..5);
    cache.set('b', 5..10);
    cache.set('c', 10..15);

    let delta = rope.insert(7, "XX");
    cache.invalidate_delta(&delta);

    assert_eq!(rope, "aaaa\nbbXXbb\ncccc\n");
    assert_eq!(cache.get(2), Some(&'a'));
    assert_eq!(cache.get(7), None);
    assert_eq!(cache.get(12), Some(&'c'));
    assert_eq!(
        cache.spans().iter().collect::<Vec<_>>(),
        [(0..5, &'a'), (12..17, &'c')]
    );
}
