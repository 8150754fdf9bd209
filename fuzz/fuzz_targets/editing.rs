#![no_main]

use std::ops::Range;

use braid::{Heights, IntervalCache, Rope};
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

const NON_ASCII: &str = "Ƒoo\r\nbär 👨\u{200d}👩\u{200d}👧 e\u{301}\n🇮🇹🇫🇷\
                         こんにちは\r\n\u{1f44d}\u{1f3fd}";

#[derive(Arbitrary, Clone, Debug)]
enum EditOp<'a> {
    Insert { byte_offset: usize, text: &'a str },
    Delete { byte_range: Range<usize> },
    Replace { byte_range: Range<usize>, text: &'a str },
}

#[derive(Arbitrary, Copy, Clone, Debug)]
enum StartingText<'a> {
    Custom(&'a str),
    NonAscii,
}

fn round_up(rope: &Rope, mut offset: usize) -> usize {
    while !rope.is_char_boundary(offset) {
        offset += 1;
    }
    offset
}

fuzz_target!(|data: (StartingText, Vec<EditOp>)| {
    let (starting, ops) = data;

    let mut rope = Rope::from(match starting {
        StartingText::Custom(s) => s,
        StartingText::NonAscii => NON_ASCII,
    });

    let mut heights = Heights::from_rope(&rope, 10.0);

    let mut cache = IntervalCache::new(rope.byte_len());
    cache.set((), 0..rope.byte_len());

    for op in ops {
        let (range, text) = match op {
            EditOp::Insert { byte_offset, text }
                if byte_offset <= rope.byte_len() =>
            {
                let offset = round_up(&rope, byte_offset);
                (offset..offset, text)
            },

            EditOp::Delete { byte_range }
                if byte_range.start <= byte_range.end
                    && byte_range.end <= rope.byte_len() =>
            {
                let range = round_up(&rope, byte_range.start)
                    ..round_up(&rope, byte_range.end);
                (range, "")
            },

            EditOp::Replace { byte_range, text }
                if byte_range.start <= byte_range.end
                    && byte_range.end <= rope.byte_len() =>
            {
                let range = round_up(&rope, byte_range.start)
                    ..round_up(&rope, byte_range.end);
                (range, text)
            },

            _ => continue,
        };

        let old = rope.clone();
        let delta = rope.replace(range, text);

        assert_eq!(old.applying(&delta), rope);

        let (replaced, _) = delta.summary();
        heights.replace(replaced, Rope::from(text).byte_slice(..));

        cache.invalidate_delta(&delta);
        assert_eq!(cache.len(), rope.byte_len());
    }

    rope.assert_invariants();
    heights.assert_invariants();
    cache.spans().assert_invariants();

    assert_eq!(heights.len(), rope.byte_len());
    assert_eq!(heights.line_count(), rope.line_len());
});
