#![allow(dead_code)]

use std::env;

use rand::{Rng, SeedableRng};

/// Two lines, one of them ending in a CRLF.
pub const TINY: &str = "Hello there!\r\nHow're you doing?\nこんにちは、みんなさん！";

/// Grapheme clusters made of more than one code point.
pub const CLUSTERS: &str = "e\u{301}\r\n👨\u{200d}👩\u{200d}👧🇮🇹🇫🇷g\u{308}\u{323}\
                            \u{1f44d}\u{1f3fd}한\u{11a8}\r\n";

/// Characters which are a grapheme cluster each, on their own and next to
/// each other.
const ALPHABET: &[char] = &['a', 'b', 'c', ' ', '\n', 'é', 'ß', 'こ', '🐻'];

#[track_caller]
pub fn rng() -> impl Rng {
    let seed = seed();
    println!("SEED: {seed:?}");
    rand_chacha::ChaChaRng::seed_from_u64(seed)
}

#[track_caller]
fn seed() -> u64 {
    match env::var("SEED") {
        Ok(seed) => seed.parse().expect("couldn't parse $SEED"),
        Err(env::VarError::NotPresent) => rand::random(),
        Err(env::VarError::NotUnicode(seed)) => {
            panic!("$SEED contained invalid unicode: {seed:?}")
        },
    }
}

/// Returns `n` lines of lorem ipsum.
pub fn lipsum(n: usize) -> String {
    const WORDS: &[&str] = &[
        "lorem", "ipsum", "dolor", "sit", "amet", "consectetur",
        "adipiscing", "elit", "sed", "do", "eiusmod", "tempor",
    ];

    let mut text = String::new();

    for line in 0..n {
        for word in 0..(line % 7) + 3 {
            if word > 0 {
                text.push(' ');
            }
            text.push_str(WORDS[(line * 5 + word) % WORDS.len()]);
        }
        text.push('\n');
    }

    text
}

/// Returns a random string of `n` characters, each one its own grapheme
/// cluster.
pub fn random_text(rng: &mut impl Rng, n: usize) -> String {
    (0..n).map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())]).collect()
}

/// Returns a random char boundary of `s` in `range`, rounding down.
pub fn char_boundary_in(
    rng: &mut impl Rng,
    s: &str,
    range: std::ops::RangeInclusive<usize>,
) -> usize {
    let mut offset = rng.random_range(range);
    while !s.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Returns a random range of `s` whose ends are on char boundaries.
pub fn random_range(rng: &mut impl Rng, s: &str) -> std::ops::Range<usize> {
    let start = char_boundary_in(rng, s, 0..=s.len());
    let end = char_boundary_in(rng, s, start..=s.len()).max(start);
    start..end
}
