#![allow(dead_code)]

/// Generated lorem ipsum text of a few sizes, from a couple of lines to a
/// few megabytes.
pub struct Fixtures {
    pub tiny: String,
    pub small: String,
    pub medium: String,
    pub large: String,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            tiny: lipsum(10),
            small: lipsum(1_000),
            medium: lipsum(20_000),
            large: lipsum(100_000),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("tiny", self.tiny.as_str()),
            ("small", self.small.as_str()),
            ("medium", self.medium.as_str()),
            ("large", self.large.as_str()),
        ]
        .into_iter()
    }
}

fn lipsum(lines: usize) -> String {
    const WORDS: &[&str] = &[
        "lorem", "ipsum", "dolor", "sit", "amet", "consectetur",
        "adipiscing", "elit", "sed", "do", "eiusmod", "tempor",
    ];

    let mut text = String::new();

    for line in 0..lines {
        for word in 0..(line % 9) + 2 {
            if word > 0 {
                text.push(' ');
            }
            text.push_str(WORDS[(line * 7 + word) % WORDS.len()]);
        }
        text.push('\n');
    }

    text
}
