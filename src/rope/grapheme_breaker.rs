use unicode_segmentation::{GraphemeCursor, GraphemeIncomplete};

/// The state of a grapheme cluster recognizer fed one char at a time.
///
/// Whether there's a grapheme boundary before a char only depends on the
/// chars since the last boundary, so the state is just the text of the
/// cluster that's currently being built. Two breakers with the same state
/// always agree on where the following boundaries are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphemeBreaker {
    /// The text of the current unfinished grapheme cluster. Empty at the
    /// start of the text.
    pending: String,
}

impl GraphemeBreaker {
    /// Feeds every char of `s` to the breaker.
    #[inline]
    pub fn consume(&mut self, s: &str) {
        for ch in s.chars() {
            self.has_break_before(ch);
        }
    }

    /// Returns the byte offset of the first grapheme boundary in `s`, assuming
    /// `s` follows the text already fed to this breaker, or `None` if every
    /// char of `s` continues the current cluster.
    ///
    /// Offset `0` is a boundary if the breaker is at the start of the text
    /// or if the first char of `s` starts a new cluster.
    #[inline]
    pub fn first_break(&self, s: &str) -> Option<usize> {
        let mut breaker = self.clone();

        s.char_indices()
            .find(|&(_, ch)| breaker.has_break_before(ch))
            .map(|(offset, _)| offset)
    }

    /// Creates a breaker whose current cluster is `pending`.
    ///
    /// NOTE: `pending` is assumed to be a single grapheme cluster that starts
    /// right after a boundary.
    #[inline]
    pub(super) fn from_pending(pending: &str) -> Self {
        Self { pending: pending.to_owned() }
    }

    /// Feeds `ch` to the breaker, returning whether there's a grapheme
    /// boundary right before it.
    #[inline]
    pub fn has_break_before(&mut self, ch: char) -> bool {
        let Some(last) = self.pending.chars().next_back() else {
            self.pending.push(ch);
            return true;
        };

        // Two ASCII chars are always in different clusters, except CRLF.
        if last.is_ascii() && ch.is_ascii() && !(last == '\r' && ch == '\n') {
            self.pending.clear();
            self.pending.push(ch);
            return true;
        }

        let at = self.pending.len();

        let last_start = at - last.len_utf8();

        self.pending.push(ch);

        // Most boundaries only depend on the last char, so the rest of the
        // cluster is only handed to the cursor if it asks for it.
        let mut cursor = GraphemeCursor::new(at, self.pending.len(), true);

        let chunk = &self.pending[last_start..];

        let is_break = loop {
            match cursor.is_boundary(chunk, last_start) {
                Ok(is_break) => break is_break,
                Err(GraphemeIncomplete::PreContext(end)) if end > 0 => {
                    cursor.provide_context(&self.pending[..end], 0);
                },
                Err(_) => break true,
            }
        };

        if is_break {
            self.pending.drain(..at);
        }

        is_break
    }

    /// Returns whether the breaker is at the start of the text or right after
    /// a boundary that hasn't been followed by any char yet.
    #[inline]
    pub fn is_at_start(&self) -> bool {
        self.pending.is_empty()
    }

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use unicode_segmentation::UnicodeSegmentation;

    use super::*;

    fn boundaries(s: &str) -> Vec<usize> {
        let mut breaker = GraphemeBreaker::new();
        s.char_indices()
            .filter(|&(_, ch)| breaker.has_break_before(ch))
            .map(|(offset, _)| offset)
            .collect()
    }

    fn expected(s: &str) -> Vec<usize> {
        s.grapheme_indices(true).map(|(offset, _)| offset).collect()
    }

    #[test]
    fn matches_unicode_segmentation() {
        for s in [
            "",
            "abc",
            "a\r\nb\n\r",
            "e\u{301}\u{302}x",
            "🇮🇹🇫🇷🇩🇪",
            "🇮🇹🇫",
            "👨‍👩‍👧‍👦 and 🏳️‍🌈",
            "한국어 텍스트",
            "\u{1100}\u{1161}\u{11a8}",
            "क्षि",
            "\u{600}a",
            "👩\u{1f3fd}\u{200d}🚀x",
            "x👨\u{1f3fb}\u{200d}\u{200d}👩",
        ] {
            assert_eq!(boundaries(s), expected(s), "{s:?}");
        }
    }

    #[test]
    fn first_break_after_a_zwj() {
        let mut breaker = GraphemeBreaker::new();
        breaker.consume("a👨\u{200d}");
        assert_eq!(breaker.first_break("👩b"), Some("👩".len()));
        assert_eq!(breaker.first_break("c"), Some(0));
    }

    #[test]
    fn first_break_none() {
        let mut breaker = GraphemeBreaker::new();
        breaker.consume("e");
        assert_eq!(breaker.first_break("\u{301}\u{302}"), None);
        assert_eq!(GraphemeBreaker::new().first_break(""), None);
        assert_eq!(GraphemeBreaker::new().first_break("x"), Some(0));
    }

    #[test]
    fn regional_indicators_pair_up_after_a_break() {
        let mut left = GraphemeBreaker::new();
        left.consume("🇮🇹🇫");

        let mut right = GraphemeBreaker::new();
        right.consume("x🇫");

        assert_eq!(left, right);
        assert_eq!(left.first_break("🇷🇩"), Some("🇷".len()));
    }

    #[test]
    fn long_clusters() {
        let marks = "\u{301}".repeat(5000);

        for s in [
            format!("a{marks}b"),
            format!("👨{marks}\u{200d}👩{marks}x"),
            format!("\r{marks}\n"),
        ] {
            assert_eq!(boundaries(&s), expected(&s));
        }
    }
}
