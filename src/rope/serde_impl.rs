use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use super::{Rope, RopeBuilder};

impl Serialize for Rope {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let chunks = self.chunks();
        let mut seq = serializer.serialize_seq(Some(chunks.len()))?;
        for chunk in chunks {
            seq.serialize_element(chunk)?;
        }
        seq.end()
    }
}

struct RopeVisitor;

impl<'de> Visitor<'de> for RopeVisitor {
    type Value = Rope;

    #[inline]
    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a string or a sequence of strings")
    }

    #[inline]
    fn visit_str<E: de::Error>(self, s: &str) -> Result<Rope, E> {
        Ok(Rope::from(s))
    }

    #[inline]
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Rope, A::Error> {
        let mut builder = RopeBuilder::new();
        while let Some(chunk) = seq.next_element::<std::borrow::Cow<'de, str>>()? {
            builder.append(chunk);
        }
        Ok(builder.build())
    }
}

impl<'de> Deserialize<'de> for Rope {
    /// Deserializes a `Rope` from either a single string or a sequence of
    /// strings. Both shapes are only told apart by self-describing formats.
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Rope, D::Error> {
        deserializer.deserialize_any(RopeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde_test::{Token, assert_de_tokens, assert_tokens};

    use crate::Rope;

    #[test]
    fn empty() {
        assert_tokens(&Rope::new(), &[Token::Seq { len: Some(0) }, Token::SeqEnd]);
    }

    #[test]
    fn from_a_single_string() {
        assert_de_tokens(&Rope::from("lorem ipsum"), &[Token::Str("lorem ipsum")]);
    }

    #[test]
    fn round_trip_through_json() {
        let rope = Rope::from("lorem ipsum dolor sit amet\r\n👨\u{200d}👩");
        let json = serde_json::to_string(&rope).unwrap();
        let back: Rope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rope);
        back.assert_invariants();

        let from_str: Rope = serde_json::from_str("\"lorem\"").unwrap();
        assert_eq!(from_str, "lorem");
    }
}
