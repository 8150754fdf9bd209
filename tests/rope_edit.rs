use braid::Rope;
use braid::tree::DeltaRegion;
use rand::Rng;

mod common;

use common::{lipsum, random_range, random_text, rng};

fn assert_matches(r: &Rope, s: &str) {
    r.assert_invariants();
    assert_eq!(r, s);
    assert_eq!(r.byte_len(), s.len());
    assert_eq!(r.char_len(), s.chars().count());
    assert_eq!(r.utf16_len(), s.encode_utf16().count());
    assert_eq!(r.line_len(), s.matches('\n').count() + 1);
    // Every character of the random text is its own grapheme cluster.
    assert_eq!(r.grapheme_len(), s.chars().count());
}

#[test]
fn random_edits_match_a_string() {
    let mut rng = rng();

    let mut s = random_text(&mut rng, 3000);
    let mut r = Rope::from(s.as_str());

    for _ in 0..300 {
        let range = random_range(&mut rng, &s);
        let len = rng.random_range(0..100);
        let text = random_text(&mut rng, len);

        let old = r.clone();
        let delta = r.replace(range.clone(), &text);

        s.replace_range(range.clone(), &text);

        assert_matches(&r, &s);
        assert_eq!(old.applying(&delta), r);
        assert_eq!(delta.base_len(), old.byte_len());
        assert_eq!(delta.new_len(), r.byte_len());
    }
}

#[test]
fn random_deletions_down_to_empty() {
    let mut rng = rng();

    let mut s = lipsum(150);
    let mut r = Rope::from(s.as_str());

    while !s.is_empty() {
        let mut range = random_range(&mut rng, &s);
        range.end = range.end.min(range.start + 500);

        r.delete(range.clone());
        s.replace_range(range, "");

        assert_matches(&r, &s);
    }

    assert!(r.is_empty());
    assert_eq!(r.line_len(), 1);
}

#[test]
fn random_insertions_from_empty() {
    let mut rng = rng();

    let mut s = String::new();
    let mut r = Rope::new();

    for _ in 0..500 {
        let at = common::char_boundary_in(&mut rng, &s, 0..=s.len());
        let len = rng.random_range(1..20);
        let text = random_text(&mut rng, len);

        r.insert(at, &text);
        s.insert_str(at, &text);
    }

    assert_matches(&r, &s);
}

#[test]
fn delta_regions_describe_the_edit() {
    let mut r = Rope::from(lipsum(80).as_str());
    let len = r.byte_len();

    let delta = r.replace(100..200, "foo");

    let regions = delta.regions().collect::<Vec<_>>();

    assert_eq!(
        regions,
        [
            DeltaRegion::Copy(0..100),
            DeltaRegion::Insert(3),
            DeltaRegion::Copy(200..len),
        ]
    );
    assert_eq!(delta.summary(), (100..200, 3));
}

#[test]
fn delta_summary_at_the_edges() {
    let mut r = Rope::from("abcdefghij");
    assert_eq!(r.delete(0..4).summary(), (0..4, 0));
    assert_eq!(r, "efghij");

    let mut r = Rope::from("abcdefghij");
    assert_eq!(r.delete(6..10).summary(), (6..10, 0));

    let mut r = Rope::from("abcdefghij");
    assert_eq!(r.replace(3..5, "xyz").summary(), (3..5, 3));
}

#[test]
fn empty_edits() {
    let mut r = Rope::from("foo");

    let delta = r.replace(1..1, "");

    assert_eq!(r, "foo");
    assert_eq!(delta.new_len(), 3);
    assert_eq!(Rope::from("foo").applying(&delta), "foo");

    let delta = r.replace(.., "");
    assert!(r.is_empty());
    assert_eq!(delta.summary(), (0..3, 0));
}

#[test]
fn old_versions_are_untouched() {
    let mut rng = rng();

    let mut r = Rope::from(lipsum(300).as_str());
    let mut versions = vec![(r.clone(), r.to_string())];

    for _ in 0..50 {
        let s = r.to_string();
        let range = random_range(&mut rng, &s);
        r.replace(range, "edit\n");
        versions.push((r.clone(), r.to_string()));
    }

    for (rope, string) in versions {
        rope.assert_invariants();
        assert_eq!(rope, string);
    }
}
