use criterion::measurement::WallTime;
use criterion::{BenchmarkGroup, Criterion, criterion_group, criterion_main};
use rand::Rng;

mod common;

use common::Fixtures;

const SENTENCE: &str =
    "Lorem ipsum dolor sit amet, consectetur adipiscing elit.";

fn bench_replace(
    group: &mut BenchmarkGroup<WallTime>,
    fixtures: &Fixtures,
    deleted: usize,
    inserted: &str,
) {
    for (name, text) in fixtures.iter() {
        group.bench_function(name, |bench| {
            let mut rng = rand::rng();
            let orig = braid::Rope::from(text);
            let mut r = orig.clone();
            bench.iter(|| {
                let len = r.byte_len();
                let start = rng.random_range(0..=len);
                let end = (start + deleted).min(len);
                r.replace(start..end, inserted);

                if r.byte_len() < orig.byte_len() / 4
                    || r.byte_len() > orig.byte_len() * 4
                {
                    r = orig.clone();
                }
            });
        });
    }
}

fn insert_char(c: &mut Criterion) {
    let fixtures = Fixtures::new();
    let mut group = c.benchmark_group("insert_char");
    bench_replace(&mut group, &fixtures, 0, "a");
}

fn insert_sentence(c: &mut Criterion) {
    let fixtures = Fixtures::new();
    let mut group = c.benchmark_group("insert_sentence");
    bench_replace(&mut group, &fixtures, 0, SENTENCE);
}

fn delete_sentence(c: &mut Criterion) {
    let fixtures = Fixtures::new();
    let mut group = c.benchmark_group("delete_sentence");
    bench_replace(&mut group, &fixtures, SENTENCE.len(), "");
}

fn replace_sentence(c: &mut Criterion) {
    let fixtures = Fixtures::new();
    let mut group = c.benchmark_group("replace_sentence");
    bench_replace(&mut group, &fixtures, SENTENCE.len(), SENTENCE);
}

fn ropey_insert_char(c: &mut Criterion) {
    let fixtures = Fixtures::new();
    let mut group = c.benchmark_group("ropey_insert_char");

    for (name, text) in fixtures.iter() {
        group.bench_function(name, |bench| {
            let mut rng = rand::rng();
            let mut r = ropey::Rope::from_str(text);
            bench.iter(|| {
                let at = rng.random_range(0..=r.len_chars());
                r.insert(at, "a");
            });
        });
    }
}

fn insert_char_with_clone_around(c: &mut Criterion) {
    let fixtures = Fixtures::new();
    let mut group = c.benchmark_group("insert_char_with_clone_around");

    group.bench_function("large", |bench| {
        let mut rng = rand::rng();
        let orig = braid::Rope::from(fixtures.large.as_str());
        let mut r = orig.clone();
        let mut insertions = 0;
        bench.iter(|| {
            let at = rng.random_range(0..=r.byte_len());
            r.insert(at, "a");
            insertions += 1;
            if insertions == 64 {
                insertions = 0;
                r = orig.clone();
            }
        })
    });
}

fn interval_cache(c: &mut Criterion) {
    let fixtures = Fixtures::new();
    let mut group = c.benchmark_group("interval_cache_invalidate_delta");

    for (name, text) in fixtures.iter() {
        group.bench_function(name, |bench| {
            let mut rng = rand::rng();
            let mut r = braid::Rope::from(text);

            let mut builder = braid::SpansBuilder::new(r.byte_len());
            for (idx, line) in r.lines().enumerate() {
                let start = r.byte_of_line(idx);
                builder.add(line.byte_len(), start..start + line.byte_len());
            }
            let mut cache = braid::IntervalCache::from(builder.build());

            bench.iter(|| {
                let at = rng.random_range(0..=r.byte_len());
                let delta = r.insert(at, "a");
                cache.invalidate_delta(&delta);
            });
        });
    }
}

fn heights_replace(c: &mut Criterion) {
    let fixtures = Fixtures::new();
    let mut group = c.benchmark_group("heights_replace");

    let inserted = braid::Rope::from("foo\nbar");

    for (name, text) in fixtures.iter() {
        group.bench_function(name, |bench| {
            let mut rng = rand::rng();
            let mut heights =
                braid::Heights::from_rope(&braid::Rope::from(text), 14.0);
            bench.iter(|| {
                let at = rng.random_range(0..=heights.len());
                heights.replace(at..at, inserted.byte_slice(..));
            });
        });
    }
}

criterion_group!(
    benches,
    insert_char,
    insert_sentence,
    delete_sentence,
    replace_sentence,
    ropey_insert_char,
    insert_char_with_clone_around,
    interval_cache,
    heights_replace,
);
criterion_main!(benches);
