use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

mod common;

use common::Fixtures;

fn from_str(c: &mut Criterion) {
    let fixtures = Fixtures::new();

    let mut group = c.benchmark_group("braid_from_str");
    for (name, text) in fixtures.iter() {
        group.bench_function(name, |b| {
            b.iter(|| braid::Rope::from(black_box(text)))
        });
    }
    group.finish();

    let mut group = c.benchmark_group("ropey_from_str");
    for (name, text) in fixtures.iter() {
        group.bench_function(name, |b| {
            b.iter(|| ropey::Rope::from_str(black_box(text)))
        });
    }
    group.finish();
}

fn builder(c: &mut Criterion) {
    let fixtures = Fixtures::new();

    let mut group = c.benchmark_group("braid_builder");
    for (name, text) in fixtures.iter() {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut builder = braid::RopeBuilder::new();
                for line in text.split_inclusive('\n') {
                    builder.append(line);
                }
                builder.build()
            })
        });
    }
    group.finish();

    let mut group = c.benchmark_group("ropey_builder");
    for (name, text) in fixtures.iter() {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut builder = ropey::RopeBuilder::new();
                for line in text.split_inclusive('\n') {
                    builder.append(line);
                }
                builder.finish()
            })
        });
    }
    group.finish();
}

fn heights(c: &mut Criterion) {
    let fixtures = Fixtures::new();

    let mut group = c.benchmark_group("heights_from_rope");
    for (name, text) in fixtures.iter() {
        let rope = braid::Rope::from(text);
        group.bench_function(name, |b| {
            b.iter(|| braid::Heights::from_rope(black_box(&rope), 14.0))
        });
    }
    group.finish();
}

criterion_group!(benches, from_str, builder, heights);
criterion_main!(benches);
