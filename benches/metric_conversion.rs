use criterion::{Bencher, Criterion, criterion_group, criterion_main};

mod common;

use common::Fixtures;

fn bench_offsets<F>(c: &mut Criterion, group_name: &str, mut fun: F)
where
    F: FnMut(&mut Bencher, &str),
{
    let fixtures = Fixtures::new();
    let mut group = c.benchmark_group(group_name);
    for (name, text) in fixtures.iter() {
        group.bench_function(name, |b| fun(b, text));
    }
}

fn line_of_byte(c: &mut Criterion) {
    bench_offsets(c, "line_of_byte", |bench, s| {
        let r = braid::Rope::from(s);
        let mut byte_offsets = (0..=r.byte_len()).cycle();
        bench.iter(|| r.line_of_byte(byte_offsets.next().unwrap()));
    });

    bench_offsets(c, "ropey_char_to_line", |bench, s| {
        let r = ropey::Rope::from_str(s);
        let mut char_offsets = (0..=r.len_chars()).cycle();
        bench.iter(|| r.char_to_line(char_offsets.next().unwrap()));
    });
}

fn byte_of_line(c: &mut Criterion) {
    bench_offsets(c, "byte_of_line", |bench, s| {
        let r = braid::Rope::from(s);
        let mut line_offsets = (0..r.line_len()).cycle();
        bench.iter(|| r.byte_of_line(line_offsets.next().unwrap()));
    });

    bench_offsets(c, "ropey_line_to_byte", |bench, s| {
        let r = ropey::Rope::from_str(s);
        let mut line_offsets = (0..r.len_lines()).cycle();
        bench.iter(|| r.line_to_byte(line_offsets.next().unwrap()));
    });
}

fn grapheme_of_byte(c: &mut Criterion) {
    bench_offsets(c, "grapheme_of_byte", |bench, s| {
        let r = braid::Rope::from(s);
        let mut byte_offsets = (0..=r.byte_len()).step_by(7).cycle();
        bench.iter(|| r.grapheme_of_byte(byte_offsets.next().unwrap()));
    });
}

fn utf16_of_byte(c: &mut Criterion) {
    bench_offsets(c, "utf16_of_byte", |bench, s| {
        let r = braid::Rope::from(s);
        let mut byte_offsets = (0..=r.byte_len()).cycle();
        bench.iter(|| r.utf16_of_byte(byte_offsets.next().unwrap()));
    });
}

fn heights_position_at(c: &mut Criterion) {
    bench_offsets(c, "heights_position_at", |bench, s| {
        let heights = braid::Heights::from_rope(&braid::Rope::from(s), 14.0);
        let height = heights.content_height() as usize;
        let mut ys = (0..=height).step_by(3).cycle();
        bench.iter(|| heights.position_at(ys.next().unwrap() as f64));
    });
}

criterion_group!(
    benches,
    byte_of_line,
    line_of_byte,
    grapheme_of_byte,
    utf16_of_byte,
    heights_position_at,
);
criterion_main!(benches);
