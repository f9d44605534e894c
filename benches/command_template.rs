//! Benchmarks for command placeholder substitution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sourcecast::command::CommandTemplate;
use sourcecast_util::shell_quote;
use std::path::Path;

/// Decoder command with only the track placeholder
const DECODER: &str = "madplay -q -b 16 -R 44100 -S -o raw:- @T@";

/// Encoder command with metadata placeholders
const ENCODER: &str = "oggenc -r -B 16 -C 2 -R 44100 --raw-endianness 0 \
    -q 1.5 -t @t@ -a @a@ -c 'COMMENT=@M@' -";

/// No placeholders (baseline)
const PLAIN: &str = "lame --preset cbr 128 -r -s 44.1 --bitwidth 16 - -";

fn create_template() -> CommandTemplate {
    CommandTemplate::new()
        .with_track(Path::new("/music/Guns N' Roses/G N' R Lies/04 - Patience.mp3"))
        .with_artist("Guns N' Roses")
        .with_title("Patience")
        .with_stream("main")
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let template = create_template();

    for (name, program) in [("plain", PLAIN), ("decoder", DECODER), ("encoder", ENCODER)] {
        group.bench_with_input(BenchmarkId::new("program", name), &program, |b, program| {
            b.iter(|| template.render(black_box(program)));
        });
    }

    group.finish();
}

fn bench_shell_quote(c: &mut Criterion) {
    let mut group = c.benchmark_group("shell_quote");

    let clean = "a".repeat(256);
    let quotes = "it's ".repeat(64);
    for (name, input) in [("clean", &clean), ("quotes", &quotes)] {
        group.bench_with_input(BenchmarkId::new("input", name), input, |b, input| {
            b.iter(|| shell_quote(black_box(input)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_shell_quote);
criterion_main!(benches);
