use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use pairdrill_core::mistakes::{MistakeBook, MistakeEntry};
use pairdrill_core::model::{Deck, DeckSource, Direction, Field, QuizMode};
use pairdrill_core::normalize::{normalize_answer, Matcher};
use pairdrill_core::quiz::build_choice;

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let short = "  Bonjour ";
    let cjk = "\u{3000}你好\u{3000} 世界  ";
    let long = "The quick   brown fox\tjumps over the LAZY dog ".repeat(20);

    group.bench_function("short", |b| {
        b.iter(|| normalize_answer(black_box(short), true))
    });
    group.bench_function("cjk_spaces", |b| {
        b.iter(|| normalize_answer(black_box(cjk), true))
    });
    group.bench_function("long", |b| {
        b.iter(|| normalize_answer(black_box(&long), true))
    });

    group.finish();
}

fn bench_weighted_pick(c: &mut Criterion) {
    let mut group = c.benchmark_group("weighted_pick");

    for size in [10usize, 1000] {
        let entries: Vec<MistakeEntry> = (0..size)
            .map(|i| {
                let mut e = MistakeEntry::new(
                    "bench",
                    i,
                    Field::A,
                    &format!("q{i}"),
                    Field::B,
                    &format!("a{i}"),
                    "wrong",
                    QuizMode::Fill,
                );
                e.weight = (i % 7) as u32;
                e
            })
            .collect();
        let mut book = MistakeBook::with_entries("bench.json", entries);
        let mut rng = StdRng::seed_from_u64(7);
        let mut last = None;

        group.bench_function(format!("entries_{size}"), |b| {
            b.iter(|| {
                last = book.weighted_pick(black_box(last), &mut rng).map(|e| e.id);
            })
        });
    }

    group.finish();
}

fn bench_build_choice(c: &mut Criterion) {
    let deck = Deck::from_rows(
        (0..500).map(|i| (format!("word{i}"), format!("meaning{i}"))),
        DeckSource::default(),
    );
    let matcher = Matcher::default();
    let mut rng = StdRng::seed_from_u64(3);

    c.bench_function("build_choice_500", |b| {
        b.iter(|| build_choice(&deck, black_box(250), Direction::AToB, 4, &matcher, &mut rng))
    });
}

criterion_group!(benches, bench_normalize, bench_weighted_pick, bench_build_choice);
criterion_main!(benches);
