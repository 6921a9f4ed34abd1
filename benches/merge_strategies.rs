use bbpe_trainer::tokenizer::{BpeTrainer, MergeStrategy};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const SYLLABLES: &[&str] = &[
    "the", "an", "on", "er", "ing", "st", "ou", "ca", "ra", "lo", "mi", "ke", "ed", "ly", "a", "o",
];

/// Space-separated pseudo-words; a small syllable set keeps pair counts
/// skewed the way natural text is.
fn generate_corpus(words: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::new();
    for i in 0..words {
        if i > 0 {
            out.push(if i % 17 == 0 { '\n' } else { ' ' });
        }
        for _ in 0..rng.gen_range(1..5) {
            if let Some(syllable) = SYLLABLES.choose(&mut rng) {
                out.push_str(syllable);
            }
        }
    }
    out
}

fn trainer(merges: usize, strategy: MergeStrategy) -> BpeTrainer {
    BpeTrainer::builder()
        .vocab_size(256 + merges)
        .strategy(strategy)
        .workers(1)
        .show_progress(false)
        .build()
}

fn bench_strategies(c: &mut Criterion) {
    let corpus = generate_corpus(20_000, 42);
    let mut group = c.benchmark_group("merge_strategy");
    group.sample_size(10);

    for merges in [50, 200, 800] {
        for (name, strategy) in [
            ("baseline", MergeStrategy::Baseline),
            ("incremental", MergeStrategy::Incremental),
        ] {
            let trainer = trainer(merges, strategy);
            group.bench_with_input(BenchmarkId::new(name, merges), &corpus, |b, corpus| {
                b.iter(|| trainer.train_text(black_box(corpus)).map(|o| o.merges.len()))
            });
        }
    }
    group.finish();
}

fn bench_parallel_counting(c: &mut Criterion) {
    let corpus = generate_corpus(200_000, 7);
    let mut group = c.benchmark_group("train_parallel");
    group.sample_size(10);

    for workers in [1, 2, 4, 8] {
        let trainer = BpeTrainer::builder()
            .vocab_size(256 + 100)
            .workers(workers)
            .show_progress(false)
            .build();
        group.bench_with_input(BenchmarkId::from_parameter(workers), &corpus, |b, corpus| {
            b.iter(|| trainer.train_parallel(black_box(corpus)).map(|o| o.merges.len()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_strategies, bench_parallel_counting);
criterion_main!(benches);
