use criterion::{Criterion, black_box, criterion_group, criterion_main};

use handtype::engine::problem_words::ProblemWordStore;
use handtype::engine::scoring;
use handtype::session::input::{Keystroke, WordResult};
use handtype::session::result::{self, CompileInput};

const WORDS: [&str; 8] = [
    "their", "people", "would", "about", "which", "water", "pumpkin", "street",
];

fn make_results(count: usize) -> Vec<WordResult> {
    (0..count)
        .map(|i| {
            let expected = WORDS[i % WORDS.len()];
            let start = i as i64 * 700;
            let keystrokes: Vec<Keystroke> = expected
                .chars()
                .enumerate()
                .map(|(j, key)| Keystroke {
                    key,
                    timestamp: start + j as i64 * 120,
                    correct: (i + j) % 9 != 0,
                    delay: 120,
                })
                .collect();
            let typed = if i % 5 == 0 {
                expected.replacen(expected.chars().next().unwrap_or('x'), "x", 1)
            } else {
                expected.to_string()
            };
            WordResult::new(expected, &typed, start, start + 600 + (i % 4) as i64 * 700, keystrokes)
        })
        .collect()
}

fn bench_compile(c: &mut Criterion) {
    let results = make_results(200);
    let history: Vec<u32> = (0..60).map(|i| 55 + (i % 7)).collect();

    c.bench_function("compile results (200 words)", |b| {
        b.iter(|| {
            result::compile(black_box(&CompileInput {
                word_results: &results,
                partial: None,
                start_time: 0,
                end_time: 140_000,
                wpm_history: &history,
            }))
        })
    });
}

fn bench_primitives(c: &mut Criterion) {
    let samples: Vec<f64> = (0..120).map(|i| 40.0 + (i % 13) as f64).collect();
    let results = make_results(200);

    c.bench_function("consistency (120 samples)", |b| {
        b.iter(|| scoring::consistency(black_box(&samples)))
    });
    c.bench_function("burst_wpm (200 words)", |b| {
        b.iter(|| scoring::burst_wpm(black_box(&results), 0))
    });
}

fn bench_problem_words(c: &mut Criterion) {
    let results = make_results(200);

    c.bench_function("problem word update (200 words)", |b| {
        b.iter(|| {
            let mut store = ProblemWordStore::default();
            store.update(black_box(&results), 0);
            store
        })
    });

    let mut warm = ProblemWordStore::default();
    for _ in 0..10 {
        warm.update(&results, 0);
    }
    c.bench_function("problem word ranking", |b| b.iter(|| black_box(&warm).top(35)));
}

criterion_group!(benches, bench_compile, bench_primitives, bench_problem_words);
criterion_main!(benches);
