//! Benchmarks for dmpatch diff, patch and match operations.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use dmpatch::{DiffMatchPatch, PatchInput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

const SIZES: [usize; 3] = [1024, 10 * 1024, 50 * 1024];
const WORDS: [&str; 12] = [
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "patch", "diff", "match",
    "context",
];

// ============================================================================
// Data Generators
// ============================================================================

fn generate_source_code(size_target: usize, rng: &mut StdRng) -> String {
    let mut data = String::from("fn main() {\n");

    while data.len() < size_target {
        let var_name = format!("var_{}", rng.random_range(0..100));
        let value = rng.random_range(0..1000);

        data.push_str(&format!("    let {} = {};\n", var_name, value));

        if rng.random_bool(0.3) {
            data.push_str("    if condition {\n        do_something();\n    }\n");
        }
    }

    data.push_str("}\n");
    data
}

fn generate_prose(size_target: usize, rng: &mut StdRng) -> String {
    let mut data = String::new();

    while data.len() < size_target {
        let word = WORDS[rng.random_range(0..WORDS.len())];
        data.push_str(word);
        data.push(if rng.random_bool(0.1) { '\n' } else { ' ' });
    }

    data
}

// ============================================================================
// Change Patterns
// ============================================================================

/// Rewrites roughly `pct` of the lines.
fn change_lines(base: &str, pct: f64, rng: &mut StdRng) -> String {
    base.lines()
        .map(|line| {
            if rng.random_bool(pct) {
                format!("{line} // edited {}\n", rng.random_range(0..1000))
            } else {
                format!("{line}\n")
            }
        })
        .collect()
}

/// Replaces `count` random words with other words.
fn change_words(base: &str, count: usize, rng: &mut StdRng) -> String {
    let mut words: Vec<&str> = base.split(' ').collect();
    for _ in 0..count {
        if words.is_empty() {
            break;
        }
        let idx = rng.random_range(0..words.len());
        words[idx] = WORDS[rng.random_range(0..WORDS.len())];
    }
    words.join(" ")
}

fn create_test_texts(size: usize) -> (String, String) {
    let mut rng = StdRng::seed_from_u64(42);
    let base = generate_source_code(size, &mut rng);
    let new = change_lines(&base, 0.05, &mut rng);
    (base, new)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn benchmark_diff(c: &mut Criterion) {
    let dmp = DiffMatchPatch::new();
    let mut group = c.benchmark_group("diff_main");

    for size in SIZES.iter() {
        let (base, new) = create_test_texts(*size);

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("lines", size), size, |b, _| {
            b.iter(|| dmp.diff(black_box(&base), black_box(&new), true))
        });
        group.bench_with_input(BenchmarkId::new("chars", size), size, |b, _| {
            b.iter(|| dmp.diff(black_box(&base), black_box(&new), false))
        });
    }

    group.finish();
}

fn benchmark_patch_make(c: &mut Criterion) {
    let dmp = DiffMatchPatch::new();
    let mut group = c.benchmark_group("patch_make");

    for size in SIZES.iter() {
        let (base, new) = create_test_texts(*size);

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| dmp.patch_make(PatchInput::Texts(black_box(&base), black_box(&new))))
        });
    }

    group.finish();
}

fn benchmark_patch_apply(c: &mut Criterion) {
    let dmp = DiffMatchPatch::new();
    let mut group = c.benchmark_group("patch_apply");

    for size in SIZES.iter() {
        let (base, new) = create_test_texts(*size);
        let patches = dmp.patch_make(PatchInput::Texts(&base, &new));

        // Drift the target so patches have to be relocated
        let drifted = format!("// header\n{base}");

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("exact", size), size, |b, _| {
            b.iter(|| dmp.patch_apply(black_box(&patches), black_box(&base)))
        });
        group.bench_with_input(BenchmarkId::new("drifted", size), size, |b, _| {
            b.iter(|| dmp.patch_apply(black_box(&patches), black_box(&drifted)))
        });
    }

    group.finish();
}

fn benchmark_patch_text(c: &mut Criterion) {
    let dmp = DiffMatchPatch::new();
    let mut group = c.benchmark_group("patch_text");
    let mut rng = StdRng::seed_from_u64(7);
    let base = generate_prose(20 * 1024, &mut rng);
    let new = change_words(&base, 200, &mut rng);
    let patches = dmp.patch_make(PatchInput::Texts(&base, &new));
    let text = dmp.patch_to_text(&patches);

    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("to_text", |b| b.iter(|| dmp.patch_to_text(black_box(&patches))));
    group.bench_function("from_text", |b| b.iter(|| dmp.patch_from_text(black_box(&text))));

    group.finish();
}

fn benchmark_match(c: &mut Criterion) {
    let dmp = DiffMatchPatch::new();
    let mut group = c.benchmark_group("match_main");
    let mut rng = StdRng::seed_from_u64(99);
    let text = generate_prose(10 * 1024, &mut rng);

    for distance in [0usize, 100, 1000].iter() {
        let pattern = "quick brown fax jumps";
        let loc = text.len() / 2 + distance;

        group.bench_with_input(BenchmarkId::new("fuzzy", distance), distance, |b, _| {
            b.iter(|| dmp.match_main(black_box(&text), black_box(pattern), loc))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_diff,
    benchmark_patch_make,
    benchmark_patch_apply,
    benchmark_patch_text,
    benchmark_match
);
criterion_main!(benches);
