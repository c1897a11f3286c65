use criterion::{black_box, criterion_group, criterion_main, Criterion};
use orion_rs::authority::ConfigAuthority;
use orion_rs::intent::{round_with_fixed_sum, DustGenerator, Normalizer, OrderIntent};

fn bench_round_with_fixed_sum(c: &mut Criterion) {
    // 64 uneven shares of 10^9
    let raw: Vec<f64> = (1..=64).map(|i| (i * 7 % 13 + 1) as f64).collect();
    let total: f64 = raw.iter().sum();
    let values: Vec<f64> = raw.iter().map(|v| v / total * 1e9).collect();

    c.bench_function("round_with_fixed_sum_64", |b| {
        b.iter(|| round_with_fixed_sum(black_box(&values), Some(10u128.pow(9))).unwrap())
    });
}

fn bench_normalize_fuzzed(c: &mut Criterion) {
    let tokens: Vec<String> = (0..32).map(|i| format!("0x{:040x}", i)).collect();
    let authority = ConfigAuthority::new(tokens.iter().map(String::as_str), 9);
    let normalizer = Normalizer::new(authority);
    let intent: OrderIntent = tokens[..4].iter().map(|t| (t.as_str(), 0.25)).collect();
    let mut dust = DustGenerator::seeded(42);

    c.bench_function("normalize_fuzzed_4_of_32", |b| {
        b.iter(|| normalizer.normalize(black_box(&intent), Some(&mut dust)).unwrap())
    });
}

criterion_group!(benches, bench_round_with_fixed_sum, bench_normalize_fuzzed);
criterion_main!(benches);
