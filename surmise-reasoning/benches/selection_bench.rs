//! Criterion benchmarks for aggregation and selection

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use surmise_reasoning::*;

fn candidates(n: usize) -> Vec<Hypothesis> {
    (0..n)
        .map(|i| {
            let mut h = Hypothesis::new(format!("hypothesis {}", i));
            for j in 0..8 {
                let group = format!("g{}", j % 3);
                if (i + j) % 4 == 0 {
                    h.add_evidence(Evidence::contradicting("doubt", 0.4, "oracle", group));
                } else {
                    h.add_evidence(Evidence::supporting("fits", 0.7, "oracle", group));
                }
            }
            update_confidence(&mut h, &Policy::default());
            h
        })
        .collect()
}

/// Benchmark: aggregation over a hypothesis with grouped evidence
fn bench_update_confidence(c: &mut Criterion) {
    let policy = Policy {
        same_group_weight: 0.3,
        ..Policy::default()
    };
    let mut hs = candidates(1);
    c.bench_function("update_confidence", |b| {
        b.iter(|| update_confidence(black_box(&mut hs[0]), &policy))
    });
}

/// Benchmark: full selection round per algorithm
fn bench_selection_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection_round");
    let policy = Policy::default();

    for size in [10usize, 100].iter() {
        let algorithms: Vec<Box<dyn Selection>> =
            vec![Box::new(Greedy), Box::new(Ucb1), Box::new(Thompson::seeded(1))];
        for selection in algorithms {
            group.bench_with_input(BenchmarkId::new(selection.name(), size), size, |b, &size| {
                let mut hs = candidates(size);
                b.iter(|| {
                    let mut round = selection.init(&hs);
                    while let Some(i) = selection.next(&hs, &mut round, &policy) {
                        selection.update(i, &mut hs[i], &mut round);
                        if round.total_visits() as usize >= size {
                            break;
                        }
                    }
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_update_confidence, bench_selection_round);
criterion_main!(benches);
