//! Add / sample / remove latency for the three backings.
//!
//! Every element gets weight 1.0 and removal happens in a shuffled order.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use probdist_rs::{
    ArrayDistribution, LinkedListDistribution, ProbabilityDistribution, TreeDistribution,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::time::Duration;

const LOADS: [usize; 2] = [10_000, 40_000];

/// Backing types for benchmarking.
#[derive(Debug, Clone, Copy)]
enum Backing {
    Array,
    LinkedList,
    Tree,
}

impl Backing {
    const ALL: [Backing; 3] = [Backing::Array, Backing::LinkedList, Backing::Tree];

    fn name(&self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::LinkedList => "linked_list",
            Self::Tree => "tree",
        }
    }

    fn build(&self) -> Box<dyn ProbabilityDistribution<usize>> {
        match self {
            Self::Array => Box::new(ArrayDistribution::with_seed(12345)),
            Self::LinkedList => Box::new(LinkedListDistribution::with_seed(12345)),
            Self::Tree => Box::new(TreeDistribution::with_seed(12345)),
        }
    }

    fn filled(&self, n: usize) -> Box<dyn ProbabilityDistribution<usize>> {
        let mut dist = self.build();
        for i in 0..n {
            let _ = dist.add(i, 1.0);
        }
        dist
    }
}

fn shuffled(n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut Pcg32::seed_from_u64(42));
    order
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");
    group.sampling_mode(SamplingMode::Flat);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));
    group.sample_size(10);

    for backing in Backing::ALL {
        for n in LOADS {
            group.bench_with_input(BenchmarkId::new(backing.name(), n), &n, |b, &n| {
                b.iter(|| black_box(backing.filled(n)));
            });
        }
    }

    group.finish();
}

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");
    group.sampling_mode(SamplingMode::Flat);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));
    group.sample_size(20);

    for backing in Backing::ALL {
        for n in LOADS {
            let mut dist = backing.filled(n);
            group.bench_function(BenchmarkId::new(backing.name(), n), |b| {
                b.iter(|| black_box(dist.sample()));
            });
        }
    }

    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_all");
    group.sampling_mode(SamplingMode::Flat);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));
    group.sample_size(10);

    for backing in Backing::ALL {
        for n in LOADS {
            let order = shuffled(n);
            group.bench_with_input(BenchmarkId::new(backing.name(), n), &order, |b, order| {
                b.iter_batched(
                    || backing.filled(n),
                    |mut dist| {
                        for k in order {
                            dist.remove(k);
                        }
                        dist
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_add, bench_sample, bench_remove);
criterion_main!(benches);
