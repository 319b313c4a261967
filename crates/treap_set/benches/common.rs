use std::collections::BTreeSet;
use std::hint::black_box;
use std::ops::Bound::{Excluded, Unbounded};
use std::time::{Duration, Instant};

use bench::{
    apply_medium_runtime_config, apply_small_runtime_config, default_rng, distinct_keys, probes,
};
use criterion::measurement::Measurement;
use criterion::{BenchmarkGroup, BenchmarkId};
use rand::Rng;

use treap_set::{NavigableSet, TreapSet};

const SIZES: [usize; 4] = [1_000, 16_000, 64_000, 256_000];
const OPS_PER_ITER: usize = 200;
const HIT_RATE_PERCENT: u64 = 80;

/// Minimal surface shared by the set under test and the std baseline.
trait BenchSet {
    fn build(keys: &[u64]) -> Self;
    fn contains(&self, key: u64) -> bool;
    fn lower(&self, key: u64) -> Option<u64>;
    fn higher(&self, key: u64) -> Option<u64>;
    fn add(&mut self, key: u64) -> bool;
    fn remove(&mut self, key: u64) -> bool;
    fn walk(&self, descending: bool) -> u64;
}

impl BenchSet for TreapSet<u64> {
    fn build(keys: &[u64]) -> Self {
        keys.iter().copied().collect()
    }

    fn contains(&self, key: u64) -> bool {
        NavigableSet::contains(self, &key)
    }

    fn lower(&self, key: u64) -> Option<u64> {
        NavigableSet::lower(self, &key)
    }

    fn higher(&self, key: u64) -> Option<u64> {
        NavigableSet::higher(self, &key)
    }

    fn add(&mut self, key: u64) -> bool {
        NavigableSet::add(self, key)
    }

    fn remove(&mut self, key: u64) -> bool {
        NavigableSet::remove(self, &key)
    }

    fn walk(&self, descending: bool) -> u64 {
        let it = if descending {
            self.descending_iter()
        } else {
            self.iter()
        };
        it.map_while(Result::ok).fold(0, u64::wrapping_add)
    }
}

impl BenchSet for BTreeSet<u64> {
    fn build(keys: &[u64]) -> Self {
        keys.iter().copied().collect()
    }

    fn contains(&self, key: u64) -> bool {
        BTreeSet::contains(self, &key)
    }

    fn lower(&self, key: u64) -> Option<u64> {
        self.range(..key).next_back().copied()
    }

    fn higher(&self, key: u64) -> Option<u64> {
        self.range((Excluded(key), Unbounded)).next().copied()
    }

    fn add(&mut self, key: u64) -> bool {
        self.insert(key)
    }

    fn remove(&mut self, key: u64) -> bool {
        BTreeSet::remove(self, &key)
    }

    fn walk(&self, descending: bool) -> u64 {
        if descending {
            self.iter().rev().fold(0, |acc, &k| acc.wrapping_add(k))
        } else {
            self.iter().fold(0, |acc, &k| acc.wrapping_add(k))
        }
    }
}

fn bench_read<S, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    S: BenchSet,
{
    for &size in &SIZES {
        apply_small_runtime_config(group);
        let mut rng = default_rng();
        let keys = distinct_keys(&mut rng, size);
        let set = S::build(&keys);

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let ops = probes(&mut rng, &keys, OPS_PER_ITER, HIT_RATE_PERCENT);
                    let start = Instant::now();
                    for (i, &key) in ops.iter().enumerate() {
                        match i % 3 {
                            0 => black_box(set.contains(key)),
                            1 => black_box(set.lower(key).is_some()),
                            _ => black_box(set.higher(key).is_some()),
                        };
                    }
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

fn bench_update<S, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    S: BenchSet,
{
    for &size in &SIZES {
        apply_small_runtime_config(group);
        let mut rng = default_rng();
        let keys = distinct_keys(&mut rng, size);
        let mut set = S::build(&keys);

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    // Odd keys are never resident, so each add is paired with
                    // the remove that undoes it and the set keeps its size.
                    let fresh: Vec<u64> = (0..OPS_PER_ITER / 2)
                        .map(|_| rng.random_range(0..2 * size as u64) | 1)
                        .collect();
                    let start = Instant::now();
                    for &key in &fresh {
                        black_box(set.add(key));
                    }
                    for &key in &fresh {
                        black_box(set.remove(key));
                    }
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

fn bench_walk<S, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    S: BenchSet,
{
    for &size in &SIZES {
        apply_medium_runtime_config(group);
        let keys = distinct_keys(&mut default_rng(), size);
        let set = S::build(&keys);

        group.bench_function(BenchmarkId::new(format!("{label}/asc"), size), |bencher| {
            bencher.iter(|| black_box(set.walk(false)))
        });
        group.bench_function(BenchmarkId::new(format!("{label}/desc"), size), |bencher| {
            bencher.iter(|| black_box(set.walk(true)))
        });
    }
}

pub fn bench_all_read<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_read::<BTreeSet<u64>, _>(group, "std_btree");
    bench_read::<TreapSet<u64>, _>(group, "treap");
}

pub fn bench_all_update<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_update::<BTreeSet<u64>, _>(group, "std_btree");
    bench_update::<TreapSet<u64>, _>(group, "treap");
}

pub fn bench_all_walk<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_walk::<BTreeSet<u64>, _>(group, "std_btree");
    bench_walk::<TreapSet<u64>, _>(group, "treap");
}
