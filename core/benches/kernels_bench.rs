/// Criterion benchmarks for the sparse update and the hidden-layer build.
///
/// Sweeps hidden width for AdaGrad (row-sparse and column-sparse at a fixed
/// nonzero count) and document length for the first layer.
///
/// Run: cargo bench --bench kernels_bench
/// Reports saved to: target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use corefnn_core::adagrad::SparseAdaGrad;
use corefnn_core::config::AdaGradConfig;
use corefnn_core::layout::{Dims, Layout, NonzeroSet};
use corefnn_core::pair_features::{build_hidden_layer, num_pairs, EmbeddingTable, RaggedFeatures};
use corefnn_core::tensor::SampleRng;

const FEATURES: usize = 5000;
const NNZ: usize = 60;

fn make_nonzero(rng: &mut SampleRng, d: usize) -> NonzeroSet {
    let ids: Vec<usize> = (0..NNZ).map(|_| rng.range(1, d + 1)).collect();
    NonzeroSet::from_one_based(&ids, 4096).unwrap()
}

/// One AdaGrad iteration on a (h, FEATURES) weight matrix.
fn bench_adagrad(c: &mut Criterion) {
    let mut group = c.benchmark_group("adagrad_update");
    let opt = SparseAdaGrad::new(AdaGradConfig::first_layer()).unwrap();
    for h in [16, 64, 256] {
        let dims = Dims::new(h, FEATURES);
        let mut rng = SampleRng::new(42);
        let mut x = vec![0.0f64; dims.numel()];
        let mut g = vec![0.0f64; dims.numel()];
        let mut var = vec![0.0f64; dims.numel()];
        rng.fill_uniform(&mut x, 0.1);
        rng.fill_sparse(&mut g, 0.1, 0.9);
        let nz = make_nonzero(&mut rng, FEATURES);

        group.bench_with_input(BenchmarkId::new("row_sparse", h), &h, |b, _| {
            b.iter(|| {
                opt.update(&mut x, black_box(&g), &mut var, Layout::RowSparse(&nz), dims).unwrap();
            });
        });
        group.bench_with_input(BenchmarkId::new("column_sparse", h), &h, |b, _| {
            b.iter(|| {
                opt.update(&mut x, black_box(&g), &mut var, Layout::ColumnSparse(&nz), dims).unwrap();
            });
        });
    }
    group.finish();
}

/// First layer for one document of `n` mentions.
fn bench_hidden_layer(c: &mut Criterion) {
    let mut group = c.benchmark_group("hidden_layer");
    let (hp, ha, rows) = (200, 50, 2000);
    let mut rng = SampleRng::new(7);
    let mut pair_w = vec![0.0f64; rows * hp];
    let mut ana_w = vec![0.0f64; rows * ha];
    rng.fill_uniform(&mut pair_w, 0.05);
    rng.fill_uniform(&mut ana_w, 0.05);
    let pair_table = EmbeddingTable::new(&pair_w, hp).unwrap();
    let ana_table = EmbeddingTable::new(&ana_w, ha).unwrap();

    for n in [10, 40, 80] {
        let segment = |rng: &mut SampleRng, count: usize| {
            let mut ids = Vec::new();
            let mut starts = vec![0usize];
            for _ in 0..count {
                for _ in 0..8 {
                    ids.push(rng.range(1, rows + 1));
                }
                starts.push(ids.len());
            }
            (ids, starts)
        };
        let (pair_ids, pair_starts) = segment(&mut rng, n * (n - 1) / 2);
        let (ana_ids, ana_starts) = segment(&mut rng, n - 1);
        let pairs = RaggedFeatures::new(&pair_ids, &pair_starts, 0);
        let ana = RaggedFeatures::new(&ana_ids, &ana_starts, 0);
        let mut z1 = vec![0.0f64; (hp + ha) * num_pairs(n)];

        group.bench_with_input(BenchmarkId::new("mentions", n), &n, |b, &n| {
            b.iter(|| {
                z1.fill(0.0);
                build_hidden_layer(&mut z1, &pair_table, &pairs, &ana_table, &ana, n).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_adagrad, bench_hidden_layer);
criterion_main!(benches);
