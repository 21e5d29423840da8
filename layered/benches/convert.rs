use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use layered::{
    convert_to_layered, read_layered_sparse_from_matrix_market_buffer, CompressedSparseMatrix,
    LayeredConfig, LayeredMatrix, MatrixOperations,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NROW: usize = 2000;
const NCOL: usize = 5000;

fn counts(seed: u64) -> Vec<(usize, usize, u32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut triplets = Vec::new();
    for r in 0..NROW {
        for _ in 0..rng.gen_range(20..60) {
            // Mostly small counts with the occasional large one
            let value = if rng.gen_bool(0.02) {
                rng.gen_range(256..100_000)
            } else {
                rng.gen_range(1..50)
            };
            triplets.push((r, rng.gen_range(0..NCOL), value));
        }
    }
    triplets.sort_by_key(|&(r, c, _)| (r, c));
    triplets.dedup_by_key(|&mut (r, c, _)| (r, c));
    triplets
}

fn convert_bench(c: &mut Criterion) {
    let triplets = counts(1);
    let csr = CompressedSparseMatrix::from_triplets(NROW, NCOL, &triplets, true).unwrap();
    let csc = CompressedSparseMatrix::from_triplets(NROW, NCOL, &triplets, false).unwrap();

    let mut group = c.benchmark_group("convert");
    for threads in [1, 4] {
        let config = LayeredConfig::default()
            .with_chunk_size(1024)
            .with_num_threads(threads);
        group.bench_with_input(BenchmarkId::new("by_row", threads), &config, |b, config| {
            b.iter(|| convert_to_layered::<f64, _>(&csr, config).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("by_column", threads), &config, |b, config| {
            b.iter(|| convert_to_layered::<f64, _>(&csc, config).unwrap())
        });
    }
    group.finish();
}

fn matrix_market_bench(c: &mut Criterion) {
    let triplets = counts(2);
    let mut text = format!(
        "%%MatrixMarket matrix coordinate integer general\n{NROW} {NCOL} {}\n",
        triplets.len()
    );
    for (r, col, v) in &triplets {
        text.push_str(&format!("{} {} {}\n", r + 1, col + 1, v));
    }
    let config = LayeredConfig::default();

    c.bench_function("matrix_market_buffer", |b| {
        b.iter(|| {
            read_layered_sparse_from_matrix_market_buffer::<f64>(text.as_bytes(), &config).unwrap()
        })
    });
}

fn extraction_bench(c: &mut Criterion) {
    let triplets = counts(3);
    let csr = CompressedSparseMatrix::from_triplets(NROW, NCOL, &triplets, true).unwrap();
    let layered: LayeredMatrix<f64> = convert_to_layered(&csr, &LayeredConfig::default()).unwrap();

    c.bench_function("sparse_rows", |b| {
        b.iter(|| (0..NROW).map(|r| layered.sparse_row(r).0.len()).sum::<usize>())
    });
}

criterion_group!(benches, convert_bench, matrix_market_bench, extraction_bench);
criterion_main!(benches);
