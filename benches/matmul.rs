//! Dense matrix multiplication benchmarks.
//!
//! ```bash
//! cargo bench --bench matmul
//! cargo bench --bench matmul -- matmul_256
//! ```

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use matbench::matmul::{self, LoopOrder, Strategy};
use matbench::{DenseMatrix, RowKernel, DEFAULT_BLOCK_SIZE};

fn bench_dense_kernels(c: &mut Criterion) {
    let sizes = [64, 128, 256];

    for n in sizes {
        let mut group = c.benchmark_group(format!("matmul_{n}"));
        group.sample_size(20);

        let a = DenseMatrix::random(n, 42).unwrap();
        let b = DenseMatrix::random(n, 43).unwrap();
        let mut out = DenseMatrix::new(n).unwrap();

        let strategies = [
            Strategy::Naive(LoopOrder::Ijk),
            Strategy::Naive(LoopOrder::Ikj),
            Strategy::Naive(LoopOrder::Jik),
            Strategy::Blocked {
                block_size: DEFAULT_BLOCK_SIZE,
            },
            Strategy::Simd,
            Strategy::RayonRows,
        ];

        for strategy in strategies {
            group.bench_function(strategy.to_string(), |bench| {
                bench.iter(|| {
                    matmul::multiply(black_box(&a), black_box(&b), &mut out, strategy).unwrap();
                    black_box(&out);
                });
            });
        }

        group.finish();
    }
}

fn bench_parallel_threads(c: &mut Criterion) {
    let n = 256;
    let a = DenseMatrix::random(n, 42).unwrap();
    let b = DenseMatrix::random(n, 43).unwrap();
    let mut out = DenseMatrix::new(n).unwrap();

    let mut group = c.benchmark_group("parallel_256");
    group.sample_size(20);

    for threads in [1, 2, 4, 8] {
        for kernel in [RowKernel::Plain, RowKernel::Simd] {
            group.bench_with_input(
                BenchmarkId::new(kernel.to_string(), threads),
                &threads,
                |bench, &threads| {
                    bench.iter(|| {
                        matmul::multiply(
                            black_box(&a),
                            black_box(&b),
                            &mut out,
                            Strategy::Parallel { threads, kernel },
                        )
                        .unwrap();
                        black_box(&out);
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_block_sizes(c: &mut Criterion) {
    let n = 256;
    let a = DenseMatrix::random(n, 42).unwrap();
    let b = DenseMatrix::random(n, 43).unwrap();
    let mut out = DenseMatrix::new(n).unwrap();

    let mut group = c.benchmark_group("blocked_256");
    group.sample_size(20);

    for block_size in [8, 16, 32, 64, 100] {
        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |bench, &block_size| {
                bench.iter(|| {
                    matmul::matmul_blocked(black_box(&a), black_box(&b), &mut out, block_size)
                        .unwrap();
                    black_box(&out);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_dense_kernels,
    bench_parallel_threads,
    bench_block_sizes
);
criterion_main!(benches);
