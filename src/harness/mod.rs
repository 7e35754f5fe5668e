//! Benchmark harness: generates inputs, times every kernel, cross-checks the
//! results and collects one [`ResultRow`] per kernel and configuration.
//!
//! Every timing is compared against the naive i-k-j kernel on the same
//! inputs. For dimensions up to [`BenchConfig::verify_limit`] the kernel's
//! output is also compared with the naive result within
//! [`VERIFY_TOLERANCE`](crate::VERIFY_TOLERANCE); a mismatch is logged and
//! recorded but does not stop the run.

use chrono::Local;
use log::{info, warn};

use crate::dense::DenseMatrix;
use crate::error::{validation_error, Result};
use crate::matmul::{self, LoopOrder, Strategy};
use crate::parallel::RowKernel;
use crate::sparse::CsrMatrix;
use crate::VERIFY_TOLERANCE;

pub mod config;
pub mod record;
pub mod stats;

pub use config::{BenchConfig, Suite};
pub use record::{write_csv, ResultRow, CSV_HEADER};
pub use stats::{time_repeated, Timing};

const BASELINE: Strategy = Strategy::Naive(LoopOrder::Ikj);

/// Runs every suite selected by `config` and returns the collected rows.
pub fn run(config: &BenchConfig) -> Result<Vec<ResultRow>> {
    validate(config)?;

    let mut rows = Vec::new();

    if config.suite.includes(Suite::Dense) {
        for &n in &config.sizes {
            rows.extend(run_dense(config, n)?);
        }
    }

    if config.suite.includes(Suite::Parallel) {
        let thread_options = config.thread_options();
        info!("parallel suite thread options: {thread_options:?}");
        for &n in &config.sizes {
            rows.extend(run_parallel(config, n, &thread_options)?);
        }
    }

    if config.suite.includes(Suite::Sparse) {
        for &density in &config.densities {
            for &n in &config.sizes {
                rows.extend(run_sparse(config, n, density)?);
            }
        }
    }

    Ok(rows)
}

fn validate(config: &BenchConfig) -> Result<()> {
    if config.sizes.iter().any(|&n| n == 0) {
        return Err(validation_error("matrix sizes must be positive"));
    }
    if config.block_size == 0 {
        return Err(validation_error("block size must be positive"));
    }
    if let Some(d) = config.densities.iter().find(|d| !(0.0..=1.0).contains(*d)) {
        return Err(validation_error(format!("density {d} is outside [0, 1]")));
    }
    if config.thread_options().iter().any(|&t| t == 0) {
        return Err(validation_error("thread counts must be positive"));
    }
    Ok(())
}

/// Inputs and the naive reference result for one configuration.
struct Baseline {
    a: DenseMatrix,
    b: DenseMatrix,
    expected: DenseMatrix,
    timing: Timing,
}

impl Baseline {
    fn new(config: &BenchConfig, a: DenseMatrix, b: DenseMatrix) -> Result<Self> {
        let mut expected = DenseMatrix::new(a.n())?;
        let timing = time_repeated(config.repetitions, || {
            matmul::multiply(&a, &b, &mut expected, BASELINE)
        })?;

        Ok(Baseline {
            a,
            b,
            expected,
            timing,
        })
    }

    fn n(&self) -> usize {
        self.a.n()
    }

    /// Compares `c` with the naive result when `n` is small enough.
    fn verify(&self, config: &BenchConfig, label: &str, c: &DenseMatrix) -> Option<bool> {
        if self.n() > config.verify_limit {
            return None;
        }

        let ok = c.approx_eq(&self.expected, VERIFY_TOLERANCE);
        if !ok {
            warn!(
                "{label} differs from the naive result for n={} (max diff {:?})",
                self.n(),
                c.max_abs_diff(&self.expected)
            );
        }
        Some(ok)
    }
}

struct RowTemplate {
    suite: &'static str,
    n: usize,
    density: f64,
}

impl RowTemplate {
    fn row(
        &self,
        strategy: String,
        threads: usize,
        timing: Timing,
        baseline: &Timing,
        nnz_density: Option<f64>,
        verified: Option<bool>,
    ) -> ResultRow {
        let speedup = timing.speedup_over(baseline);
        ResultRow {
            timestamp: Local::now(),
            suite: self.suite,
            n: self.n,
            density: self.density,
            nnz_density,
            threads,
            strategy,
            timing,
            speedup,
            efficiency: speedup / threads as f64,
            verified,
        }
    }
}

fn time_strategy(
    config: &BenchConfig,
    base: &Baseline,
    strategy: Strategy,
) -> Result<(Timing, Option<bool>)> {
    let mut c = DenseMatrix::new(base.n())?;
    let timing = time_repeated(config.repetitions, || {
        matmul::multiply(&base.a, &base.b, &mut c, strategy)
    })?;
    let verified = base.verify(config, &strategy.to_string(), &c);
    Ok((timing, verified))
}

/// Naive loop orders, blocked, SIMD and rayon row-parallel on one size.
fn run_dense(config: &BenchConfig, n: usize) -> Result<Vec<ResultRow>> {
    info!("dense suite: n={n}");

    let a = DenseMatrix::random(n, config.seed)?;
    let b = DenseMatrix::random(n, config.seed.wrapping_add(1))?;
    let base = Baseline::new(config, a, b)?;
    let template = RowTemplate {
        suite: "dense",
        n,
        density: 1.0,
    };

    let strategies = [
        Strategy::Naive(LoopOrder::Ijk),
        Strategy::Naive(LoopOrder::Jik),
        Strategy::Blocked {
            block_size: config.block_size,
        },
        Strategy::Simd,
        Strategy::RayonRows,
    ];

    let mut rows = vec![template.row(
        BASELINE.to_string(),
        1,
        base.timing,
        &base.timing,
        None,
        Some(true),
    )];

    for strategy in strategies {
        let (timing, verified) = time_strategy(config, &base, strategy)?;
        let threads = match strategy {
            Strategy::RayonRows => rayon::current_num_threads(),
            _ => 1,
        };
        rows.push(template.row(
            strategy.to_string(),
            threads,
            timing,
            &base.timing,
            None,
            verified,
        ));
    }

    Ok(rows)
}

/// Plain and SIMD fixed-partition kernels for every thread count.
fn run_parallel(config: &BenchConfig, n: usize, thread_options: &[usize]) -> Result<Vec<ResultRow>> {
    info!("parallel suite: n={n}");

    let a = DenseMatrix::random(n, config.seed)?;
    let b = DenseMatrix::random(n, config.seed.wrapping_add(1))?;
    let base = Baseline::new(config, a, b)?;
    let template = RowTemplate {
        suite: "parallel",
        n,
        density: 1.0,
    };

    let mut rows = Vec::new();
    for &threads in thread_options {
        for kernel in [RowKernel::Plain, RowKernel::Simd] {
            let strategy = Strategy::Parallel { threads, kernel };
            let (timing, verified) = time_strategy(config, &base, strategy)?;
            rows.push(template.row(
                strategy.to_string(),
                threads,
                timing,
                &base.timing,
                None,
                verified,
            ));
        }
    }

    Ok(rows)
}

/// Dense baseline, blocked and CSR multiplication on inputs of one density.
fn run_sparse(config: &BenchConfig, n: usize, density: f64) -> Result<Vec<ResultRow>> {
    info!("sparse suite: n={n}, density={density}");

    let a = DenseMatrix::random_with_density(n, density, config.seed)?;
    let b = DenseMatrix::random_with_density(n, density, config.seed.wrapping_add(1))?;
    let base = Baseline::new(config, a, b)?;
    let template = RowTemplate {
        suite: "sparse",
        n,
        density,
    };

    let blocked = Strategy::Blocked {
        block_size: config.block_size,
    };
    let (blocked_timing, blocked_verified) = time_strategy(config, &base, blocked)?;

    let mut csr = None;
    let convert_timing = time_repeated(config.repetitions, || {
        csr = Some(CsrMatrix::from_dense(&base.a, config.csr_tolerance)?);
        Ok(())
    })?;
    let csr = csr.ok_or_else(|| validation_error("CSR conversion produced no matrix"))?;
    let nnz_density = Some(csr.density());

    let mut c = DenseMatrix::new(n)?;
    let csr_timing = time_repeated(config.repetitions, || csr.matmul_dense(&base.b, &mut c))?;
    let csr_verified = base.verify(config, "csr_matmul", &c);

    let par_timing = time_repeated(config.repetitions, || csr.par_matmul_dense(&base.b, &mut c))?;
    let par_verified = base.verify(config, "csr_par_matmul", &c);

    Ok(vec![
        template.row(
            BASELINE.to_string(),
            1,
            base.timing,
            &base.timing,
            nnz_density,
            Some(true),
        ),
        template.row(
            blocked.to_string(),
            1,
            blocked_timing,
            &base.timing,
            nnz_density,
            blocked_verified,
        ),
        template.row(
            "csr_convert".to_string(),
            1,
            convert_timing,
            &base.timing,
            nnz_density,
            None,
        ),
        template.row(
            "csr_matmul".to_string(),
            1,
            csr_timing,
            &base.timing,
            nnz_density,
            csr_verified,
        ),
        template.row(
            "csr_par_matmul".to_string(),
            rayon::current_num_threads(),
            par_timing,
            &base.timing,
            nnz_density,
            par_verified,
        ),
    ])
}
