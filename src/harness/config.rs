//! Command-line configuration of a benchmark run.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread;

use clap::{Parser, ValueEnum};

use crate::{DEFAULT_BLOCK_SIZE, DEFAULT_CSR_TOLERANCE, DEFAULT_SEED};

/// Which group of kernels to benchmark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Suite {
    /// Naive loop orders, blocked, SIMD and rayon row-parallel kernels.
    Dense,
    /// Fixed-partition multi-threaded kernels across thread counts.
    Parallel,
    /// Dense versus CSR multiplication across densities.
    Sparse,
    /// Every suite above.
    All,
}

impl Suite {
    pub fn includes(self, other: Suite) -> bool {
        self == Suite::All || self == other
    }
}

#[derive(Parser, Clone, Debug)]
#[command(
    name = "matbench",
    about = "Benchmark naive, blocked, SIMD, multi-threaded and sparse matrix multiplication"
)]
pub struct BenchConfig {
    /// Kernel group to run.
    #[arg(long, value_enum, default_value_t = Suite::All)]
    pub suite: Suite,

    /// Matrix dimensions to benchmark.
    #[arg(long, value_delimiter = ',', default_values_t = vec![64, 128, 256, 512])]
    pub sizes: Vec<usize>,

    /// Densities for the sparse suite, each in [0, 1].
    #[arg(long, value_delimiter = ',', default_values_t = vec![1.0, 0.1, 0.01, 0.001])]
    pub densities: Vec<f64>,

    /// Worker counts for the parallel suite. Derived from the hardware when absent.
    #[arg(long, value_delimiter = ',')]
    pub threads: Option<Vec<usize>>,

    /// Tile edge of the blocked kernel.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// Seed of the matrix generator; equal seeds give equal matrices.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Timed runs per kernel and configuration.
    #[arg(long, default_value_t = 1)]
    pub repetitions: usize,

    /// Largest dimension whose results are cross-checked against the naive kernel.
    #[arg(long, default_value_t = 256)]
    pub verify_limit: usize,

    /// Entries with magnitude at or below this value are dropped when converting to CSR.
    #[arg(long, default_value_t = DEFAULT_CSR_TOLERANCE)]
    pub csr_tolerance: f64,

    /// Write CSV results to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            suite: Suite::All,
            sizes: vec![64, 128, 256, 512],
            densities: vec![1.0, 0.1, 0.01, 0.001],
            threads: None,
            block_size: DEFAULT_BLOCK_SIZE,
            seed: DEFAULT_SEED,
            repetitions: 1,
            verify_limit: 256,
            csr_tolerance: DEFAULT_CSR_TOLERANCE,
            output: None,
        }
    }
}

impl BenchConfig {
    /// Worker counts the parallel suite iterates over.
    pub fn thread_options(&self) -> Vec<usize> {
        match &self.threads {
            Some(threads) => threads.clone(),
            None => default_thread_options(
                thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(4),
            ),
        }
    }
}

/// `1`, half the hardware threads and all hardware threads, skipping
/// duplicates.
pub fn default_thread_options(hw_threads: usize) -> Vec<usize> {
    let hw_threads = hw_threads.max(1);
    let physical = (hw_threads / 2).max(1);

    let mut options = vec![1];
    if physical != 1 && physical != hw_threads {
        options.push(physical);
    }
    if hw_threads != 1 {
        options.push(hw_threads);
    }
    options
}
