//! Wall-clock timing and summary statistics.

use std::time::Instant;

use crate::error::{validation_error, Result};

/// Summary of repeated timings, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    pub mean_ms: f64,
    pub stdev_ms: f64,
    pub min_ms: f64,
    pub samples: usize,
}

impl Timing {
    /// Summarises a set of samples. The standard deviation is the sample
    /// (n - 1) estimate and is zero for a single sample.
    pub fn from_samples(samples: &[f64]) -> Result<Self> {
        if samples.is_empty() {
            return Err(validation_error("at least one timing sample is required"));
        }

        let count = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / count;
        let stdev = if samples.len() > 1 {
            let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (count - 1.0);
            var.sqrt()
        } else {
            0.0
        };
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);

        Ok(Timing {
            mean_ms: mean,
            stdev_ms: stdev,
            min_ms: min,
            samples: samples.len(),
        })
    }

    /// `baseline.mean / self.mean`; how many times faster than `baseline`.
    pub fn speedup_over(&self, baseline: &Timing) -> f64 {
        if self.mean_ms > 0.0 {
            baseline.mean_ms / self.mean_ms
        } else {
            f64::INFINITY
        }
    }
}

/// Runs `f` `repetitions` times (at least once) and summarises the elapsed
/// time of each run. Stops at the first error.
pub fn time_repeated<F>(repetitions: usize, mut f: F) -> Result<Timing>
where
    F: FnMut() -> Result<()>,
{
    let repetitions = repetitions.max(1);
    let mut samples = Vec::with_capacity(repetitions);

    for _ in 0..repetitions {
        let start = Instant::now();
        f()?;
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
    }

    Timing::from_samples(&samples)
}
