//! Benchmark result rows and their CSV form.

use std::io::{self, Write};

use chrono::{DateTime, Local};

use crate::harness::stats::Timing;

/// Column names, in the order [`ResultRow::write_csv`] emits them.
pub const CSV_HEADER: &str = "timestamp,suite,n,density,nnz_density,threads,strategy,\
mean_ms,stdev_ms,min_ms,samples,speedup,efficiency,verified";

/// One timed kernel under one configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
    pub timestamp: DateTime<Local>,
    pub suite: &'static str,
    pub n: usize,
    /// Requested fill density of the inputs.
    pub density: f64,
    /// Stored entries of the CSR operand over `n * n`, for sparse runs.
    pub nnz_density: Option<f64>,
    pub threads: usize,
    pub strategy: String,
    pub timing: Timing,
    /// Speedup over the naive i-k-j kernel on the same inputs.
    pub speedup: f64,
    /// `speedup / threads`.
    pub efficiency: f64,
    /// Outcome of the cross-check against the naive kernel, if one ran.
    pub verified: Option<bool>,
}

impl ResultRow {
    /// Writes the row as one CSV line, without a trailing header.
    pub fn write_csv<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        let nnz_density = self
            .nnz_density
            .map(|d| format!("{d:.6}"))
            .unwrap_or_default();
        let verified = self.verified.map(|v| v.to_string()).unwrap_or_default();

        writeln!(
            w,
            "{},{},{},{:.6},{},{},{},{:.4},{:.4},{:.4},{},{:.4},{:.4},{}",
            self.timestamp.to_rfc3339(),
            self.suite,
            self.n,
            self.density,
            nnz_density,
            self.threads,
            self.strategy,
            self.timing.mean_ms,
            self.timing.stdev_ms,
            self.timing.min_ms,
            self.timing.samples,
            self.speedup,
            self.efficiency,
            verified,
        )
    }
}

/// Writes the header followed by every row.
pub fn write_csv<W: Write + ?Sized>(rows: &[ResultRow], w: &mut W) -> io::Result<()> {
    writeln!(w, "{CSV_HEADER}")?;
    for row in rows {
        row.write_csv(w)?;
    }
    Ok(())
}
