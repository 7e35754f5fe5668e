//! `matbench`: times every multiplication kernel over a grid of sizes,
//! densities and thread counts and writes the results as CSV.
//!
//! ```text
//! RUST_LOG=info matbench --suite parallel --sizes 256,512,1024 --output results.csv
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use log::info;

use matbench::harness::{self, BenchConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = BenchConfig::parse();

    info!("SIMD backend: {}", matbench::simd::backend());

    let rows = harness::run(&config).context("benchmark run failed")?;

    match &config.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("couldn't create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            harness::write_csv(&rows, &mut writer)
                .and_then(|()| writer.flush())
                .with_context(|| format!("couldn't write {}", path.display()))?;
            info!("{} results saved to {}", rows.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            harness::write_csv(&rows, &mut lock).context("couldn't write results to stdout")?;
        }
    }

    Ok(())
}
