//! ORTHOSET command-line entry point.
//!
//! Subcommands:
//! - `search`: exhaustive m×n orthogonal set search
//! - `network`: 2×2 search followed by D-node network composition
//! - `subsample`: random row subsamples of a matrix

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use orthoset::config;
use orthoset::data::subsample::subsample_many;
use orthoset::data::table::{read_matrix_csv, write_matrix_csv};
use orthoset::report::export::{save_network_csv, save_ranked_csv};
use orthoset::runtime::pipeline::{OrthoPipeline, PipelineReport};
use orthoset::search::config::SearchConfig;
use orthoset::search::scoring::Metric;

/// Orthogonal set finder.
#[derive(Parser, Debug)]
#[command(
    name = "orthoset",
    about = "Exhaustive orthogonal set search over labeled matrices",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank every m×n sub-selection by orthogonality.
    Search {
        #[command(flatten)]
        run: RunArgs,

        /// Rows (mutants) per selection.
        #[arg(short, default_value_t = config::DEFAULT_DIMENSION)]
        m: usize,

        /// Columns (compounds) per selection.
        #[arg(short, default_value_t = config::DEFAULT_DIMENSION)]
        n: usize,

        /// Scoring metric.
        #[arg(long, value_enum, default_value_t = MetricArg::Rms)]
        metric: MetricArg,

        /// Write each sub-matrix into the output table.
        #[arg(long)]
        embed_matrix: bool,
    },

    /// Compose D-node networks from a 2×2 search.
    Network {
        #[command(flatten)]
        run: RunArgs,

        /// Nodes per network.
        #[arg(short, long, default_value_t = config::DEFAULT_NETWORK_DIM)]
        dim: usize,

        /// Also write the pairwise table used to build the networks.
        #[arg(long)]
        pairs: Option<PathBuf>,
    },

    /// Write random row subsamples of a matrix.
    Subsample {
        /// Input matrix CSV.
        #[arg(short, long)]
        input: PathBuf,

        /// Output path; files are numbered OUT1.csv … OUTn.csv.
        #[arg(short, long)]
        output: PathBuf,

        /// Fraction of rows kept per subsample.
        #[arg(short, long, default_value_t = config::DEFAULT_SUBSAMPLE_FRACTION)]
        fraction: f64,

        /// Number of subsamples.
        #[arg(short = 'n', long, default_value_t = config::DEFAULT_SUBSAMPLE_COUNT)]
        count: usize,

        /// RNG seed for reproducible draws.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Options shared by `search` and `network`.
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Input matrix CSV.
    #[arg(short, long)]
    input: PathBuf,

    /// Output table CSV.
    #[arg(short, long)]
    output: PathBuf,

    /// Worker threads.
    #[arg(short = 'p', long, default_value_t = config::DEFAULT_WORKERS)]
    workers: usize,

    /// Drop results scoring at or above this.
    #[arg(short, long, default_value_t = config::DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Combinations held in memory per chunk.
    #[arg(short, long, default_value_t = config::DEFAULT_BUFFER_LEN)]
    buffer_len: usize,

    /// Rows in the output table.
    #[arg(short, long, default_value_t = config::DEFAULT_LIST_LEN)]
    list_len: usize,

    /// Values below this are raised to it before searching.
    #[arg(long, default_value_t = config::DEFAULT_FLOOR)]
    floor: f64,

    /// Save the full run report (bincode) here.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricArg {
    /// RMS deviation of the normalised Gram matrix from the identity.
    Rms,
    /// Condition number of the raw sub-matrix.
    Cond,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Rms => Metric::RmsIdentity,
            MetricArg::Cond => Metric::ConditionNumber,
        }
    }
}

impl RunArgs {
    fn config(
        &self,
        m: usize,
        n: usize,
        metric: Metric,
        network_dim: Option<usize>,
    ) -> SearchConfig {
        SearchConfig {
            m,
            n,
            workers: self.workers,
            threshold: self.threshold,
            buffer_len: self.buffer_len,
            list_len: self.list_len,
            network_dim,
            floor: self.floor,
            metric,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    tracing::info!("ORTHOSET v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Search {
            run,
            m,
            n,
            metric,
            embed_matrix,
        } => {
            let report = execute(&run, run.config(m, n, metric.into(), None))?;
            save_ranked_csv(&report.table, embed_matrix, &run.output)?;
        }
        Command::Network { run, dim, pairs } => {
            let report = execute(&run, run.config(2, 2, Metric::RmsIdentity, Some(dim)))?;
            if let Some(path) = &pairs {
                save_ranked_csv(&report.table, false, path)?;
            }
            let networks = report
                .networks
                .as_ref()
                .context("network stage produced no report")?;
            save_network_csv(&networks.table, &run.output)?;
        }
        Command::Subsample {
            input,
            output,
            fraction,
            count,
            seed,
        } => subsample(&input, &output, fraction, count, seed)?,
    }

    tracing::info!("Done.");
    Ok(())
}

fn execute(run: &RunArgs, config: SearchConfig) -> anyhow::Result<PipelineReport> {
    let matrix = read_matrix_csv(&run.input)?;
    let mut pipeline = OrthoPipeline::new(config);
    let report = pipeline.run(&matrix)?;

    let stats = &report.stats;
    tracing::info!(
        "{} of {} combinations kept ({:.2}%), {} degenerate",
        stats.survivors,
        stats.examined,
        stats.survival_rate() * 100.0,
        stats.degenerate,
    );
    for (stage, pct) in report.timings.breakdown() {
        tracing::debug!("  {:<10} {:5.1}%", stage, pct);
    }

    if let Some(path) = &run.report {
        report.save(path)?;
    }
    Ok(report)
}

fn subsample(
    input: &Path,
    output: &Path,
    fraction: f64,
    count: usize,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let matrix = read_matrix_csv(input)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let samples = subsample_many(&matrix, fraction, count, &mut rng)?;

    for (i, sample) in samples.iter().enumerate() {
        let path = numbered_path(output, i + 1);
        let file = File::create(&path)
            .with_context(|| format!("failed to create '{}'", path.display()))?;
        let mut out = BufWriter::new(file);
        write_matrix_csv(sample, &mut out)
            .with_context(|| format!("failed to write subsample '{}'", path.display()))?;
        out.flush()?;
        tracing::info!(
            "Wrote {}x{} subsample to {}",
            sample.nrows(),
            sample.ncols(),
            path.display()
        );
    }
    Ok(())
}

/// `out.csv` → `out3.csv`.
fn numbered_path(base: &Path, index: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}{index}"),
    };
    base.with_file_name(name)
}
