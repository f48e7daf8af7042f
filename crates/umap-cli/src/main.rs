//! CLI for the UMAP dimensionality-reduction engine.
//!
//! Subcommands:
//!  - `fit` : embed a CSV dataset and optionally persist the fitted model.
//!  - `transform` : project new CSV rows through a previously saved model.
//!
//! Design goals:
//!  - Small, testable, and clear CLI surface.
//!  - Use the library crate (`umap`) for all numerical work.
//!  - Prefer `anyhow::Result` for application-level error handling.
//!
//! Usage examples:
//!  cargo run -p umap-cli -- fit --input data.csv --output embedding.csv \
//!      --model model.json --n-neighbors 15 --init random
//!  cargo run -p umap-cli -- transform --model model.json --input new.csv \
//!      --output projected.csv

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ndarray::Array2;

use umap::{
    load_model_json, save_model_json, Initialization, Metric, Umap, UmapConfig,
};

/// CLI entrypoint.
#[derive(Parser)]
#[command(
    name = "umap",
    about = "UMAP — embed high-dimensional CSV data into 2 or 3 dimensions",
    version
)]
struct Cli {
    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit an embedding from a CSV dataset.
    Fit(FitArgs),

    /// Project new points through a saved model.
    Transform(TransformArgs),
}

/// Arguments for the `fit` subcommand.
#[derive(Args, Debug)]
struct FitArgs {
    /// Path to the input CSV (one row per point, numeric columns).
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Path to write the embedding CSV to.
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,

    /// Path to write the fitted model JSON to (optional).
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// Optional CSV of one numeric target per row for supervised fitting.
    #[arg(long, value_name = "PATH")]
    labels: Option<PathBuf>,

    /// Neighborhood size.
    #[arg(long, default_value_t = 15)]
    n_neighbors: usize,

    /// Embedding dimension.
    #[arg(long, default_value_t = 2)]
    n_components: usize,

    /// Override the epoch schedule.
    #[arg(long)]
    n_epochs: Option<usize>,

    /// Distance metric name (euclidean, manhattan, chebyshev, cosine,
    /// correlation, hamming, jaccard, precomputed).
    #[arg(long, default_value = "euclidean")]
    metric: String,

    /// Minimum separation of embedded points.
    #[arg(long, default_value_t = 0.1)]
    min_dist: f32,

    /// Kernel spread.
    #[arg(long, default_value_t = 1.0)]
    spread: f32,

    /// Initial SGD learning rate.
    #[arg(long, default_value_t = 1.0)]
    learning_rate: f32,

    /// Repulsion strength applied to negative samples.
    #[arg(long, default_value_t = 1.0)]
    repulsion_strength: f32,

    /// Fuzzy union/intersection mix ratio.
    #[arg(long, default_value_t = 1.0)]
    set_op_mix_ratio: f32,

    /// Assumed perfectly-connected neighbor count.
    #[arg(long, default_value_t = 1)]
    local_connectivity: usize,

    /// Negative samples per positive SGD update.
    #[arg(long, default_value_t = 5)]
    negative_sample_rate: usize,

    /// Embedding initialization: spectral | random.
    #[arg(long, default_value = "spectral")]
    init: String,

    /// Force angular splits in the random-projection forest.
    #[arg(long)]
    angular: bool,

    /// Seed for every stochastic choice.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Skip the first CSV line as a header.
    #[arg(long)]
    has_header: bool,

    /// Emit progress logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Arguments for the `transform` subcommand.
#[derive(Args, Debug)]
struct TransformArgs {
    /// Path to a model JSON written by `fit --model`.
    #[arg(short, long, value_name = "PATH")]
    model: PathBuf,

    /// Path to the CSV of new points.
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Path to write the projected CSV to.
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,

    /// Skip the first CSV line as a header.
    #[arg(long)]
    has_header: bool,

    /// Emit progress logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Fit(args) => {
            init_logging(args.verbose);
            run_fit(args)
        }
        Commands::Transform(args) => {
            init_logging(args.verbose);
            run_transform(args)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run_fit(args: FitArgs) -> Result<()> {
    let data = read_csv_matrix(&args.input, args.has_header)
        .with_context(|| format!("reading dataset {}", args.input.display()))?;
    let labels = match &args.labels {
        Some(path) => Some(
            read_csv_column(path, args.has_header)
                .with_context(|| format!("reading labels {}", path.display()))?,
        ),
        None => None,
    };

    let init = match args.init.as_str() {
        "spectral" => Initialization::Spectral,
        "random" => Initialization::Random,
        other => bail!("unknown init `{other}` (expected `spectral` or `random`)"),
    };
    let config = UmapConfig {
        n_neighbors: args.n_neighbors,
        n_components: args.n_components,
        n_epochs: args.n_epochs,
        metric: Metric::from_name(&args.metric)?,
        learning_rate: args.learning_rate,
        repulsion_strength: args.repulsion_strength,
        min_dist: args.min_dist,
        spread: args.spread,
        set_op_mix_ratio: args.set_op_mix_ratio,
        local_connectivity: args.local_connectivity,
        negative_sample_rate: args.negative_sample_rate,
        init,
        angular_rp_forest: args.angular,
        random_seed: args.seed,
        verbose: args.verbose,
        ..UmapConfig::default()
    };

    let umap = Umap::new(config)?;

    #[cfg(feature = "progress")]
    let spinner = make_spinner(format!(
        "fitting {} points into {} dimensions",
        data.nrows(),
        args.n_components
    ));

    let model = umap.fit(&data, labels.as_deref()).context("fitting UMAP")?;

    #[cfg(feature = "progress")]
    spinner.finish_with_message("fit complete");

    write_csv_matrix(&args.output, model.embedding())
        .with_context(|| format!("writing embedding {}", args.output.display()))?;
    if let Some(path) = &args.model {
        save_model_json(&model, path)
            .with_context(|| format!("writing model {}", path.display()))?;
    }
    eprintln!(
        "embedded {} points -> {}",
        data.nrows(),
        args.output.display()
    );
    Ok(())
}

fn run_transform(args: TransformArgs) -> Result<()> {
    let model = load_model_json(&args.model)
        .with_context(|| format!("loading model {}", args.model.display()))?;
    let data = read_csv_matrix(&args.input, args.has_header)
        .with_context(|| format!("reading dataset {}", args.input.display()))?;

    #[cfg(feature = "progress")]
    let spinner = make_spinner(format!("projecting {} points", data.nrows()));

    let projected = model.transform(&data).context("projecting new points")?;

    #[cfg(feature = "progress")]
    spinner.finish_with_message("projection complete");

    write_csv_matrix(&args.output, &projected)
        .with_context(|| format!("writing embedding {}", args.output.display()))?;
    eprintln!(
        "projected {} points -> {}",
        data.nrows(),
        args.output.display()
    );
    Ok(())
}

#[cfg(feature = "progress")]
fn make_spinner(message: String) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

/// Read a CSV file into a dense `f32` matrix. Every row must have the same
/// number of numeric fields.
fn read_csv_matrix(path: &Path, has_header: bool) -> Result<Array2<f32>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut values: Vec<f32> = Vec::new();
    let mut n_cols: Option<usize> = None;
    let mut n_rows = 0usize;
    for record in reader.records() {
        let record = record?;
        match n_cols {
            Some(c) if c != record.len() => {
                bail!("row {} has {} fields, expected {c}", n_rows + 1, record.len())
            }
            None => n_cols = Some(record.len()),
            _ => {}
        }
        for field in record.iter() {
            values.push(
                field
                    .parse::<f32>()
                    .with_context(|| format!("parsing `{field}` in row {}", n_rows + 1))?,
            );
        }
        n_rows += 1;
    }
    let n_cols = n_cols.unwrap_or(0);
    if n_rows == 0 || n_cols == 0 {
        bail!("dataset is empty");
    }
    Ok(Array2::from_shape_vec((n_rows, n_cols), values).expect("rectangular CSV"))
}

/// Read a single-column CSV of numeric targets.
fn read_csv_column(path: &Path, has_header: bool) -> Result<Vec<f32>> {
    let matrix = read_csv_matrix(path, has_header)?;
    if matrix.ncols() != 1 {
        bail!("label file must have exactly one column, got {}", matrix.ncols());
    }
    Ok(matrix.column(0).to_vec())
}

/// Write a matrix as plain CSV, one row per line.
fn write_csv_matrix(path: &Path, matrix: &Array2<f32>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in matrix.rows() {
        let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writer.write_record(&fields)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join("umap_cli_csv_round_trip.csv");
        let matrix =
            Array2::from_shape_vec((2, 3), vec![1.0_f32, 2.0, 3.0, 4.0, 5.5, -6.0]).unwrap();
        write_csv_matrix(&path, &matrix).expect("write");
        let back = read_csv_matrix(&path, false).expect("read");
        std::fs::remove_file(&path).ok();
        assert_eq!(back, matrix);
    }

    #[test]
    fn test_ragged_csv_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join("umap_cli_ragged.csv");
        std::fs::write(&path, "1,2,3\n4,5\n").expect("write");
        let result = read_csv_matrix(&path, false);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
