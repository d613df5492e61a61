//! spotpix CLI.
//!
//! Runs threshold search, clustering and centroiding over a JSON intensity grid.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use ndarray::Array2;
use spotpix_algorithms::{
    apply_threshold, cluster_pixels, generate_centroids, generate_threshold,
    sort_by_intensity_desc, window_exceedances, WindowPlacement,
};
use spotpix_core::Intensity;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] spotpix_core::Error),

    #[error("row {row} has {found} values, expected {expected}")]
    RaggedGrid {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("threshold {0} does not fit the grid element type")]
    InvalidThreshold(f64),

    #[error("value {value} at ({row}, {col}) does not fit the {dtype} element type")]
    ValueOutOfRange {
        row: usize,
        col: usize,
        value: f64,
        dtype: &'static str,
    },
}

/// Element type the grid is loaded as.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Dtype {
    /// 64-bit float
    F64,
    /// 64-bit signed integer
    I64,
    /// 16-bit unsigned integer (typical sensor counts)
    U16,
}

/// Exceedance clustering and centroiding for 2-D intensity grids.
#[derive(Parser)]
#[command(name = "spotpix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Element type of the grid
    #[arg(long, value_enum, global = true, default_value = "f64")]
    dtype: Dtype,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find centroids for a target exceedance rate
    Centroids {
        /// Input grid (JSON array of rows)
        input: PathBuf,

        /// Fraction of pixels that should exceed the threshold
        #[arg(short, long, default_value = "0.01")]
        rate: f64,

        /// Where to apply the border dilation: pre or post
        #[arg(short, long, value_parser = WindowPlacement::from_str, default_value = "post")]
        window: WindowPlacement,

        /// Dilation border width (pixels)
        #[arg(short, long, default_value = "0")]
        border: u8,

        /// Sort centroids brightest first
        #[arg(long)]
        sort: bool,
    },

    /// Print the threshold for a target exceedance rate
    Threshold {
        /// Input grid (JSON array of rows)
        input: PathBuf,

        /// Fraction of pixels that should exceed the threshold
        #[arg(short, long)]
        rate: f64,
    },

    /// Dump the clusters above a fixed threshold
    Clusters {
        /// Input grid (JSON array of rows)
        input: PathBuf,

        /// Intensity threshold (strictly greater exceeds)
        #[arg(short, long)]
        threshold: f64,

        /// Where to apply the border dilation: pre or post
        #[arg(short, long, value_parser = WindowPlacement::from_str, default_value = "post")]
        window: WindowPlacement,

        /// Dilation border width (pixels)
        #[arg(short, long, default_value = "0")]
        border: u8,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.dtype {
        Dtype::F64 => run::<f64>(&cli),
        Dtype::I64 => run::<i64>(&cli),
        Dtype::U16 => run::<u16>(&cli),
    }
}

fn run<T: Intensity>(cli: &Cli) -> Result<()> {
    let start = Instant::now();

    match &cli.command {
        Commands::Centroids {
            input,
            rate,
            window,
            border,
            sort,
        } => {
            let grid = load_grid::<T>(input)?;
            if cli.verbose {
                eprintln!("Grid: {} x {}", grid.nrows(), grid.ncols());
                eprintln!("Rate: {}", rate);
                eprintln!("Window: {}, border {}", window, border);
            }

            let mut centroids =
                generate_centroids(grid.view(), *rate, *window, *border)?;
            if *sort {
                sort_by_intensity_desc(&mut centroids);
            }
            for centroid in &centroids {
                println!("{}", centroid);
            }
            info!("{} centroids from {}", centroids.len(), input.display());
            if cli.verbose {
                eprintln!("{} centroids", centroids.len());
            }
        }

        Commands::Threshold { input, rate } => {
            let grid = load_grid::<T>(input)?;
            let threshold = generate_threshold(grid.view(), *rate)?;
            let mask = apply_threshold(grid.view(), threshold);
            let exceedances = mask.iter().filter(|&&flag| flag).count();

            println!("Threshold: {}", threshold);
            println!(
                "Exceedances: {} of {} ({:.4})",
                exceedances,
                grid.len(),
                exceedances as f64 / grid.len() as f64
            );
        }

        Commands::Clusters {
            input,
            threshold,
            window,
            border,
        } => {
            let grid = load_grid::<T>(input)?;
            let threshold = element_from_f64::<T>(*threshold)
                .ok_or(CliError::InvalidThreshold(*threshold))?;
            let mut mask = apply_threshold(grid.view(), threshold);

            let post_border = match window {
                WindowPlacement::Pre => {
                    mask = window_exceedances(mask.view(), *border);
                    0
                }
                WindowPlacement::Post => *border,
            };

            let clusters = cluster_pixels(grid.view(), mask.view(), post_border)?;
            for cluster in &clusters {
                println!(
                    "Cluster {}: {} pixels, intensity = {}, peak = {}, eod = {:.4}",
                    cluster.id(),
                    cluster.len(),
                    cluster.intensity(),
                    cluster.peak_intensity(),
                    cluster.eod()
                );
                print!("{}", cluster);
            }
            info!("{} clusters from {}", clusters.len(), input.display());
        }
    }

    if cli.verbose {
        eprintln!("Elapsed: {:.2?}", start.elapsed());
    }
    Ok(())
}

/// Reads a JSON array of equal-length rows into a grid.
fn load_grid<T: Intensity>(path: &Path) -> Result<Array2<T>> {
    let text = std::fs::read_to_string(path)?;
    let rows: Vec<Vec<f64>> = serde_json::from_str(&text)?;

    let ncols = rows.first().map_or(0, Vec::len);
    let mut values = Vec::with_capacity(rows.len() * ncols);
    for (row, line) in rows.iter().enumerate() {
        if line.len() != ncols {
            return Err(CliError::RaggedGrid {
                row,
                found: line.len(),
                expected: ncols,
            });
        }
        for (col, &value) in line.iter().enumerate() {
            let element = element_from_f64(value).ok_or(CliError::ValueOutOfRange {
                row,
                col,
                value,
                dtype: std::any::type_name::<T>(),
            })?;
            values.push(element);
        }
    }

    // Shape always matches the collected values
    Array2::from_shape_vec((rows.len(), ncols), values)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err).into())
}

/// Converts a JSON number into a grid element, rejecting values the
/// element type cannot hold exactly.
fn element_from_f64<T: Intensity>(value: f64) -> Option<T> {
    <T as num_traits::NumCast>::from(value).filter(|element: &T| element.as_f64() == value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_grid(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_grid() {
        let file = write_grid("[[0, 1, 2], [3, 4, 5]]");
        let grid = load_grid::<u16>(file.path()).unwrap();
        assert_eq!(grid.dim(), (2, 3));
        assert_eq!(grid[[1, 2]], 5);
    }

    #[test]
    fn test_load_grid_floats() {
        let file = write_grid("[[0.5, -1.25]]");
        let grid = load_grid::<f64>(file.path()).unwrap();
        assert!((grid[[0, 1]] + 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ragged_grid_rejected() {
        let file = write_grid("[[0, 1], [2]]");
        assert!(matches!(
            load_grid::<f64>(file.path()),
            Err(CliError::RaggedGrid {
                row: 1,
                found: 1,
                expected: 2
            })
        ));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let file = write_grid("[[-1, 2]]");
        assert!(matches!(
            load_grid::<u16>(file.path()),
            Err(CliError::ValueOutOfRange { row: 0, col: 0, .. })
        ));

        let file = write_grid("[[1.5]]");
        assert!(matches!(
            load_grid::<i64>(file.path()),
            Err(CliError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_grid("not json");
        assert!(matches!(load_grid::<f64>(file.path()), Err(CliError::Json(_))));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "spotpix", "--dtype", "u16", "centroids", "grid.json", "--rate", "0.05", "--window",
            "pre", "--border", "2", "--sort",
        ])
        .unwrap();
        assert!(matches!(cli.dtype, Dtype::U16));
        assert!(matches!(
            cli.command,
            Commands::Centroids {
                border: 2,
                sort: true,
                window: WindowPlacement::Pre,
                ..
            }
        ));
        let err = Cli::try_parse_from(["spotpix", "centroids", "g.json", "-w", "mid"])
            .err()
            .unwrap();
        assert!(err
            .to_string()
            .contains("unknown window placement 'mid', expected one of ['pre', 'post']"));

        let cli = Cli::try_parse_from(["spotpix", "clusters", "g.json", "-t", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Clusters {
                window: WindowPlacement::Post,
                ..
            }
        ));
    }
}
