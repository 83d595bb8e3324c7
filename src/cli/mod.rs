//! Command-line parsing for the polynomial degree sweep.
//!
//! Argument parsing and command dispatch stay separate from the modeling
//! code: every `sweep` flag is turned into a [`SweepContext`] before anything
//! touches the file system.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::data::{DEFAULT_SPLIT_SEED, DEFAULT_TEST_SIZE};
use crate::domain::{DEFAULT_MAX_DEGREE, DEFAULT_MIN_DEGREE, DegreeRange};
use crate::error::AppError;
use crate::io::DEFAULT_C_STEM;
use crate::sweep::{DEFAULT_MODELS_ROOT, DEFAULT_RESULTS_ROOT, SweepContext, run_timestamp};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "polysweep",
    version,
    about = "Polynomial regression degree sweep for camera distance calibration"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every degree in the range, save one bundle per degree, and report the best.
    Sweep(SweepArgs),
    /// Predict a single distance from a saved bundle.
    Predict(PredictArgs),
    /// Generate a C header/source pair that evaluates a saved bundle.
    #[command(name = "export-c")]
    ExportC(ExportCArgs),
    /// Write a synthetic `under_y,theta,distance` CSV.
    Synth(SynthArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct SweepArgs {
    /// Training CSV (columns `under_y`, `theta`, `distance`).
    #[arg(long, env = "POLYSWEEP_TRAIN", value_name = "CSV")]
    pub train: PathBuf,

    /// Validation CSV. Passing the training file again triggers a seeded split.
    #[arg(long, env = "POLYSWEEP_VAL", value_name = "CSV")]
    pub val: PathBuf,

    /// Fraction of the training rows to use, taken from the front of the file.
    #[arg(long, env = "POLYSWEEP_TRAIN_RATIO", default_value_t = 1.0)]
    pub train_ratio: f64,

    #[arg(long, env = "POLYSWEEP_MIN_DEGREE", default_value_t = DEFAULT_MIN_DEGREE)]
    pub min_degree: u32,

    #[arg(long, env = "POLYSWEEP_MAX_DEGREE", default_value_t = DEFAULT_MAX_DEGREE)]
    pub max_degree: u32,

    /// Seed for the train/validation split of a shared file.
    #[arg(long, env = "POLYSWEEP_SEED", default_value_t = DEFAULT_SPLIT_SEED)]
    pub seed: u64,

    /// Validation share of a shared file.
    #[arg(long, env = "POLYSWEEP_TEST_SIZE", default_value_t = DEFAULT_TEST_SIZE)]
    pub test_size: f64,

    /// Root for per-run bundle directories.
    #[arg(long, env = "POLYSWEEP_MODELS_DIR", default_value = DEFAULT_MODELS_ROOT)]
    pub models_dir: PathBuf,

    /// Root for per-run CSV and plot directories.
    #[arg(long, env = "POLYSWEEP_RESULTS_DIR", default_value = DEFAULT_RESULTS_ROOT)]
    pub results_dir: PathBuf,

    /// Run directory name (defaults to a `YYYYMMDD_HHMMSS` timestamp).
    #[arg(long, env = "POLYSWEEP_RUN_ID")]
    pub run_id: Option<String>,

    /// Skip PNG rendering. The CSV and bundles are still written.
    #[arg(long, env = "POLYSWEEP_NO_PLOT")]
    pub no_plot: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    /// Bundle JSON written by `polysweep sweep`.
    #[arg(long, value_name = "JSON")]
    pub bundle: PathBuf,

    #[arg(long, allow_negative_numbers = true)]
    pub under_y: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub theta: f64,
}

#[derive(Debug, Parser, Clone)]
pub struct ExportCArgs {
    /// Bundle JSON written by `polysweep sweep`.
    #[arg(long, value_name = "JSON")]
    pub bundle: PathBuf,

    /// Directory receiving `<name>.h` and `<name>.c`.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// File stem for the generated pair.
    #[arg(long, default_value = DEFAULT_C_STEM)]
    pub name: String,
}

#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    #[arg(long, default_value_t = 1000)]
    pub rows: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Standard deviation of the noise added to `distance`.
    #[arg(long, default_value_t = 0.5)]
    pub noise: f64,

    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,
}

/// Convert parsed flags into the explicit sweep configuration.
pub fn sweep_context_from_args(args: &SweepArgs) -> Result<SweepContext, AppError> {
    let ctx = SweepContext {
        train_path: args.train.clone(),
        val_path: args.val.clone(),
        train_ratio: args.train_ratio,
        degrees: DegreeRange::new(args.min_degree, args.max_degree)?,
        seed: args.seed,
        test_size: args.test_size,
        models_root: args.models_dir.clone(),
        results_root: args.results_dir.clone(),
        run_id: args.run_id.clone().unwrap_or_else(run_timestamp),
        plots: !args.no_plot,
    };
    ctx.validate()?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("polysweep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn sweep_defaults() {
        let cli = parse(&["sweep", "--train", "a.csv", "--val", "b.csv", "--run-id", "r1"]);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        let ctx = sweep_context_from_args(&args).unwrap();
        assert_eq!(ctx.train_ratio, 1.0);
        assert_eq!((ctx.degrees.min(), ctx.degrees.max()), (1, 20));
        assert_eq!(ctx.seed, 42);
        assert_eq!(ctx.test_size, 0.3);
        assert_eq!(ctx.model_dir(), PathBuf::from("models").join("r1"));
        assert_eq!(ctx.result_dir(), PathBuf::from("results").join("r1"));
        assert!(ctx.plots);
    }

    #[test]
    fn invalid_sweep_values_are_config_errors() {
        let cli = parse(&["sweep", "--train", "a.csv", "--val", "b.csv", "--train-ratio", "1.5"]);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        let err = sweep_context_from_args(&args).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);

        let cli = parse(&["sweep", "--train", "a.csv", "--val", "b.csv", "--min-degree", "5", "--max-degree", "4"]);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        assert!(sweep_context_from_args(&args).is_err());

        let cli = parse(&["sweep", "--train", "a.csv", "--val", "b.csv", "--max-degree", "4294967295"]);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        let err = sweep_context_from_args(&args).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn predict_accepts_negative_angles() {
        let cli = parse(&["predict", "--bundle", "m.json", "--under-y", "120", "--theta", "-12.5"]);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.theta, -12.5);
        assert_eq!(args.under_y, 120.0);
    }

    #[test]
    fn export_c_default_stem() {
        let cli = parse(&["export-c", "--bundle", "m.json"]);
        let Command::ExportC(args) = cli.command else {
            panic!("expected export-c");
        };
        assert_eq!(args.name, "polynomial_model");
        assert_eq!(args.out_dir, PathBuf::from("."));
    }
}
