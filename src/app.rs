//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that loads `.env`,
//! installs the log subscriber, parses the CLI, and dispatches subcommands.

use clap::Parser;
use nalgebra::DMatrix;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ExportCArgs, PredictArgs, SweepArgs, SynthArgs, sweep_context_from_args};
use crate::data::{SynthConfig, generate_dataset};
use crate::error::AppError;
use crate::io::{load_bundle, write_c_model, write_dataset_csv};
use crate::report;
use crate::sweep::{SweepEvent, run_sweep};

/// Entry point for the `polysweep` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Sweep(args) => handle_sweep(&args),
        Command::Predict(args) => handle_predict(&args),
        Command::ExportC(args) => handle_export_c(&args),
        Command::Synth(args) => handle_synth(&args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_sweep(args: &SweepArgs) -> Result<(), AppError> {
    let ctx = sweep_context_from_args(args)?;
    let outcome = run_sweep(&ctx, &mut |event| match event {
        SweepEvent::Loaded(splits) => println!("{}\n", report::format_split_summary(splits)),
        SweepEvent::DegreeEvaluated(record) => println!("{}", report::format_degree_line(record)),
        SweepEvent::SummaryWritten(path) => println!("\n{}", report::format_summary_written(path)),
        SweepEvent::BestSelected(best) => println!("{}", report::format_best(&best)),
        SweepEvent::BestMissing(_) => {}
    })?;

    if let Some(best) = outcome.best {
        println!("{}", report::format_best_replot(outcome.best_replot.as_ref(), best.degree));
    }
    Ok(())
}

fn handle_predict(args: &PredictArgs) -> Result<(), AppError> {
    let bundle = load_bundle(&args.bundle)?;
    let x = DMatrix::from_row_slice(1, 2, &[args.under_y, args.theta]);
    let y = bundle.predict(&x)?;
    println!("{}", report::format_prediction(args.under_y, args.theta, bundle.degree, y[0]));
    Ok(())
}

fn handle_export_c(args: &ExportCArgs) -> Result<(), AppError> {
    let bundle = load_bundle(&args.bundle)?;
    let (header, source) = write_c_model(&bundle, &args.out_dir, &args.name)?;
    println!("Wrote {} and {}", header.display(), source.display());
    Ok(())
}

fn handle_synth(args: &SynthArgs) -> Result<(), AppError> {
    let data = generate_dataset(&SynthConfig {
        rows: args.rows,
        seed: args.seed,
        noise: args.noise,
    })?;
    write_dataset_csv(&args.out, &data)?;
    println!("Wrote {} rows to {}", data.len(), args.out.display());
    Ok(())
}
