//! The sweep itself: load, fit every degree, summarize, re-plot the best.
//!
//! Failure semantics are fail-fast. Load, shape, fit, and persistence errors
//! abort the run; bundles already written stay on disk. The only tolerated
//! miss is a best bundle that cannot be located for the final re-plot.

use std::path::{Path, PathBuf};

use nalgebra::{DMatrix, DVector};

use crate::data::{subsample_prefix, train_test_split};
use crate::domain::{BestDegree, Dataset, Metrics, MetricsRecord};
use crate::error::AppError;
use crate::fit::{TrainedDegree, evaluate, train_polynomial};
use crate::io::{ModelBundle, SUMMARY_FILE_NAME, load_bundle, load_dataset, locate_best_bundle, save_bundle, write_mae_csv};
use crate::plot::{plot_degree_vs_mae, plot_predictions_vs_actual, plot_residuals};
use crate::sweep::{BestTracker, SweepContext};

pub const DEGREE_PLOT_FILE_NAME: &str = "degree_vs_mae.png";
pub const BEST_PREDICTIONS_FILE_NAME: &str = "validation_predictions_best_model.png";
pub const BEST_RESIDUALS_FILE_NAME: &str = "validation_residuals_best_model.png";

pub fn predictions_plot_name(degree: u32) -> String {
    format!("predictions_degree_{degree}.png")
}

pub fn residuals_plot_name(degree: u32) -> String {
    format!("residuals_degree_{degree}.png")
}

/// Training and validation data as used by every degree.
#[derive(Debug, Clone, PartialEq)]
pub struct Splits {
    /// Training rows after subsampling.
    pub train: Dataset,
    /// Training rows before subsampling.
    pub train_full_len: usize,
    pub validation: Dataset,
    /// True when both came from one file via the seeded split.
    pub shared_source: bool,
}

/// Progress notifications, in the order they occur.
#[derive(Debug, Clone, Copy)]
pub enum SweepEvent<'a> {
    Loaded(&'a Splits),
    DegreeEvaluated(&'a MetricsRecord),
    SummaryWritten(&'a Path),
    BestSelected(BestDegree),
    BestMissing(u32),
}

/// Final validation diagnostics for the best degree.
#[derive(Debug, Clone, PartialEq)]
pub struct BestReplot {
    pub degree: u32,
    pub bundle_path: PathBuf,
    /// Validation metrics recomputed from the reloaded bundle.
    pub metrics: Metrics,
    /// `(predictions, residuals)` PNG paths, when plotting is enabled.
    pub plots: Option<(PathBuf, PathBuf)>,
}

/// Everything a finished sweep produced.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub splits: Splits,
    pub records: Vec<MetricsRecord>,
    pub best: Option<BestDegree>,
    pub model_dir: PathBuf,
    pub result_dir: PathBuf,
    pub bundle_paths: Vec<PathBuf>,
    pub summary_csv: PathBuf,
    pub best_replot: Option<BestReplot>,
}

/// Run the sweep described by `ctx`, reporting progress through `on_event`.
pub fn run_sweep(ctx: &SweepContext, on_event: &mut dyn FnMut(SweepEvent<'_>)) -> Result<SweepOutcome, AppError> {
    ctx.validate()?;

    // Loading
    let splits = load_splits(ctx)?;
    on_event(SweepEvent::Loaded(&splits));

    let model_dir = ctx.model_dir();
    let result_dir = ctx.result_dir();
    ensure_dir(&model_dir)?;
    ensure_dir(&result_dir)?;
    tracing::info!(
        models = %model_dir.display(),
        results = %result_dir.display(),
        degrees = ctx.degrees.count(),
        "starting sweep"
    );

    let x_train = splits.train.feature_matrix();
    let y_train = splits.train.targets();
    let x_val = splits.validation.feature_matrix();
    let y_val = splits.validation.targets();

    // Fitting / Evaluating / Persisting
    let mut records = Vec::with_capacity(ctx.degrees.count());
    let mut bundle_paths = Vec::with_capacity(ctx.degrees.count());
    let mut tracker = BestTracker::new();

    for degree in ctx.degrees.iter() {
        let _span = tracing::info_span!("degree", degree).entered();

        let trained: TrainedDegree = train_polynomial(&x_train, &y_train, degree)?;
        let train_pred = trained.predict(&x_train)?;
        let val_pred = trained.predict(&x_val)?;

        let record = MetricsRecord::new(
            degree,
            evaluate(y_train.as_slice(), train_pred.as_slice())?,
            evaluate(y_val.as_slice(), val_pred.as_slice())?,
        );
        on_event(SweepEvent::DegreeEvaluated(&record));

        if ctx.plots {
            plot_predictions_vs_actual(
                y_train.as_slice(),
                train_pred.as_slice(),
                degree,
                &result_dir.join(predictions_plot_name(degree)),
            )?;
            plot_residuals(
                y_train.as_slice(),
                train_pred.as_slice(),
                degree,
                &result_dir.join(residuals_plot_name(degree)),
            )?;
        }

        let bundle = ModelBundle::new(&trained, &record, &splits.train);
        let path = save_bundle(&bundle, &model_dir)?;
        tracing::debug!(path = %path.display(), "saved bundle");
        bundle_paths.push(path);

        if tracker.observe(degree, record.val_mae) {
            tracing::debug!(val_mae = record.val_mae, "new best degree");
        }
        records.push(record);
    }

    // Summarizing
    let summary_csv = result_dir.join(SUMMARY_FILE_NAME);
    write_mae_csv(&summary_csv, &records)?;
    on_event(SweepEvent::SummaryWritten(&summary_csv));
    if ctx.plots {
        plot_degree_vs_mae(&records, &result_dir.join(DEGREE_PLOT_FILE_NAME))?;
    }

    // BestModelReplot
    let best = tracker.best();
    let mut best_replot = None;
    if let Some(best) = best {
        on_event(SweepEvent::BestSelected(best));
        best_replot = replot_best(&model_dir, &result_dir, &best, &x_val, &y_val, ctx.plots)?;
        if best_replot.is_none() {
            on_event(SweepEvent::BestMissing(best.degree));
        }
    } else {
        tracing::warn!("no degree produced a finite validation MAE; skipping best-model plots");
    }

    tracing::info!("sweep finished");
    Ok(SweepOutcome {
        splits,
        records,
        best,
        model_dir,
        result_dir,
        bundle_paths,
        summary_csv,
        best_replot,
    })
}

/// Load training and validation data.
///
/// One shared file is split with the context's seed and test size; two
/// distinct files are loaded independently. In both cases the training side
/// is then cut to its leading `train_ratio` share.
pub fn load_splits(ctx: &SweepContext) -> Result<Splits, AppError> {
    let shared_source = ctx.shares_source();
    let (train_full, validation) = if shared_source {
        tracing::info!(path = %ctx.train_path.display(), "train and validation share one file; splitting");
        let all = load_dataset(&ctx.train_path)?;
        train_test_split(&all, ctx.test_size, ctx.seed)?
    } else {
        let train = load_dataset(&ctx.train_path)?;
        let validation = load_dataset(&ctx.val_path)?;
        (train, validation)
    };

    let train = subsample_prefix(&train_full, ctx.train_ratio)?;
    Ok(Splits {
        train,
        train_full_len: train_full.len(),
        validation,
        shared_source,
    })
}

/// Reload the best degree's bundle and render validation diagnostics.
///
/// Returns `Ok(None)` when no bundle for `best.degree` exists in `model_dir`.
pub fn replot_best(
    model_dir: &Path,
    result_dir: &Path,
    best: &BestDegree,
    x_val: &DMatrix<f64>,
    y_val: &DVector<f64>,
    plots: bool,
) -> Result<Option<BestReplot>, AppError> {
    let Some(bundle_path) = locate_best_bundle(model_dir, best)? else {
        tracing::warn!(degree = best.degree, dir = %model_dir.display(), "best-model bundle not found; skipping final plots");
        return Ok(None);
    };

    let bundle = load_bundle(&bundle_path)?;
    let val_pred = bundle.predict(x_val)?;
    let metrics = evaluate(y_val.as_slice(), val_pred.as_slice())?;

    let plots = if plots {
        let predictions = result_dir.join(BEST_PREDICTIONS_FILE_NAME);
        let residuals = result_dir.join(BEST_RESIDUALS_FILE_NAME);
        plot_predictions_vs_actual(y_val.as_slice(), val_pred.as_slice(), bundle.degree, &predictions)?;
        plot_residuals(y_val.as_slice(), val_pred.as_slice(), bundle.degree, &residuals)?;
        Some((predictions, residuals))
    } else {
        None
    };

    Ok(Some(BestReplot {
        degree: bundle.degree,
        bundle_path,
        metrics,
        plots,
    }))
}

fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::persistence(format!("Failed to create directory '{}': {e}", dir.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SynthConfig, generate_dataset};
    use crate::domain::DegreeRange;
    use crate::io::{parse_bundle_degree, write_dataset_csv};

    fn write_synth(dir: &Path, name: &str, rows: usize, seed: u64) -> PathBuf {
        let path = dir.join(name);
        let data = generate_dataset(&SynthConfig { rows, seed, noise: 0.5 }).unwrap();
        write_dataset_csv(&path, &data).unwrap();
        path
    }

    fn context(root: &Path, train: &Path, val: &Path, max_degree: u32) -> SweepContext {
        SweepContext {
            degrees: DegreeRange::new(1, max_degree).unwrap(),
            models_root: root.join("models"),
            results_root: root.join("results"),
            run_id: "20250101_000000".to_string(),
            ..SweepContext::new(train, val)
        }
    }

    #[test]
    fn three_degree_sweep_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let train = write_synth(dir.path(), "train.csv", 100, 1);
        let val = write_synth(dir.path(), "val.csv", 100, 2);
        let ctx = context(dir.path(), &train, &val, 3);

        let mut evaluated = Vec::new();
        let outcome = run_sweep(&ctx, &mut |event| {
            if let SweepEvent::DegreeEvaluated(r) = event {
                evaluated.push(r.degree);
            }
        })
        .unwrap();

        assert_eq!(evaluated, vec![1, 2, 3]);
        assert_eq!(outcome.records.iter().map(|r| r.degree).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(outcome.splits.train.len(), 100);
        assert_eq!(outcome.splits.validation.len(), 100);
        assert!(!outcome.splits.shared_source);

        let mut degrees: Vec<u32> = std::fs::read_dir(&outcome.model_dir)
            .unwrap()
            .map(|e| parse_bundle_degree(e.unwrap().file_name().to_str().unwrap()).unwrap())
            .collect();
        degrees.sort_unstable();
        assert_eq!(degrees, vec![1, 2, 3]);
        assert_eq!(outcome.bundle_paths.len(), 3);

        let csv = std::fs::read_to_string(&outcome.summary_csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "degree,val_mae");
        for (line, degree) in lines[1..].iter().zip(1..) {
            assert!(line.starts_with(&format!("{degree},")), "{line}");
        }

        let min_mae = outcome.records.iter().map(|r| r.val_mae).fold(f64::INFINITY, f64::min);
        let best = outcome.best.unwrap();
        assert_eq!(best.val_mae, min_mae);
        let first_min = outcome.records.iter().find(|r| r.val_mae == min_mae).unwrap();
        assert_eq!(best.degree, first_min.degree);

        let replot = outcome.best_replot.unwrap();
        assert_eq!(replot.degree, best.degree);
        assert_eq!(replot.metrics.mae.to_bits(), best.val_mae.to_bits());

        for degree in 1..=3 {
            assert!(outcome.result_dir.join(predictions_plot_name(degree)).exists());
            assert!(outcome.result_dir.join(residuals_plot_name(degree)).exists());
        }
        for name in [DEGREE_PLOT_FILE_NAME, BEST_PREDICTIONS_FILE_NAME, BEST_RESIDUALS_FILE_NAME] {
            assert!(outcome.result_dir.join(name).exists(), "{name}");
        }
    }

    #[test]
    fn half_ratio_trains_on_leading_half() {
        let dir = tempfile::tempdir().unwrap();
        let train = write_synth(dir.path(), "train.csv", 100, 3);
        let val = write_synth(dir.path(), "val.csv", 40, 4);
        let ctx = SweepContext {
            train_ratio: 0.5,
            ..context(dir.path(), &train, &val, 2)
        };

        let splits = load_splits(&ctx).unwrap();
        let full = load_dataset(&train).unwrap();
        assert_eq!(splits.train_full_len, 100);
        assert_eq!(splits.train, full.prefix(50));

        let outcome = run_sweep(&ctx, &mut |_| {}).unwrap();
        assert_eq!(outcome.splits.train.len(), 50);
        assert_eq!(outcome.records.len(), 2);
    }

    #[test]
    fn shared_file_is_split_seventy_thirty_reproducibly() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_synth(dir.path(), "all.csv", 100, 5);
        let ctx = SweepContext {
            plots: false,
            ..context(dir.path(), &data, &data, 4)
        };

        let a = load_splits(&ctx).unwrap();
        let b = load_splits(&ctx).unwrap();
        assert!(a.shared_source);
        assert_eq!(a.train.len(), 70);
        assert_eq!(a.validation.len(), 30);
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_runs_pick_identical_best() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_synth(dir.path(), "all.csv", 120, 6);
        let first = SweepContext {
            plots: false,
            run_id: "run_a".to_string(),
            ..context(dir.path(), &data, &data, 6)
        };
        let second = SweepContext {
            run_id: "run_b".to_string(),
            ..first.clone()
        };

        let a = run_sweep(&first, &mut |_| {}).unwrap();
        let b = run_sweep(&second, &mut |_| {}).unwrap();
        let (ba, bb) = (a.best.unwrap(), b.best.unwrap());
        assert_eq!(ba.degree, bb.degree);
        assert_eq!(ba.val_mae.to_bits(), bb.val_mae.to_bits());
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn missing_input_aborts_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let val = write_synth(dir.path(), "val.csv", 20, 7);
        let ctx = context(dir.path(), &dir.path().join("absent.csv"), &val, 2);

        let err = run_sweep(&ctx, &mut |_| {}).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Load);
        assert!(err.message().contains("absent.csv"));
        assert!(!ctx.model_dir().exists());
    }

    #[test]
    fn missing_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let train = dir.path().join("train.csv");
        std::fs::write(&train, "under_y,distance\n1,2\n").unwrap();
        let val = write_synth(dir.path(), "val.csv", 20, 8);
        let err = run_sweep(&context(dir.path(), &train, &val, 2), &mut |_| {}).unwrap_err();
        assert!(err.message().contains("`theta`"));
    }

    #[test]
    fn default_range_sweeps_twenty_degrees() {
        let dir = tempfile::tempdir().unwrap();
        let train = write_synth(dir.path(), "train.csv", 300, 9);
        let val = write_synth(dir.path(), "val.csv", 100, 10);
        let ctx = SweepContext {
            degrees: DegreeRange::default(),
            plots: false,
            ..context(dir.path(), &train, &val, 1)
        };

        let outcome = run_sweep(&ctx, &mut |_| {}).unwrap();
        let degrees: Vec<u32> = outcome.records.iter().map(|r| r.degree).collect();
        assert_eq!(degrees, (1..=20).collect::<Vec<_>>());

        let mut saved: Vec<u32> = std::fs::read_dir(&outcome.model_dir)
            .unwrap()
            .map(|e| parse_bundle_degree(e.unwrap().file_name().to_str().unwrap()).unwrap())
            .collect();
        saved.sort_unstable();
        assert_eq!(saved, (1..=20).collect::<Vec<_>>());
        assert!(outcome.best_replot.is_some());

        // Degrees 10..=19 share the `polynomial_degree1` prefix.
        let first = BestDegree {
            degree: 1,
            val_mae: outcome.records[0].val_mae,
        };
        let x_val = outcome.splits.validation.feature_matrix();
        let y_val = outcome.splits.validation.targets();
        let replot = replot_best(&outcome.model_dir, &outcome.result_dir, &first, &x_val, &y_val, false)
            .unwrap()
            .unwrap();
        assert_eq!(replot.degree, 1);
        assert_eq!(replot.bundle_path, outcome.bundle_paths[0]);
        assert!(replot.plots.is_none());
    }

    #[test]
    fn replot_ignores_stale_bundle_from_a_reused_run_dir() {
        let dir = tempfile::tempdir().unwrap();
        let train = write_synth(dir.path(), "train.csv", 80, 11);
        let val = write_synth(dir.path(), "val.csv", 40, 12);
        let ctx = SweepContext {
            plots: false,
            ..context(dir.path(), &train, &val, 2)
        };

        // Sorts ahead of any real MAE and is not a readable bundle.
        std::fs::create_dir_all(ctx.model_dir()).unwrap();
        std::fs::write(ctx.model_dir().join("polynomial_degree1_mae-1.00.json"), "{}").unwrap();
        std::fs::write(ctx.model_dir().join("polynomial_degree2_mae-1.00.json"), "{}").unwrap();

        let outcome = run_sweep(&ctx, &mut |_| {}).unwrap();
        let best = outcome.best.unwrap();
        let replot = outcome.best_replot.unwrap();
        assert_eq!(replot.degree, best.degree);
        assert_eq!(replot.bundle_path, outcome.bundle_paths[(best.degree - 1) as usize]);
        assert_eq!(replot.metrics.mae.to_bits(), best.val_mae.to_bits());
    }

    #[test]
    fn unwritable_models_root_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let train = write_synth(dir.path(), "train.csv", 30, 13);
        let val = write_synth(dir.path(), "val.csv", 20, 14);
        let blocker = dir.path().join("models_file");
        std::fs::write(&blocker, "not a directory").unwrap();
        let ctx = SweepContext {
            models_root: blocker,
            plots: false,
            ..context(dir.path(), &train, &val, 2)
        };

        let err = run_sweep(&ctx, &mut |_| {}).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Persistence);
        assert!(err.message().contains("models_file"));
    }

    #[test]
    fn replot_without_bundle_is_a_soft_miss() {
        let dir = tempfile::tempdir().unwrap();
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0]);
        let best = BestDegree { degree: 5, val_mae: 1.0 };
        let out = replot_best(dir.path(), dir.path(), &best, &x, &y, true).unwrap();
        assert!(out.is_none());
    }
}
