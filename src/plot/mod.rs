//! PNG diagnostics rendered with Plotters.
//!
//! Plots are a passive sink: nothing here feeds back into model selection.
//! Text is drawn with the bundled DejaVu Sans (registered once for the
//! `sans-serif` family) so rendering does not depend on system fonts.
//!
//! Font: DejaVu Sans, Copyright 2003 by Bitstream, Inc. (Bitstream Vera license).

use std::error::Error;
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;

use plotters::prelude::*;
use plotters::style::FontStyle;

use crate::domain::MetricsRecord;
use crate::error::AppError;
use crate::fit::residuals;

const FONT_BYTES: &[u8] = include_bytes!("DejaVuSans.ttf");

/// Output image size in pixels.
pub const PLOT_SIZE: (u32, u32) = (1000, 600);

const CAPTION_FONT: (&str, u32) = ("sans-serif", 24);
const LABEL_FONT: (&str, u32) = ("sans-serif", 16);

type DrawResult = Result<(), Box<dyn Error>>;

/// Training and validation MAE per degree, one line each.
pub fn plot_degree_vs_mae(records: &[MetricsRecord], path: &Path) -> Result<(), AppError> {
    register_font()?;
    draw_degree_vs_mae(records, path).map_err(|e| render_error(path, e))
}

/// Scatter of actual (x) against predicted (y) with the `y = x` reference.
pub fn plot_predictions_vs_actual(y_true: &[f64], y_pred: &[f64], degree: u32, path: &Path) -> Result<(), AppError> {
    check_pairs(y_true, y_pred)?;
    register_font()?;
    draw_predictions_vs_actual(y_true, y_pred, degree, path).map_err(|e| render_error(path, e))
}

/// Scatter of predicted (x) against residual `actual - predicted` (y).
pub fn plot_residuals(y_true: &[f64], y_pred: &[f64], degree: u32, path: &Path) -> Result<(), AppError> {
    check_pairs(y_true, y_pred)?;
    register_font()?;
    draw_residuals(y_true, y_pred, degree, path).map_err(|e| render_error(path, e))
}

fn draw_degree_vs_mae(records: &[MetricsRecord], path: &Path) -> DrawResult {
    let train: Vec<(f64, f64)> = records.iter().map(|r| (r.degree as f64, r.train_mae)).collect();
    let val: Vec<(f64, f64)> = records.iter().map(|r| (r.degree as f64, r.val_mae)).collect();

    let x_range = padded_range(train.iter().map(|p| p.0));
    let y_range = padded_range(train.iter().chain(&val).map(|p| p.1));

    let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Polynomial Degree vs MAE", CAPTION_FONT)
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Polynomial Degree")
        .y_desc("Mean Absolute Error")
        .label_style(LABEL_FONT)
        .draw()?;

    for (points, color, label) in [(&train, BLUE, "Training MAE"), (&val, RED, "Validation MAE")] {
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .label_font(LABEL_FONT)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_predictions_vs_actual(y_true: &[f64], y_pred: &[f64], degree: u32, path: &Path) -> DrawResult {
    let x_range = padded_range(y_true.iter().copied());
    let y_range = padded_range(y_pred.iter().copied());
    let (lo, hi) = min_max(y_true.iter().copied()).unwrap_or((0.0, 1.0));

    let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Actual vs Predicted Distance (Degree {degree})"), CAPTION_FONT)
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Actual Distance")
        .y_desc("Predicted Distance")
        .label_style(LABEL_FONT)
        .draw()?;

    chart.draw_series(
        y_true
            .iter()
            .zip(y_pred)
            .map(|(&t, &p)| Circle::new((t, p), 3, BLUE.mix(0.5).filled())),
    )?;
    chart.draw_series(LineSeries::new(vec![(lo, lo), (hi, hi)], RED.stroke_width(2)))?;

    root.present()?;
    Ok(())
}

fn draw_residuals(y_true: &[f64], y_pred: &[f64], degree: u32, path: &Path) -> DrawResult {
    let res = residuals(y_true, y_pred);
    let x_range = padded_range(y_pred.iter().copied());
    let y_range = padded_range(res.iter().copied().chain(std::iter::once(0.0)));
    let (x_lo, x_hi) = (x_range.start, x_range.end);

    let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Residual Plot (Degree {degree})"), CAPTION_FONT)
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Predicted Distance")
        .y_desc("Residuals")
        .label_style(LABEL_FONT)
        .draw()?;

    chart.draw_series(
        y_pred
            .iter()
            .zip(&res)
            .map(|(&p, &r)| Circle::new((p, r), 3, BLUE.mix(0.5).filled())),
    )?;
    chart.draw_series(LineSeries::new(vec![(x_lo, 0.0), (x_hi, 0.0)], RED.stroke_width(2)))?;

    root.present()?;
    Ok(())
}

fn register_font() -> Result<(), AppError> {
    static FONT: OnceLock<Result<(), String>> = OnceLock::new();
    FONT.get_or_init(|| {
        plotters::style::register_font("sans-serif", FontStyle::Normal, FONT_BYTES)
            .map_err(|_| "Bundled plot font could not be loaded.".to_string())
    })
    .clone()
    .map_err(AppError::persistence)
}

fn check_pairs(y_true: &[f64], y_pred: &[f64]) -> Result<(), AppError> {
    if y_true.len() != y_pred.len() {
        return Err(AppError::shape(format!(
            "Cannot plot {} predictions against {} targets.",
            y_pred.len(),
            y_true.len()
        )));
    }
    Ok(())
}

fn render_error(path: &Path, err: Box<dyn Error>) -> AppError {
    AppError::persistence(format!("Failed to render plot '{}': {err}", path.display()))
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Finite min..max widened by 5% on each side; never empty.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let Some((lo, hi)) = min_max(values) else {
        return 0.0..1.0;
    };
    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.05 } else { lo.abs().max(1.0) * 0.05 };
    (lo - pad)..(hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_range_handles_degenerate_input() {
        let r = padded_range([3.0, 3.0].into_iter());
        assert!(r.start < 3.0 && r.end > 3.0);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
        let r = padded_range([0.0, f64::NAN, 10.0].into_iter());
        assert_eq!(r, -0.5..10.5);
    }

    #[test]
    fn renders_all_three_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let y_true = [1.0, 2.0, 3.0, 4.5];
        let y_pred = [1.1, 1.8, 3.2, 4.4];
        let records = [
            MetricsRecord {
                degree: 1,
                train_mae: 0.5,
                train_rmse: 0.6,
                val_mae: 0.7,
                val_rmse: 0.8,
            },
            MetricsRecord {
                degree: 2,
                train_mae: 0.2,
                train_rmse: 0.3,
                val_mae: 0.4,
                val_rmse: 0.5,
            },
        ];

        let a = dir.path().join("degree_vs_mae.png");
        let b = dir.path().join("pred.png");
        let c = dir.path().join("res.png");
        plot_degree_vs_mae(&records, &a).unwrap();
        plot_predictions_vs_actual(&y_true, &y_pred, 2, &b).unwrap();
        plot_residuals(&y_true, &y_pred, 2, &c).unwrap();
        for path in [a, b, c] {
            assert!(std::fs::metadata(&path).unwrap().len() > 0, "{}", path.display());
        }
    }

    #[test]
    fn mismatched_series_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = plot_residuals(&[1.0], &[1.0, 2.0], 1, &dir.path().join("x.png")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Shape);
    }
}
