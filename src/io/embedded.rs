//! C source export for microcontroller deployment.
//!
//! Renders a bundle as a self-contained `.h`/`.c` pair: the scaler and model
//! parameters become constant tables, and `predict_distance` reproduces the
//! Rust feature path (expansion in the same column order, standard scaling,
//! linear combination). The combination uses Kahan summation so high-degree
//! models keep double precision on FPUs without extended accumulators.
//!
//! Inputs outside the training range make `predict_distance` return `-1.0`.

use std::fmt::Write as _;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::io::bundle::ModelBundle;

pub const DEFAULT_C_STEM: &str = "polynomial_model";

/// Paired header and source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedSource {
    pub header: String,
    pub source: String,
}

/// Render `bundle` as C. `stem` names the files and the include guard.
pub fn render_c_model(bundle: &ModelBundle, stem: &str) -> Result<EmbeddedSource, AppError> {
    if !is_c_identifier(stem) {
        return Err(AppError::config(format!(
            "Output name '{stem}' must be a C identifier (letters, digits, '_')."
        )));
    }
    for name in &bundle.feature_names {
        if !is_c_identifier(name) {
            return Err(AppError::config(format!("Feature name '{name}' is not a C identifier.")));
        }
    }
    if bundle.input_min.len() != bundle.feature_names.len() || bundle.input_max.len() != bundle.feature_names.len() {
        return Err(AppError::shape("Bundle input ranges do not match its feature names."));
    }

    let expansion = bundle.expansion()?;
    let names = &bundle.feature_names;

    Ok(EmbeddedSource {
        header: render_header(bundle, stem)?,
        source: render_source(bundle, stem, names, expansion.exponents())?,
    })
}

/// Render and write `<stem>.h` and `<stem>.c` into `out_dir`.
pub fn write_c_model(bundle: &ModelBundle, out_dir: &Path, stem: &str) -> Result<(PathBuf, PathBuf), AppError> {
    let rendered = render_c_model(bundle, stem)?;
    create_dir_all(out_dir)
        .map_err(|e| AppError::persistence(format!("Failed to create output dir '{}': {e}", out_dir.display())))?;

    let header_path = out_dir.join(format!("{stem}.h"));
    let source_path = out_dir.join(format!("{stem}.c"));
    for (path, text) in [(&header_path, &rendered.header), (&source_path, &rendered.source)] {
        std::fs::write(path, text)
            .map_err(|e| AppError::persistence(format!("Failed to write '{}': {e}", path.display())))?;
    }
    Ok((header_path, source_path))
}

fn render_header(bundle: &ModelBundle, stem: &str) -> Result<String, AppError> {
    let guard = format!("{}_H", stem.to_ascii_uppercase());
    let args = bundle
        .feature_names
        .iter()
        .map(|n| format!("double {n}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::new();
    writeln!(out, "/*").map_err(fmt_error)?;
    writeln!(out, " * Polynomial regression model (degree {}).", bundle.degree).map_err(fmt_error)?;
    writeln!(out, " * Generated by polysweep from {}.", bundle.file_name()).map_err(fmt_error)?;
    writeln!(
        out,
        " * Training MAE: {:.6}, validation MAE: {:.6}",
        bundle.train_mae, bundle.val_mae
    ).map_err(fmt_error)?;
    writeln!(out, " */").map_err(fmt_error)?;
    writeln!(out, "#ifndef {guard}").map_err(fmt_error)?;
    writeln!(out, "#define {guard}\n").map_err(fmt_error)?;
    writeln!(out, "#include <stdbool.h>\n").map_err(fmt_error)?;
    writeln!(out, "#define POLY_DEGREE {}", bundle.degree).map_err(fmt_error)?;
    writeln!(out, "#define FEATURE_COUNT {}", bundle.model.n_features()).map_err(fmt_error)?;
    writeln!(out, "#define INPUT_FEATURES {}\n", bundle.feature_names.len()).map_err(fmt_error)?;
    for (j, name) in bundle.feature_names.iter().enumerate() {
        let upper = name.to_ascii_uppercase();
        writeln!(out, "#define {upper}_MIN {}", c_double(bundle.input_min[j])?).map_err(fmt_error)?;
        writeln!(out, "#define {upper}_MAX {}", c_double(bundle.input_max[j])?).map_err(fmt_error)?;
    }
    writeln!(out).map_err(fmt_error)?;
    writeln!(out, "bool validate_input_range({args});").map_err(fmt_error)?;
    writeln!(out, "void generate_polynomial_features({args}, double *features);").map_err(fmt_error)?;
    writeln!(out, "void apply_standard_scaling(double *features);").map_err(fmt_error)?;
    writeln!(out, "double compute_linear_combination(const double *features);").map_err(fmt_error)?;
    writeln!(out, "double predict_distance({args});\n").map_err(fmt_error)?;
    writeln!(out, "#endif /* {guard} */").map_err(fmt_error)?;
    Ok(out)
}

fn render_source(bundle: &ModelBundle, stem: &str, names: &[String], exponents: &[Vec<u32>]) -> Result<String, AppError> {
    let args = names.iter().map(|n| format!("double {n}")).collect::<Vec<_>>().join(", ");
    let call_args = names.join(", ");

    let mut out = String::new();
    writeln!(out, "#include \"{stem}.h\"\n").map_err(fmt_error)?;
    write_table(&mut out, "SCALER_MEAN", &bundle.scaler.mean)?;
    write_table(&mut out, "SCALER_SCALE", &bundle.scaler.scale)?;
    write_table(&mut out, "MODEL_COEFFICIENTS", &bundle.model.coefficients)?;
    writeln!(
        out,
        "static const double MODEL_INTERCEPT = {};\n",
        c_double(bundle.model.intercept)?
    ).map_err(fmt_error)?;

    writeln!(out, "bool validate_input_range({args}) {{").map_err(fmt_error)?;
    let checks = names
        .iter()
        .map(|n| {
            let upper = n.to_ascii_uppercase();
            format!("{n} >= {upper}_MIN && {n} <= {upper}_MAX")
        })
        .collect::<Vec<_>>()
        .join(" &&\n           ");
    writeln!(out, "    return {checks};").map_err(fmt_error)?;
    writeln!(out, "}}\n").map_err(fmt_error)?;

    writeln!(out, "void generate_polynomial_features({args}, double *features) {{").map_err(fmt_error)?;
    for n in names {
        writeln!(out, "    double {n}_powers[POLY_DEGREE + 1];").map_err(fmt_error)?;
    }
    for n in names {
        writeln!(out, "    {n}_powers[0] = 1.0;").map_err(fmt_error)?;
    }
    writeln!(out, "    for (int i = 1; i <= POLY_DEGREE; i++) {{").map_err(fmt_error)?;
    for n in names {
        writeln!(out, "        {n}_powers[i] = {n}_powers[i - 1] * {n};").map_err(fmt_error)?;
    }
    writeln!(out, "    }}").map_err(fmt_error)?;
    for (k, exps) in exponents.iter().enumerate() {
        let product = names
            .iter()
            .zip(exps)
            .map(|(n, e)| format!("{n}_powers[{e}]"))
            .collect::<Vec<_>>()
            .join(" * ");
        writeln!(out, "    features[{k}] = {product};").map_err(fmt_error)?;
    }
    writeln!(out, "}}\n").map_err(fmt_error)?;

    writeln!(out, "void apply_standard_scaling(double *features) {{").map_err(fmt_error)?;
    writeln!(out, "    for (int i = 0; i < FEATURE_COUNT; i++) {{").map_err(fmt_error)?;
    writeln!(out, "        features[i] = (features[i] - SCALER_MEAN[i]) / SCALER_SCALE[i];").map_err(fmt_error)?;
    writeln!(out, "    }}").map_err(fmt_error)?;
    writeln!(out, "}}\n").map_err(fmt_error)?;

    writeln!(out, "double compute_linear_combination(const double *features) {{").map_err(fmt_error)?;
    writeln!(out, "    double sum = MODEL_INTERCEPT;").map_err(fmt_error)?;
    writeln!(out, "    double c = 0.0;").map_err(fmt_error)?;
    writeln!(out, "    for (int i = 0; i < FEATURE_COUNT; i++) {{").map_err(fmt_error)?;
    writeln!(out, "        double y = MODEL_COEFFICIENTS[i] * features[i] - c;").map_err(fmt_error)?;
    writeln!(out, "        double t = sum + y;").map_err(fmt_error)?;
    writeln!(out, "        c = (t - sum) - y;").map_err(fmt_error)?;
    writeln!(out, "        sum = t;").map_err(fmt_error)?;
    writeln!(out, "    }}").map_err(fmt_error)?;
    writeln!(out, "    return sum;").map_err(fmt_error)?;
    writeln!(out, "}}\n").map_err(fmt_error)?;

    writeln!(out, "double predict_distance({args}) {{").map_err(fmt_error)?;
    writeln!(out, "    if (!validate_input_range({call_args})) {{").map_err(fmt_error)?;
    writeln!(out, "        return -1.0;").map_err(fmt_error)?;
    writeln!(out, "    }}").map_err(fmt_error)?;
    writeln!(out, "    double features[FEATURE_COUNT];").map_err(fmt_error)?;
    writeln!(out, "    generate_polynomial_features({call_args}, features);").map_err(fmt_error)?;
    writeln!(out, "    apply_standard_scaling(features);").map_err(fmt_error)?;
    writeln!(out, "    return compute_linear_combination(features);").map_err(fmt_error)?;
    writeln!(out, "}}").map_err(fmt_error)?;
    Ok(out)
}

fn write_table(out: &mut String, name: &str, values: &[f64]) -> Result<(), AppError> {
    writeln!(out, "static const double {name}[FEATURE_COUNT] = {{").map_err(fmt_error)?;
    for chunk in values.chunks(4) {
        let line = chunk.iter().map(|&v| c_double(v)).collect::<Result<Vec<_>, _>>()?.join(", ");
        writeln!(out, "    {line},").map_err(fmt_error)?;
    }
    writeln!(out, "}};\n").map_err(fmt_error)?;
    Ok(())
}

fn fmt_error(e: std::fmt::Error) -> AppError {
    AppError::persistence(format!("Failed to format C source: {e}"))
}

/// Shortest round-trip literal in exponent form, always a valid C double.
fn c_double(v: f64) -> Result<String, AppError> {
    if !v.is_finite() {
        return Err(AppError::persistence(format!("Cannot export non-finite parameter {v}.")));
    }
    Ok(format!("{v:e}"))
}

fn is_c_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
