//! Plain-text rendering of an analysis run.

use crate::dataset::{Dataset, Diagnosis};
use crate::decomposition::Pca;
use crate::error::{AnalysisError, Result};
use crate::evaluation::{Evaluation, SweepPoint};
use crate::linear_model::CvResult;
use crate::pipeline::AnalysisOutcome;
use crate::Vector;
use ndarray::Axis;
use std::io::Write;

const BAR_WIDTH: usize = 40;

/// Five-number summary plus mean of one feature column.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureSummary {
    pub name: String,
    pub min: f64,
    pub first_quartile: f64,
    pub median: f64,
    pub mean: f64,
    pub third_quartile: f64,
    pub max: f64,
}

pub fn summarize(dataset: &Dataset) -> Vec<FeatureSummary> {
    dataset
        .features
        .axis_iter(Axis(1))
        .zip(dataset.feature_names.iter())
        .map(|(column, name)| {
            let mut sorted: Vec<f64> = column.to_vec();
            sorted.sort_by(f64::total_cmp);
            FeatureSummary {
                name: name.clone(),
                min: sorted.first().copied().unwrap_or(f64::NAN),
                first_quartile: quantile(&sorted, 0.25),
                median: quantile(&sorted, 0.5),
                mean: column.mean().unwrap_or(f64::NAN),
                third_quartile: quantile(&sorted, 0.75),
                max: sorted.last().copied().unwrap_or(f64::NAN),
            }
        })
        .collect()
}

/// Linear interpolation between order statistics of a sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled)
}

fn heading<W: Write>(out: &mut W, title: &str) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "== {} ==", title)?;
    Ok(())
}

pub fn write_summary<W: Write>(out: &mut W, summaries: &[FeatureSummary]) -> Result<()> {
    writeln!(
        out,
        "{:<24} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "feature", "min", "1st qu.", "median", "mean", "3rd qu.", "max"
    )?;
    for s in summaries {
        writeln!(
            out,
            "{:<24} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            s.name, s.min, s.first_quartile, s.median, s.mean, s.third_quartile, s.max
        )?;
    }
    Ok(())
}

pub fn write_label_chart<W: Write>(out: &mut W, counts: [usize; 2]) -> Result<()> {
    let total: usize = counts.iter().sum();
    let largest = counts.iter().copied().max().unwrap_or(0).max(1);
    for class in Diagnosis::ALL {
        let count = counts[class.index()];
        writeln!(
            out,
            "{:<10} | {:<width$} {} ({:.1}%)",
            class.to_string(),
            bar(count as f64 / largest as f64),
            count,
            100.0 * count as f64 / total.max(1) as f64,
            width = BAR_WIDTH
        )?;
    }
    Ok(())
}

/// Mean CV deviance per lambda with its standard error; `*` marks
/// lambda.min and `+` lambda.1se.
pub fn write_cv_curve<W: Write>(out: &mut W, cv: &CvResult) -> Result<()> {
    let lo = cv.cv_mean.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = cv.cv_mean.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = (hi - lo).max(1e-12);

    writeln!(out, "{:>12} {:>9} {:>10} {:>10}", "lambda", "log", "deviance", "se")?;
    let best = cv.best_index();
    for (i, ((&lambda, &mean), &se)) in cv.lambdas.iter().zip(cv.cv_mean.iter()).zip(cv.cv_se.iter()).enumerate() {
        let marker = if i == best {
            '*'
        } else if lambda == cv.lambda_1se {
            '+'
        } else {
            ' '
        };
        writeln!(
            out,
            "{:>12.4e} {:>9.3} {:>10.5} {:>10.5} {} {}",
            lambda,
            lambda.ln(),
            mean,
            se,
            marker,
            bar((mean - lo) / span)
        )?;
    }
    writeln!(
        out,
        "lambda.min = {:.6e} (deviance {:.5}), lambda.1se = {:.6e}",
        cv.lambda_min, cv.cv_mean[best], cv.lambda_1se
    )?;
    Ok(())
}

pub fn write_coefficients<W: Write>(
    out: &mut W,
    names: &[String],
    intercept: Option<f64>,
    coefficients: Option<&Vector>,
) -> Result<()> {
    writeln!(out, "{:<24} {:>14}", "(Intercept)", format_coefficient(intercept))?;
    for (j, name) in names.iter().enumerate() {
        let value = coefficients.and_then(|c| c.get(j).copied());
        writeln!(out, "{:<24} {:>14}", name, format_coefficient(value))?;
    }
    Ok(())
}

fn format_coefficient(value: Option<f64>) -> String {
    match value {
        Some(v) if v == 0.0 => ".".to_string(),
        Some(v) => format!("{:.6}", v),
        None => "-".to_string(),
    }
}

pub fn write_variance_curve<W: Write>(out: &mut W, pca: &Pca) -> Result<()> {
    let ratios = pca
        .explained_variance_ratio
        .as_ref()
        .ok_or(AnalysisError::NotFitted("PCA"))?;
    let cumulative = pca
        .cumulative_variance_ratio()
        .ok_or(AnalysisError::NotFitted("PCA"))?;

    writeln!(out, "{:>4} {:>10} {:>11}", "PC", "variance", "cumulative")?;
    for (k, (&ratio, &cumulative)) in ratios.iter().zip(cumulative.iter()).enumerate() {
        writeln!(
            out,
            "{:>4} {:>10.4} {:>11.4} {}",
            k + 1,
            ratio,
            cumulative,
            bar(ratio)
        )?;
    }
    Ok(())
}

pub fn write_sweep<W: Write>(out: &mut W, sweep: &[SweepPoint]) -> Result<()> {
    writeln!(out, "{:>10} {:>10} {:>10} {:>10}", "components", "accuracy", "precision", "recall")?;
    for point in sweep {
        writeln!(
            out,
            "{:>10} {:>10.4} {:>10.4} {:>10.4}",
            point.n_components, point.metrics.accuracy, point.metrics.precision, point.metrics.recall
        )?;
    }
    Ok(())
}

pub fn write_evaluation<W: Write>(out: &mut W, title: &str, evaluation: &Evaluation) -> Result<()> {
    writeln!(out, "-- {} --", title)?;
    write!(out, "{}", evaluation.confusion)?;
    writeln!(out, "{}", evaluation.metrics)?;
    Ok(())
}

/// Every artifact of a run, in pipeline order.
pub fn write_report<W: Write>(out: &mut W, outcome: &AnalysisOutcome) -> Result<()> {
    heading(out, "Dataset")?;
    writeln!(out, "dimensions: {} x {}", outcome.dim.0, outcome.dim.1)?;
    write_summary(out, &outcome.feature_summaries)?;

    heading(out, "Diagnosis distribution")?;
    write_label_chart(out, outcome.class_counts)?;

    heading(out, "Features retained after collinearity reduction")?;
    writeln!(out, "{}", outcome.retained_features.join(", "))?;

    heading(out, "Holdout split")?;
    writeln!(out, "training rows: {}, testing rows: {}", outcome.n_train, outcome.n_test)?;

    for cv in [&outcome.ridge_cv, &outcome.lasso_cv] {
        heading(out, &format!("{} cross-validation", cv.penalty))?;
        write_cv_curve(out, cv)?;
        writeln!(out, "coefficients at lambda.min:")?;
        write_coefficients(
            out,
            &outcome.feature_names,
            cv.model.intercept,
            cv.model.coefficients.as_ref(),
        )?;
    }

    heading(out, "Saturated logistic regression")?;
    write_coefficients(
        out,
        &outcome.feature_names,
        outcome.saturated.intercept,
        outcome.saturated.coefficients.as_ref(),
    )?;

    heading(out, "Reduced logistic regression")?;
    write_coefficients(
        out,
        &outcome.retained_features,
        outcome.reduced.intercept,
        outcome.reduced.coefficients.as_ref(),
    )?;

    heading(out, "PCA variance explained (training split)")?;
    write_variance_curve(out, &outcome.pca)?;

    heading(out, "PCA component sweep (training split, in-sample)")?;
    write_sweep(out, &outcome.sweep)?;

    heading(out, "Holdout evaluation")?;
    for (name, evaluation) in &outcome.holdout {
        write_evaluation(out, name, evaluation)?;
    }

    if let Some(loocv) = &outcome.loocv {
        heading(out, &format!("Leave-one-out cross-validation ({} folds)", loocv.n))?;
        write_evaluation(out, "ridge", &loocv.ridge)?;
        write_evaluation(out, "lasso", &loocv.lasso)?;
        write_evaluation(out, "PCA logistic", &loocv.pca)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear_model::{PenalizedLogistic, Penalty};
    use ndarray::array;

    #[test]
    fn test_quantiles_interpolate() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 0.5), 2.5);
        assert_eq!(quantile(&sorted, 0.25), 1.75);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
    }

    #[test]
    fn test_summarize() {
        let dataset = Dataset::new(
            vec!["a".into()],
            array![[3.0], [1.0], [2.0]],
            vec![Diagnosis::Benign, Diagnosis::Malignant, Diagnosis::Benign],
        )
        .unwrap();
        let summary = summarize(&dataset);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].min, 1.0);
        assert_eq!(summary[0].median, 2.0);
        assert_eq!(summary[0].max, 3.0);
        assert_eq!(summary[0].mean, 2.0);
    }

    #[test]
    fn test_label_chart() {
        let mut out = Vec::new();
        write_label_chart(&mut out, [357, 212]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Benign"));
        assert!(lines[0].contains(&"#".repeat(BAR_WIDTH)));
        assert!(lines[1].contains("212 (37.3%)"));
    }

    #[test]
    fn test_variance_curve_ends_at_one() {
        let x = array![[1.0, 2.0, 0.5], [2.0, 4.5, 0.1], [3.0, 5.5, 0.9], [4.0, 8.5, 0.4]];
        let mut pca = Pca::new();
        pca.fit(&x).unwrap();

        let mut out = Vec::new();
        write_variance_curve(&mut out, &pca).unwrap();
        let text = String::from_utf8(out).unwrap();
        let last = text.lines().last().unwrap();
        assert!(last.trim_start().starts_with('3'));
        assert!(last.contains("1.0000"));

        let mut unfitted = Vec::new();
        assert!(write_variance_curve(&mut unfitted, &Pca::new()).is_err());
    }

    #[test]
    fn test_cv_curve_marks_the_minimum() {
        let cv = CvResult {
            penalty: Penalty::Ridge,
            lambdas: vec![1.0, 0.1, 0.01],
            cv_mean: vec![1.2, 0.8, 0.9],
            cv_se: vec![0.05, 0.05, 0.05],
            lambda_min: 0.1,
            lambda_1se: 0.1,
            model: PenalizedLogistic::new(Penalty::Ridge).lambda(0.1),
        };
        let mut out = Vec::new();
        write_cv_curve(&mut out, &cv).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).take(3).collect();
        assert!(rows[1].contains(" * "));
        assert!(!rows[0].contains('*') && !rows[2].contains('*'));
        assert!(text.contains("(deviance 0.80000)"));
    }

    #[test]
    fn test_zero_coefficients_print_as_dots() {
        let mut out = Vec::new();
        let names = vec!["a".to_string(), "b".to_string()];
        let coefficients = array![0.0, 1.5];
        write_coefficients(&mut out, &names, Some(-0.25), Some(&coefficients)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("-0.250000"));
        assert!(text.lines().nth(1).unwrap().trim_end().ends_with('.'));
        assert!(text.contains("1.500000"));
    }
}
