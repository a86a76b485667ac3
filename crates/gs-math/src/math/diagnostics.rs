//! Goodness-of-fit and multicollinearity diagnostics.

use super::lstsq::least_squares;
use super::summary::mean;
use serde::{Deserialize, Serialize};

/// VIF above which a regressor is considered collinear with the others.
pub const VIF_CONCERN: f64 = 5.0;

/// Unexplained share `1 - R^2` at or below which an auxiliary fit counts as exact.
const EXACT_FIT_TOL: f64 = 1e-12;

/// Fitted values `X b` for a row-major design matrix.
pub fn predict(rows: &[Vec<f64>], coeffs: &[f64]) -> Vec<f64> {
    rows.iter()
        .map(|r| r.iter().zip(coeffs).map(|(x, b)| x * b).sum())
        .collect()
}

/// Residual sum of squares.
pub fn rss(y: &[f64], fitted: &[f64]) -> f64 {
    y.iter().zip(fitted).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// Total sum of squares around the mean of `y`.
pub fn tss(y: &[f64]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let m = mean(y);
    y.iter().map(|v| (v - m) * (v - m)).sum()
}

/// Coefficient of determination `1 - rss/tss`; `None` when `tss == 0`.
pub fn r_squared(rss: f64, tss: f64) -> Option<f64> {
    if tss == 0.0 || !tss.is_finite() {
        return None;
    }
    Some(1.0 - rss / tss)
}

/// Akaike information criterion `n ln(rss/n) + 2k`.
///
/// A perfect fit (rss = 0) yields negative infinity.
pub fn aic(n: usize, rss: f64, k: usize) -> f64 {
    if n == 0 {
        return f64::NAN;
    }
    let n = n as f64;
    n * (rss / n).ln() + 2.0 * k as f64
}

/// Variance inflation factor for each regressor column.
///
/// `columns` holds the non-intercept regressors. Each one is regressed on an
/// intercept plus all the others; VIF is `1 / (1 - R^2)`. A regressor with
/// zero variance gets R^2 = 0 (VIF 1). A perfect fit, or auxiliary
/// regressors that are themselves collinear, give infinity.
pub fn vif(columns: &[Vec<f64>]) -> Vec<f64> {
    (0..columns.len())
        .map(|j| {
            let target = &columns[j];
            let n = target.len();
            let rows: Vec<Vec<f64>> = (0..n)
                .map(|i| {
                    let mut row = Vec::with_capacity(columns.len());
                    row.push(1.0);
                    row.extend(
                        columns
                            .iter()
                            .enumerate()
                            .filter(|(k, _)| *k != j)
                            .map(|(_, c)| c[i]),
                    );
                    row
                })
                .collect();
            let Some(beta) = least_squares(&rows, target) else {
                return f64::INFINITY;
            };
            let fitted = predict(&rows, &beta);
            let r2 = r_squared(rss(target, &fitted), tss(target)).unwrap_or(0.0);
            if 1.0 - r2 <= EXACT_FIT_TOL {
                f64::INFINITY
            } else {
                1.0 / (1.0 - r2)
            }
        })
        .collect()
}

/// Largest and smallest residual, measured as fitted minus observed.
pub fn residual_extremes(y: &[f64], fitted: &[f64]) -> Option<(f64, f64)> {
    let mut it = fitted.iter().zip(y).map(|(f, o)| f - o);
    let first = it.next()?;
    Some(it.fold((first, first), |(hi, lo), r| (hi.max(r), lo.min(r))))
}

/// Result of an ordinary least-squares fit with its basic diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    /// Coefficients in design-column order.
    pub coefficients: Vec<f64>,
    pub n: usize,
    pub rss: f64,
    pub tss: f64,
    /// `None` when every observation is identical.
    pub r_squared: Option<f64>,
}

impl OlsFit {
    /// AIC with `k` = number of coefficients.
    pub fn aic(&self) -> f64 {
        aic(self.n, self.rss, self.coefficients.len())
    }
}

/// Fit `y ~ X` and collect residual statistics.
pub fn ols(rows: &[Vec<f64>], y: &[f64]) -> Option<OlsFit> {
    let coefficients = least_squares(rows, y)?;
    Some(score_fit(rows, y, coefficients))
}

/// Collect residual statistics for given coefficients.
pub fn score_fit(rows: &[Vec<f64>], y: &[f64], coefficients: Vec<f64>) -> OlsFit {
    let fitted = predict(rows, &coefficients);
    let rss = rss(y, &fitted);
    let tss = tss(y);
    OlsFit {
        coefficients,
        n: y.len(),
        rss,
        tss,
        r_squared: r_squared(rss, tss),
    }
}
