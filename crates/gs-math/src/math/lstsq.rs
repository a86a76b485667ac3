//! Linear least squares.
//!
//! Solves `min ||X b - y||^2` with a Householder QR factorization of the
//! column-scaled design matrix. Gift totals run into the hundreds of
//! thousands while the intercept column is 1, so columns are scaled to unit
//! max-abs before factorizing and the coefficients are unscaled afterwards.

/// Relative threshold below which a diagonal of R marks a dependent column.
const RANK_TOL: f64 = 1e-10;

/// Ordinary least-squares solution for a row-major design matrix.
///
/// Returns `None` when the problem is malformed (no rows, ragged rows,
/// fewer rows than columns, mismatched `y`) or the design is rank deficient.
pub fn least_squares(rows: &[Vec<f64>], y: &[f64]) -> Option<Vec<f64>> {
    let n = rows.len();
    if n == 0 || y.len() != n {
        return None;
    }
    let p = rows[0].len();
    if p == 0 || n < p || rows.iter().any(|r| r.len() != p) {
        return None;
    }
    if rows.iter().flatten().chain(y).any(|v| !v.is_finite()) {
        return None;
    }

    // Column-major copy, scaled to unit max-abs per column.
    let mut cols: Vec<Vec<f64>> = (0..p).map(|j| rows.iter().map(|r| r[j]).collect()).collect();
    let mut scales = vec![1.0; p];
    for (col, scale) in cols.iter_mut().zip(scales.iter_mut()) {
        let max = col.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        if max == 0.0 {
            return None;
        }
        *scale = max;
        for v in col.iter_mut() {
            *v /= max;
        }
    }
    let col_norms: Vec<f64> = cols.iter().map(|c| norm(c)).collect();
    let mut rhs = y.to_vec();

    for k in 0..p {
        let norm_k = norm(&cols[k][k..]);
        if norm_k <= RANK_TOL * col_norms[k] {
            return None;
        }
        let alpha = if cols[k][k] > 0.0 { -norm_k } else { norm_k };

        let mut v: Vec<f64> = cols[k][k..].to_vec();
        v[0] -= alpha;
        let v_norm2: f64 = v.iter().map(|x| x * x).sum();

        if v_norm2 > 0.0 {
            for col in cols.iter_mut().skip(k) {
                reflect(&v, v_norm2, &mut col[k..]);
            }
            reflect(&v, v_norm2, &mut rhs[k..]);
        }
        cols[k][k] = alpha;
    }

    // Back substitution on the upper-triangular R.
    let mut coeffs = vec![0.0; p];
    for k in (0..p).rev() {
        let mut s = rhs[k];
        for j in (k + 1)..p {
            s -= cols[j][k] * coeffs[j];
        }
        coeffs[k] = s / cols[k][k];
    }

    for (c, scale) in coeffs.iter_mut().zip(&scales) {
        *c /= scale;
    }
    Some(coeffs)
}

/// Least squares over the leading independent columns of the design.
///
/// Columns are taken left to right; one that depends linearly on the columns
/// already kept gets a zero coefficient. The fitted values are those of the
/// full column space. Returns the coefficients and the number of columns
/// kept, or `None` when not even one column can be fitted.
pub fn least_squares_basic(rows: &[Vec<f64>], y: &[f64]) -> Option<(Vec<f64>, usize)> {
    let p = rows.first()?.len();
    let mut kept: Vec<usize> = Vec::with_capacity(p);
    let mut solution = None;
    for j in 0..p {
        let trial: Vec<usize> = kept.iter().copied().chain(std::iter::once(j)).collect();
        let sub: Vec<Vec<f64>> = rows
            .iter()
            .map(|r| {
                trial
                    .iter()
                    .map(|&k| r.get(k).copied().unwrap_or(f64::NAN))
                    .collect()
            })
            .collect();
        if let Some(b) = least_squares(&sub, y) {
            kept = trial;
            solution = Some(b);
        }
    }

    let b = solution?;
    let mut coeffs = vec![0.0; p];
    for (&k, v) in kept.iter().zip(b) {
        coeffs[k] = v;
    }
    Some((coeffs, kept.len()))
}

/// Least-squares slope of a line forced through the origin: `sum(xy) / sum(x^2)`.
///
/// Returns `None` for empty or mismatched input and when every `x` is zero.
pub fn fit_through_origin(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }
    let sxx: f64 = x.iter().map(|v| v * v).sum();
    if sxx == 0.0 || !sxx.is_finite() {
        return None;
    }
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    Some(sxy / sxx)
}

/// Apply the Householder reflection `I - 2 v v^T / (v^T v)` to `target`.
fn reflect(v: &[f64], v_norm2: f64, target: &mut [f64]) {
    let dot: f64 = v.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    let factor = 2.0 * dot / v_norm2;
    for (t, vi) in target.iter_mut().zip(v) {
        *t -= factor * vi;
    }
}

fn norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}
