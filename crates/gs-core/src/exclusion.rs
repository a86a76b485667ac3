//! Outlier exclusion for regression input.
//!
//! The exclusion line runs through rate 3.0 at zero total and drops by 0.6
//! every 130k coins. Records on or below it are left out of segment fits
//! (except the lowest range) but still classified and reported.

/// Rate of the exclusion line at total gift 0.
pub const EXCLUSION_INTERCEPT: f64 = 3.0;

/// Rate drop of the exclusion line per coin.
pub const EXCLUSION_SLOPE: f64 = -0.6 / 130_000.0;

/// Exclusion line value at `total_gift`.
pub fn exclusion_rate(total_gift: f64) -> f64 {
    EXCLUSION_SLOPE * total_gift + EXCLUSION_INTERCEPT
}

/// True when `(total_gift, livescore)` lies on or below the exclusion line.
///
/// `total_gift` must be positive; normalized records guarantee it.
pub fn is_excluded(total_gift: f64, livescore: f64) -> bool {
    livescore / total_gift <= exclusion_rate(total_gift)
}
