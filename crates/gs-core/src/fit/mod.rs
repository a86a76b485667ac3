//! Segmented least-squares fitting of the expected-score model.
//!
//! Records are split into total-gift ranges; each range gets its own line.
//! The lowest range is fit through the origin on its full population, the
//! others by ordinary least squares with outliers removed. The fitted lines
//! form a new [`PiecewiseModel`], reported together with per-segment
//! diagnostics and the breakpoints between consecutive segments.

pub mod features;

pub use features::{compare_feature_sets, FeatureSet, FeatureSetReport};

use crate::exclusion::is_excluded;
use crate::filter::partition::{partition_by_total, RangeBucket};
use crate::logging::event_names;
use crate::model::{Breakpoint, PiecewiseModel};
use gs_common::{Error, NormalizedRecord, Result};
use gs_config::{FitConfig, Segment};
use gs_math::{
    fit_through_origin, least_squares, score_fit, tss, vif, VIF_CONCERN,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Calibration override for the first segment's slope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeOverride {
    /// Slope forced onto the first segment.
    pub slope: f64,
    /// Apply only when the first range has fewer samples than this.
    pub below_samples: Option<usize>,
}

impl SlopeOverride {
    /// Whether the override applies to a first range of `samples` records.
    pub fn applies(&self, samples: usize) -> bool {
        self.below_samples.is_none_or(|limit| samples < limit)
    }
}

/// Inputs to [`fit`] besides the records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Lower edges of the ranges; must start at 0 and ascend.
    pub boundaries: Vec<f64>,
    pub exclude_outliers: bool,
    pub origin_first_segment: bool,
    pub slope_override: Option<SlopeOverride>,
    pub diagnostics: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions::from_config(&FitConfig::default())
    }
}

impl FitOptions {
    pub fn from_config(config: &FitConfig) -> Self {
        FitOptions {
            boundaries: config.boundaries.clone(),
            exclude_outliers: config.exclude_outliers,
            origin_first_segment: config.origin_first_segment,
            slope_override: config.override_first_slope.then_some(SlopeOverride {
                slope: config.first_slope,
                below_samples: config.override_below_samples,
            }),
            diagnostics: config.diagnostics,
        }
    }

    pub fn with_boundaries(mut self, boundaries: Vec<f64>) -> Self {
        self.boundaries = boundaries;
        self
    }

    pub fn with_exclusion(mut self, enabled: bool) -> Self {
        self.exclude_outliers = enabled;
        self
    }

    pub fn with_slope_override(mut self, slope_override: Option<SlopeOverride>) -> Self {
        self.slope_override = slope_override;
        self
    }
}

/// Diagnostics for one fitted range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDiagnostics {
    pub index: usize,
    pub lo: f64,
    /// Upper edge; absent for the open-ended last range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hi: Option<f64>,
    /// Records used in the fit.
    pub samples: usize,
    /// Records in the range dropped by the exclusion line.
    pub excluded: usize,
    pub through_origin: bool,
    /// Final segment, after any override.
    pub intercept: f64,
    pub slope: f64,
    /// Least-squares slope before any override.
    pub fitted_slope: f64,
    pub override_applied: bool,
    /// R^2 of the least-squares fit.
    pub r_squared: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aic: Option<f64>,
    /// VIF per non-intercept regressor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vif: Option<Vec<f64>>,
    pub multicollinear: bool,
}

/// Output of a segmented fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub model: PiecewiseModel,
    pub segments: Vec<SegmentDiagnostics>,
    pub breakpoints: Vec<Breakpoint>,
}

impl FitReport {
    /// Sample count per segment, in range order.
    pub fn sample_counts(&self) -> Vec<usize> {
        self.segments.iter().map(|s| s.samples).collect()
    }
}

/// Fit one line per total-gift range.
///
/// Fails on the first degenerate range: empty after exclusion, identical
/// scores (R^2 undefined), or a rank-deficient design. Parallel consecutive
/// lines fail when the breakpoints are computed.
pub fn fit(records: &[NormalizedRecord], options: &FitOptions) -> Result<FitReport> {
    let buckets = partition_by_total(records, &options.boundaries)?;

    let mut segments = Vec::with_capacity(buckets.len());
    let mut diagnostics = Vec::with_capacity(buckets.len());
    for (index, bucket) in buckets.iter().enumerate() {
        let diag = fit_range(index, bucket, options)?;
        debug!(
            target: event_names::FIT_SEGMENT,
            index,
            lo = diag.lo,
            samples = diag.samples,
            excluded = diag.excluded,
            slope = diag.slope,
            intercept = diag.intercept,
            r_squared = diag.r_squared,
            "segment fitted"
        );
        segments.push(Segment::new(diag.intercept, diag.slope));
        diagnostics.push(diag);
    }

    let model = PiecewiseModel::new(segments)?;
    let breakpoints = model.breakpoints()?;
    info!(
        target: event_names::FIT_FINISHED,
        segments = diagnostics.len(),
        records = records.len(),
        breakpoints = breakpoints.len(),
        "segmented fit complete"
    );
    Ok(FitReport {
        model,
        segments: diagnostics,
        breakpoints,
    })
}

fn fit_range(index: usize, bucket: &RangeBucket<'_>, options: &FitOptions) -> Result<SegmentDiagnostics> {
    let exclude = index != 0 && options.exclude_outliers;
    let kept: Vec<&NormalizedRecord> = bucket
        .records
        .iter()
        .copied()
        .filter(|r| !(exclude && is_excluded(r.total_gift as f64, r.livescore as f64)))
        .collect();
    let excluded = bucket.len() - kept.len();

    if kept.is_empty() {
        return Err(Error::EmptyPartition {
            lo: bucket.lo,
            hi: bucket.hi,
        });
    }

    let x: Vec<f64> = kept.iter().map(|r| r.total_gift as f64).collect();
    let y: Vec<f64> = kept.iter().map(|r| r.livescore as f64).collect();
    let total_ss = tss(&y);
    if total_ss == 0.0 {
        return Err(Error::ZeroVariance { samples: y.len() });
    }

    let through_origin = index == 0 && options.origin_first_segment;
    let rows: Vec<Vec<f64>> = if through_origin {
        x.iter().map(|&v| vec![v]).collect()
    } else {
        x.iter().map(|&v| vec![1.0, v]).collect()
    };
    let coefficients = if through_origin {
        fit_through_origin(&x, &y).map(|slope| vec![slope])
    } else {
        least_squares(&rows, &y)
    }
    .ok_or_else(|| {
        Error::SingularDesign(format!(
            "range [{}, {}) with {} samples",
            bucket.lo,
            bucket.hi,
            y.len()
        ))
    })?;

    let scored = score_fit(&rows, &y, coefficients);
    let r2 = scored
        .r_squared
        .ok_or(Error::ZeroVariance { samples: y.len() })?;
    let (fitted_intercept, fitted_slope) = if through_origin {
        (0.0, scored.coefficients[0])
    } else {
        (scored.coefficients[0], scored.coefficients[1])
    };

    let (aic_value, vifs) = if options.diagnostics {
        (
            Some(scored.aic()),
            Some(vif(&[x.clone()])),
        )
    } else {
        (None, None)
    };
    let multicollinear = vifs
        .as_ref()
        .is_some_and(|v| v.iter().any(|&f| f > VIF_CONCERN));

    let override_applied = index == 0
        && options
            .slope_override
            .is_some_and(|o| o.applies(y.len()));
    let slope = match options.slope_override {
        Some(o) if override_applied => o.slope,
        _ => fitted_slope,
    };

    Ok(SegmentDiagnostics {
        index,
        lo: bucket.lo,
        hi: bucket.hi.is_finite().then_some(bucket.hi),
        samples: y.len(),
        excluded,
        through_origin,
        intercept: fitted_intercept,
        slope,
        fitted_slope,
        override_applied,
        r_squared: r2,
        aic: aic_value,
        vif: vifs,
        multicollinear,
    })
}
