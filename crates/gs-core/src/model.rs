//! Piecewise-linear expected-score model.
//!
//! A model is an ordered list of line segments. Its value at `x` is the
//! minimum over all segment lines, which makes it a concave lower envelope
//! whatever the storage order. Range boundaries are implicit: they are the
//! intersections of consecutive segments.

use gs_common::{Error, Result};
use gs_config::{ModelConfig, PresetName, Segment};
use gs_math::line_intersection;
use serde::{Deserialize, Serialize};

/// Default number of sample points for curve rendering.
pub const DEFAULT_SAMPLES: usize = 101;

/// Smallest x used when sampling, so `evaluate(x) / x` stays defined.
pub const SAMPLE_FLOOR: f64 = 0.01;

/// Intersection of two consecutive segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Index of the left segment; the right one is `index + 1`.
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

/// One sampled point of the model curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f64,
    pub score: f64,
    /// `score / x`, the expected rate.
    pub rate: f64,
}

/// A non-empty lower envelope of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseModel {
    segments: Vec<Segment>,
}

impl PiecewiseModel {
    /// Build a model; at least one segment is required.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(Error::EmptyModel);
        }
        if let Some(s) = segments
            .iter()
            .find(|s| !s.intercept.is_finite() || !s.slope.is_finite())
        {
            return Err(Error::Config(format!(
                "segment ({}, {}) is not finite",
                s.intercept, s.slope
            )));
        }
        Ok(PiecewiseModel { segments })
    }

    /// Model of a built-in preset.
    pub fn from_preset(preset: PresetName) -> Self {
        PiecewiseModel {
            segments: preset.segments(),
        }
    }

    /// Model selected by configuration: explicit segments or the preset.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        PiecewiseModel::new(config.segments())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Expected score at `x`: the minimum of all segment lines.
    ///
    /// Defined at every `x`, including 0.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.segments
            .iter()
            .map(|s| s.value_at(x))
            .fold(f64::INFINITY, f64::min)
    }

    /// Intersections of consecutive segments, in storage order.
    ///
    /// Parallel neighbours have no intersection and are reported as an error.
    pub fn breakpoints(&self) -> Result<Vec<Breakpoint>> {
        self.segments
            .windows(2)
            .enumerate()
            .map(|(index, pair)| {
                let (a, b) = (pair[0], pair[1]);
                line_intersection(a.slope, a.intercept, b.slope, b.intercept)
                    .map(|p| Breakpoint { index, x: p.x, y: p.y })
                    .ok_or(Error::ParallelSegments {
                        index,
                        next: index + 1,
                        slope: a.slope,
                    })
            })
            .collect()
    }

    /// Sample the curve over `[xmin, xmax]`.
    pub fn sample_curve(&self, xmin: f64, xmax: f64, count: usize) -> Vec<CurvePoint> {
        sample_x(xmin, xmax, count)
            .into_iter()
            .map(|x| {
                let score = self.evaluate(x);
                CurvePoint {
                    x,
                    score,
                    rate: score / x,
                }
            })
            .collect()
    }
}

/// Evenly spaced sample points for rendering.
///
/// The step is `(xmax - xmin) / (count - 1)`. When `xmin <= 0` the first
/// point moves up to [`SAMPLE_FLOOR`] and the whole grid shifts with it.
pub fn sample_x(xmin: f64, xmax: f64, count: usize) -> Vec<f64> {
    let span = xmax - xmin;
    let start = if xmin <= 0.0 { SAMPLE_FLOOR } else { xmin };
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let last = (count - 1) as f64;
            (0..count).map(|i| start + i as f64 / last * span).collect()
        }
    }
}

/// Evaluate a model at one point.
pub fn evaluate_model(model: &PiecewiseModel, total_gift: f64) -> f64 {
    model.evaluate(total_gift)
}
