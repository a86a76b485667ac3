//! Nested feature-set comparison over the whole population.
//!
//! Fits livescore on growing sets of regressors and reports fit quality
//! (R^2, AIC) and multicollinearity (VIF) for each, to judge whether gift
//! counts explain anything beyond the total.

use gs_common::{Error, NormalizedRecord, Result};
use gs_math::{
    least_squares_basic, ols, predict, residual_extremes, score_fit, tss, vif, VIF_CONCERN,
};
use serde::{Deserialize, Serialize};

/// Regressor sets, each extending the previous one by a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSet {
    /// `[1, total_gift]`
    Total,
    /// `+ gift_count`
    GiftCount,
    /// `+ gifts >= 100`
    Ge100,
    /// `+ gifts >= 5`
    Ge5,
}

impl FeatureSet {
    pub const ALL: [FeatureSet; 4] = [
        FeatureSet::Total,
        FeatureSet::GiftCount,
        FeatureSet::Ge100,
        FeatureSet::Ge5,
    ];

    /// Column names including the intercept.
    pub fn columns(self) -> &'static [&'static str] {
        static COLUMNS: [&str; 5] = ["intercept", "total_gift", "gift_count", "100coin", "5coin"];
        let n = match self {
            FeatureSet::Total => 2,
            FeatureSet::GiftCount => 3,
            FeatureSet::Ge100 => 4,
            FeatureSet::Ge5 => 5,
        };
        &COLUMNS[..n]
    }

    /// Design row for one record.
    pub fn row(self, record: &NormalizedRecord) -> Vec<f64> {
        let full = [
            1.0,
            record.total_gift as f64,
            record.gift_count() as f64,
            record.thresholds.ge100 as f64,
            record.thresholds.ge5 as f64,
        ];
        full[..self.columns().len()].to_vec()
    }
}

/// Fit quality of one feature set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSetReport {
    pub feature_set: FeatureSet,
    pub columns: Vec<String>,
    pub coefficients: Vec<f64>,
    pub samples: usize,
    /// Independent design columns; below `columns.len()` when some column is
    /// a linear combination of the others and was given a zero coefficient.
    pub rank: usize,
    pub r_squared: f64,
    pub aic: f64,
    /// One entry per non-intercept column.
    pub vif: Vec<f64>,
    pub multicollinear: bool,
    /// Largest fitted-minus-observed residual.
    pub max_residual: f64,
    pub min_residual: f64,
}

/// Fit every [`FeatureSet`] on the same records.
pub fn compare_feature_sets(records: &[NormalizedRecord]) -> Result<Vec<FeatureSetReport>> {
    if records.is_empty() {
        return Err(Error::EmptyPartition {
            lo: 0.0,
            hi: f64::INFINITY,
        });
    }
    let y: Vec<f64> = records.iter().map(|r| r.livescore as f64).collect();
    let total_ss = tss(&y);
    if total_ss == 0.0 {
        return Err(Error::ZeroVariance { samples: y.len() });
    }

    FeatureSet::ALL
        .iter()
        .map(|&set| {
            let rows: Vec<Vec<f64>> = records.iter().map(|r| set.row(r)).collect();
            let width = set.columns().len();
            let (fit, rank) = match ols(&rows, &y) {
                Some(fit) => (fit, width),
                None => {
                    let (coefficients, rank) =
                        least_squares_basic(&rows, &y).ok_or_else(|| {
                            Error::SingularDesign(format!(
                                "feature set {:?} over {} records",
                                set,
                                y.len()
                            ))
                        })?;
                    (score_fit(&rows, &y, coefficients), rank)
                }
            };
            let fitted = predict(&rows, &fit.coefficients);
            let (max_residual, min_residual) =
                residual_extremes(&y, &fitted).unwrap_or((0.0, 0.0));

            let regressors: Vec<Vec<f64>> = (1..fit.coefficients.len())
                .map(|j| rows.iter().map(|r| r[j]).collect())
                .collect();
            let vifs = vif(&regressors);

            Ok(FeatureSetReport {
                feature_set: set,
                columns: set.columns().iter().map(|c| c.to_string()).collect(),
                samples: fit.n,
                rank,
                r_squared: fit
                    .r_squared
                    .ok_or(Error::ZeroVariance { samples: fit.n })?,
                aic: fit.aic(),
                multicollinear: rank < width || vifs.iter().any(|&v| v > VIF_CONCERN),
                vif: vifs,
                coefficients: fit.coefficients,
                max_residual,
                min_residual,
            })
        })
        .collect()
}
