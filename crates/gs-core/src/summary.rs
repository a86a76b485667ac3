//! Class tally by gifter count and coin level.

use crate::classify::BandClass;
use gs_common::{Error, NormalizedRecord, Result};
use serde::{Deserialize, Serialize};

/// Coin levels tallied when none are given.
pub const DEFAULT_COINS: [u64; 3] = [10, 100, 1000];

/// Largest gifter count tallied when none is given.
pub const DEFAULT_MAX_GIFTERS: usize = 20;

/// One row of the class table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRow {
    /// Exact number of gifts at or above `coin`.
    pub gifters: usize,
    pub coin: u64,
    pub total: usize,
    /// Records per class, indexed by [`BandClass::index`].
    pub counts: [usize; 4],
    /// Fraction of `total` per class, in `[0, 1]`; absent when `total` is 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<[f64; 4]>,
}

impl ClassRow {
    pub fn count(&self, band: BandClass) -> usize {
        self.counts[band.index() as usize]
    }
}

/// Tally classified records for every `n` in `1..=max_gifters` and every coin level.
///
/// Rows are ordered by gifter count, then coin level. Every record must
/// already carry a class.
pub fn class_table(
    records: &[NormalizedRecord],
    max_gifters: usize,
    coins: &[u64],
) -> Result<Vec<ClassRow>> {
    let classes = records
        .iter()
        .map(|r| {
            r.class()
                .filter(|&c| (c as usize) < BandClass::ALL.len())
                .map(usize::from)
                .ok_or_else(|| Error::data(format!("record {} is not classified", r.display_id())))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(max_gifters * coins.len());
    for gifters in 1..=max_gifters {
        for &coin in coins {
            let mut counts = [0usize; 4];
            for (record, &class) in records.iter().zip(&classes) {
                if record.count_at_least(coin) == gifters {
                    counts[class] += 1;
                }
            }
            let total: usize = counts.iter().sum();
            let shares = (total > 0).then(|| counts.map(|c| c as f64 / total as f64));
            rows.push(ClassRow {
                gifters,
                coin,
                total,
                counts,
                shares,
            });
        }
    }
    Ok(rows)
}
