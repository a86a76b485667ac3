//! Range partitioning by total gift.

use gs_common::{Error, NormalizedRecord, Result};
use gs_config::validate_boundaries;

/// Records whose `total_gift` falls in `[lo, hi)`.
#[derive(Debug, Clone)]
pub struct RangeBucket<'a> {
    pub lo: f64,
    /// `f64::INFINITY` for the last, open-ended bucket.
    pub hi: f64,
    pub records: Vec<&'a NormalizedRecord>,
}

impl RangeBucket<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, total_gift: f64) -> bool {
        total_gift >= self.lo && total_gift < self.hi
    }
}

/// Split records into contiguous, non-overlapping `[lo, hi)` buckets.
///
/// `boundaries` are the lower edges; the last bucket is open-ended. Records
/// keep ascending `total_gift` order inside each bucket. Empty buckets are
/// returned as such; deciding whether that is fatal is the caller's job.
pub fn partition_by_total<'a>(
    records: &'a [NormalizedRecord],
    boundaries: &[f64],
) -> Result<Vec<RangeBucket<'a>>> {
    validate_boundaries(boundaries).map_err(|e| Error::InvalidBoundaries(e.to_string()))?;

    let mut sorted: Vec<&NormalizedRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.total_gift);

    let mut buckets = Vec::with_capacity(boundaries.len());
    for (i, &lo) in boundaries.iter().enumerate() {
        let hi = boundaries.get(i + 1).copied().unwrap_or(f64::INFINITY);
        let start = sorted.partition_point(|r| (r.total_gift as f64) < lo);
        let end = sorted.partition_point(|r| (r.total_gift as f64) < hi);
        buckets.push(RangeBucket {
            lo,
            hi,
            records: sorted[start..end].to_vec(),
        });
    }
    Ok(buckets)
}
