//! Record normalization: raw collector records into derived metrics.
//!
//! The normalizer is total over well-formed input. The only failures are
//! structural (no gifts, zero total); data-quality policy lives in
//! [`crate::validation`].

use gs_common::{Error, GiftStats, GiftThresholds, NormalizedRecord, RawRecord, Result};
use gs_math::{mean, median};
use std::collections::BTreeMap;

/// Normalize one raw record.
///
/// `group` is the grouping key of whoever discovered the record (usually its
/// directory name). When the record has no `date` and the key looks like a
/// `20YYMMDD` date, the key is used as the date.
pub fn normalize(raw: &RawRecord, group: Option<&str>) -> Result<NormalizedRecord> {
    if raw.gifts.is_empty() {
        return Err(Error::data(format!(
            "record {} has no gifts; max_coin is undefined",
            raw_id(raw, group)
        )));
    }
    let total_gift: u64 = raw.gifts.iter().sum();
    if total_gift == 0 {
        return Err(Error::data(format!(
            "record {} has total_gift 0",
            raw_id(raw, group)
        )));
    }

    // Top-N shares below read prefixes, so this order is load-bearing.
    let mut gifts = raw.gifts.clone();
    gifts.sort_unstable_by(|a, b| b.cmp(a));
    debug_assert!(gifts.windows(2).all(|w| w[0] >= w[1]));

    let max_coin = gifts[0];
    let thresholds = thresholds(&gifts);
    let stats = gift_stats(&gifts, total_gift);
    let date = raw
        .date
        .clone()
        .or_else(|| group.filter(|g| is_date_key(g)).map(str::to_string));

    Ok(NormalizedRecord::from_parts(
        raw,
        group.map(str::to_string),
        date,
        gifts,
        total_gift,
        max_coin,
        thresholds,
        stats,
    ))
}

/// Normalize every record of every group, in key order.
///
/// Fails on the first broken record: a corrupted file aborts the batch.
pub fn normalize_groups(groups: &BTreeMap<String, Vec<RawRecord>>) -> Result<Vec<NormalizedRecord>> {
    let mut out = Vec::with_capacity(groups.values().map(Vec::len).sum());
    for (key, raws) in groups {
        for raw in raws {
            out.push(normalize(raw, Some(key))?);
        }
    }
    Ok(out)
}

/// Whether a grouping key is a `20YYMMDD` date.
pub fn is_date_key(key: &str) -> bool {
    key.len() == 8 && key.starts_with("20") && key.bytes().all(|b| b.is_ascii_digit())
}

fn thresholds(sorted_desc: &[u64]) -> GiftThresholds {
    let at_least = |coin: u64| sorted_desc.partition_point(|&g| g >= coin);
    GiftThresholds {
        ge1000: at_least(1000),
        ge100: at_least(100),
        ge10: at_least(10),
        ge5: at_least(5),
        ge1: at_least(1),
        ge0: sorted_desc.len(),
    }
}

fn gift_stats(sorted_desc: &[u64], total: u64) -> GiftStats {
    let all: Vec<f64> = sorted_desc.iter().map(|&g| g as f64).collect();
    let ge5: Vec<f64> = sorted_desc
        .iter()
        .take_while(|&&g| g >= 5)
        .map(|&g| g as f64)
        .collect();

    let share = |n: usize| {
        let top: u64 = sorted_desc.iter().take(n).sum();
        100.0 * top as f64 / total as f64
    };
    let pct_count = |fraction: f64| (sorted_desc.len() as f64 * fraction).ceil() as usize;

    GiftStats {
        avg_ge5: (!ge5.is_empty()).then(|| mean(&ge5)),
        avg_all: mean(&all),
        median_ge5: (!ge5.is_empty()).then(|| median(&ge5).trunc() as u64),
        median_all: median(&all).trunc() as u64,
        top1_share: share(1),
        top3_share: share(3),
        top5_share: share(5),
        top5pct_share: share(pct_count(0.05)),
        top10pct_share: share(pct_count(0.10)),
    }
}

fn raw_id(raw: &RawRecord, group: Option<&str>) -> String {
    raw.label
        .clone()
        .or_else(|| raw.date.clone())
        .or_else(|| group.map(str::to_string))
        .unwrap_or_else(|| "<unlabeled>".to_string())
}
