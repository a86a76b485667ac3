//! End-to-end library pipeline: normalize, validate, fit, classify, tally.

use gs_common::{NormalizedRecord, RawRecord};
use gs_config::ValidationPolicy;
use gs_core::classify::{assign_classes, BandClass};
use gs_core::fit::{fit, FitOptions};
use gs_core::normalize::normalize_groups;
use gs_core::summary::class_table;
use gs_core::validation::validate_all;
use std::collections::BTreeMap;

/// Deterministic noise in [-amp, amp].
fn jitter(i: u64, amp: i64) -> i64 {
    ((i * 7919) % (2 * amp as u64 + 1)) as i64 - amp
}

/// Two days of synthetic streams.
///
/// Below 50k coins the score is about 3.2x the gift total; above it about
/// 2.7x + 15000. One stream above 50k sits under the exclusion line.
fn groups() -> BTreeMap<String, Vec<RawRecord>> {
    let mut groups: BTreeMap<String, Vec<RawRecord>> = BTreeMap::new();
    for (i, total) in (1_000..50_000u64).step_by(2_000).enumerate() {
        let score = (3.2 * total as f64) as i64 + jitter(i as u64, 100);
        let day = if i % 2 == 0 { "20250101" } else { "20250102" };
        groups
            .entry(day.to_string())
            .or_default()
            .push(RawRecord::new(vec![total / 2, total - total / 2], score as u64));
    }
    for (i, total) in (50_000..=200_000u64).step_by(5_000).enumerate() {
        let score = (2.7 * total as f64 + 15_000.0) as i64 + jitter(i as u64, 1_000);
        groups
            .entry("20250102".to_string())
            .or_default()
            .push(RawRecord::new(vec![total], score as u64));
    }
    groups
        .entry("20250101".to_string())
        .or_default()
        .push(RawRecord::new(vec![100_000], 170_000).with_label("quiet-night"));
    groups
}

fn records() -> Vec<NormalizedRecord> {
    normalize_groups(&groups()).unwrap()
}

#[test]
fn dates_come_from_group_keys() {
    let recs = records();
    assert_eq!(recs.len(), 25 + 31 + 1);
    assert!(recs.iter().all(|r| r.date.is_some()));
    let strict = ValidationPolicy {
        strict: true,
        ..ValidationPolicy::default()
    };
    validate_all(&recs, &strict).unwrap();
}

#[test]
fn segmented_fit_recovers_generating_lines() {
    let recs = records();
    let report = fit(&recs, &FitOptions::default()).unwrap();

    assert_eq!(report.segments.len(), 2);
    let first = &report.segments[0];
    assert!(first.through_origin);
    assert!(first.override_applied);
    assert_eq!(first.slope, 3.0);
    assert!((first.fitted_slope - 3.2).abs() < 0.01, "{}", first.fitted_slope);
    assert_eq!(first.samples, 25);

    let second = &report.segments[1];
    assert_eq!(second.excluded, 1);
    assert_eq!(second.samples, 31);
    assert!((second.slope - 2.7).abs() < 0.05, "{}", second.slope);
    assert!((second.intercept - 15_000.0).abs() < 3_000.0, "{}", second.intercept);
    assert!(second.r_squared > 0.99);

    // 3x meets 2.7x + 15000 at 50000.
    assert_eq!(report.breakpoints.len(), 1);
    assert!((report.breakpoints[0].x - 50_000.0).abs() < 10_000.0);
    assert_eq!(report.model.segments().len(), 2);
}

#[test]
fn disabling_exclusion_keeps_the_outlier() {
    let recs = records();
    let options = FitOptions::default().with_exclusion(false);
    let report = fit(&recs, &options).unwrap();
    assert_eq!(report.segments[1].excluded, 0);
    assert_eq!(report.segments[1].samples, 32);
}

#[test]
fn classify_then_tally() {
    let mut recs = records();
    assign_classes(&mut recs).unwrap();
    assert!(recs.iter().all(|r| r.class().is_some()));

    let outlier = recs
        .iter()
        .find(|r| r.label.as_deref() == Some("quiet-night"))
        .unwrap();
    assert_eq!(outlier.class(), Some(BandClass::Below.index()));

    let rows = class_table(&recs, 2, &[500]).unwrap();
    let tallied: usize = rows.iter().map(|r| r.total).sum();
    // Every record has one or two gifts of at least 500 coins.
    assert_eq!(tallied, recs.len());
    for row in &rows {
        assert_eq!(row.counts.iter().sum::<usize>(), row.total);
    }
}
