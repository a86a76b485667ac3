//! Property-based tests for gs-math numerical functions.
//!
//! Uses proptest to verify algebraic properties hold across many random inputs.

use gs_math::{
    cross, fit_through_origin, least_squares, line_intersection, median, on_or_above_polyline,
    ols, predict, rss, Point,
};
use proptest::prelude::*;

/// Helper to check approximate equality with a relative floor.
fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// least squares
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Noise-free linear data is reproduced exactly.
    #[test]
    fn lstsq_recovers_exact_lines(
        slope in 0.5..5.0f64,
        intercept in -50_000.0..50_000.0f64,
        xs in prop::collection::btree_set(1u32..200_000, 3..40),
    ) {
        let rows: Vec<Vec<f64>> = xs.iter().map(|&x| vec![1.0, x as f64]).collect();
        let y: Vec<f64> = xs.iter().map(|&x| slope * x as f64 + intercept).collect();
        let b = least_squares(&rows, &y).unwrap();
        prop_assert!(approx_eq(b[1], slope, 1e-7), "slope {} vs {}", b[1], slope);
        prop_assert!((b[0] - intercept).abs() < 1e-3 * intercept.abs().max(1.0) + 1e-3,
            "intercept {} vs {}", b[0], intercept);
    }

    /// The OLS solution is a minimum: perturbing it never lowers RSS.
    #[test]
    fn lstsq_minimizes_rss(
        pts in prop::collection::vec((1.0..1000.0f64, -500.0..500.0f64), 4..30),
        d0 in -1.0..1.0f64,
        d1 in -0.1..0.1f64,
    ) {
        let rows: Vec<Vec<f64>> = pts.iter().map(|(x, _)| vec![1.0, *x]).collect();
        let y: Vec<f64> = pts.iter().map(|(_, y)| *y).collect();
        if let Some(b) = least_squares(&rows, &y) {
            let best = rss(&y, &predict(&rows, &b));
            let moved = rss(&y, &predict(&rows, &[b[0] + d0, b[1] + d1]));
            prop_assert!(moved >= best - 1e-6 * best.max(1.0));
        }
    }

    /// R^2 of an intercept model is within [0, 1].
    #[test]
    fn r_squared_in_unit_interval(
        pts in prop::collection::vec((1.0..1000.0f64, -500.0..500.0f64), 4..30),
    ) {
        let rows: Vec<Vec<f64>> = pts.iter().map(|(x, _)| vec![1.0, *x]).collect();
        let y: Vec<f64> = pts.iter().map(|(_, y)| *y).collect();
        if let Some(fit) = ols(&rows, &y) {
            if let Some(r2) = fit.r_squared {
                prop_assert!((-1e-9..=1.0 + 1e-9).contains(&r2), "r2={}", r2);
            }
        }
    }

    /// Origin fit on y = k x recovers k.
    #[test]
    fn origin_fit_recovers_slope(
        k in 0.1..10.0f64,
        xs in prop::collection::vec(1.0..100_000.0f64, 1..50),
    ) {
        let y: Vec<f64> = xs.iter().map(|x| k * x).collect();
        let slope = fit_through_origin(&xs, &y).unwrap();
        prop_assert!(approx_eq(slope, k, 1e-12));
    }
}

// ============================================================================
// geometry
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The intersection satisfies both line equations.
    #[test]
    fn intersection_on_both_lines(
        a1 in -5.0..5.0f64, b1 in -1e5..1e5f64,
        a2 in -5.0..5.0f64, b2 in -1e5..1e5f64,
    ) {
        prop_assume!((a1 - a2).abs() > 1e-3);
        let p = line_intersection(a1, b1, a2, b2).unwrap();
        let y2 = a2 * p.x + b2;
        prop_assert!((p.y - y2).abs() <= 1e-6 * p.y.abs().max(y2.abs()).max(1.0));
    }

    /// Raising a point never moves it from above a polyline to below it.
    #[test]
    fn polyline_test_monotone_in_y(
        x in 0.0..200_000.0f64,
        y in 0.0..5.0f64,
        dy in 0.0..2.0f64,
    ) {
        let line = [
            Point::new(0.0, 3.1),
            Point::new(40_000.0, 2.8),
            Point::new(140_000.0, 2.6),
        ];
        if on_or_above_polyline(&line, Point::new(x, y)) {
            prop_assert!(on_or_above_polyline(&line, Point::new(x, y + dy)));
        }
    }

    /// Cross product flips sign with edge direction.
    #[test]
    fn cross_antisymmetric(
        ax in -10.0..10.0f64, ay in -10.0..10.0f64,
        bx in -10.0..10.0f64, by in -10.0..10.0f64,
        qx in -10.0..10.0f64, qy in -10.0..10.0f64,
    ) {
        let (a, b, q) = (Point::new(ax, ay), Point::new(bx, by), Point::new(qx, qy));
        prop_assert!(approx_eq(cross(a, b, q), -cross(b, a, q), 1e-9));
    }

    /// Median sits between min and max.
    #[test]
    fn median_bounded(values in prop::collection::vec(-1e6..1e6f64, 1..50)) {
        let m = median(&values);
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(m >= lo && m <= hi);
    }
}
