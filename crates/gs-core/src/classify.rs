//! Band classification against fixed boundary curves.
//!
//! A record is the point `(total_gift, rate)`. Three hand-drawn polylines in
//! that plane separate four bands; the highest polyline the point is on or
//! above decides its class.

use gs_common::{NormalizedRecord, Result};
use gs_math::{on_or_above_polyline, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper edge of band Z.
pub const Z_BOUNDARY: [Point; 3] = [
    Point::new(0.0, 3.1),
    Point::new(40_000.0, 2.8),
    Point::new(140_000.0, 2.6),
];

/// Upper edge of band A.
pub const A_BOUNDARY: [Point; 3] = [
    Point::new(0.0, 2.8),
    Point::new(20_000.0, 2.6),
    Point::new(120_000.0, 2.3),
];

/// Upper edge of band B.
pub const B_BOUNDARY: [Point; 3] = [
    Point::new(0.0, 2.4),
    Point::new(20_000.0, 2.3),
    Point::new(60_000.0, 2.1),
];

/// Performance band, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BandClass {
    Z,
    A,
    B,
    /// Below every boundary.
    Below,
}

impl BandClass {
    pub const ALL: [BandClass; 4] = [BandClass::Z, BandClass::A, BandClass::B, BandClass::Below];

    /// Class index, 0 (best) to 3.
    pub fn index(self) -> u8 {
        match self {
            BandClass::Z => 0,
            BandClass::A => 1,
            BandClass::B => 2,
            BandClass::Below => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<BandClass> {
        BandClass::ALL.get(index as usize).copied()
    }

    /// Boundary whose on-or-above side is this band, if any.
    pub fn boundary(self) -> Option<&'static [Point]> {
        match self {
            BandClass::Z => Some(&Z_BOUNDARY),
            BandClass::A => Some(&A_BOUNDARY),
            BandClass::B => Some(&B_BOUNDARY),
            BandClass::Below => None,
        }
    }
}

impl fmt::Display for BandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandClass::Z => write!(f, "Z"),
            BandClass::A => write!(f, "A"),
            BandClass::B => write!(f, "B"),
            BandClass::Below => write!(f, "C"),
        }
    }
}

/// Whether `point` is on or above every piece of `boundary`.
pub fn classify_geq(boundary: &[Point], point: Point) -> bool {
    on_or_above_polyline(boundary, point)
}

/// Band of the point `(total_gift, rate)`.
pub fn classify(total_gift: f64, rate: f64) -> BandClass {
    let point = Point::new(total_gift, rate);
    BandClass::ALL
        .into_iter()
        .find(|band| band.boundary().is_none_or(|b| classify_geq(b, point)))
        .unwrap_or(BandClass::Below)
}

/// Band of a normalized record.
pub fn classify_record(record: &NormalizedRecord) -> BandClass {
    classify(record.total_gift as f64, record.rate)
}

/// Attach the band class to every record.
pub fn assign_classes(records: &mut [NormalizedRecord]) -> Result<()> {
    for record in records.iter_mut() {
        let band = classify_record(record);
        record.set_class(band.index())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use gs_common::RawRecord;

    #[test]
    fn reference_points() {
        let cases = [
            (20_000.0, 3.1, 0),
            (40_000.0, 3.0, 0),
            (80_000.0, 2.9, 0),
            (20_000.0, 2.8, 1),
            (100_000.0, 2.5, 1),
            (80_000.0, 2.3, 2),
            (80_000.0, 1.5, 3),
        ];
        for (x, rate, expected) in cases {
            assert_eq!(classify(x, rate).index(), expected, "({x}, {rate})");
        }
    }

    #[test]
    fn vertex_is_on_boundary() {
        assert!(classify_geq(&Z_BOUNDARY, Point::new(40_000.0, 2.8)));
        assert!(!classify_geq(&Z_BOUNDARY, Point::new(40_000.0, 2.79)));
    }

    #[test]
    fn each_piece_is_checked() {
        // Above the first Z piece's line but below the second piece.
        assert!(!classify_geq(&Z_BOUNDARY, Point::new(140_000.0, 2.59)));
    }

    #[test]
    fn index_round_trip() {
        for band in BandClass::ALL {
            assert_eq!(BandClass::from_index(band.index()), Some(band));
        }
        assert_eq!(BandClass::from_index(4), None);
    }

    #[test]
    fn assign_sets_class_once() {
        let mut recs = vec![
            normalize(&RawRecord::new(vec![20_000], 62_000), None).unwrap(),
            normalize(&RawRecord::new(vec![80_000], 120_000), None).unwrap(),
        ];
        assign_classes(&mut recs).unwrap();
        assert_eq!(recs[0].class(), Some(0));
        assert_eq!(recs[1].class(), Some(3));
        // Re-running is idempotent; forcing a different class is refused.
        assign_classes(&mut recs).unwrap();
        assert!(recs[0].set_class(2).is_err());
    }
}
