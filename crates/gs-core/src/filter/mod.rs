//! Dataset filtering, slicing, ordering, and range partitioning.

pub mod condition;
pub mod partition;
pub mod slice;

pub use condition::{apply, parse_condition, Condition, Op, Operand, Predicate};
pub use partition::{partition_by_total, RangeBucket};
pub use slice::Slice;

use gs_common::{FieldValue, NormalizedRecord};
use serde_json::{Map, Value};

/// Default sort key for extracted records.
pub const DEFAULT_ORDER_KEY: &str = "livescore";

/// Columns shown when extraction names no keys.
pub const DEFAULT_KEYS: [&str; 10] = [
    "date",
    "rank",
    "user_rank",
    "total_gift",
    "livescore",
    "rate",
    "max_coin",
    "100coin",
    "10coin",
    "0coin",
];

/// Sort order parsed from `key` (descending) or `-key` (ascending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub key: String,
    pub descending: bool,
}

impl SortOrder {
    pub fn parse(text: &str) -> SortOrder {
        match text.strip_prefix('-') {
            Some(key) => SortOrder {
                key: key.to_string(),
                descending: false,
            },
            None => SortOrder {
                key: text.to_string(),
                descending: true,
            },
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::parse(DEFAULT_ORDER_KEY)
    }
}

/// Stable sort by a record field. Missing or non-numeric values count as 0.
pub fn sort_records(records: &mut [NormalizedRecord], key: &str, descending: bool) {
    let value = |r: &NormalizedRecord| r.field(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
    records.sort_by(|a, b| {
        let ord = value(a).total_cmp(&value(b));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

/// Keep the records that satisfy the predicate and every slice.
pub fn select(
    records: Vec<NormalizedRecord>,
    predicate: &Predicate,
    slices: &[Slice],
) -> Vec<NormalizedRecord> {
    records
        .into_iter()
        .filter(|r| predicate.apply(r) && slices.iter().all(|s| s.matches(r)))
        .collect()
}

/// The named fields of a record. Unknown or absent fields are null.
pub fn project<S: AsRef<str>>(record: &NormalizedRecord, keys: &[S]) -> Map<String, Value> {
    keys.iter()
        .map(|key| {
            let key = key.as_ref();
            let value = match record.field(key) {
                Some(FieldValue::Int(n)) => Value::from(n),
                Some(FieldValue::Float(f)) => Value::from(f),
                Some(FieldValue::Text(s)) => Value::from(s),
                None => Value::Null,
            };
            (key.to_string(), value)
        })
        .collect()
}
