//! Typed dataset slices.
//!
//! A slice names one of a few fixed dimensions the records are cut along:
//!
//! | text             | slice                         |
//! |------------------|-------------------------------|
//! | `20250101`       | records from that date        |
//! | `100k+`, `5000+` | livescore at least the value  |
//! | `A2`, `1500`     | records with that rank code   |
//! | `20250101/A2`    | date and rank together        |

use gs_common::{Error, NormalizedRecord, RankCode, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static RE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^20\d{6}$").unwrap());
static RE_SCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)([kKmM]?)\+$").unwrap());
static RE_RANK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap());

/// One slice of the record collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slice {
    ByDate { date: String },
    ScoreAtLeast { livescore: u64 },
    ByRank { rank: RankCode },
    DateAndRank { date: String, rank: RankCode },
}

impl Slice {
    /// Parse slice text.
    pub fn parse(text: &str) -> Result<Slice> {
        let text = text.trim();
        if let Some((date, rank)) = text.split_once('/') {
            if RE_DATE.is_match(date) && RE_RANK.is_match(rank) {
                return Ok(Slice::DateAndRank {
                    date: date.to_string(),
                    rank: rank_code(rank),
                });
            }
            return Err(Error::InvalidSlice(text.to_string()));
        }
        if RE_DATE.is_match(text) {
            return Ok(Slice::ByDate {
                date: text.to_string(),
            });
        }
        if let Some(caps) = RE_SCORE.captures(text) {
            let base: u64 = caps[1]
                .parse()
                .map_err(|_| Error::InvalidSlice(text.to_string()))?;
            let scale = match &caps[2] {
                "k" | "K" => 1_000,
                "m" | "M" => 1_000_000,
                _ => 1,
            };
            let livescore = base
                .checked_mul(scale)
                .ok_or_else(|| Error::InvalidSlice(text.to_string()))?;
            return Ok(Slice::ScoreAtLeast { livescore });
        }
        if RE_RANK.is_match(text) {
            return Ok(Slice::ByRank {
                rank: rank_code(text),
            });
        }
        Err(Error::InvalidSlice(text.to_string()))
    }

    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        match self {
            Slice::ByDate { date } => record.date.as_deref() == Some(date.as_str()),
            Slice::ScoreAtLeast { livescore } => record.livescore >= *livescore,
            Slice::ByRank { rank } => rank_matches(record, rank),
            Slice::DateAndRank { date, rank } => {
                record.date.as_deref() == Some(date.as_str()) && rank_matches(record, rank)
            }
        }
    }

    /// Records in the slice, in input order.
    pub fn select<'a>(&self, records: &'a [NormalizedRecord]) -> Vec<&'a NormalizedRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

impl FromStr for Slice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Slice::parse(s)
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slice::ByDate { date } => write!(f, "{}", date),
            Slice::ScoreAtLeast { livescore } => write!(f, "{}+", livescore),
            Slice::ByRank { rank } => write!(f, "{}", rank),
            Slice::DateAndRank { date, rank } => write!(f, "{}/{}", date, rank),
        }
    }
}

fn rank_code(text: &str) -> RankCode {
    match text.parse::<u64>() {
        Ok(n) => RankCode::Number(n),
        Err(_) => RankCode::Code(text.to_string()),
    }
}

/// Rank codes compare by text so `"1500"` and `1500` are the same rank.
fn rank_matches(record: &NormalizedRecord, rank: &RankCode) -> bool {
    record
        .rank
        .as_ref()
        .is_some_and(|r| r.to_string() == rank.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use gs_common::RawRecord;

    fn rec(date: &str, rank: RankCode, livescore: u64) -> NormalizedRecord {
        let raw = RawRecord::new(vec![100], livescore)
            .with_date(date)
            .with_rank(rank);
        normalize(&raw, None).unwrap()
    }

    #[test]
    fn parses_each_kind() {
        assert_eq!(
            Slice::parse("20250101").unwrap(),
            Slice::ByDate {
                date: "20250101".into()
            }
        );
        assert_eq!(
            Slice::parse("100k+").unwrap(),
            Slice::ScoreAtLeast { livescore: 100_000 }
        );
        assert_eq!(
            Slice::parse("5000+").unwrap(),
            Slice::ScoreAtLeast { livescore: 5_000 }
        );
        assert_eq!(
            Slice::parse("A2").unwrap(),
            Slice::ByRank {
                rank: RankCode::Code("A2".into())
            }
        );
        assert_eq!(
            Slice::parse("1500").unwrap(),
            Slice::ByRank {
                rank: RankCode::Number(1500)
            }
        );
        assert_eq!(
            Slice::parse("20250101/S1").unwrap(),
            Slice::DateAndRank {
                date: "20250101".into(),
                rank: RankCode::Code("S1".into())
            }
        );
    }

    #[test]
    fn rejects_garbage() {
        for text in ["", "rank>1", "2025/A2", "20250101/", "k+", "a b"] {
            assert!(
                matches!(Slice::parse(text), Err(Error::InvalidSlice(_))),
                "{text:?}"
            );
        }
    }

    #[test]
    fn selection() {
        let recs = vec![
            rec("20250101", RankCode::Code("A2".into()), 50_000),
            rec("20250101", RankCode::Code("B1".into()), 150_000),
            rec("20250102", RankCode::Number(1500), 120_000),
        ];
        assert_eq!(Slice::parse("20250101").unwrap().select(&recs).len(), 2);
        assert_eq!(Slice::parse("100k+").unwrap().select(&recs).len(), 2);
        assert_eq!(Slice::parse("1500").unwrap().select(&recs).len(), 1);
        assert_eq!(Slice::parse("20250101/B1").unwrap().select(&recs).len(), 1);
        assert!(Slice::parse("20250102/A2").unwrap().select(&recs).is_empty());
    }

    #[test]
    fn display_round_trips() {
        for text in ["20250101", "A2", "20250101/A2"] {
            assert_eq!(Slice::parse(text).unwrap().to_string(), text);
        }
        assert_eq!(Slice::parse("2k+").unwrap().to_string(), "2000+");
    }
}
