//! Gift records: the raw collector shape and the normalized metrics shape.
//!
//! `RawRecord` mirrors the JSON written by the stream collector. It is
//! lenient where the collector historically was (`livescore` as a number or
//! numeric string, rank codes as strings or integers) and strict where the
//! analysis depends on it (`gift` must be present).
//!
//! `NormalizedRecord` is produced once per raw record by the normalizer in
//! `gs-core` and is immutable afterwards, except for the band class which is
//! attached exactly once by the classifier.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A rank code as reported by the platform: either numeric or a short label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RankCode {
    Number(u64),
    Code(String),
}

impl RankCode {
    /// Numeric view of the rank, if it is numeric or a numeric string.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            RankCode::Number(n) => Some(*n),
            RankCode::Code(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for RankCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankCode::Number(n) => write!(f, "{}", n),
            RankCode::Code(s) => write!(f, "{}", s),
        }
    }
}

/// One stream's record as written by the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Gift amounts in arrival order.
    #[serde(rename = "gift", alias = "gifts")]
    pub gifts: Vec<u64>,

    /// Platform-reported score.
    #[serde(default, deserialize_with = "deserialize_livescore")]
    pub livescore: u64,

    /// Broadcast date as `YYYYMMDD`.
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub label: Option<String>,

    #[serde(default)]
    pub user_rank: Option<RankCode>,

    #[serde(default)]
    pub rank: Option<RankCode>,

    #[serde(default)]
    pub following: Option<u64>,

    #[serde(default)]
    pub followers: Option<u64>,
}

impl RawRecord {
    /// Minimal record with just gifts and a score.
    pub fn new(gifts: Vec<u64>, livescore: u64) -> Self {
        RawRecord {
            gifts,
            livescore,
            date: None,
            label: None,
            user_rank: None,
            rank: None,
            following: None,
            followers: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_rank(mut self, rank: RankCode) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_followers(mut self, followers: u64) -> Self {
        self.followers = Some(followers);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(u64),
    Float(f64),
    Text(String),
}

fn deserialize_livescore<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(0),
        Some(NumberOrText::Int(n)) => Ok(n),
        Some(NumberOrText::Float(f)) if f.is_finite() && f >= 0.0 => Ok(f.trunc() as u64),
        Some(NumberOrText::Float(f)) => Err(D::Error::custom(format!(
            "livescore must be a non-negative number, got {}",
            f
        ))),
        Some(NumberOrText::Text(s)) => s.trim().parse::<u64>().map_err(|_| {
            D::Error::custom(format!("livescore is not an integer: {:?}", s))
        }),
    }
}

fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        None => None,
        Some(NumberOrText::Int(n)) => Some(n.to_string()),
        Some(NumberOrText::Float(f)) => Some(f.to_string()),
        Some(NumberOrText::Text(s)) => Some(s),
    })
}

/// Counts of gifts at or above fixed coin levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GiftThresholds {
    #[serde(rename = "1000coin")]
    pub ge1000: usize,
    #[serde(rename = "100coin")]
    pub ge100: usize,
    #[serde(rename = "10coin")]
    pub ge10: usize,
    #[serde(rename = "5coin")]
    pub ge5: usize,
    #[serde(rename = "1coin")]
    pub ge1: usize,
    /// Equals the number of gifts.
    #[serde(rename = "0coin")]
    pub ge0: usize,
}

/// Distribution statistics over a record's gifts.
///
/// Shares are percentages of the total gift amount taken by the largest gifts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GiftStats {
    /// Mean of gifts worth 5 coins or more; absent when there are none.
    pub avg_ge5: Option<f64>,
    pub avg_all: f64,
    pub median_ge5: Option<u64>,
    pub median_all: u64,
    pub top1_share: f64,
    pub top3_share: f64,
    pub top5_share: f64,
    pub top5pct_share: f64,
    pub top10pct_share: f64,
}

/// A record field value as seen by the filter language.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view; text parses if it looks like a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(n) => Some(*n as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Float(x) => write!(f, "{:.3}", x),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Derived metrics for one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Grouping key supplied by whoever discovered the record (e.g. its directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Gifts sorted in descending order.
    pub gifts: Vec<u64>,

    pub livescore: u64,

    /// Sum of gifts; always > 0.
    pub total_gift: u64,

    /// livescore / total_gift.
    pub rate: f64,

    pub max_coin: u64,

    #[serde(flatten)]
    pub thresholds: GiftThresholds,

    #[serde(flatten)]
    pub stats: GiftStats,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rank: Option<RankCode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<RankCode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    class: Option<u8>,
}

impl NormalizedRecord {
    /// Assemble a record from already-derived parts. The class starts unset.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        raw: &RawRecord,
        group: Option<String>,
        date: Option<String>,
        gifts: Vec<u64>,
        total_gift: u64,
        max_coin: u64,
        thresholds: GiftThresholds,
        stats: GiftStats,
    ) -> Self {
        NormalizedRecord {
            label: raw.label.clone(),
            date,
            group,
            gifts,
            livescore: raw.livescore,
            total_gift,
            rate: raw.livescore as f64 / total_gift as f64,
            max_coin,
            thresholds,
            stats,
            user_rank: raw.user_rank.clone(),
            rank: raw.rank.clone(),
            following: raw.following,
            followers: raw.followers,
            class: None,
        }
    }

    /// Band class, once assigned.
    pub fn class(&self) -> Option<u8> {
        self.class
    }

    /// Attach the band class. Reassigning a different class is refused.
    pub fn set_class(&mut self, class: u8) -> crate::Result<()> {
        match self.class {
            Some(existing) if existing != class => Err(crate::Error::data(format!(
                "record {} already classified as {}, refusing {}",
                self.display_id(),
                existing,
                class
            ))),
            _ => {
                self.class = Some(class);
                Ok(())
            }
        }
    }

    /// Number of gifts.
    pub fn gift_count(&self) -> usize {
        self.gifts.len()
    }

    /// Number of gifts worth at least `coin`.
    pub fn count_at_least(&self, coin: u64) -> usize {
        // Sorted descending, so the qualifying gifts form a prefix.
        self.gifts.partition_point(|&g| g >= coin)
    }

    /// Label, date, or group: whichever identifies the record best.
    pub fn display_id(&self) -> String {
        self.label
            .clone()
            .or_else(|| self.date.clone())
            .or_else(|| self.group.clone())
            .unwrap_or_else(|| format!("<total_gift={}>", self.total_gift))
    }

    /// Look a field up by its report key.
    pub fn field(&self, key: &str) -> Option<FieldValue> {
        let int = |n: u64| Some(FieldValue::Int(n as i64));
        let count = |n: usize| Some(FieldValue::Int(n as i64));
        match key {
            "total_gift" | "gift" => int(self.total_gift),
            "livescore" | "score" => int(self.livescore),
            "rate" => Some(FieldValue::Float(self.rate)),
            "max_coin" | "max" => int(self.max_coin),
            "gift_count" => count(self.gift_count()),
            "1000coin" => count(self.thresholds.ge1000),
            "100coin" => count(self.thresholds.ge100),
            "10coin" => count(self.thresholds.ge10),
            "5coin" => count(self.thresholds.ge5),
            "1coin" => count(self.thresholds.ge1),
            "0coin" => count(self.thresholds.ge0),
            "avg_ge5" => self.stats.avg_ge5.map(FieldValue::Float),
            "avg_all" => Some(FieldValue::Float(self.stats.avg_all)),
            "median_ge5" => self.stats.median_ge5.and_then(int),
            "median_all" => int(self.stats.median_all),
            "top1_share" => Some(FieldValue::Float(self.stats.top1_share)),
            "top3_share" => Some(FieldValue::Float(self.stats.top3_share)),
            "top5_share" => Some(FieldValue::Float(self.stats.top5_share)),
            "top5pct_share" => Some(FieldValue::Float(self.stats.top5pct_share)),
            "top10pct_share" => Some(FieldValue::Float(self.stats.top10pct_share)),
            "triple_gift" | "3xgift" => int(self.total_gift.saturating_mul(3)),
            "date" => self.date.clone().map(FieldValue::Text),
            "label" => self.label.clone().map(FieldValue::Text),
            "group" => self.group.clone().map(FieldValue::Text),
            "rank" => self.rank.as_ref().map(rank_value),
            "user_rank" => self.user_rank.as_ref().map(rank_value),
            "following" => self.following.and_then(int),
            "followers" => self.followers.and_then(int),
            "class" => self.class.map(|c| FieldValue::Int(c as i64)),
            _ => None,
        }
    }
}

fn rank_value(rank: &RankCode) -> FieldValue {
    match rank {
        RankCode::Number(n) => FieldValue::Int(*n as i64),
        RankCode::Code(s) => FieldValue::Text(s.clone()),
    }
}
