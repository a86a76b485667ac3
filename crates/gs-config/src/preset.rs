//! Expected-score model presets.
//!
//! Each preset is a calibration snapshot from an earlier fitting run: an
//! ordered list of `(intercept, slope)` line segments whose lower envelope
//! gives the expected livescore for a total gift amount.
//!
//! - `linear-3x` (v1): the flat "score is three times the gift" reference line
//! - `ru-v2` (v2): the two-segment fit; 3x below roughly 53k coins, shallower above

use serde::{Deserialize, Serialize};
use std::fmt;

/// One line `score = slope * total_gift + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub intercept: f64,
    pub slope: f64,
}

impl Segment {
    pub const fn new(intercept: f64, slope: f64) -> Self {
        Segment { intercept, slope }
    }

    /// Line value at `x`.
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Available model presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PresetName {
    /// Single line through the origin with slope 3
    #[serde(rename = "linear-3x", alias = "v1")]
    Linear3x,
    /// Two segments from the second calibration run
    #[default]
    #[serde(rename = "ru-v2", alias = "v2")]
    RuV2,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[PresetName::Linear3x, PresetName::RuV2];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Linear3x => "linear-3x",
            PresetName::RuV2 => "ru-v2",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "linear-3x" | "3x" | "v1" | "linear" => Some(PresetName::Linear3x),
            "ru-v2" | "ru" | "v2" => Some(PresetName::RuV2),
            _ => None,
        }
    }

    /// Calibration version of the preset.
    pub fn version(&self) -> u32 {
        match self {
            PresetName::Linear3x => 1,
            PresetName::RuV2 => 2,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Linear3x => "Reference line: expected score is three times the gift total",
            PresetName::RuV2 => {
                "Two-segment envelope: 3x at low totals, 2.675x + 17299 above the ~53k breakpoint"
            }
        }
    }

    /// Segments of the preset, in ascending validity order.
    pub fn segments(&self) -> Vec<Segment> {
        match self {
            PresetName::Linear3x => vec![Segment::new(0.0, 3.0)],
            PresetName::RuV2 => vec![
                Segment::new(0.0, 3.0),
                Segment::new(17_299.150_66, 2.675_280_793),
            ],
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    /// Unknown preset name.
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => {
                write!(
                    f,
                    "Unknown preset '{}'. Available: {}",
                    name,
                    PresetName::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for PresetError {}
