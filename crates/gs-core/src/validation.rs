//! Optional strict data-quality pass over normalized records.
//!
//! These checks catch upstream collection bugs. They are kept out of the
//! normalizer so that a structural failure (zero total) and a policy failure
//! (implausible rate) stay distinguishable.

use chrono::NaiveDate;
use gs_common::{Error, NormalizedRecord, Result};
use gs_config::{parse_record_date, ValidationPolicy};

/// A compiled validation policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    min_rate: f64,
    followers_from: Option<NaiveDate>,
}

impl Validator {
    /// Compile a policy, parsing the followers cutover date.
    pub fn new(policy: &ValidationPolicy) -> Result<Self> {
        let followers_from = match policy.followers_required_from.as_deref() {
            None => None,
            Some(s) => Some(parse_record_date(s).ok_or_else(|| {
                Error::Config(format!(
                    "validation.followers_required_from is not a YYYYMMDD date: {:?}",
                    s
                ))
            })?),
        };
        Ok(Validator {
            min_rate: policy.min_rate,
            followers_from,
        })
    }

    /// Check one record.
    pub fn check(&self, record: &NormalizedRecord) -> Result<()> {
        let Some(date_text) = record.date.as_deref() else {
            return Err(Error::MissingField {
                record: record.display_id(),
                field: "date".to_string(),
            });
        };

        if record.rate <= self.min_rate {
            return Err(Error::RateBelowFloor {
                record: record.display_id(),
                rate: record.rate,
                floor: self.min_rate,
            });
        }

        if let Some(cutover) = self.followers_from {
            let date = parse_record_date(date_text).ok_or_else(|| {
                Error::data(format!(
                    "record {} has malformed date {:?}",
                    record.display_id(),
                    date_text
                ))
            })?;
            if date >= cutover && record.followers.is_none() {
                return Err(Error::MissingField {
                    record: record.display_id(),
                    field: "followers".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Validate one record against a policy.
pub fn validate_record(record: &NormalizedRecord, policy: &ValidationPolicy) -> Result<()> {
    Validator::new(policy)?.check(record)
}

/// Validate every record; the first violation aborts.
pub fn validate_all(records: &[NormalizedRecord], policy: &ValidationPolicy) -> Result<()> {
    let validator = Validator::new(policy)?;
    records.iter().try_for_each(|r| validator.check(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use gs_common::RawRecord;

    fn policy(cutover: Option<&str>) -> ValidationPolicy {
        ValidationPolicy {
            strict: true,
            min_rate: 1.6,
            followers_required_from: cutover.map(str::to_string),
        }
    }

    fn record(raw: RawRecord) -> NormalizedRecord {
        normalize(&raw, None).unwrap()
    }

    #[test]
    fn healthy_record_passes() {
        let rec = record(RawRecord::new(vec![100], 300).with_date("20250101"));
        validate_record(&rec, &policy(None)).unwrap();
    }

    #[test]
    fn missing_date_fails() {
        let rec = record(RawRecord::new(vec![100], 300));
        let err = validate_record(&rec, &policy(None)).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "date"));
    }

    #[test]
    fn rate_at_floor_fails() {
        let rec = record(RawRecord::new(vec![100], 160).with_date("20250101"));
        let err = validate_record(&rec, &policy(None)).unwrap_err();
        assert!(matches!(err, Error::RateBelowFloor { .. }));
        assert_eq!(err.code(), 12);
    }

    #[test]
    fn followers_required_from_cutover() {
        let p = policy(Some("20250401"));
        let before = record(RawRecord::new(vec![100], 300).with_date("20250331"));
        validate_record(&before, &p).unwrap();

        let on = record(RawRecord::new(vec![100], 300).with_date("20250401"));
        let err = validate_record(&on, &p).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "followers"));

        let with = record(
            RawRecord::new(vec![100], 300)
                .with_date("20250401")
                .with_followers(10),
        );
        validate_record(&with, &p).unwrap();
    }

    #[test]
    fn bad_cutover_is_config_error() {
        let err = Validator::new(&policy(Some("April"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn validate_all_stops_at_first_violation() {
        let good = record(RawRecord::new(vec![100], 300).with_date("20250101"));
        let bad = record(RawRecord::new(vec![100], 100).with_date("20250101"));
        validate_all(&[good.clone()], &policy(None)).unwrap();
        assert!(validate_all(&[good, bad], &policy(None)).is_err());
    }
}
