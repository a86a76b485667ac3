//! `key<op>value` conditions over normalized-record fields.
//!
//! Operators: `<`, `>`, `=`, `<=`, `>=`, and `=~` (regex search). A value
//! made of digits only is an integer; anything else must parse as a float,
//! except for `=~` where it is a regex pattern. A record without the key
//! never matches.

use gs_common::{Error, FieldValue, NormalizedRecord, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Lt,
    Gt,
    Eq,
    Le,
    Ge,
    Matches,
}

impl Op {
    fn parse(token: &str) -> Option<Op> {
        match token {
            "<" => Some(Op::Lt),
            ">" => Some(Op::Gt),
            "=" => Some(Op::Eq),
            "<=" => Some(Op::Le),
            ">=" => Some(Op::Ge),
            "=~" => Some(Op::Matches),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Op::Lt => "<",
            Op::Gt => ">",
            Op::Eq => "=",
            Op::Le => "<=",
            Op::Ge => ">=",
            Op::Matches => "=~",
        }
    }

    fn accepts(self, ord: Ordering) -> bool {
        match self {
            Op::Lt => ord == Ordering::Less,
            Op::Gt => ord == Ordering::Greater,
            Op::Eq => ord == Ordering::Equal,
            Op::Le => ord != Ordering::Greater,
            Op::Ge => ord != Ordering::Less,
            Op::Matches => false,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone)]
pub enum Operand {
    Int(i64),
    Float(f64),
    Pattern(Regex),
}

impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operand::Int(a), Operand::Int(b)) => a == b,
            (Operand::Float(a), Operand::Float(b)) => a == b,
            (Operand::Pattern(a), Operand::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// One parsed `key<op>value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub key: String,
    pub op: Op,
    pub value: Operand,
}

impl Condition {
    /// Whether the record satisfies the condition. Missing keys never match.
    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        let Some(field) = record.field(&self.key) else {
            return false;
        };
        match (&self.value, &field) {
            (Operand::Pattern(re), _) => re.is_match(&field.to_string()),
            (Operand::Int(want), FieldValue::Int(have)) => self.op.accepts(have.cmp(want)),
            (Operand::Int(want), _) => compare_f64(&field, *want as f64, self.op),
            (Operand::Float(want), _) => compare_f64(&field, *want, self.op),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Operand::Int(v) => write!(f, "{}{}{}", self.key, self.op, v),
            Operand::Float(v) => write!(f, "{}{}{}", self.key, self.op, v),
            Operand::Pattern(re) => write!(f, "{}{}{}", self.key, self.op, re.as_str()),
        }
    }
}

fn compare_f64(field: &FieldValue, want: f64, op: Op) -> bool {
    field
        .as_f64()
        .and_then(|have| have.partial_cmp(&want))
        .is_some_and(|ord| op.accepts(ord))
}

static RE_CONDITION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*?)(=~|[<=>]+)(.*)$").unwrap());
static RE_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Parse a `key<op>value` condition.
pub fn parse_condition(text: &str) -> Result<Condition> {
    let trimmed = text.trim();
    let caps = RE_CONDITION
        .captures(trimmed)
        .ok_or_else(|| Error::condition(text, "no comparison operator"))?;
    let key = caps[1].trim();
    let token = &caps[2];
    let raw_value = caps[3].trim();

    if key.is_empty() {
        return Err(Error::condition(text, "missing key"));
    }
    let op = Op::parse(token)
        .ok_or_else(|| Error::condition(text, format!("unknown operator '{}'", token)))?;
    if raw_value.is_empty() {
        return Err(Error::condition(text, "missing value"));
    }

    let value = if op == Op::Matches {
        Regex::new(raw_value)
            .map(Operand::Pattern)
            .map_err(|e| Error::condition(text, format!("bad pattern: {}", e)))?
    } else if RE_INTEGER.is_match(raw_value) {
        raw_value
            .parse::<i64>()
            .map(Operand::Int)
            .map_err(|_| Error::condition(text, "integer out of range"))?
    } else {
        raw_value
            .parse::<f64>()
            .map(Operand::Float)
            .map_err(|_| Error::condition(text, format!("'{}' is not a number", raw_value)))?
    };

    Ok(Condition {
        key: key.to_string(),
        op,
        value,
    })
}

/// A conjunction of conditions. The empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Predicate { conditions }
    }

    /// Parse every condition; the first malformed one fails the whole set.
    pub fn parse_all<S: AsRef<str>>(texts: &[S]) -> Result<Self> {
        texts
            .iter()
            .map(|t| parse_condition(t.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Predicate::new)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn apply(&self, record: &NormalizedRecord) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

/// Apply a predicate to a record.
pub fn apply(predicate: &Predicate, record: &NormalizedRecord) -> bool {
    predicate.apply(record)
}
