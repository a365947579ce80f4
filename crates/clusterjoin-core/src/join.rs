//! Join parameters and join-key normalization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Scalar;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported join type '{0}': expected one of inner, left, right")]
pub struct JoinTypeParseError(pub String);

impl FromStr for JoinType {
    type Err = JoinTypeParseError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinType::Inner),
            "left" => Ok(JoinType::Left),
            "right" => Ok(JoinType::Right),
            _ => Err(JoinTypeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
        };
        f.write_str(s)
    }
}

/// Key column and join kind for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub key: String,
    pub join_type: JoinType,
}

impl JoinSpec {
    pub fn new(key: impl Into<String>, join_type: JoinType) -> Self {
        Self {
            key: key.into(),
            join_type,
        }
    }
}

/// Hashable form of a join-key cell.
///
/// Numeric text is compared by value, so `1`, `01` and `1.0` are the same key.
/// Missing values and NaN never produce a key and therefore never match.
/// Integers outside `i64` stay `Text`, so long identifiers never collide
/// through float rounding. Tokens such as `NA` or `null` are ordinary text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Int(i64),
    /// IEEE bits of a non-integral finite-or-infinite float (`-0.0` folded into `Int(0)`).
    Float(u64),
    Text(String),
}

impl KeyValue {
    pub fn from_scalar(v: &Scalar) -> Option<Self> {
        v.as_str().and_then(Self::parse)
    }

    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(i) = s.parse::<i64>() {
            return Some(KeyValue::Int(i));
        }
        if is_integer_literal(s) {
            return Some(KeyValue::Text(s.to_string()));
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_nan() {
                return None;
            }
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                return Some(KeyValue::Int(f as i64));
            }
            return Some(KeyValue::Float(f.to_bits()));
        }
        Some(KeyValue::Text(s.to_string()))
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
