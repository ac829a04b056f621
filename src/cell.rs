use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single non-empty cell value as it appears in a sheet or a JSON request body.
///
/// Numbers keep their integer/float form so that values read from the workbook are
/// written back unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl CellValue {
    /// Truthiness used by the required-field checks: `false`, `0`, NaN and empty
    /// text are all treated as missing.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            CellValue::Text(s) => !s.is_empty(),
        }
    }

    /// Numeric reading of the value. Text is parsed leniently; anything that
    /// doesn't parse to a finite number yields `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Number(n) => n.as_f64(),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        }
    }

    /// Label used for grouping keys (store, week) in reports.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n.into())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        // NaN/inf are not representable in JSON; store them as text instead.
        serde_json::Number::from_f64(n)
            .map(CellValue::Number)
            .unwrap_or_else(|| CellValue::Text(n.to_string()))
    }
}

/// Deserialize a text field that may have been stored as a number in the workbook.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match CellValue::deserialize(deserializer)? {
        CellValue::Text(s) => Ok(s),
        CellValue::Number(n) => Ok(n.to_string()),
        CellValue::Bool(b) => Err(de::Error::custom(format!(
            "expected text, found boolean {}",
            b
        ))),
    }
}

/// Deserialize a non-negative whole number, truncating fractions and treating
/// anything non-numeric as 0.
pub fn count_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<CellValue>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_f64())
        .filter(|f| *f >= 0.0)
        .map(|f| f as u64)
        .unwrap_or(0))
}

/// Numeric reading of an optional cell, treating anything non-numeric as 0.
pub fn number_or_zero(value: Option<&CellValue>) -> f64 {
    value.and_then(CellValue::as_f64).unwrap_or(0.0)
}
