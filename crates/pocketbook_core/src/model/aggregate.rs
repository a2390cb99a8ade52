//! Column aggregate types and numeric cell parsing.
//!
//! # Responsibility
//! - Name the supported summary statistics.
//! - Interpret raw cell text as numbers at the aggregation boundary.
//!
//! # Invariants
//! - Parsing never yields NaN or infinities; such cells are excluded.
//! - Aggregating an empty value set yields `None`, never zero.

use crate::model::list::ColumnId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Leading ASCII decimal literal with optional exponent; trailing text is ignored.
static NUMERIC_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
        .expect("valid numeric prefix regex")
});

/// Summary statistic computed over a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOp {
    Sum,
    Average,
    Min,
    Max,
}

impl AggregateOp {
    pub const ALL: [AggregateOp; 4] = [Self::Sum, Self::Average, Self::Min, Self::Max];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "average",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "average" | "avg" => Some(Self::Average),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    /// Applies this statistic to already-parsed values.
    ///
    /// Values are folded in slice order, so equal input yields bit-identical
    /// output.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        let result = match self {
            Self::Sum => values.iter().sum(),
            Self::Average => values.iter().sum::<f64>() / values.len() as f64,
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Some(result)
    }
}

/// Ephemeral result of one aggregate computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub column_id: ColumnId,
    pub op: AggregateOp,
    pub value: f64,
    /// Number of cells that parsed as numbers.
    pub sample_count: usize,
}

/// Parses the numeric prefix of a raw cell value.
///
/// Leading whitespace is skipped and trailing non-numeric text is ignored
/// (`"12abc"` is 12). Returns `None` when no numeric prefix exists or the
/// value is not finite.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let caps = NUMERIC_PREFIX_RE.captures(raw)?;
    let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}
