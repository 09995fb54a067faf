//! Row-set comparison of query results.
//!
//! Two results are equivalent when their rows, taken as sets of tuples, are
//! equal: row order and duplicate counts are ignored. Cells are compared
//! positionally, so the same columns selected in a different order do not
//! match. That mirrors plain tuple comparison and is kept for parity with
//! published execution-accuracy numbers.

use crate::db::{QueryResult, Row, Value};
use std::collections::HashSet;

/// Hashable form of a cell.
///
/// Integral floats collapse onto the integer of the same value, so `1` and
/// `1.0` (and `0.0` and `-0.0`) are the same cell, as they are for a
/// dynamically typed SQLite client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CellKey {
    Null,
    Int(i64),
    Float(u64),
    Text(String),
    Bytes(Vec<u8>),
}

/// 2^63, the first float above the i64 range.
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl From<&Value> for CellKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => CellKey::Null,
            Value::Int(i) => CellKey::Int(*i),
            Value::Float(f) => float_key(*f),
            Value::String(s) => CellKey::Text(s.clone()),
            Value::Bytes(b) => CellKey::Bytes(b.clone()),
        }
    }
}

fn float_key(f: f64) -> CellKey {
    if f.is_nan() {
        return CellKey::Float(f64::NAN.to_bits());
    }
    if f.fract() == 0.0 && f >= -I64_UPPER_BOUND && f < I64_UPPER_BOUND {
        return CellKey::Int(f as i64);
    }
    CellKey::Float(f.to_bits())
}

/// The distinct rows of a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSet {
    rows: HashSet<Vec<CellKey>>,
}

impl RowSet {
    /// Collects `rows` into a set, dropping order and duplicates.
    pub fn from_rows(rows: &[Row]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(CellKey::from).collect())
                .collect(),
        }
    }

    /// Number of distinct rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<&QueryResult> for RowSet {
    fn from(result: &QueryResult) -> Self {
        Self::from_rows(&result.rows)
    }
}

/// Returns true if both results hold the same set of rows.
pub fn results_equivalent(predicted: &QueryResult, reference: &QueryResult) -> bool {
    RowSet::from(predicted) == RowSet::from(reference)
}
