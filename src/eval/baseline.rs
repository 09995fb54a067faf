//! Exact-match baseline.
//!
//! Normalized string equality between predicted and reference SQL. Reported
//! next to execution accuracy as a lower bound.

/// Trims whitespace, lowercases and strips trailing semicolons.
pub fn normalize_sql(sql: &str) -> String {
    sql.trim().to_lowercase().trim_end_matches(';').to_string()
}

/// Returns true if both queries are equal after normalization.
pub fn is_exact_match(predicted: &str, reference: &str) -> bool {
    normalize_sql(predicted) == normalize_sql(reference)
}
