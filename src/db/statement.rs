//! Statement counting for query strings.
//!
//! Uses the sqlparser-rs tokenizer with the SQLite dialect, so semicolons
//! inside literals, quoted identifiers and comments are not separators.

use sqlparser::dialect::SQLiteDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::error::{EvalError, Result};

/// Engine message for a query string holding more than one statement.
pub const MULTIPLE_STATEMENTS: &str = "You can only execute one statement at a time.";

/// Counts the non-empty statements in `sql`.
///
/// Returns `None` when the string cannot be tokenized; the engine reports
/// the syntax error in that case.
pub fn count_statements(sql: &str) -> Option<usize> {
    let tokens = Tokenizer::new(&SQLiteDialect {}, sql).tokenize().ok()?;

    let mut count = 0;
    let mut in_statement = false;
    for token in &tokens {
        match token {
            Token::SemiColon => in_statement = false,
            Token::Whitespace(_) | Token::EOF => {}
            _ if !in_statement => {
                in_statement = true;
                count += 1;
            }
            _ => {}
        }
    }
    Some(count)
}

/// Rejects query strings with more than one statement.
///
/// Trailing semicolons, whitespace and comments do not count as statements.
pub fn ensure_single_statement(sql: &str) -> Result<()> {
    match count_statements(sql) {
        Some(count) if count > 1 => Err(EvalError::query(MULTIPLE_STATEMENTS)),
        _ => Ok(()),
    }
}
