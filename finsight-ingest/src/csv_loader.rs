//! Load transaction exports from CSV.
//!
//! History files look like:
//! user_id,type,category,amount,date
//! u1,expense,Food,450.00,2025-01-14
//!
//! Statement files only need a `description` column; `amount` is optional.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use csv::StringRecord;
use finsight_core::{Transaction, TransactionKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A raw description line to be classified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub description: String,
    pub amount: Option<f64>,
}

/// Parse a date cell as RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

fn parse_amount(s: &str) -> Option<f64> {
    s.trim().replace(',', "").parse::<f64>().ok().filter(|a| a.is_finite())
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn required_column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    column(headers, name)
        .with_context(|| format!("{}: missing `{name}` column", path.display()))
}

fn parse_history_row(record: &StringRecord, cols: &[usize; 5]) -> Option<Transaction> {
    let [user, kind, category, amount, date] = *cols;
    let user_id = record.get(user)?.trim();
    if user_id.is_empty() {
        return None;
    }
    let kind = match record.get(kind)?.trim().to_ascii_lowercase().as_str() {
        "expense" => TransactionKind::Expense,
        "income" => TransactionKind::Income,
        _ => return None,
    };
    let amount = parse_amount(record.get(amount)?)?;
    let date = parse_timestamp(record.get(date)?)?;
    Some(Transaction::new(
        user_id,
        kind,
        record.get(category).unwrap_or("").trim(),
        amount,
        date,
    ))
}

/// Load a transaction history export, skipping rows that don't parse.
pub fn load_transactions_csv(path: impl AsRef<Path>) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = rdr
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .clone();
    let cols = [
        required_column(&headers, "user_id", path)?,
        required_column(&headers, "type", path)?,
        required_column(&headers, "category", path)?,
        required_column(&headers, "amount", path)?,
        required_column(&headers, "date", path)?,
    ];

    let mut txns = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result.with_context(|| format!("reading {}", path.display()))?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        match parse_history_row(&record, &cols) {
            Some(txn) => txns.push(txn),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!(path = %path.display(), skipped, "skipped unparseable history rows");
    }
    tracing::debug!(path = %path.display(), count = txns.len(), "loaded transaction history");
    Ok(txns)
}

/// Load descriptions (and amounts, when present) from a statement export.
pub fn load_statement_csv(path: impl AsRef<Path>) -> Result<Vec<StatementLine>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = rdr
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .clone();
    let desc_col = required_column(&headers, "description", path)?;
    let amount_col = column(&headers, "amount");

    let mut lines = Vec::new();
    for result in rdr.records() {
        let record = result.with_context(|| format!("reading {}", path.display()))?;
        let description = record.get(desc_col).unwrap_or("").to_string();
        let amount = amount_col.and_then(|i| record.get(i)).and_then(parse_amount);
        if description.is_empty() && amount.is_none() {
            continue;
        }
        lines.push(StatementLine {
            description,
            amount,
        });
    }
    Ok(lines)
}
