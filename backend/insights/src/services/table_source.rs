use anyhow::{bail, Context, Result};
use reqwest::Client;
use tracing::info;

use crate::models::AttemptRecord;

const DATE_ATTEMPTED_COLUMN: &str = "Date Attempted";
const ATTEMPTED_COLUMN: &str = "Attempted";
const CORRECTNESS_COLUMN: &str = "Correctness";
const FAILURE_REASON_COLUMN: &str = "Failure Reason";

/// Fetches the attempt log from its CSV export URL. The table is read
/// fresh on every run and never cached.
pub struct SpreadsheetSource {
    client: Client,
    url: String,
}

impl SpreadsheetSource {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }

    pub async fn fetch(&self) -> Result<Vec<AttemptRecord>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to fetch attempt log spreadsheet")?
            .error_for_status()
            .context("Spreadsheet export returned error status")?
            .text()
            .await
            .context("Failed to read spreadsheet response body")?;

        let records = parse_records(&body)?;
        info!(rows = records.len(), "Attempt log loaded");
        Ok(records)
    }
}

/// Parses the CSV export into attempt records. Columns are resolved by
/// header name, so extra columns and arbitrary column order are fine.
pub fn parse_records(csv: &str) -> Result<Vec<AttemptRecord>> {
    let mut rows = split_rows(csv).into_iter();

    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };

    let date_idx = column_index(&header, DATE_ATTEMPTED_COLUMN)?;
    let attempted_idx = column_index(&header, ATTEMPTED_COLUMN)?;
    let correctness_idx = column_index(&header, CORRECTNESS_COLUMN)?;
    let reason_idx = column_index(&header, FAILURE_REASON_COLUMN)?;

    let mut records = Vec::new();
    for (row_number, fields) in rows.enumerate() {
        if fields.iter().all(|field| field.is_empty()) {
            continue;
        }

        let record = AttemptRecord {
            date_attempted: field_at(&fields, date_idx).to_string(),
            attempted: parse_flag(field_at(&fields, attempted_idx))
                .with_context(|| format!("Bad '{}' value in row {}", ATTEMPTED_COLUMN, row_number + 2))?,
            correctness: parse_flag(field_at(&fields, correctness_idx))
                .with_context(|| format!("Bad '{}' value in row {}", CORRECTNESS_COLUMN, row_number + 2))?,
            failure_reason: match field_at(&fields, reason_idx).trim() {
                "" => None,
                reason => Some(reason.to_string()),
            },
        };
        records.push(record);
    }

    Ok(records)
}

fn column_index(header: &[String], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|column| column.trim() == name)
        .with_context(|| format!("Spreadsheet is missing required column '{}'", name))
}

fn field_at(fields: &[String], index: usize) -> &str {
    fields.get(index).map(String::as_str).unwrap_or("")
}

/// Boolean cells as Google Sheets exports them. Blank counts as false
/// (an unattempted row rather than a parse failure).
fn parse_flag(value: &str) -> Result<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" || trimmed.is_empty() {
        Ok(false)
    } else {
        bail!("'{}' is not a boolean cell", value)
    }
}

/// Splits CSV text into rows of fields. Quoted fields may contain
/// commas, doubled quotes, and line breaks.
fn split_rows(csv: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = csv.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            '\r' if !in_quotes => {
                // Swallowed; the following '\n' terminates the row.
            }
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut fields));
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        rows.push(fields);
    }

    rows
}
