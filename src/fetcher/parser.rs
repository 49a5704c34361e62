//! Cost report parser
//!
//! Stateless conversion of a `reporting/cost` JSON payload into
//! [`SpendRecord`]s. Any deviation from the expected shape is reported as
//! [`FetchError::MalformedResponse`].

use crate::fetcher::{FetchError, FetchResult};
use crate::window::DateWindow;
use crate::{SpendRecord, VendorAccount, UNKNOWN_TAG};
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Dimensions requested from the cost API, in request order
pub const DIMENSIONS: &[&str] = &[
    "resource_identifier",
    "enhanced_service_name",
    "tag1",
    "tag8",
    "tag13",
    "date",
];

/// Metrics requested from the cost API, in request order
pub const METRICS: &[&str] = &[
    "unblended_cost",
    "adjusted_cost",
    "usage_hours",
    "usage_quantity",
];

/// Tag values the provider uses for "no tag present"
const UNSET_TAG_VALUES: &[&str] = &["", "(not set)"];

/// Stateless parser for cost report payloads
pub struct SpendParser;

impl SpendParser {
    /// Parse a full report body.
    ///
    /// Every record must be dated inside `window`; a record outside it means
    /// the provider ignored the requested range.
    pub fn parse_report(
        body: &Value,
        window: &DateWindow,
        account: &VendorAccount,
    ) -> FetchResult<Vec<SpendRecord>> {
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed("response has no 'results' array"))?;

        let mut records = Vec::with_capacity(results.len());
        for (index, row) in results.iter().enumerate() {
            let row = row
                .as_object()
                .ok_or_else(|| malformed(format!("result {index} is not an object")))?;
            let record = Self::parse_row(row, account)
                .map_err(|e| malformed(format!("result {index}: {e}")))?;

            if !window.contains(record.date) {
                return Err(malformed(format!(
                    "result {index} is dated {} which is outside {window}",
                    record.date
                )));
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Parse one result row
    pub fn parse_row(row: &Map<String, Value>, account: &VendorAccount) -> Result<SpendRecord, String> {
        Ok(SpendRecord {
            date: parse_date(required_str(row, "date")?)?,
            vendor_id: account.id.clone(),
            vendor_name: account.name.clone(),
            resource_id: optional_str(row, "resource_identifier").to_string(),
            service_name: optional_str(row, "enhanced_service_name").to_string(),
            name: optional_str(row, "tag1").to_string(),
            owner_email: tag_or_unknown(row, "tag13"),
            application_env: tag_or_unknown(row, "tag8"),
            unblended_cost: parse_amount(row, "unblended_cost")?,
            adjusted_cost: parse_amount(row, "adjusted_cost")?,
            usage_hours: parse_amount(row, "usage_hours")?,
            usage_quantity: parse_amount(row, "usage_quantity")?,
        })
    }
}

/// Parse a currency string such as `"$1,234.50"` or `"-$0.12"`
pub fn clean_currency(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let digits: String = rest.trim_start_matches('$').chars().filter(|c| *c != ',').collect();
    let amount = Decimal::from_str(&digits).ok()?;
    Some(if negative { -amount } else { amount })
}

fn malformed(message: impl Into<String>) -> FetchError {
    FetchError::MalformedResponse(message.into())
}

fn required_str<'a>(row: &'a Map<String, Value>, field: &str) -> Result<&'a str, String> {
    row.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing or non-string '{field}'"))
}

fn optional_str<'a>(row: &'a Map<String, Value>, field: &str) -> &'a str {
    row.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn tag_or_unknown(row: &Map<String, Value>, field: &str) -> String {
    let value = optional_str(row, field).trim();
    if UNSET_TAG_VALUES.contains(&value) {
        UNKNOWN_TAG.to_string()
    } else {
        value.to_string()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| format!("invalid date '{value}'"))
}

fn parse_amount(row: &Map<String, Value>, field: &str) -> Result<Decimal, String> {
    match row.get(field) {
        Some(Value::String(s)) => {
            clean_currency(s).ok_or_else(|| format!("invalid amount '{s}' in '{field}'"))
        }
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(|_| format!("invalid amount {n} in '{field}'")),
        Some(_) => Err(format!("'{field}' is neither a string nor a number")),
        None => Err(format!("missing '{field}'")),
    }
}
