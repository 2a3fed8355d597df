//! Timestamp normalization for export data.
//!
//! Export files carry epoch seconds; tables show ISO-8601 and are ordered
//! newest first. Both directions fail open: bad input is passed through or
//! sorted last, never raised.

use crate::denest::stringify;
use crate::error::{ExtractError, Result};
use crate::types::Row;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::debug;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Convert epoch seconds to an ISO-8601 UTC string, e.g. `1970-01-01T00:00:00+00:00`.
///
/// Accepts JSON integers, floats (truncated) and strings holding an integer.
/// Anything else is returned stringified and unchanged.
pub fn epoch_to_iso(raw: &Value) -> String {
    match epoch_seconds(raw).and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, false),
        None => {
            debug!(value = %raw, "could not convert epoch timestamp");
            stringify(raw)
        }
    }
}

/// [`epoch_to_iso`] for text pulled out of a flattened record
pub fn epoch_str_to_iso(raw: &str) -> String {
    epoch_to_iso(&Value::String(raw.to_string()))
}

fn epoch_seconds(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            // `as` saturates, so keep the range check explicit
            (f.is_finite() && f.abs() < i64::MAX as f64).then(|| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_iso(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(ExtractError::MalformedTimestamp(raw.to_string()))
}

/// Sort key for the timestamp at `column` of `row`.
///
/// Newer timestamps give smaller keys, so an ascending sort puts the most
/// recent row first. Missing, empty or unparsable values give `+inf`.
pub fn sort_key(row: &[Value], column: usize) -> f64 {
    let Some(Value::String(raw)) = row.get(column) else {
        return f64::INFINITY;
    };
    if raw.is_empty() {
        return f64::INFINITY;
    }

    match parse_iso(raw) {
        Ok(dt) => -(dt.timestamp_micros() as f64 / 1_000_000.0),
        Err(e) => {
            debug!("cannot convert timestamp: {}", e);
            f64::INFINITY
        }
    }
}

/// Stable sort, newest first, undated rows last
pub fn sort_rows_by_timestamp(rows: &mut [Row], column: usize) {
    rows.sort_by(|a, b| sort_key(a, column).total_cmp(&sort_key(b, column)));
}
