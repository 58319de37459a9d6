//! Record normalization: raw rows in, validated events out.
//!
//! Malformed rows are dropped, never raised. Each drop is counted in a
//! [`NormalizeReport`] so callers can surface how much of the input was lost.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::event::{Event, RawRecord, UNKNOWN_TRANSITION};

/// Naive layouts accepted in addition to RFC 3339. Interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Why a row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// Timestamp missing or not parseable.
    InvalidTimestamp,
    /// URL missing or blank.
    MissingUrl,
    /// URL scheme not in the allow-list.
    DisallowedScheme,
}

/// Diagnostics for one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// Rows seen.
    pub total_rows: usize,
    /// Rows turned into events.
    pub retained: usize,
    pub invalid_timestamp: usize,
    pub missing_url: usize,
    pub disallowed_scheme: usize,
}

impl NormalizeReport {
    /// Total rows dropped for any reason.
    pub const fn discarded(&self) -> usize {
        self.invalid_timestamp + self.missing_url + self.disallowed_scheme
    }

    fn record(&mut self, reason: DiscardReason) {
        match reason {
            DiscardReason::InvalidTimestamp => self.invalid_timestamp += 1,
            DiscardReason::MissingUrl => self.missing_url += 1,
            DiscardReason::DisallowedScheme => self.disallowed_scheme += 1,
        }
    }
}

/// Parses a timestamp in RFC 3339 or one of the naive export layouts.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Returns the lower-cased scheme of a URL, if it has one.
fn url_scheme(url: &str) -> Option<String> {
    let (scheme, _) = url.split_once(':')?;
    let valid = scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}

/// Validates a single row.
///
/// An empty `allowed_schemes` accepts every URL.
pub fn normalize_record(raw: &RawRecord, allowed_schemes: &[String]) -> Result<Event, DiscardReason> {
    let timestamp = raw
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .ok_or(DiscardReason::InvalidTimestamp)?;

    // Blank checks look at trimmed text; stored fields keep the raw value.
    let url = raw
        .url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or(DiscardReason::MissingUrl)?;

    if !allowed_schemes.is_empty() {
        let allowed = url_scheme(url.trim())
            .is_some_and(|scheme| allowed_schemes.iter().any(|a| a.eq_ignore_ascii_case(&scheme)));
        if !allowed {
            return Err(DiscardReason::DisallowedScheme);
        }
    }

    let transition_type = raw
        .transition
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(UNKNOWN_TRANSITION)
        .to_string();

    Ok(Event {
        timestamp,
        url: url.to_string(),
        transition_type,
        title: raw.title.clone().filter(|t| !t.trim().is_empty()),
    })
}

/// Validates every row, keeping input order.
pub fn normalize<'a, I>(rows: I, allowed_schemes: &[String]) -> (Vec<Event>, NormalizeReport)
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut report = NormalizeReport::default();
    let mut events = Vec::new();

    for (index, raw) in rows.into_iter().enumerate() {
        report.total_rows += 1;
        match normalize_record(raw, allowed_schemes) {
            Ok(event) => events.push(event),
            Err(reason) => {
                tracing::trace!(row = index, ?reason, "discarding malformed row");
                report.record(reason);
            }
        }
    }
    report.retained = events.len();

    if report.discarded() > 0 {
        tracing::warn!(
            discarded = report.discarded(),
            invalid_timestamp = report.invalid_timestamp,
            missing_url = report.missing_url,
            disallowed_scheme = report.disallowed_scheme,
            "dropped malformed rows"
        );
    }
    tracing::debug!(rows = report.total_rows, events = report.retained, "normalized rows");

    (events, report)
}
