//! Browsing events, from raw rows to enriched records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Transition label used when a row does not say how the page was reached.
pub const UNKNOWN_TRANSITION: &str = "unknown";

/// One untyped row of a browsing-history export.
///
/// Every field is optional; validation happens in [`crate::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "eventtimeutc", alias = "time")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "transition_type")]
    pub transition: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl RawRecord {
    /// Convenience constructor for the two required fields.
    pub fn new(timestamp: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            url: Some(url.into()),
            transition: None,
            title: None,
        }
    }

    /// Sets the transition label.
    #[must_use]
    pub fn with_transition(mut self, transition: impl Into<String>) -> Self {
        self.transition = Some(transition.into());
        self
    }
}

/// A validated browsing action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// When the page was visited.
    pub timestamp: DateTime<Utc>,
    /// The visited URL. Never empty.
    pub url: String,
    /// How the page was reached (`link`, `typed`, ...).
    pub transition_type: String,
    /// Page title, when the export has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// An event with its derived features.
///
/// Produced only by [`crate::enrich`]; derived fields are computed once from
/// the wrapped event and the run's reference timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedEvent {
    #[serde(flatten)]
    pub event: Event,
    /// Lower-cased host of the URL, or `unknown`.
    pub domain: String,
    /// Category label, or `uncategorized`.
    pub category: String,
    /// Hour of day, 0-23, in the reference timezone.
    pub hour: u32,
    /// Day of week, 0 (Monday) to 6 (Sunday), in the reference timezone.
    pub weekday: u32,
    /// Calendar date in the reference timezone.
    pub date: NaiveDate,
}

/// Anything that sits on the timeline.
///
/// Lets segmentation work with enriched events as well as test fixtures.
pub trait Timestamped {
    /// Returns the event's timestamp.
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Timestamped for Event {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for EnrichedEvent {
    fn timestamp(&self) -> DateTime<Utc> {
        self.event.timestamp
    }
}

impl Timestamped for DateTime<Utc> {
    fn timestamp(&self) -> DateTime<Utc> {
        *self
    }
}
