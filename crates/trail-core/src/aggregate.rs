//! Aggregation of enriched events and sessions into summary tables.
//!
//! Every function here is a pure reduction over borrowed input. Event-keyed
//! tables always sum to the number of events passed in; the session-length
//! distribution has one entry per session.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::Serialize;

use crate::event::{EnrichedEvent, Timestamped};
use crate::segment::Session;

/// Weekdays in bucket order (Monday = 0).
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// One row of a summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow<K> {
    pub key: K,
    pub count: usize,
}

/// A count row with its share of the table total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareRow<K> {
    pub key: K,
    pub count: usize,
    /// `count / total`, 0.0 for an empty table.
    pub share: f64,
}

/// Mapping from a grouping key to a count, in a fixed row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryTable<K> {
    rows: Vec<CountRow<K>>,
}

impl<K> SummaryTable<K> {
    pub const fn new(rows: Vec<CountRow<K>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CountRow<K>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    /// The first `n` rows (all rows if there are fewer).
    pub fn top(&self, n: usize) -> &[CountRow<K>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Row with the highest count; the earliest row wins ties.
    pub fn peak(&self) -> Option<&CountRow<K>> {
        self.rows
            .iter()
            .filter(|r| r.count > 0)
            .fold(None, |best: Option<&CountRow<K>>, row| match best {
                Some(b) if b.count >= row.count => Some(b),
                _ => Some(row),
            })
    }

    #[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
    pub fn share(&self, count: usize) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    }
}

impl<K: Clone> SummaryTable<K> {
    /// The same rows ranked by count descending. Equal counts keep their
    /// current order, so a date-ordered table puts the earliest date first.
    pub fn ranked_by_count(&self) -> Self {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        Self::new(rows)
    }

    /// Rows annotated with their share of the total.
    pub fn with_shares(&self) -> Vec<ShareRow<K>> {
        self.rows
            .iter()
            .map(|r| ShareRow {
                key: r.key.clone(),
                count: r.count,
                share: self.share(r.count),
            })
            .collect()
    }
}

impl<K: PartialEq> SummaryTable<K> {
    /// Count for `key`, if the table has a row for it.
    pub fn get(&self, key: &K) -> Option<usize> {
        self.rows.iter().find(|r| &r.key == key).map(|r| r.count)
    }
}

/// Counts keys, ranks by count descending, first-seen order on ties.
fn ranked<K, I>(keys: I) -> SummaryTable<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut rows: Vec<CountRow<K>> = Vec::new();

    for key in keys {
        if let Some(&i) = index.get(&key) {
            rows[i].count += 1;
        } else {
            index.insert(key.clone(), rows.len());
            rows.push(CountRow { key, count: 1 });
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    SummaryTable::new(rows)
}

/// Events per domain, most visited first.
pub fn domain_frequency(events: &[EnrichedEvent]) -> SummaryTable<String> {
    ranked(events.iter().map(|e| e.domain.clone()))
}

/// Events per category, most frequent first. Use [`SummaryTable::with_shares`]
/// for the share of total events.
pub fn category_distribution(events: &[EnrichedEvent]) -> SummaryTable<String> {
    ranked(events.iter().map(|e| e.category.clone()))
}

/// Events per transition type, most frequent first.
pub fn transition_distribution(events: &[EnrichedEvent]) -> SummaryTable<String> {
    ranked(events.iter().map(|e| e.event.transition_type.clone()))
}

/// Events per hour of day. Always 24 rows, 0 through 23.
pub fn hourly_distribution(events: &[EnrichedEvent]) -> SummaryTable<u32> {
    let mut buckets = [0usize; 24];
    for event in events {
        if let Some(bucket) = buckets.get_mut(event.hour as usize) {
            *bucket += 1;
        }
    }
    SummaryTable::new(
        (0u32..)
            .zip(buckets)
            .map(|(key, count)| CountRow { key, count })
            .collect(),
    )
}

/// Events per weekday. Always 7 rows, Monday through Sunday.
pub fn weekday_distribution(events: &[EnrichedEvent]) -> SummaryTable<Weekday> {
    let mut buckets = [0usize; 7];
    for event in events {
        if let Some(bucket) = buckets.get_mut(event.weekday as usize) {
            *bucket += 1;
        }
    }
    SummaryTable::new(
        WEEKDAYS
            .into_iter()
            .zip(buckets)
            .map(|(key, count)| CountRow { key, count })
            .collect(),
    )
}

/// Events per calendar date, oldest first. Dates without events are omitted.
pub fn daily_distribution(events: &[EnrichedEvent]) -> SummaryTable<NaiveDate> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for event in events {
        *days.entry(event.date).or_default() += 1;
    }
    SummaryTable::new(
        days.into_iter()
            .map(|(key, count)| CountRow { key, count })
            .collect(),
    )
}

/// Events per (date, hour) cell, oldest first. Empty cells are omitted.
pub fn date_hour_distribution(events: &[EnrichedEvent]) -> SummaryTable<(NaiveDate, u32)> {
    let mut cells: BTreeMap<(NaiveDate, u32), usize> = BTreeMap::new();
    for event in events {
        *cells.entry((event.date, event.hour)).or_default() += 1;
    }
    SummaryTable::new(
        cells
            .into_iter()
            .map(|(key, count)| CountRow { key, count })
            .collect(),
    )
}

/// Events per (category, domain) pair, most frequent first.
pub fn category_domain_distribution(events: &[EnrichedEvent]) -> SummaryTable<(String, String)> {
    ranked(
        events
            .iter()
            .map(|e| (e.category.clone(), e.domain.clone())),
    )
}

/// Visit count and first/last visit of one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainVisits {
    pub domain: String,
    pub count: usize,
    pub first_visit: DateTime<Utc>,
    pub last_visit: DateTime<Utc>,
}

/// Per-domain visit span, ranked like [`domain_frequency`].
pub fn domain_visits(events: &[EnrichedEvent]) -> Vec<DomainVisits> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<DomainVisits> = Vec::new();

    for event in events {
        let ts = event.event.timestamp;
        if let Some(&i) = index.get(event.domain.as_str()) {
            let row = &mut rows[i];
            row.count += 1;
            row.first_visit = row.first_visit.min(ts);
            row.last_visit = row.last_visit.max(ts);
        } else {
            index.insert(&event.domain, rows.len());
            rows.push(DomainVisits {
                domain: event.domain.clone(),
                count: 1,
                first_visit: ts,
                last_visit: ts,
            });
        }
    }

    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Size and duration of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionLength {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub event_count: usize,
    pub duration_ms: i64,
}

/// Full session-length distribution, one entry per session in session order.
pub fn session_lengths<E: Timestamped>(sessions: &[Session<'_, E>]) -> Vec<SessionLength> {
    sessions
        .iter()
        .map(|s| SessionLength {
            start_time: s.start_time(),
            end_time: s.end_time(),
            event_count: s.event_count(),
            duration_ms: s.duration().num_milliseconds(),
        })
        .collect()
}

/// Descriptive statistics over session lengths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub mean_events: f64,
    pub median_events: f64,
    pub min_events: usize,
    pub max_events: usize,
    pub mean_duration_ms: i64,
    pub max_duration_ms: i64,
}

/// Summarizes a session-length distribution. `None` when there are no sessions.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]
pub fn session_stats(lengths: &[SessionLength]) -> Option<SessionStats> {
    let n = lengths.len();
    if n == 0 {
        return None;
    }

    let mut counts: Vec<usize> = lengths.iter().map(|l| l.event_count).collect();
    counts.sort_unstable();

    let median_events = if n % 2 == 0 {
        (counts[n / 2 - 1] + counts[n / 2]) as f64 / 2.0
    } else {
        counts[n / 2] as f64
    };
    let total_events: usize = counts.iter().sum();
    let total_duration: i64 = lengths.iter().map(|l| l.duration_ms).sum();

    Some(SessionStats {
        total_sessions: n,
        mean_events: total_events as f64 / n as f64,
        median_events,
        min_events: counts[0],
        max_events: counts[n - 1],
        mean_duration_ms: total_duration / n as i64,
        max_duration_ms: lengths.iter().map(|l| l.duration_ms).max().unwrap_or(0),
    })
}

/// Headline numbers for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_events: usize,
    pub unique_domains: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<NaiveDate>,
    /// Calendar days from first to last date, both included. 0 without events.
    pub span_days: i64,
    pub events_per_day: f64,
    pub sessions_per_day: f64,
}

#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
pub fn overview(events: &[EnrichedEvent], session_count: usize) -> Overview {
    let unique_domains = events
        .iter()
        .map(|e| e.domain.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();
    let first_date = events.iter().map(|e| e.date).min();
    let last_date = events.iter().map(|e| e.date).max();

    let span_days = match (first_date, last_date) {
        (Some(first), Some(last)) => (last - first).num_days() + 1,
        _ => 0,
    };
    let per_day = |n: usize| {
        if span_days == 0 {
            0.0
        } else {
            n as f64 / span_days as f64
        }
    };

    Overview {
        total_events: events.len(),
        unique_domains,
        first_date,
        last_date,
        span_days,
        events_per_day: per_day(events.len()),
        sessions_per_day: per_day(session_count),
    }
}

/// Every table produced for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub overview: Overview,
    pub domains: SummaryTable<String>,
    pub hours: SummaryTable<u32>,
    pub weekdays: SummaryTable<Weekday>,
    pub days: SummaryTable<NaiveDate>,
    pub categories: SummaryTable<String>,
    pub transitions: SummaryTable<String>,
    pub date_hours: SummaryTable<(NaiveDate, u32)>,
    pub category_domains: SummaryTable<(String, String)>,
    pub domain_visits: Vec<DomainVisits>,
    pub session_lengths: Vec<SessionLength>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_stats: Option<SessionStats>,
}

/// Builds all summary tables from the sorted events and their sessions.
pub fn summarize(events: &[EnrichedEvent], sessions: &[Session<'_, EnrichedEvent>]) -> Summary {
    let lengths = session_lengths(sessions);
    let summary = Summary {
        overview: overview(events, sessions.len()),
        domains: domain_frequency(events),
        hours: hourly_distribution(events),
        weekdays: weekday_distribution(events),
        days: daily_distribution(events),
        categories: category_distribution(events),
        transitions: transition_distribution(events),
        date_hours: date_hour_distribution(events),
        category_domains: category_domain_distribution(events),
        domain_visits: domain_visits(events),
        session_stats: session_stats(&lengths),
        session_lengths: lengths,
    };
    tracing::debug!(
        domains = summary.domains.len(),
        categories = summary.categories.len(),
        sessions = summary.session_lengths.len(),
        "aggregated summary tables"
    );
    summary
}
