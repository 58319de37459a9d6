//! Session segmentation.
//!
//! Splits a chronologically sorted event sequence into sessions: maximal runs
//! in which every gap between consecutive events is at most the idle
//! threshold.
//!
//! # Algorithm
//!
//! 1. Reject input that is not sorted ascending by timestamp.
//! 2. The first event opens the first session.
//! 3. For each later event, `gap = event - previous`:
//!    `gap <= threshold` extends the current session, `gap > threshold`
//!    closes it and opens a new one at this event.
//! 4. The last session is closed at end of input.
//!
//! Sessions borrow contiguous slices of the input, so the pass allocates only
//! the output vector.

use std::ops::Range;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::event::Timestamped;
use crate::types::IdleThreshold;

/// Segmentation precondition failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// An event is earlier than the one before it.
    #[error(
        "events must be sorted by timestamp: event {index} at {current} is earlier than the previous event at {previous}"
    )]
    Unsorted {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

/// A maximal burst of activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session<'a, E> {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    events: &'a [E],
}

impl<'a, E: Timestamped> Session<'a, E> {
    /// Wraps a non-empty run of events. Returns `None` for an empty slice.
    pub fn new(events: &'a [E]) -> Option<Self> {
        let start_time = events.first()?.timestamp();
        let end_time = events.last()?.timestamp();
        Some(Self {
            start_time,
            end_time,
            events,
        })
    }
}

impl<'a, E> Session<'a, E> {
    /// Timestamp of the first event.
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Timestamp of the last event.
    pub const fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// `end_time - start_time`. Zero for single-event sessions.
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub const fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Member events in chronological order.
    pub const fn events(&self) -> &'a [E] {
        self.events
    }
}

/// Verifies that events are sorted ascending. Equal timestamps are allowed.
pub fn check_sorted<E: Timestamped>(events: &[E]) -> Result<(), SegmentError> {
    for (index, pair) in events.windows(2).enumerate() {
        let previous = pair[0].timestamp();
        let current = pair[1].timestamp();
        if current < previous {
            return Err(SegmentError::Unsorted {
                index: index + 1,
                previous,
                current,
            });
        }
    }
    Ok(())
}

/// Computes session boundaries as index ranges into `events`.
///
/// The ranges are non-empty, contiguous and cover `0..events.len()`.
pub fn session_bounds<E: Timestamped>(
    events: &[E],
    threshold: IdleThreshold,
) -> Result<Vec<Range<usize>>, SegmentError> {
    check_sorted(events)?;

    let Some(first) = events.first() else {
        return Ok(Vec::new());
    };

    let threshold = threshold.as_duration();
    let mut bounds = Vec::new();
    let mut start = 0;
    let mut previous = first.timestamp();

    for (index, event) in events.iter().enumerate().skip(1) {
        let current = event.timestamp();
        if current - previous > threshold {
            bounds.push(start..index);
            start = index;
        }
        previous = current;
    }
    bounds.push(start..events.len());

    tracing::debug!(
        events = events.len(),
        sessions = bounds.len(),
        threshold_secs = threshold.num_seconds(),
        "segmented sessions"
    );
    Ok(bounds)
}

/// Splits sorted events into sessions.
pub fn segment<E: Timestamped>(
    events: &[E],
    threshold: IdleThreshold,
) -> Result<Vec<Session<'_, E>>, SegmentError> {
    let bounds = session_bounds(events, threshold)?;
    Ok(sessions_from_bounds(events, &bounds))
}

/// Rebuilds sessions from ranges produced by [`session_bounds`].
pub fn sessions_from_bounds<'a, E: Timestamped>(
    events: &'a [E],
    bounds: &[Range<usize>],
) -> Vec<Session<'a, E>> {
    bounds
        .iter()
        .filter_map(|range| events.get(range.clone()).and_then(Session::new))
        .collect()
}
