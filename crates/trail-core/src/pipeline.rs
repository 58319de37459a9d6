//! End-to-end analysis run.
//!
//! raw rows -> normalize -> enrich (parallel) -> stable sort -> segment ->
//! aggregate. Each stage lives in its own module and can be called on its
//! own; this module only wires them together for one immutable input.

use std::ops::Range;

use chrono_tz::Tz;
use thiserror::Error;

use crate::aggregate::{Summary, summarize};
use crate::category::CategoryTable;
use crate::enrich::{Enricher, enrich_all};
use crate::event::{EnrichedEvent, RawRecord};
use crate::normalize::{NormalizeReport, normalize};
use crate::segment::{SegmentError, Session, session_bounds, sessions_from_bounds};
use crate::types::{DomainMode, IdleThreshold};

/// Errors that abort an analysis run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Segment(#[from] SegmentError),
}

/// Settings for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Largest gap allowed inside a session. Default: 30 minutes.
    pub idle_threshold: IdleThreshold,
    /// Reference zone for hour, weekday and date. Default: UTC.
    pub timezone: Tz,
    pub domain_mode: DomainMode,
    pub categories: CategoryTable,
    /// URL schemes to keep. Empty keeps every URL.
    pub allowed_schemes: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            idle_threshold: IdleThreshold::default(),
            timezone: Tz::UTC,
            domain_mode: DomainMode::default(),
            categories: CategoryTable::default(),
            allowed_schemes: Vec::new(),
        }
    }
}

/// Result of one run: cleaned events in chronological order plus diagnostics.
#[derive(Debug, Clone)]
pub struct Analysis {
    events: Vec<EnrichedEvent>,
    bounds: Vec<Range<usize>>,
    report: NormalizeReport,
    idle_threshold: IdleThreshold,
}

impl Analysis {
    /// Cleaned events sorted by timestamp; ties keep input order.
    pub fn events(&self) -> &[EnrichedEvent] {
        &self.events
    }

    pub const fn report(&self) -> &NormalizeReport {
        &self.report
    }

    pub const fn idle_threshold(&self) -> IdleThreshold {
        self.idle_threshold
    }

    /// Sessions over [`Self::events`], ordered by start time.
    pub fn sessions(&self) -> Vec<Session<'_, EnrichedEvent>> {
        sessions_from_bounds(&self.events, &self.bounds)
    }

    /// Index of the session containing each event, aligned with [`Self::events`].
    pub fn session_index(&self) -> Vec<usize> {
        let mut index = vec![0; self.events.len()];
        for (session, range) in self.bounds.iter().enumerate() {
            for slot in &mut index[range.clone()] {
                *slot = session;
            }
        }
        index
    }

    /// All summary tables for this run.
    pub fn summary(&self) -> Summary {
        summarize(&self.events, &self.sessions())
    }
}

/// Runs the full pipeline over `rows`.
pub fn analyze<'a, I>(rows: I, config: &AnalysisConfig) -> Result<Analysis, PipelineError>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let (events, report) = normalize(rows, &config.allowed_schemes);

    let enricher = Enricher {
        timezone: config.timezone,
        domain_mode: config.domain_mode,
        categories: &config.categories,
    };
    let mut events = enrich_all(events, &enricher);

    // Stable: equal timestamps keep their input order.
    events.sort_by_key(|e| e.event.timestamp);

    let bounds = session_bounds(&events, config.idle_threshold)?;
    tracing::info!(
        events = events.len(),
        sessions = bounds.len(),
        discarded = report.discarded(),
        "analysis complete"
    );

    Ok(Analysis {
        events,
        bounds,
        report,
        idle_threshold: config.idle_threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryRule;
    use crate::types::CategoryMatch;

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            categories: CategoryTable::new(
                vec![
                    CategoryRule::new("Search", ["google.com"]),
                    CategoryRule::new("Development", ["github.com"]),
                ],
                CategoryMatch::Domain,
            ),
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_analyze_sorts_and_segments_unordered_input() {
        let rows = vec![
            RawRecord::new("2025-01-01 09:50:00", "https://github.com/a"),
            RawRecord::new("2025-01-01 09:00:00", "https://www.google.com/search?q=x"),
            RawRecord::new("not-a-date", "https://ignored.com"),
            RawRecord::new("2025-01-01 09:10:00", "https://github.com/b"),
        ];

        let analysis = analyze(&rows, &config()).unwrap();

        let urls: Vec<_> = analysis.events().iter().map(|e| e.event.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.google.com/search?q=x",
                "https://github.com/b",
                "https://github.com/a"
            ]
        );
        assert_eq!(analysis.report().discarded(), 1);

        let sessions = analysis.sessions();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].event_count(), 2);
        assert_eq!(sessions[1].event_count(), 1);
        assert_eq!(analysis.session_index(), vec![0, 0, 1]);
    }

    #[test]
    fn test_analyze_ties_keep_input_order() {
        let rows = vec![
            RawRecord::new("2025-01-01 09:00:00", "https://first.com"),
            RawRecord::new("2025-01-01 08:00:00", "https://earlier.com"),
            RawRecord::new("2025-01-01 09:00:00", "https://second.com"),
        ];

        let analysis = analyze(&rows, &config()).unwrap();

        let domains: Vec<_> = analysis.events().iter().map(|e| e.domain.as_str()).collect();
        assert_eq!(domains, vec!["earlier.com", "first.com", "second.com"]);
    }

    #[test]
    fn test_summary_counts_are_conserved() {
        let rows: Vec<RawRecord> = (0..40)
            .map(|i| {
                let url = if i % 3 == 0 {
                    "https://google.com/"
                } else {
                    "https://github.com/"
                };
                RawRecord::new(format!("2025-01-0{} {:02}:{:02}:00", 1 + i / 20, i % 24, i), url)
            })
            .collect();

        let analysis = analyze(&rows, &config()).unwrap();
        let summary = analysis.summary();
        let n = analysis.events().len();

        assert_eq!(n, 40);
        assert_eq!(summary.domains.total(), n);
        assert_eq!(summary.hours.total(), n);
        assert_eq!(summary.categories.total(), n);
        assert_eq!(
            summary
                .session_lengths
                .iter()
                .map(|l| l.event_count)
                .sum::<usize>(),
            n
        );
        assert_eq!(summary.categories.get(&"Development".to_string()), Some(26));
    }

    #[test]
    fn test_empty_run() {
        let rows: Vec<RawRecord> = Vec::new();

        let analysis = analyze(&rows, &AnalysisConfig::default()).unwrap();

        assert!(analysis.events().is_empty());
        assert!(analysis.sessions().is_empty());
        let summary = analysis.summary();
        assert!(summary.domains.is_empty());
        assert_eq!(summary.hours.total(), 0);
    }

    #[test]
    fn test_scheme_filter_applies() {
        let rows = vec![
            RawRecord::new("2025-01-01 09:00:00", "https://a.com"),
            RawRecord::new("2025-01-01 09:01:00", "file:///etc/hosts"),
        ];
        let config = AnalysisConfig {
            allowed_schemes: vec!["http".into(), "https".into()],
            ..AnalysisConfig::default()
        };

        let analysis = analyze(&rows, &config).unwrap();

        assert_eq!(analysis.events().len(), 1);
        assert_eq!(analysis.report().disallowed_scheme, 1);
    }
}
