//! Feature enrichment: domain, category and calendar fields per event.
//!
//! Enrichment is a pure function of one event plus the run's [`Enricher`]
//! settings, so [`enrich_all`] fans out across threads with rayon. The
//! indexed collect keeps the input order.

use chrono::{Datelike, Timelike};
use chrono_tz::Tz;
use rayon::prelude::*;
use url::{Host, Url};

use crate::category::CategoryTable;
use crate::event::{EnrichedEvent, Event};
use crate::types::DomainMode;

/// Domain used when a URL has no parseable host.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Second-level labels that sit under a two-letter country TLD (`co.uk`).
const SECOND_LEVEL_LABELS: &[&str] = &["ac", "co", "com", "edu", "gov", "net", "org"];

/// Settings shared by every event of one run.
#[derive(Debug, Clone, Copy)]
pub struct Enricher<'a> {
    pub timezone: Tz,
    pub domain_mode: DomainMode,
    pub categories: &'a CategoryTable,
}

impl Enricher<'_> {
    /// Derives all features for one event.
    pub fn enrich(&self, event: Event) -> EnrichedEvent {
        let domain = extract_domain(&event.url, self.domain_mode);
        let category = self.categories.categorize(&domain, &event.url).to_string();
        let local = event.timestamp.with_timezone(&self.timezone);

        EnrichedEvent {
            domain,
            category,
            hour: local.hour(),
            weekday: local.weekday().num_days_from_monday(),
            date: local.date_naive(),
            event,
        }
    }
}

/// Enriches every event in parallel, preserving order.
pub fn enrich_all(events: Vec<Event>, enricher: &Enricher<'_>) -> Vec<EnrichedEvent> {
    let enriched: Vec<EnrichedEvent> = events
        .into_par_iter()
        .map(|event| enricher.enrich(event))
        .collect();
    tracing::debug!(
        events = enriched.len(),
        timezone = %enricher.timezone,
        "enriched events"
    );
    enriched
}

/// Extracts the normalized domain of a URL.
///
/// The host is lower-cased, the root dot of a fully-qualified name and a
/// leading `www.` are removed. URLs without a host yield [`UNKNOWN_DOMAIN`].
pub fn extract_domain(url: &str, mode: DomainMode) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return UNKNOWN_DOMAIN.to_string();
    };

    match parsed.host() {
        Some(Host::Domain(host)) => {
            let host = host.trim_end_matches('.').to_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host);
            if host.is_empty() {
                return UNKNOWN_DOMAIN.to_string();
            }
            match mode {
                DomainMode::Host => host.to_string(),
                DomainMode::Registrable => registrable(host).to_string(),
            }
        }
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        None => UNKNOWN_DOMAIN.to_string(),
    }
}

/// Keeps the last two labels of a host, or three under `co.uk`-style suffixes.
///
/// This is a heuristic, not a public suffix list lookup.
fn registrable(host: &str) -> &str {
    let labels: Vec<&str> = host.split('.').collect();
    let n = labels.len();
    if n <= 2 {
        return host;
    }

    let tld = labels[n - 1];
    let second = labels[n - 2];
    let keep = if tld.len() == 2 && SECOND_LEVEL_LABELS.contains(&second) {
        3
    } else {
        2
    };

    let skip: usize = labels[..n - keep].iter().map(|l| l.len() + 1).sum();
    &host[skip..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryRule;
    use crate::types::CategoryMatch;

    fn event(ts: &str, url: &str) -> Event {
        Event {
            timestamp: ts.parse().unwrap(),
            url: url.to_string(),
            transition_type: "link".to_string(),
            title: None,
        }
    }

    #[test]
    fn test_extract_domain_strips_www_and_lowercases() {
        assert_eq!(
            extract_domain("https://WWW.Example.COM/path", DomainMode::Host),
            "example.com"
        );
        assert_eq!(
            extract_domain("https://mail.google.com/", DomainMode::Host),
            "mail.google.com"
        );
    }

    #[test]
    fn test_extract_domain_drops_port() {
        assert_eq!(
            extract_domain("http://localhost:8080/", DomainMode::Host),
            "localhost"
        );
    }

    #[test]
    fn test_extract_domain_malformed_is_unknown() {
        assert_eq!(extract_domain("not a url", DomainMode::Host), "unknown");
        assert_eq!(extract_domain("mailto:someone@a.com", DomainMode::Host), "unknown");
        assert_eq!(extract_domain("", DomainMode::Host), "unknown");
    }

    #[test]
    fn test_extract_domain_fully_qualified_host() {
        assert_eq!(
            extract_domain("https://www.example.com./x", DomainMode::Host),
            "example.com"
        );
        assert_eq!(
            extract_domain("https://mail.google.com./", DomainMode::Registrable),
            "google.com"
        );
        assert_eq!(
            extract_domain("https://news.bbc.co.uk./", DomainMode::Registrable),
            "bbc.co.uk"
        );
    }

    #[test]
    fn test_extract_domain_ip_hosts() {
        assert_eq!(
            extract_domain("http://192.168.0.1/admin", DomainMode::Registrable),
            "192.168.0.1"
        );
    }

    #[test]
    fn test_extract_domain_registrable() {
        assert_eq!(
            extract_domain("https://mail.google.com/", DomainMode::Registrable),
            "google.com"
        );
        assert_eq!(
            extract_domain("https://news.bbc.co.uk/", DomainMode::Registrable),
            "bbc.co.uk"
        );
        assert_eq!(
            extract_domain("https://a.b.example.de/", DomainMode::Registrable),
            "example.de"
        );
        assert_eq!(
            extract_domain("https://github.com/", DomainMode::Registrable),
            "github.com"
        );
    }

    #[test]
    fn test_enrich_derives_calendar_fields_in_reference_timezone() {
        let table = CategoryTable::default();
        let enricher = Enricher {
            timezone: Tz::Asia__Tokyo,
            domain_mode: DomainMode::Host,
            categories: &table,
        };

        // 2025-01-05 is a Sunday in UTC; 23:30 UTC is Monday 08:30 in Tokyo.
        let enriched = enricher.enrich(event("2025-01-05T23:30:00Z", "https://example.com"));

        assert_eq!(enriched.hour, 8);
        assert_eq!(enriched.weekday, 0);
        assert_eq!(enriched.date.to_string(), "2025-01-06");
    }

    #[test]
    fn test_enrich_assigns_category_and_fallbacks() {
        let table = CategoryTable::new(
            vec![CategoryRule::new("Development", ["github.com"])],
            CategoryMatch::Domain,
        );
        let enricher = Enricher {
            timezone: Tz::UTC,
            domain_mode: DomainMode::Host,
            categories: &table,
        };

        let dev = enricher.enrich(event("2025-01-01T09:00:00Z", "https://gist.github.com/x"));
        assert_eq!(dev.domain, "gist.github.com");
        assert_eq!(dev.category, "Development");

        let other = enricher.enrich(event("2025-01-01T09:00:00Z", "::garbage::"));
        assert_eq!(other.domain, "unknown");
        assert_eq!(other.category, "uncategorized");
    }

    #[test]
    fn test_enrich_all_preserves_order() {
        let table = CategoryTable::default();
        let enricher = Enricher {
            timezone: Tz::UTC,
            domain_mode: DomainMode::Host,
            categories: &table,
        };
        let events: Vec<Event> = (0..500)
            .map(|i| event("2025-01-01T09:00:00Z", &format!("https://site{i}.com/")))
            .collect();

        let enriched = enrich_all(events, &enricher);

        for (i, e) in enriched.iter().enumerate() {
            assert_eq!(e.domain, format!("site{i}.com"));
        }
    }
}
