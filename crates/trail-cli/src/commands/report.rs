//! Report command for summarizing a browsing export.
//!
//! This module implements `trail report` with human-readable and JSON output.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use chrono::{Duration, NaiveDate, Weekday};
use serde::Serialize;
use trail_core::aggregate::Overview;
use trail_core::{
    CountRow, IdleThreshold, NormalizeReport, SessionLength, SessionStats, ShareRow, Summary,
    SummaryTable,
};

use super::analyze_file;
use crate::Config;

/// Width of the activity bars, in characters.
const BAR_WIDTH: usize = 20;

/// Rows in the most-active-days section.
const MOST_ACTIVE_DAYS: usize = 5;

// ========== Formatting Helpers ==========

/// Formats a session length: `1h 05m`, `12m`, or `40s` below one minute.
/// Negative lengths render as `0s`.
pub fn format_session_length(ms: i64) -> String {
    let length = Duration::milliseconds(ms.max(0));
    let hours = length.num_hours();
    let minutes = length.num_minutes() % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{}s", length.num_seconds())
    }
}

/// One bar per row, scaled so the busiest row fills [`BAR_WIDTH`].
///
/// Rounds up, so any row with a visit shows at least one block.
fn count_bars<K>(rows: &[CountRow<K>]) -> Vec<String> {
    let max = rows.iter().map(|r| r.count).max().unwrap_or(0);
    rows.iter()
        .map(|r| {
            let filled = if max == 0 {
                0
            } else {
                (r.count * BAR_WIDTH).div_ceil(max)
            };
            format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
        })
        .collect()
}

fn percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

fn plural(n: i64, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn heading(output: &mut String, title: &str) {
    writeln!(output).unwrap();
    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", "─".repeat(title.chars().count())).unwrap();
}

// ========== Report Sections ==========

fn format_overview(output: &mut String, overview: &Overview, rows: &NormalizeReport) {
    writeln!(output, "Events:          {}", overview.total_events).unwrap();
    writeln!(output, "Discarded rows:  {}", rows.discarded()).unwrap();
    writeln!(output, "Unique domains:  {}", overview.unique_domains).unwrap();
    if let (Some(first), Some(last)) = (overview.first_date, overview.last_date) {
        writeln!(
            output,
            "Period:          {first} to {last} ({})",
            plural(overview.span_days, "day")
        )
        .unwrap();
    }
    writeln!(
        output,
        "Daily average:   {:.1} events, {:.1} sessions",
        overview.events_per_day, overview.sessions_per_day
    )
    .unwrap();
}

fn format_shares(output: &mut String, rows: &[ShareRow<String>], ranked: bool) {
    for (i, row) in rows.iter().enumerate() {
        let pct = percent(row.share);
        if ranked {
            writeln!(
                output,
                "{:>3}. {:<30} {:>6}  {pct:>6}",
                i + 1,
                row.key,
                row.count
            )
            .unwrap();
        } else {
            writeln!(output, "  {:<30} {:>6}  {pct:>6}", row.key, row.count).unwrap();
        }
    }
}

fn format_hours(output: &mut String, hours: &SummaryTable<u32>) {
    let bars = count_bars(hours.rows());
    for (row, bar) in hours.rows().iter().zip(bars).filter(|(r, _)| r.count > 0) {
        writeln!(output, "  {:02}:00  {:>6}  {bar}", row.key, row.count).unwrap();
    }
    if let Some(peak) = hours.peak() {
        writeln!(
            output,
            "  Peak hour: {:02}:00 ({} events)",
            peak.key, peak.count
        )
        .unwrap();
    }
}

fn format_weekdays(output: &mut String, weekdays: &SummaryTable<Weekday>) {
    let bars = count_bars(weekdays.rows());
    for (row, bar) in weekdays.rows().iter().zip(bars) {
        writeln!(output, "  {}    {:>6}  {bar}", row.key, row.count).unwrap();
    }
}

fn format_days(output: &mut String, days: &SummaryTable<NaiveDate>) {
    let ranked = days.ranked_by_count();
    let busiest = ranked.top(MOST_ACTIVE_DAYS);
    for (row, bar) in busiest.iter().zip(count_bars(busiest)) {
        writeln!(output, "  {}  {:>6}  {bar}", row.key, row.count).unwrap();
    }
}

fn format_sessions(output: &mut String, stats: Option<&SessionStats>) {
    let Some(stats) = stats else {
        writeln!(output, "  (no sessions)").unwrap();
        return;
    };
    writeln!(output, "  Sessions:        {}", stats.total_sessions).unwrap();
    writeln!(
        output,
        "  Events/session:  mean {:.1}, median {:.1}, min {}, max {}",
        stats.mean_events, stats.median_events, stats.min_events, stats.max_events
    )
    .unwrap();
    writeln!(
        output,
        "  Duration:        mean {}, max {}",
        format_session_length(stats.mean_duration_ms),
        format_session_length(stats.max_duration_ms)
    )
    .unwrap();
}

// ========== Report Generation ==========

/// Formats the human-readable report output.
pub fn format_report(
    summary: &Summary,
    rows: &NormalizeReport,
    idle_threshold: IdleThreshold,
    top: usize,
) -> String {
    let mut output = String::new();

    writeln!(output, "BROWSING REPORT").unwrap();
    writeln!(output, "───────────────").unwrap();

    if summary.overview.total_events == 0 {
        writeln!(output, "No browsing events found.").unwrap();
        writeln!(output, "Discarded rows:  {}", rows.discarded()).unwrap();
        return output;
    }

    format_overview(&mut output, &summary.overview, rows);

    heading(&mut output, &format!("TOP {top} DOMAINS"));
    // Shares stay relative to all domains, not just the rows shown.
    let domains: Vec<ShareRow<String>> = summary
        .domains
        .top(top)
        .iter()
        .map(|r| ShareRow {
            key: r.key.clone(),
            count: r.count,
            share: summary.domains.share(r.count),
        })
        .collect();
    format_shares(&mut output, &domains, true);

    heading(&mut output, "ACTIVITY BY HOUR");
    format_hours(&mut output, &summary.hours);

    heading(&mut output, "ACTIVITY BY WEEKDAY");
    format_weekdays(&mut output, &summary.weekdays);

    heading(&mut output, "MOST ACTIVE DAYS");
    format_days(&mut output, &summary.days);

    heading(&mut output, "CATEGORIES");
    format_shares(&mut output, &summary.categories.with_shares(), false);

    heading(&mut output, "TRANSITIONS");
    format_shares(&mut output, &summary.transitions.with_shares(), false);

    heading(&mut output, &format!("SESSIONS (idle gap > {idle_threshold})"));
    format_sessions(&mut output, summary.session_stats.as_ref());

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub idle_threshold_minutes: i64,
    pub timezone: &'a str,
    pub rows: &'a NormalizeReport,
    pub overview: &'a Overview,
    pub domains: Vec<ShareRow<String>>,
    pub hours: &'a [CountRow<u32>],
    pub weekdays: &'a [CountRow<Weekday>],
    pub days: &'a [CountRow<NaiveDate>],
    pub categories: Vec<ShareRow<String>>,
    pub transitions: Vec<ShareRow<String>>,
    pub sessions: JsonSessions<'a>,
}

#[derive(Debug, Serialize)]
pub struct JsonSessions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<&'a SessionStats>,
    pub lengths: &'a [SessionLength],
}

/// Formats the summary as JSON.
pub fn format_report_json(
    summary: &Summary,
    rows: &NormalizeReport,
    idle_threshold: IdleThreshold,
    timezone: &str,
) -> Result<String> {
    let report = JsonReport {
        idle_threshold_minutes: idle_threshold.num_minutes(),
        timezone,
        rows,
        overview: &summary.overview,
        domains: summary.domains.with_shares(),
        hours: summary.hours.rows(),
        weekdays: summary.weekdays.rows(),
        days: summary.days.rows(),
        categories: summary.categories.with_shares(),
        transitions: summary.transitions.with_shares(),
        sessions: JsonSessions {
            stats: summary.session_stats.as_ref(),
            lengths: &summary.session_lengths,
        },
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run(
    out: &mut impl std::io::Write,
    config: &Config,
    file: &Path,
    top: Option<usize>,
    json: bool,
) -> Result<()> {
    let analysis = analyze_file(config, file)?;
    let summary = analysis.summary();

    if json {
        let output = format_report_json(
            &summary,
            analysis.report(),
            analysis.idle_threshold(),
            &config.timezone,
        )?;
        out.write_all(output.as_bytes())?;
        out.write_all(b"\n")?;
    } else {
        let top = top.unwrap_or(config.top_domains);
        let output = format_report(&summary, analysis.report(), analysis.idle_threshold(), top);
        out.write_all(output.as_bytes())?;
    }

    Ok(())
}
