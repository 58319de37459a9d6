//! Export command: cleaned tables as CSV on stdout.

use anyhow::Result;
use serde::Serialize;
use chrono::NaiveDate;
use trail_core::aggregate::{
    category_domain_distribution, date_hour_distribution, domain_visits, session_lengths,
};
use trail_core::{Analysis, CountRow, DomainVisits, EnrichedEvent, SessionLength};

use super::analyze_file;
use crate::{Config, ExportTable};

/// One row of the events table.
#[derive(Debug, Serialize)]
struct EventRow<'a> {
    session: usize,
    timestamp: String,
    domain: &'a str,
    category: &'a str,
    hour: u32,
    weekday: u32,
    date: String,
    transition: &'a str,
    url: &'a str,
    title: &'a str,
}

impl<'a> EventRow<'a> {
    fn new(session: usize, e: &'a EnrichedEvent) -> Self {
        Self {
            session,
            timestamp: e.event.timestamp.to_rfc3339(),
            domain: &e.domain,
            category: &e.category,
            hour: e.hour,
            weekday: e.weekday,
            date: e.date.to_string(),
            transition: &e.event.transition_type,
            url: &e.event.url,
            title: e.event.title.as_deref().unwrap_or(""),
        }
    }
}

/// One row of the sessions table.
#[derive(Debug, Serialize)]
struct SessionRow {
    session: usize,
    start_time: String,
    end_time: String,
    event_count: usize,
    duration_ms: i64,
}

impl SessionRow {
    fn new(session: usize, length: &SessionLength) -> Self {
        Self {
            session,
            start_time: length.start_time.to_rfc3339(),
            end_time: length.end_time.to_rfc3339(),
            event_count: length.event_count,
            duration_ms: length.duration_ms,
        }
    }
}

/// One row of the domains table.
#[derive(Debug, Serialize)]
struct DomainRow<'a> {
    domain: &'a str,
    visits: usize,
    first_visit: String,
    last_visit: String,
}

impl<'a> From<&'a DomainVisits> for DomainRow<'a> {
    fn from(v: &'a DomainVisits) -> Self {
        Self {
            domain: &v.domain,
            visits: v.count,
            first_visit: v.first_visit.to_rfc3339(),
            last_visit: v.last_visit.to_rfc3339(),
        }
    }
}

/// One cell of the date by hour table.
#[derive(Debug, Serialize)]
struct HourRow {
    date: NaiveDate,
    hour: u32,
    visits: usize,
}

/// One row of the category by domain table.
#[derive(Debug, Serialize)]
struct CategoryRow<'a> {
    category: &'a str,
    domain: &'a str,
    visits: usize,
}

fn write_rows<T: Serialize>(
    out: impl std::io::Write,
    rows: impl IntoIterator<Item = T>,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_events(out: impl std::io::Write, analysis: &Analysis) -> Result<()> {
    let index = analysis.session_index();
    let rows = index
        .into_iter()
        .zip(analysis.events())
        .map(|(session, event)| EventRow::new(session, event));
    write_rows(out, rows)
}

fn write_sessions(out: impl std::io::Write, analysis: &Analysis) -> Result<()> {
    let lengths = session_lengths(&analysis.sessions());
    write_rows(
        out,
        lengths
            .iter()
            .enumerate()
            .map(|(session, length)| SessionRow::new(session, length)),
    )
}

/// Runs the export command.
pub fn run(out: &mut impl std::io::Write, config: &Config, table: &ExportTable) -> Result<()> {
    let analysis = analyze_file(config, table.file())?;
    let events = analysis.events();

    match table {
        ExportTable::Events { .. } => write_events(out, &analysis)?,
        ExportTable::Sessions { .. } => write_sessions(out, &analysis)?,
        ExportTable::Domains { .. } => {
            let visits = domain_visits(events);
            write_rows(out, visits.iter().map(DomainRow::from))?;
        }
        ExportTable::Hours { .. } => {
            let cells = date_hour_distribution(events);
            write_rows(
                out,
                cells.rows().iter().map(|&CountRow { key: (date, hour), count }| HourRow {
                    date,
                    hour,
                    visits: count,
                }),
            )?;
        }
        ExportTable::Categories { .. } => {
            let pairs = category_domain_distribution(events);
            write_rows(
                out,
                pairs.rows().iter().map(|row| CategoryRow {
                    category: &row.key.0,
                    domain: &row.key.1,
                    visits: row.count,
                }),
            )?;
        }
    }
    tracing::debug!(events = events.len(), "exported table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn export_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,url,transition,title").unwrap();
        writeln!(file, "2025-01-01 09:10:00,https://github.com/x,TYPED,\"Repo, x\"").unwrap();
        writeln!(file, "2025-01-01 09:00:00,https://www.google.com/search,LINK,").unwrap();
        writeln!(file, "garbage,https://a.com,LINK,").unwrap();
        writeln!(file, "2025-01-01 10:00:00,https://github.com/y,LINK,Y").unwrap();
        file
    }

    fn export(table: &ExportTable) -> String {
        let mut output = Vec::new();
        run(&mut output, &Config::default(), table).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_export_events() {
        let file = export_file();
        let output = export(&ExportTable::Events {
            file: file.path().to_path_buf(),
        });

        assert_snapshot!(output.trim_end(), @r#"
        session,timestamp,domain,category,hour,weekday,date,transition,url,title
        0,2025-01-01T09:00:00+00:00,google.com,Search,9,2,2025-01-01,LINK,https://www.google.com/search,
        0,2025-01-01T09:10:00+00:00,github.com,Development,9,2,2025-01-01,TYPED,https://github.com/x,"Repo, x"
        1,2025-01-01T10:00:00+00:00,github.com,Development,10,2,2025-01-01,LINK,https://github.com/y,Y
        "#);
    }

    #[test]
    fn test_export_sessions() {
        let file = export_file();
        let output = export(&ExportTable::Sessions {
            file: file.path().to_path_buf(),
        });

        assert_snapshot!(output.trim_end(), @r"
        session,start_time,end_time,event_count,duration_ms
        0,2025-01-01T09:00:00+00:00,2025-01-01T09:10:00+00:00,2,600000
        1,2025-01-01T10:00:00+00:00,2025-01-01T10:00:00+00:00,1,0
        ");
    }

    #[test]
    fn test_export_domains() {
        let file = export_file();
        let output = export(&ExportTable::Domains {
            file: file.path().to_path_buf(),
        });

        assert_snapshot!(output.trim_end(), @r"
        domain,visits,first_visit,last_visit
        github.com,2,2025-01-01T09:10:00+00:00,2025-01-01T10:00:00+00:00
        google.com,1,2025-01-01T09:00:00+00:00,2025-01-01T09:00:00+00:00
        ");
    }

    #[test]
    fn test_export_hours() {
        let file = export_file();
        let output = export(&ExportTable::Hours {
            file: file.path().to_path_buf(),
        });

        assert_snapshot!(output.trim_end(), @r"
        date,hour,visits
        2025-01-01,9,2
        2025-01-01,10,1
        ");
    }

    #[test]
    fn test_export_categories() {
        let file = export_file();
        let output = export(&ExportTable::Categories {
            file: file.path().to_path_buf(),
        });

        assert_snapshot!(output.trim_end(), @r"
        category,domain,visits
        Development,github.com,2
        Search,google.com,1
        ");
    }

    #[test]
    fn test_export_empty_sessions_writes_nothing() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,url").unwrap();

        let output = export(&ExportTable::Sessions {
            file: file.path().to_path_buf(),
        });

        assert!(output.is_empty());
    }
}
