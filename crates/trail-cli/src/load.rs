//! Loading browsing-history exports from CSV.
//!
//! Two layouts are accepted: a plain CSV whose first line is the header, and
//! a sectioned export where the browsing table follows a line whose first
//! field is `Browsing`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use trail_core::RawRecord;

/// Header names accepted for the timestamp column.
const TIMESTAMP_COLUMNS: &[&str] = &["eventtimeutc", "timestamp", "time"];

/// Header names accepted for the URL column.
const URL_COLUMNS: &[&str] = &["url"];

/// Marker of the browsing section in sectioned exports.
const BROWSING_SECTION: &str = "Browsing";

/// Reads all rows of the browsing table in `path`.
pub fn load_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows = parse_csv(&content).with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "loaded browsing rows");
    Ok(rows)
}

/// Parses CSV text into raw records.
pub fn parse_csv(content: &str) -> Result<Vec<RawRecord>> {
    let table = browsing_table(content);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(table.as_bytes());

    let headers = reader.headers().context("missing header row")?.clone();
    let has = |names: &[&str]| has_column(headers.iter(), names);
    if !has(TIMESTAMP_COLUMNS) {
        bail!(
            "no timestamp column found (expected one of: {})",
            TIMESTAMP_COLUMNS.join(", ")
        );
    }
    if !has(URL_COLUMNS) {
        bail!("no url column found");
    }

    let mut rows = Vec::new();
    for (line, record) in reader.deserialize::<RawRecord>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            // A row the CSV layer cannot read at all still counts as malformed.
            Err(e) => {
                tracing::debug!(line = line + 2, error = %e, "unreadable csv row");
                rows.push(RawRecord::default());
            }
        }
    }
    Ok(rows)
}

fn has_column<'a>(mut fields: impl Iterator<Item = &'a str>, names: &[&str]) -> bool {
    fields.any(|f| names.contains(&f))
}

/// Returns the text of the browsing table.
///
/// Scans lines until either a usable header (timestamp and url columns) or
/// a line whose first field is exactly `Browsing`. A header means the table
/// starts there; the marker means it starts on the next line. Data rows are
/// never reached, so their contents cannot be mistaken for a marker.
fn browsing_table(content: &str) -> &str {
    let mut start = 0;
    for line in content.split_inclusive('\n') {
        let end = start + line.len();
        let fields: Vec<&str> = line
            .split(',')
            .map(|f| f.trim().trim_matches('"'))
            .collect();

        if has_column(fields.iter().copied(), TIMESTAMP_COLUMNS)
            && has_column(fields.iter().copied(), URL_COLUMNS)
        {
            return &content[start..];
        }
        if fields.first() == Some(&BROWSING_SECTION) {
            return &content[end..];
        }
        start = end;
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_plain_csv() {
        let content = "\
timestamp,url,transition,title
2025-01-01 09:00:00,https://a.com,LINK,A
2025-01-01 09:10:00,https://b.com,,
";
        let rows = parse_csv(content).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].url.as_deref(), Some("https://a.com"));
        assert_eq!(rows[0].transition.as_deref(), Some("LINK"));
        assert_eq!(rows[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn test_parse_sectioned_export() {
        let content = "\
Summary,,
Total,3,
Browsing,,
eventtime,eventtimeutc,url,transition
2025-01-01 10:00:00,2025-01-01 09:00:00,https://a.com,LINK
2025-01-01 10:05:00,2025-01-01 09:05:00,https://b.com,TYPED
";
        let rows = parse_csv(content).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp.as_deref(), Some("2025-01-01 09:00:00"));
        assert_eq!(rows[1].transition.as_deref(), Some("TYPED"));
    }

    #[test]
    fn test_browsing_in_data_rows_is_not_a_marker() {
        let content = "\
title,timestamp,url
Home,2025-01-01 08:00:00,https://a.com
Browsing tips,2025-01-01 09:00:00,https://b.com
Browsing,2025-01-01 10:00:00,https://c.com
";
        let rows = parse_csv(content).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].title.as_deref(), Some("Browsing tips"));
        assert_eq!(rows[2].url.as_deref(), Some("https://c.com"));
    }

    #[test]
    fn test_marker_must_match_exactly() {
        let content = "\
Browsing history export,,
Browsing,,
timestamp,url
2025-01-01 09:00:00,https://a.com
";
        let rows = parse_csv(content).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].url.as_deref(), Some("https://a.com"));
    }

    #[test]
    fn test_missing_columns_rejected() {
        let err = parse_csv("when,url\n2025-01-01,https://a.com\n").unwrap_err();
        assert!(err.to_string().contains("timestamp"));

        let err = parse_csv("timestamp,link\n2025-01-01,https://a.com\n").unwrap_err();
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn test_short_rows_keep_their_fields() {
        let content = "timestamp,url,transition\n2025-01-01 09:00:00,https://a.com\n";
        let rows = parse_csv(content).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].url.as_deref(), Some("https://a.com"));
        assert_eq!(rows[0].transition, None);
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "eventtimeutc,url").unwrap();
        writeln!(file, "2025-01-01 09:00:00,https://a.com").unwrap();

        let rows = load_csv(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
