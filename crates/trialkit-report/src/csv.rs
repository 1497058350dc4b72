//! CSV export and import.
//!
//! The column layout, quoting and line endings are fixed: spreadsheets and
//! earlier exports depend on them byte for byte.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use trialkit_core::model::{Deck, Outcome, ResultRecord};
use trialkit_core::session::Session;
use trialkit_core::statistics::{summarize_records, Summary};

use crate::error::ExportError;

/// Column names, in order.
pub const HEADERS: [&str; 12] = [
    "session_id",
    "client",
    "created_at",
    "deck",
    "concept_id",
    "concept_label",
    "sd_text",
    "exemplar_index",
    "exemplar_total",
    "src",
    "result",
    "timestamp",
];

/// Timestamps as `2026-01-02T03:04:05.678Z`.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Quote a field iff it contains a quote, a comma or a newline.
fn escape_field(s: &str) -> Cow<'_, str> {
    if s.contains('"') || s.contains(',') || s.contains('\n') {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

fn render<'a, I>(session_id: &str, client: &str, created_at: &DateTime<Utc>, records: I) -> String
where
    I: IntoIterator<Item = &'a ResultRecord>,
{
    let created_at = format_timestamp(created_at);
    let mut lines = vec![HEADERS.join(",")];
    for r in records {
        let exemplar_index = r.exemplar_index.to_string();
        let exemplar_total = r.exemplar_total.to_string();
        let result = r.outcome.to_string();
        let timestamp = format_timestamp(&r.timestamp);
        let fields = [
            session_id,
            client,
            created_at.as_str(),
            r.deck.as_str(),
            r.item_id.as_str(),
            r.item_label.as_str(),
            r.sd_text.as_str(),
            exemplar_index.as_str(),
            exemplar_total.as_str(),
            r.exemplar.as_str(),
            result.as_str(),
            timestamp.as_str(),
        ];
        let line: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_field(f)).collect();
        lines.push(line.join(","));
    }
    lines.join("\n")
}

/// Render the answered trials of a session, in trial order.
///
/// Refuses to export a session with no answered trials.
pub fn to_csv(session: &Session) -> Result<String, ExportError> {
    if session.answered_count() == 0 {
        return Err(ExportError::NothingToExport);
    }
    Ok(render(
        &session.session_id,
        &session.client,
        &session.created_at,
        session.answered(),
    ))
}

/// `{client}_VBMAPP_Tacts_{YYYY-MM-DD}.csv`, with the client name made file-safe.
///
/// Each UTF-16 code unit outside `[A-Za-z0-9_-]` becomes `_`, so a character
/// outside the BMP turns into `__`. Browser exports name files the same way.
pub fn export_filename(client: &str, date: NaiveDate) -> String {
    let client = client.trim();
    let client = if client.is_empty() { "Client" } else { client };
    let mut safe = String::with_capacity(client.len());
    for c in client.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            safe.push(c);
        } else {
            safe.extend(std::iter::repeat('_').take(c.len_utf16()));
        }
    }
    format!("{safe}_VBMAPP_Tacts_{}.csv", date.format("%Y-%m-%d"))
}

/// Write the session export into `dir`, returning the file path.
pub fn write_csv(session: &Session, dir: &Path, date: NaiveDate) -> Result<PathBuf, ExportError> {
    let csv = to_csv(session)?;
    std::fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;
    let path = dir.join(export_filename(&session.client, date));
    std::fs::write(&path, csv).map_err(|e| ExportError::io(&path, e))?;
    tracing::info!(
        session = %session.session_id,
        rows = session.answered_count(),
        "exported {}",
        path.display()
    );
    Ok(path)
}

/// A session read back from an export.
///
/// Exports carry no trial position, so imported records are numbered by row:
/// `trial_index` counts answered trials, not positions in the original session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedSession {
    pub session_id: String,
    pub client: String,
    pub created_at: Option<DateTime<Utc>>,
    pub records: Vec<ResultRecord>,
}

impl From<&Session> for ImportedSession {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            client: session.client.clone(),
            created_at: Some(session.created_at),
            records: session.answered().cloned().collect(),
        }
    }
}

impl ImportedSession {
    pub fn summary(&self) -> Summary {
        summarize_records(&self.records)
    }

    /// Re-render in export format.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        if self.records.is_empty() {
            return Err(ExportError::NothingToExport);
        }
        let created_at = self.created_at.unwrap_or_default();
        Ok(render(
            &self.session_id,
            &self.client,
            &created_at,
            &self.records,
        ))
    }
}

/// Split CSV text into records, tracking the line each record starts on.
fn split_records(content: &str) -> Result<Vec<(usize, Vec<String>)>, ExportError> {
    let mut records = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            '"' => {
                return Err(ExportError::BadRow {
                    line,
                    reason: "unexpected quote in unquoted field".into(),
                })
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                quoted = false;
                records.push((row_line, std::mem::take(&mut row)));
                line += 1;
                row_line = line;
            }
            _ if quoted => {
                return Err(ExportError::BadRow {
                    line,
                    reason: "text after closing quote".into(),
                })
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ExportError::BadRow {
            line: row_line,
            reason: "unterminated quoted field".into(),
        });
    }
    if quoted || !field.is_empty() || !row.is_empty() {
        row.push(field);
        records.push((row_line, row));
    }

    records.retain(|(_, fields)| !(fields.len() == 1 && fields[0].is_empty()));
    Ok(records)
}

fn parse_timestamp(line: usize, column: &str, value: &str) -> Result<DateTime<Utc>, ExportError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ExportError::BadRow {
            line,
            reason: format!("invalid {column} '{value}': {e}"),
        })
}

fn parse_count(line: usize, column: &str, value: &str) -> Result<usize, ExportError> {
    value.parse().map_err(|_| ExportError::BadRow {
        line,
        reason: format!("invalid {column} '{value}'"),
    })
}

/// Parse an export back into session metadata and records.
///
/// Session metadata is taken from the first row. Each record's `trial_index`
/// is its 1-based row number, since skipped trials leave no row behind.
pub fn parse_csv(content: &str) -> Result<ImportedSession, ExportError> {
    let mut records = split_records(content)?.into_iter();

    match records.next() {
        Some((_, header)) if header.iter().map(String::as_str).eq(HEADERS) => {}
        _ => return Err(ExportError::MissingHeader),
    }

    let mut imported = ImportedSession {
        session_id: String::new(),
        client: String::new(),
        created_at: None,
        records: Vec::new(),
    };

    for (position, (line, fields)) in records.enumerate() {
        let found = fields.len();
        let Ok(fields) = <[String; 12]>::try_from(fields) else {
            return Err(ExportError::BadRow {
                line,
                reason: format!("expected {} fields, found {found}", HEADERS.len()),
            });
        };
        let [session_id, client, created_at, deck, concept_id, concept_label, sd_text, exemplar_index, exemplar_total, src, result, timestamp] =
            fields;

        if position == 0 {
            imported.created_at = if created_at.is_empty() {
                None
            } else {
                Some(parse_timestamp(line, "created_at", &created_at)?)
            };
            imported.session_id = session_id;
            imported.client = client;
        }

        let deck: Deck = deck
            .parse()
            .map_err(|reason| ExportError::BadRow { line, reason })?;
        let outcome: Outcome = result
            .parse()
            .map_err(|reason| ExportError::BadRow { line, reason })?;

        imported.records.push(ResultRecord {
            trial_index: position + 1,
            item_id: concept_id,
            item_label: concept_label,
            deck,
            sd_text,
            exemplar_index: parse_count(line, "exemplar_index", &exemplar_index)?,
            exemplar_total: parse_count(line, "exemplar_total", &exemplar_total)?,
            exemplar: src,
            outcome,
            timestamp: parse_timestamp(line, "timestamp", &timestamp)?,
        });
    }

    tracing::debug!(rows = imported.records.len(), "parsed CSV export");
    Ok(imported)
}

/// Read an export file from disk.
pub fn read_csv(path: &Path) -> Result<ImportedSession, ExportError> {
    let content = std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
    parse_csv(&content)
}
