//! HTML summary report.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use std::path::Path;

use trialkit_core::statistics::Summary;

use crate::csv::ImportedSession;
use crate::error::ExportError;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn percent(accuracy: f64) -> String {
    format!("{:.0}%", accuracy * 100.0)
}

fn accuracy_class(accuracy: f64) -> &'static str {
    if accuracy >= 0.8 {
        "pass"
    } else if accuracy >= 0.5 {
        "partial"
    } else {
        "fail"
    }
}

/// Generate an HTML summary for a session.
pub fn generate_html(session: &ImportedSession, summary: &Summary) -> String {
    let client = if session.client.is_empty() {
        "Client"
    } else {
        session.client.as_str()
    };
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Tact session — {}</title>\n",
        html_escape(client)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str("<h1>Session summary</h1>\n");
    let created = session
        .created_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string());
    html.push_str(&format!(
        "<p class=\"meta\">Client: <strong>{}</strong> | Session {} | {}</p>\n",
        html_escape(client),
        html_escape(&session.session_id),
        created
    ));
    html.push_str("</header>\n");

    // Overall
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str(&format!(
        "<p class=\"overall {}\">Accuracy: <strong>{}</strong> ({}/{} correct)</p>\n",
        accuracy_class(summary.accuracy),
        percent(summary.accuracy),
        summary.correct,
        summary.total
    ));

    html.push_str("<h2>By deck</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Deck</th><th>Correct</th><th>Total</th><th>Accuracy</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (deck, stats) in &summary.by_deck {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td></tr>\n",
            deck,
            stats.correct,
            stats.total,
            accuracy_class(stats.accuracy()),
            percent(stats.accuracy()),
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    html.push_str("<section class=\"missed\">\n");
    html.push_str("<h2>Missed</h2>\n");
    if summary.missed.is_empty() {
        html.push_str("<p>None</p>\n");
    } else {
        html.push_str("<ul>\n");
        for item in &summary.missed {
            html.push_str(&format!(
                "<li>{} <code>{}</code></li>\n",
                html_escape(&item.label),
                html_escape(&item.id)
            ));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str("<details>\n<summary>Trials</summary>\n");
    html.push_str("<table class=\"results-table\">\n");
    html.push_str("<thead><tr><th>#</th><th>Deck</th><th>Concept</th><th>SD</th><th>Exemplar</th><th>Result</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for r in &session.records {
        let class = if r.outcome.is_correct() { "pass" } else { "fail" };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}/{}</td><td class=\"{}\">{}</td></tr>\n",
            r.trial_index,
            r.deck,
            html_escape(&r.item_label),
            html_escape(&r.sd_text),
            r.exemplar_index,
            r.exemplar_total,
            class,
            r.outcome
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML summary to a file.
pub fn write_html_report(
    session: &ImportedSession,
    summary: &Summary,
    path: &Path,
) -> Result<(), ExportError> {
    let html = generate_html(session, summary);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
    }
    std::fs::write(path, html).map_err(|e| ExportError::io(path, e))
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --partial: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --partial: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.overall { font-size: 1.25rem; padding: 0.75rem 1rem; border-radius: 8px; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass { background: var(--pass); }
.partial { background: var(--partial); }
.fail { background: var(--fail); }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use trialkit_core::model::{Deck, Outcome, ResultRecord};

    fn record(position: usize, id: &str, label: &str, outcome: Outcome) -> ResultRecord {
        ResultRecord {
            trial_index: position + 1,
            item_id: id.into(),
            item_label: label.into(),
            deck: Deck::Nouns,
            sd_text: "What is it?".into(),
            exemplar_index: 1,
            exemplar_total: 2,
            exemplar: format!("assets/{id}_1.png"),
            outcome,
            timestamp: Utc::now(),
        }
    }

    fn make_session() -> ImportedSession {
        ImportedSession {
            session_id: "sess_html".into(),
            client: "Sam <script>".into(),
            created_at: Some(Utc::now()),
            records: vec![
                record(0, "cup", "cup", Outcome::Correct),
                record(1, "ball", "ball & bat", Outcome::Incorrect),
            ],
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let session = make_session();
        let html = generate_html(&session, &session.summary());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("sess_html"));
        assert!(html.contains("Accuracy: <strong>50%</strong> (1/2 correct)"));
        assert!(html.contains("<td>nouns</td>"));
        assert!(html.contains("ball &amp; bat"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Sam &lt;script&gt;"));
    }

    #[test]
    fn empty_missed_list() {
        let mut session = make_session();
        session.records.truncate(1);
        let html = generate_html(&session, &session.summary());
        assert!(html.contains("<p>None</p>"));
    }

    #[test]
    fn html_report_write_to_file() {
        let session = make_session();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.html");

        write_html_report(&session, &session.summary(), &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
