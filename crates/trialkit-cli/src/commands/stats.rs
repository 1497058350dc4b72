//! The `trialkit stats` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use trialkit_core::statistics::Summary;
use trialkit_report::{read_csv, write_html_report};

pub fn execute(csv: PathBuf, format: String, html: Option<PathBuf>) -> Result<()> {
    let imported =
        read_csv(&csv).with_context(|| format!("failed to read export {}", csv.display()))?;
    let summary = imported.summary();

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            let client = if imported.client.is_empty() {
                "-"
            } else {
                imported.client.as_str()
            };
            println!("Session {} | client {}", imported.session_id, client);
            print_summary(&summary);
        }
    }

    if let Some(path) = html {
        write_html_report(&imported, &summary, &path)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

/// Print overall accuracy, a per-deck table and the missed list.
pub(crate) fn print_summary(summary: &Summary) {
    use comfy_table::{Cell, Table};

    println!(
        "Overall: {}% ({}/{})",
        summary.percent(),
        summary.correct,
        summary.total
    );

    if !summary.by_deck.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Deck", "Correct", "Total", "Accuracy"]);
        for (deck, stats) in &summary.by_deck {
            table.add_row(vec![
                Cell::new(deck),
                Cell::new(stats.correct),
                Cell::new(stats.total),
                Cell::new(format!("{:.0}%", stats.accuracy() * 100.0)),
            ]);
        }
        println!("{table}");
    }

    if summary.missed.is_empty() {
        println!("Missed (0)");
    } else {
        let labels: Vec<&str> = summary.missed.iter().map(|m| m.label.as_str()).collect();
        println!("Missed ({}): {}", labels.len(), labels.join(", "));
    }
}
