//! trialkit-report — session exports.
//!
//! CSV in the fixed column layout therapists import into spreadsheets, a
//! reader for those files, and a self-contained HTML summary.

pub mod csv;
pub mod error;
pub mod html;

pub use csv::{export_filename, parse_csv, read_csv, to_csv, write_csv, ImportedSession};
pub use error::ExportError;
pub use html::{generate_html, write_html_report};
