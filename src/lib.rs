//! # Crucible - Data Download Extraction Toolkit
//!
//! Turns the deeply and inconsistently nested JSON of a platform data
//! download into flat, reviewable tables, with identifying strings scrubbed
//! before anyone looks at them.
//!
//! ## Modules
//!
//! - **denest**: flatten nested JSON and look fields up by (partial) name
//! - **timestamp**: epoch to ISO-8601, and a newest-first sort key
//! - **redact**: verbatim denylist redaction and third-party name discovery
//! - **facebook**: per-file extraction routines for a Facebook download
//!
//! ## Quick Start
//!
//! ```rust
//! use crucible::denest::flatten;
//! use crucible::timestamp::epoch_str_to_iso;
//! use serde_json::json;
//!
//! let post = json!({
//!     "timestamp": 1609459200,
//!     "title": "Jane posted in Rustaceans.",
//!     "data": [{"post": "Hello!"}],
//!     "attachments": [{"data": [{"media": {"title": "photo.jpg"}}]}]
//! });
//!
//! let flat = flatten(&post);
//! assert_eq!(flat.find_item("title"), "Jane posted in Rustaceans.");
//! assert_eq!(flat.find_item("post"), "Hello!");
//! assert_eq!(epoch_str_to_iso(&flat.find_item("timestamp")), "2021-01-01T00:00:00+00:00");
//! ```
//!
//! ### Redaction
//!
//! ```rust
//! use crucible::redact::{extract_recipients, replace_in_column, Denylist};
//! use crucible::Table;
//! use serde_json::json;
//!
//! let mut table = Table::new("comments", "Comments", &["Title"]);
//! table.push_row(vec![json!("John commented on Mary's post.")]).unwrap();
//!
//! let denylist: Denylist = extract_recipients(&table, "Title").into_iter().collect();
//! let table = replace_in_column(table, "Title", &denylist, "<Redacted>");
//! assert_eq!(table.rows[0][0], "John commented on <Redacted>'s post.");
//! ```

use anyhow::Result;
use std::path::Path;

pub mod denest;
pub mod error;
pub mod facebook;
pub mod redact;
pub mod text;
pub mod timestamp;
pub mod types;
pub mod writer;

// Re-export commonly used types for convenience
pub use denest::{find_item, find_items, flatten, FlatRecord, Flattener};
pub use error::ExtractError;
pub use redact::{extract_recipients, replace_in_column, replace_literal, Denylist};
pub use timestamp::{epoch_to_iso, sort_key};
pub use types::{ExtractConfig, Row, Table};
pub use writer::TableWriter;

/// Main entry point: extract every table from an unzipped Facebook download
pub fn extract_export<P: AsRef<Path>>(export_dir: P, config: &ExtractConfig) -> Result<Vec<Table>> {
    let source = facebook::DirectorySource::new(export_dir)?;
    Ok(facebook::extract_all(&source, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_export_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("your_saved_items.json"),
            r#"{"saves_v2": [{"title": "Jane saved Bob's link.", "timestamp": 1609459200}]}"#,
        )
        .unwrap();

        let tables = extract_export(dir.path(), &ExtractConfig::default()).unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].id, "your_saved_items");
        assert_eq!(tables[0].rows[0][1], "2021-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_extract_export_missing_directory() {
        assert!(extract_export("/definitely/not/here", &ExtractConfig::default()).is_err());
    }
}
