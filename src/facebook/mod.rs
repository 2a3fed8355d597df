//! Facebook data download - table extraction and scrubbing
//!
//! Each known export file has a routine that turns it into one [`Table`].
//! Routines never fail: anything that goes wrong inside one is logged and
//! yields an empty table, so a single odd file cannot sink the others.
//!
//! ```rust
//! use crucible::facebook::{extract_all, ExportSource};
//! use crucible::ExtractConfig;
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! let mut files = HashMap::new();
//! files.insert(
//!     "comments.json".to_string(),
//!     json!({"comments_v2": [{
//!         "timestamp": 1609459200,
//!         "title": "Jane Doe commented on Mary's post.",
//!         "data": [{"comment": {"comment": "Congrats Mary!", "author": "Jane Doe"}}]
//!     }]}),
//! );
//! files.insert(
//!     "profile_information.json".to_string(),
//!     json!({"profile_v2": {"name": {"full_name": "Jane Doe"}}}),
//! );
//!
//! let tables = extract_all(&files, &ExtractConfig::default());
//! let comments = tables.iter().find(|t| t.id == "comments").unwrap();
//! assert_eq!(comments.rows[0][0], "You commented on <Redacted>'s post.");
//! assert_eq!(comments.rows[0][1], "Congrats <Redacted>!");
//! ```

pub mod identity;
pub mod source;
pub mod tables;

pub use identity::{groups_to_list, Identity};
pub use source::{DirectorySource, ExportSource};
pub use tables::all_tables;

use crate::error::ExtractError;
use crate::redact::{replace_in_column, replace_in_table, RecipientExtractor};
use crate::types::{ExtractConfig, Table};
use tracing::{debug, error, info};

const PLATFORM: &str = "Facebook";

/// Run one extraction, turning any failure into an empty copy of `template`
pub(crate) fn guarded<F>(template: Table, f: F) -> Table
where
    F: FnOnce(Table) -> anyhow::Result<Table>,
{
    let empty = template.emptied();
    match f(template) {
        Ok(table) => table,
        Err(e) => {
            match e.downcast_ref::<ExtractError>() {
                Some(ExtractError::MissingFile(file)) => {
                    debug!(table = %empty.id, file = %file, "export file not present");
                }
                _ => error!(table = %empty.id, "extraction failed: {:#}", e),
            }
            empty
        }
    }
}

/// Scrub one table before it is shown.
///
/// Third-party names are collected from the recipient columns first, then
/// contact details plus the collected names are redacted in the redact
/// columns, and finally the account holder's name becomes the "you" token
/// everywhere.
pub fn scrub(table: Table, identity: &Identity, config: &ExtractConfig) -> Table {
    let extractor = RecipientExtractor::builtin();
    let mut denylist = identity.contact_details();
    for column in &config.recipient_columns {
        denylist.extend(extractor.extract(&table, column));
    }

    let mut table = table;
    for column in &config.redact_columns {
        table = replace_in_column(table, column, &denylist, &config.placeholder);
    }
    match &identity.username {
        Some(username) => replace_in_table(table, username, &config.you_token),
        None => table,
    }
}

/// Extract, scrub and chunk every table in the export.
///
/// Empty tables are dropped; if nothing is left a single "no data" table is
/// returned so the reviewer always sees something.
pub fn extract_all(source: &dyn ExportSource, config: &ExtractConfig) -> Vec<Table> {
    let identity = Identity::from_source(source);
    let mut out = Vec::new();

    for table in all_tables(source, config) {
        if table.is_empty() {
            continue;
        }
        info!(table = %table.id, rows = table.len(), "extracted table");
        let table = scrub(table, &identity, config);
        out.extend(table.split(config.chunk_size));
    }

    if out.is_empty() {
        out.push(Table::no_data(PLATFORM));
    }
    out
}
