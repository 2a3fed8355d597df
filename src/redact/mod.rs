//! Redaction - scrub identifying strings from extracted tables
//!
//! A table's denylist is the account holder's identity strings plus every
//! third-party name the recipient templates find in that same table.
//! All matching is verbatim: denylist entries are never read as patterns.

pub mod recipients;
pub mod redactor;

pub use recipients::{
    extract_recipients, Language, RecipientExtractor, RecipientTemplate, RecipientTemplates,
    TEMPLATE_VERSION,
};
pub use redactor::{replace_in_column, replace_in_table, replace_literal, Denylist};
