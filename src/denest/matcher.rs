//! Best-effort lookup of fields in a flattened record.
//!
//! Export files nest the same logical field at varying depths from one
//! record to the next, so lookups match any key that merely *contains* the
//! requested name and prefer the shallowest such key.

use crate::denest::flatten::FlatRecord;
use serde_json::Value;

/// Render a leaf value as display text.
///
/// Strings are returned as-is, `null` becomes the empty string, everything
/// else uses its JSON text.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Find the value at the shallowest key containing `substring`.
///
/// Depth is the number of separators in the key. Among equally shallow
/// matches the first one in traversal order wins. Returns an empty string
/// when no key matches.
pub fn find_item(flat: &FlatRecord, substring: &str) -> String {
    let separator = flat.separator();
    let mut best: Option<(usize, &Value)> = None;

    for (key, value) in flat.entries().iter() {
        if !key.contains(substring) {
            continue;
        }
        let depth = key.matches(separator).count();
        match best {
            Some((best_depth, _)) if best_depth <= depth => {}
            _ => best = Some((depth, value)),
        }
    }

    best.map(|(_, value)| stringify(value)).unwrap_or_default()
}

/// Find the values at every key containing `substring`, in traversal order
pub fn find_items(flat: &FlatRecord, substring: &str) -> Vec<String> {
    flat.entries()
        .iter()
        .filter(|(key, _)| key.contains(substring))
        .map(|(_, value)| stringify(value))
        .collect()
}
