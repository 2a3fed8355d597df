use crate::denest::matcher;
use crate::types::ExtractConfig;
use serde_json::{Map, Value};
use tracing::debug;

/// A single-level view of a nested value.
///
/// Keys are the traversal path (field names and array indices) joined with
/// the separator. Entries keep traversal pre-order. When two paths produce
/// the same key, the later leaf overwrites the earlier value and the key
/// keeps its first position.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    entries: Map<String, Value>,
    separator: String,
    truncated: bool,
}

impl FlatRecord {
    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when part of the input lay beyond the depth limit and was skipped
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Value at the shallowest key containing `substring`, or "" if none
    pub fn find_item(&self, substring: &str) -> String {
        matcher::find_item(self, substring)
    }

    /// Values at every key containing `substring`, in traversal order
    pub fn find_items(&self, substring: &str) -> Vec<String> {
        matcher::find_items(self, substring)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.entries
    }
}

/// Denests arbitrary JSON into a [`FlatRecord`]
pub struct Flattener {
    separator: String,
    max_depth: usize,
}

impl Flattener {
    pub fn new(config: &ExtractConfig) -> Self {
        Flattener {
            separator: config.separator.clone(),
            max_depth: config.max_depth,
        }
    }

    /// Flatten a value with an explicit work-stack.
    ///
    /// Containers whose children would sit deeper than `max_depth` are not
    /// descended into; the record is then marked truncated.
    pub fn flatten(&self, value: &Value) -> FlatRecord {
        let mut entries = Map::new();
        let mut truncated = false;

        // (path key, node, depth); children are pushed in reverse so they pop in source order
        let mut stack: Vec<(String, &Value, usize)> = vec![(String::new(), value, 0)];

        while let Some((path, node, depth)) = stack.pop() {
            match node {
                Value::Object(obj) if !obj.is_empty() => {
                    if depth >= self.max_depth {
                        truncated = true;
                        continue;
                    }
                    for (key, child) in obj.iter().rev() {
                        stack.push((self.child_path(&path, depth, key), child, depth + 1));
                    }
                }
                Value::Array(arr) if !arr.is_empty() => {
                    if depth >= self.max_depth {
                        truncated = true;
                        continue;
                    }
                    for (idx, child) in arr.iter().enumerate().rev() {
                        let segment = idx.to_string();
                        stack.push((self.child_path(&path, depth, &segment), child, depth + 1));
                    }
                }
                leaf => {
                    entries.insert(path, leaf.clone());
                }
            }
        }

        if truncated {
            debug!(max_depth = self.max_depth, "flattened record truncated at depth limit");
        }

        FlatRecord {
            entries,
            separator: self.separator.clone(),
            truncated,
        }
    }

    fn child_path(&self, parent: &str, depth: usize, segment: &str) -> String {
        if depth == 0 {
            segment.to_string()
        } else {
            format!("{}{}{}", parent, self.separator, segment)
        }
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Flattener::new(&ExtractConfig::default())
    }
}

/// Flatten with the default separator and depth limit
pub fn flatten(value: &Value) -> FlatRecord {
    Flattener::default().flatten(value)
}
