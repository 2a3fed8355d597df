use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Hands out parsed export files by file name.
///
/// Reading and validating the downloaded archive happens elsewhere; the
/// extractors only ever ask for one file's parsed JSON.
pub trait ExportSource {
    /// Parsed contents of `file_name`, or `None` if the export lacks it
    fn read_json(&self, file_name: &str) -> Option<Value>;
}

impl ExportSource for HashMap<String, Value> {
    fn read_json(&self, file_name: &str) -> Option<Value> {
        self.get(file_name).cloned()
    }
}

/// An unzipped export on disk, indexed by file name
#[derive(Debug, Clone)]
pub struct DirectorySource {
    files: HashMap<String, PathBuf>,
}

impl DirectorySource {
    /// Index every `*.json` file under `root`; when two share a name the first found is kept
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let mut files = HashMap::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let entries = std::fs::read_dir(&dir)
                .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
            for entry in entries {
                let path = entry.context("Failed to read directory entry")?.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if files.contains_key(name) {
                    debug!(file = name, path = %path.display(), "duplicate file name, keeping first");
                    continue;
                }
                files.insert(name.to_string(), path);
            }
        }

        debug!(root = %root.display(), count = files.len(), "indexed export files");
        Ok(DirectorySource { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ExportSource for DirectorySource {
    fn read_json(&self, file_name: &str) -> Option<Value> {
        let path = self.files.get(file_name)?;
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), "failed to read export file: {}", e);
                return None;
            }
        };
        match parse_json(bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), "failed to parse export file: {:#}", e);
                None
            }
        }
    }
}

/// Parse with simd-json, falling back to serde_json when the SIMD parser rejects the input
pub fn parse_json(bytes: Vec<u8>) -> Result<Value> {
    // simd-json rewrites its buffer in place, so parse a scratch copy
    let mut scratch = bytes.clone();
    match simd_json::serde::from_slice::<Value>(&mut scratch) {
        Ok(value) => Ok(value),
        Err(_) => serde_json::from_slice(&bytes).context("Failed to parse JSON"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_source() {
        let mut files = HashMap::new();
        files.insert("a.json".to_string(), json!({"x": 1}));

        assert_eq!(files.read_json("a.json"), Some(json!({"x": 1})));
        assert_eq!(files.read_json("b.json"), None);
    }

    #[test]
    fn test_directory_source_indexes_nested_json() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("your_activity").join("comments");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("comments.json"), r#"{"comments_v2": []}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        let source = DirectorySource::new(dir.path()).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.read_json("comments.json"), Some(json!({"comments_v2": []})));
        assert_eq!(source.read_json("broken.json"), None);
        assert_eq!(source.read_json("notes.txt"), None);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DirectorySource::new(dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_parse_json_keeps_field_order() {
        let value = parse_json(br#"{"b": 1, "a": [true, null]}"#.to_vec()).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
