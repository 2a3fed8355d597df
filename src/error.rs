use thiserror::Error;

/// Failures raised inside the extraction engine.
///
/// Most of the engine fails open and never surfaces these; they show up
/// where a caller builds something explicit (a template table, a row) or
/// inside an extraction routine, where `guarded` turns them into an empty
/// table.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("expected field '{0}' is missing")]
    MissingField(String),
    #[error("export file '{0}' is not present")]
    MissingFile(String),
    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),
    #[error("failed to compile pattern '{pattern}': {source}")]
    PatternCompile {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("pattern '{pattern}' has no capture group {group}")]
    MissingCaptureGroup { pattern: String, group: usize },
    #[error("row has {found} cells but the table has {expected} columns")]
    RowArity { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, ExtractError>;
