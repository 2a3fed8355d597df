use crate::error::{ExtractError, Result};
use crate::timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One extracted row: a fixed-arity tuple of cells, one per table column
pub type Row = Vec<Value>;

/// A named table of extracted rows, ready for review and redaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Stable identifier, e.g. "group_posts_and_comments"
    pub id: String,

    /// Human readable title shown above the table
    pub title: String,

    /// Column names, in display order
    pub columns: Vec<String>,

    /// Rows, each with exactly `columns.len()` cells
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(id: impl Into<String>, title: impl Into<String>, columns: &[&str]) -> Self {
        Table {
            id: id.into(),
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// An empty table with the same id, title and columns
    pub fn emptied(&self) -> Self {
        Table {
            id: self.id.clone(),
            title: self.title.clone(),
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    /// Placeholder shown when nothing at all could be extracted
    pub fn no_data(platform: &str) -> Self {
        let mut table = Table::new(
            format!("{}_no_data_found", platform),
            "Nothing went wrong, but we could not find any data",
            &["No data found"],
        );
        table.rows.push(vec![Value::String("No data found".to_string())]);
        table
    }

    /// Append a row, rejecting it if its arity does not match the columns
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ExtractError::RowArity {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the cells of one column
    pub fn column_cells(&self, column: &str) -> impl Iterator<Item = &Value> {
        let idx = self.column_index(column);
        self.rows
            .iter()
            .filter_map(move |row| idx.and_then(|i| row.get(i)))
    }

    /// Sort rows newest first by the timestamp in `column`; undated rows go last.
    /// Unknown columns leave the order untouched.
    pub fn sort_by_timestamp(&mut self, column: &str) {
        if let Some(idx) = self.column_index(column) {
            timestamp::sort_rows_by_timestamp(&mut self.rows, idx);
        }
    }

    /// Split into tables of at most `row_count` rows each.
    ///
    /// Large tables render slowly downstream, so they are shown in chunks.
    /// Chunk ids get a `_1`, `_2`, ... suffix when more than one chunk results.
    pub fn split(self, row_count: usize) -> Vec<Table> {
        if row_count == 0 || self.rows.len() <= row_count {
            return vec![self];
        }

        let Table { id, title, columns, rows } = self;
        rows.chunks(row_count)
            .enumerate()
            .map(|(i, chunk)| Table {
                id: format!("{}_{}", id, i + 1),
                title: title.clone(),
                columns: columns.clone(),
                rows: chunk.to_vec(),
            })
            .collect()
    }
}

/// Configuration for extraction and redaction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Maximum nesting depth the flattener descends into
    pub max_depth: usize,

    /// Separator joining path segments in flattened keys
    pub separator: String,

    /// Token substituted for redacted strings
    pub placeholder: String,

    /// Token substituted for the account holder's own name
    pub you_token: String,

    /// Columns scrubbed with the denylist
    pub redact_columns: Vec<String>,

    /// Free-text columns scanned for third-party names
    pub recipient_columns: Vec<String>,

    /// Maximum rows per emitted table (0 = no chunking)
    pub chunk_size: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            max_depth: 64,
            separator: String::from("-"),
            placeholder: String::from("<Redacted>"),
            you_token: String::from("You"),
            redact_columns: ["Title", "Post", "Comment", "Text", "Name"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            recipient_columns: vec![String::from("Title")],
            chunk_size: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(rows: usize) -> Table {
        let mut table = Table::new("posts", "Posts", &["Title", "Date"]);
        for i in 0..rows {
            table.push_row(vec![json!(format!("post {}", i)), json!("")]).unwrap();
        }
        table
    }

    #[test]
    fn test_push_row_checks_arity() {
        let mut table = Table::new("t", "T", &["A", "B"]);
        assert!(table.push_row(vec![json!("a"), json!("b")]).is_ok());

        let err = table.push_row(vec![json!("a")]).unwrap_err();
        assert!(matches!(err, ExtractError::RowArity { expected: 2, found: 1 }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_split_into_chunks() {
        let chunks = sample(5).split(2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].id, "posts_1");
        assert_eq!(chunks[2].id, "posts_3");
        assert_eq!(chunks[2].len(), 1);
        assert_eq!(chunks[1].rows[0][0], "post 2");
    }

    #[test]
    fn test_split_small_table_keeps_id() {
        let chunks = sample(2).split(10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "posts");

        let whole = sample(3).split(0);
        assert_eq!(whole[0].len(), 3);
    }

    #[test]
    fn test_sort_by_timestamp() {
        let mut table = Table::new("t", "T", &["Title", "Date"]);
        table.push_row(vec![json!("old"), json!("2021-01-01T00:00:00+00:00")]).unwrap();
        table.push_row(vec![json!("none"), json!("")]).unwrap();
        table.push_row(vec![json!("new"), json!("2022-01-01T00:00:00+00:00")]).unwrap();

        table.sort_by_timestamp("Date");
        let titles: Vec<_> = table.column_cells("Title").cloned().collect();
        assert_eq!(titles, vec![json!("new"), json!("old"), json!("none")]);
    }

    #[test]
    fn test_no_data_table() {
        let table = Table::no_data("Facebook");
        assert_eq!(table.id, "Facebook_no_data_found");
        assert_eq!(table.len(), 1);
    }
}
