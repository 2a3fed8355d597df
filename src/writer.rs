use crate::types::Table;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::Write;

/// Writes tables as JSON Lines: one object per row, keyed by column name
pub struct TableWriter<W: Write> {
    writer: W,
}

impl<W: Write> TableWriter<W> {
    pub fn new(writer: W) -> Self {
        TableWriter { writer }
    }

    pub fn write_tables(&mut self, tables: &[Table]) -> Result<()> {
        for table in tables {
            self.write_table(table)?;
        }
        Ok(())
    }

    pub fn write_table(&mut self, table: &Table) -> Result<()> {
        for row in &table.rows {
            let mut data = Map::new();

            // Add metadata
            data.insert("_table_id".to_string(), Value::String(table.id.clone()));

            for (column, cell) in table.columns.iter().zip(row) {
                data.insert(column.clone(), cell.clone());
            }

            let json = serde_json::to_string(&data)
                .context("Failed to serialize row")?;
            writeln!(self.writer, "{}", json)
                .context("Failed to write row")?;
        }
        Ok(())
    }

    /// Write plain strings, one JSON string per line
    pub fn write_list(&mut self, items: &[String]) -> Result<()> {
        for item in items {
            let json = serde_json::to_string(item).context("Failed to serialize item")?;
            writeln!(self.writer, "{}", json).context("Failed to write item")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
