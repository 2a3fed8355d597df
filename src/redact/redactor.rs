use crate::types::Table;
use regex::{NoExpand, Regex};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Literal strings to scrub from one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Denylist {
    literals: BTreeSet<String>,
}

impl Denylist {
    pub fn new() -> Self {
        Denylist::default()
    }

    /// Add a literal; empty strings are ignored
    pub fn insert(&mut self, literal: impl Into<String>) {
        let literal = literal.into();
        if !literal.is_empty() {
            self.literals.insert(literal);
        }
    }

    pub fn contains(&self, literal: &str) -> bool {
        self.literals.contains(literal)
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// One alternation matching any literal verbatim, longest first so a
    /// literal wins over its own prefix
    pub fn to_regex(&self) -> Option<Result<Regex, regex::Error>> {
        if self.literals.is_empty() {
            return None;
        }
        let mut literals: Vec<&String> = self.literals.iter().collect();
        literals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let pattern = literals
            .iter()
            .map(|l| regex::escape(l))
            .collect::<Vec<_>>()
            .join("|");
        Some(Regex::new(&pattern))
    }
}

impl<S: Into<String>> Extend<S> for Denylist {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for literal in iter {
            self.insert(literal);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Denylist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut denylist = Denylist::new();
        denylist.extend(iter);
        denylist
    }
}

fn substitute(value: Value, pattern: &Regex, placeholder: &str) -> Value {
    match value {
        Value::String(s) => Value::String(pattern.replace_all(&s, NoExpand(placeholder)).into_owned()),
        other => other,
    }
}

/// Replace every verbatim occurrence of `literal` in a string cell.
///
/// Non-string cells and empty literals pass through; so does the cell if
/// the pattern cannot be built.
pub fn replace_literal(value: Value, literal: &str, placeholder: &str) -> Value {
    if literal.is_empty() || !value.is_string() {
        return value;
    }
    match Regex::new(&regex::escape(literal)) {
        Ok(pattern) => substitute(value, &pattern, placeholder),
        Err(e) => {
            warn!("could not build redaction pattern: {}", e);
            value
        }
    }
}

/// Replace every denylisted literal in one column with `placeholder`.
///
/// A missing column or an unbuildable pattern leaves the table unchanged.
pub fn replace_in_column(mut table: Table, column: &str, denylist: &Denylist, placeholder: &str) -> Table {
    let Some(idx) = table.column_index(column) else {
        debug!(table = %table.id, column, "column not present, nothing to redact");
        return table;
    };
    let pattern = match denylist.to_regex() {
        None => return table,
        Some(Ok(pattern)) => pattern,
        Some(Err(e)) => {
            warn!(table = %table.id, "could not build redaction pattern: {}", e);
            return table;
        }
    };

    for row in table.rows.iter_mut() {
        if let Some(cell) = row.get_mut(idx) {
            *cell = substitute(cell.take(), &pattern, placeholder);
        }
    }
    table
}

/// Replace `literal` in every cell of every column
pub fn replace_in_table(mut table: Table, literal: &str, placeholder: &str) -> Table {
    if literal.is_empty() {
        return table;
    }
    let pattern = match Regex::new(&regex::escape(literal)) {
        Ok(pattern) => pattern,
        Err(e) => {
            warn!(table = %table.id, "could not build redaction pattern: {}", e);
            return table;
        }
    };

    for cell in table.rows.iter_mut().flat_map(|row| row.iter_mut()) {
        *cell = substitute(cell.take(), &pattern, placeholder);
    }
    table
}
