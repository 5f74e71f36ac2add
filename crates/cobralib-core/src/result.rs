use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Tabular result of a statement.
///
/// Read statements fill `columns` and `rows`; writes report
/// `rows_affected` and carry no rows. `note` annotates the deliberate
/// empty result used where an engine lacks a capability (e.g. listing
/// databases on SQLite), so callers can tell "nothing there" apart from
/// "not applicable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub rows_affected: u64,
    pub note: Option<String>,
}

impl QueryResult {
    /// Result of a read statement.
    pub fn tabular(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            rows_affected: 0,
            note: None,
        }
    }

    /// Result of a write statement.
    pub fn from_write(rows_affected: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            rows_affected,
            note: None,
        }
    }

    /// Deliberately empty result for an engine capability gap.
    pub fn unsupported(columns: Vec<String>, note: impl Into<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            rows_affected: 0,
            note: Some(note.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Index of a named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// All values of one column, rendered as text.
    ///
    /// Convenience for the single-column listings (`Databases`, `Tables`).
    pub fn column_text(&self, column: &str) -> Vec<String> {
        match self.column_index(column) {
            Some(idx) => self
                .rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(Value::as_text)
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueryResult {
        QueryResult::tabular(
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec![Value::Int64(1), Value::Text("Jon".to_string())],
                vec![Value::Int64(2), Value::Text("Fred".to_string())],
            ],
        )
    }

    #[test]
    fn cell_lookup_by_name() {
        let result = sample();
        assert_eq!(result.len(), 2);
        assert_eq!(result.get(1, "name"), Some(&Value::Text("Fred".to_string())));
        assert_eq!(result.get(0, "missing"), None);
        assert_eq!(result.get(5, "id"), None);
    }

    #[test]
    fn column_text_renders_values() {
        let result = sample();
        assert_eq!(result.column_text("id"), vec!["1", "2"]);
        assert!(result.column_text("nope").is_empty());
    }

    #[test]
    fn unsupported_is_empty_but_annotated() {
        let result = QueryResult::unsupported(
            vec!["Databases".to_string()],
            "not supported by this engine",
        );
        assert!(result.is_empty());
        assert!(result.note.is_some());
    }

    #[test]
    fn write_result_has_no_rows() {
        let result = QueryResult::from_write(3);
        assert!(result.is_empty());
        assert_eq!(result.rows_affected, 3);
    }
}
