//! Time-series input tables
//!
//! A [`TimeSeriesTable`] is built once per run, either from a delimited
//! text file by [`TableReader`] or synthesised by [`synthetic::generate`],
//! and is only read afterwards.

pub mod reader;
pub mod synthetic;
pub mod timestamp;

pub use reader::{Ingestion, TableReader, BAD_RECORD_LOG};

use serde::Serialize;

/// One (timestamp, value) row in canonical text form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// `%Y-%m-%dT%H:%M:%S`
    pub timestamp: String,
    pub value: String,
}

impl Row {
    pub fn new(timestamp: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            value: value.into(),
        }
    }
}

/// Ordered two-column table; source order is preserved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeriesTable {
    rows: Vec<Row>,
}

impl TimeSeriesTable {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as the `[[timestamp, value], ...]` matrix the service expects
    pub fn values(&self) -> Vec<[&str; 2]> {
        self.rows
            .iter()
            .map(|row| [row.timestamp.as_str(), row.value.as_str()])
            .collect()
    }
}

impl FromIterator<Row> for TimeSeriesTable {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_matrix_keeps_order() {
        let table: TimeSeriesTable = vec![
            Row::new("2020-01-01T00:00:00", "5"),
            Row::new("2020-01-01T00:02:00", "7"),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.values(),
            vec![["2020-01-01T00:00:00", "5"], ["2020-01-01T00:02:00", "7"]]
        );
    }
}
