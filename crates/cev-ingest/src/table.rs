//! Tabular upload reader
//!
//! The first CSV record is the header. Every following record must have the
//! same number of fields; a ragged file is not a table and is rejected whole.

use crate::error::ValidationError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header plus rows of raw cell text, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularPayload {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularPayload {
    /// Parse CSV bytes. Header names are trimmed; cell values are kept verbatim.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, ValidationError> {
        let data = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(ValidationError::Empty);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::Headers)
            .from_reader(data);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        tracing::trace!(columns = columns.len(), rows = rows.len(), "CSV table read");

        Ok(Self { columns, rows })
    }

    /// Build a table from rows given as column/value pairs.
    ///
    /// Columns appear in first-seen order; a row without a value for some
    /// column gets an empty cell there.
    pub fn from_mappings<K, V>(rows: Vec<Vec<(K, V)>>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for (key, _) in row {
                if !columns.iter().any(|c| c == key.as_ref()) {
                    columns.push(key.as_ref().to_string());
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells = vec![String::new(); columns.len()];
                for (key, value) in row {
                    if let Some(index) = columns.iter().position(|c| c == key.as_ref()) {
                        cells[index] = value.into();
                    }
                }
                cells
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
