use crate::utils::error::{RecordsError, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Quoting convention used when a table is written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quoting {
    /// Quote only fields that need it.
    #[default]
    Necessary,
    /// Quote every field, header included.
    All,
}

impl From<Quoting> for csv::QuoteStyle {
    fn from(quoting: Quoting) -> Self {
        match quoting {
            Quoting::Necessary => csv::QuoteStyle::Necessary,
            Quoting::All => csv::QuoteStyle::Always,
        }
    }
}

/// A CSV file held in memory as an ordered header and ordered rows.
///
/// Columns are addressed by name; columns nobody asks for are carried through untouched so a
/// rewrite never drops data. Short rows are padded with empty fields on load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            rows.push(row);
        }

        Ok(Self {
            name: name.into(),
            headers,
            rows,
        })
    }

    pub fn to_csv_string(&self, quoting: Quoting) -> Result<String> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .quote_style(quoting.into())
            .from_writer(Vec::new());

        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }

        let bytes = wtr.into_inner().map_err(|e| RecordsError::IoError(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| RecordsError::ValidationError {
            message: format!("{} produced invalid UTF-8: {}", self.name, e),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
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

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| RecordsError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    pub fn get(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(r) = self.rows.get_mut(row) {
            if r.len() <= column {
                r.resize(column + 1, String::new());
            }
            r[column] = value.into();
        }
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        if row.len() < self.headers.len() {
            row.resize(self.headers.len(), String::new());
        }
        self.rows.push(row);
    }

    /// Parse an integer cell. Row numbers in errors are 1-based data rows.
    pub fn parse_int(&self, row: usize, column: usize) -> Result<i64> {
        let raw = self.get(row, column);
        raw.trim().parse::<i64>().map_err(|_| RecordsError::InvalidNumber {
            table: self.name.clone(),
            row: row + 1,
            field: self.headers.get(column).cloned().unwrap_or_default(),
            value: raw.to_string(),
        })
    }

    /// Insert `column` right after `after`, or return the existing index if already present.
    pub fn ensure_column_after(&mut self, after: &str, column: &str) -> Result<usize> {
        if let Ok(idx) = self.column_index(column) {
            return Ok(idx);
        }

        let at = self.column_index(after)? + 1;
        self.headers.insert(at, column.to_string());
        for row in &mut self.rows {
            if row.len() >= at {
                row.insert(at, String::new());
            } else {
                row.resize(self.headers.len(), String::new());
            }
        }
        Ok(at)
    }
}
