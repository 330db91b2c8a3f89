//! Downloaded export files (CSV/XLSX/PDF) and the simple CSV parsing used
//! for table-content assertions.
//!
//! Parsing contract: first line is the header row (quote-stripped,
//! comma-split); subsequent lines map positionally to headers. Embedded
//! commas or newlines inside quoted fields are NOT supported — exports from
//! the application under test never produce them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::result::{Error, Result};

const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "pdf"];

/// A completed download surfaced by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested file name from the application
    pub file_name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl Download {
    /// Create a download record
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// True when the file name carries one of the expected export
    /// extensions (.csv, .xlsx, .pdf)
    #[must_use]
    pub fn has_allowed_extension(&self) -> bool {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
    }

    /// Persist the download under `dir`, creating the directory if needed
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }

    /// Interpret the contents as UTF-8 text (CSV exports)
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.bytes.clone()).map_err(|e| Error::Export {
            message: format!("{}: not valid UTF-8: {e}", self.file_name),
        })
    }
}

/// A parsed CSV export: header row plus positional data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn strip_quotes(field: &str) -> String {
    let trimmed = field.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

impl CsvTable {
    /// Parse CSV text per the export contract.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Export`] on empty input.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.trim().lines();
        let header_line = lines.next().ok_or_else(|| Error::Export {
            message: "CSV is empty".to_string(),
        })?;
        let headers: Vec<String> = header_line.split(',').map(strip_quotes).collect();
        let rows = lines
            .map(|line| {
                let mut fields: Vec<String> = line.split(',').map(strip_quotes).collect();
                fields.resize(headers.len(), String::new());
                fields
            })
            .collect();
        Ok(Self { headers, rows })
    }

    /// Header names in column order
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Raw positional rows
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first header matching a predicate (case handling is the
    /// caller's business; exports are inconsistent about header casing)
    pub fn find_header(&self, predicate: impl Fn(&str) -> bool) -> Option<usize> {
        self.headers.iter().position(|h| predicate(h))
    }

    /// Each data row as a header → value mapping
    #[must_use]
    pub fn row_maps(&self) -> Vec<BTreeMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Rows whose `header` column equals `value` exactly
    #[must_use]
    pub fn rows_where(&self, header: &str, value: &str) -> Vec<&Vec<String>> {
        let Some(idx) = self.find_header(|h| h == header) else {
            return Vec::new();
        };
        self.rows.iter().filter(|row| row[idx] == value).collect()
    }

    /// Re-serialize to CSV text. Round-trip stable for the simple
    /// (no embedded comma) case.
    #[must_use]
    pub fn to_csv_string(&self) -> String {
        let mut out = self.headers.join(",");
        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.join(","));
        }
        out
    }
}
