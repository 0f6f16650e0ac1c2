//! Spreadsheet Reader
//!
//! Opens an uploaded tabular file and exposes its first worksheet as trimmed
//! cell text. Row 1 holds the headers; data rows start at row 2.
//!
//! Supported inputs:
//! - `*.csv`: delimiter sniffed from the header line (`,` `;` tab `|`)
//! - anything else: handed to calamine (xlsx, xlsm, xls, xlsb, ods)
//!
//! The whole sheet is decoded on open, so the upload buffer is fully consumed
//! before the caller gets a reader back.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::models::RowRecord;

/// Reader failures
#[derive(Debug, Error)]
pub enum ReaderError {
    /// File could not be decoded as tabular data
    #[error("'{file_name}' could not be opened as a spreadsheet: {reason}")]
    UnreadableFile { file_name: String, reason: String },

    /// No worksheet, or no populated cells in the first one
    #[error("'{0}' has no populated worksheet")]
    EmptyWorksheet(String),
}

/// An uploaded file: original name plus raw bytes
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }

    fn is_csv(&self) -> bool {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
    }
}

/// Decoded first worksheet
#[derive(Debug, Clone)]
pub struct SpreadsheetReader {
    file_name: String,
    /// Absolute layout: `grid[0]` is sheet row 1, `grid[r][0]` is column A
    grid: Vec<Vec<String>>,
}

impl SpreadsheetReader {
    /// Open and decode the first worksheet of `file`
    pub fn open(file: &UploadedFile) -> Result<Self, ReaderError> {
        if file.bytes.is_empty() {
            return Err(ReaderError::UnreadableFile {
                file_name: file.file_name.clone(),
                reason: "file is empty".to_string(),
            });
        }

        let mut grid = if file.is_csv() {
            read_csv_grid(file)?
        } else {
            read_workbook_grid(file)?
        };

        // Keep rows only up to the last populated one
        while grid
            .last()
            .is_some_and(|row| row.iter().all(|cell| cell.is_empty()))
        {
            grid.pop();
        }

        debug!(
            file_name = %file.file_name,
            rows = grid.len(),
            "Spreadsheet decoded"
        );

        Ok(Self {
            file_name: file.file_name.clone(),
            grid,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Header strings from row 1, in file column order
    ///
    /// Trailing blank header cells are dropped. An unpopulated sheet yields an
    /// empty list rather than an error.
    pub fn read_headers(&self) -> Vec<String> {
        let Some(first) = self.grid.first() else {
            return Vec::new();
        };

        let mut headers = first.clone();
        while headers.last().is_some_and(|h| h.is_empty()) {
            headers.pop();
        }
        headers
    }

    /// Data rows from `start_row` (1-based) to the last populated row
    ///
    /// Column `i` is keyed by `header_names[i]`; columns beyond the header
    /// list are ignored and missing cells become empty strings. When two
    /// columns share a name the leftmost one is kept.
    pub fn read_rows(
        &self,
        header_names: &[String],
        start_row: u32,
    ) -> Result<Vec<RowRecord>, ReaderError> {
        if self.grid.is_empty() {
            return Err(ReaderError::EmptyWorksheet(self.file_name.clone()));
        }

        let first_index = start_row.max(1) as usize - 1;
        let rows = self
            .grid
            .iter()
            .enumerate()
            .skip(first_index)
            .map(|(index, cells)| {
                let mut data = BTreeMap::new();
                for (column, header) in header_names.iter().enumerate() {
                    let value = cells.get(column).cloned().unwrap_or_default();
                    data.entry(header.clone()).or_insert(value);
                }
                RowRecord::new(index as u32 + 1, data)
            })
            .collect();

        Ok(rows)
    }
}

fn unreadable(file: &UploadedFile, reason: impl ToString) -> ReaderError {
    ReaderError::UnreadableFile {
        file_name: file.file_name.clone(),
        reason: reason.to_string(),
    }
}

fn read_workbook_grid(file: &UploadedFile) -> Result<Vec<Vec<String>>, ReaderError> {
    let cursor = Cursor::new(file.bytes.clone());
    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| unreadable(file, e))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ReaderError::EmptyWorksheet(file.file_name.clone()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| unreadable(file, e))?;

    let Some((start_row, start_col)) = range.start() else {
        return Ok(Vec::new());
    };

    let mut grid: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_text));
        grid.push(cells);
    }
    Ok(grid)
}

/// Text form of a spreadsheet cell
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time() == chrono::NaiveTime::MIN => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
    }
}

fn read_csv_grid(file: &UploadedFile) -> Result<Vec<Vec<String>>, ReaderError> {
    let text = std::str::from_utf8(&file.bytes)
        .map_err(|_| unreadable(file, "CSV is not valid UTF-8"))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let header_line = text.lines().next().unwrap_or_default();
    let delimiter = sniff_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| unreadable(file, e))?;
        grid.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }
    Ok(grid)
}

/// Most frequent candidate delimiter in the header line; `,` on a tie or none
fn sniff_delimiter(header_line: &str) -> u8 {
    let mut best = (b',', header_line.matches(',').count());
    for candidate in [b';', b'\t', b'|'] {
        let count = header_line.matches(candidate as char).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}
