use crate::file::csv::error::FileError;
use model::{
    core::value::{FieldValue, Value},
    records::row::Row,
};
use paging::PageFetcher;
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CsvSettings {
    pub delimiter: char,
    pub has_headers: bool,
}

impl CsvSettings {
    pub fn new(delimiter: char, has_headers: bool) -> Self {
        CsvSettings {
            delimiter,
            has_headers,
        }
    }
}

impl Default for CsvSettings {
    fn default() -> Self {
        CsvSettings::new(',', true)
    }
}

/// Serves pages of a CSV file, one row per record.
///
/// Reads forward from where the previous page ended, so a sequential scan
/// parses the file once. Asking for an earlier offset reopens the file.
/// Every cell is a string; empty cells become `NULL`.
pub struct CsvPageFetcher {
    path: PathBuf,
    settings: CsvSettings,
    entity: String,
    headers: Vec<String>,
    records: csv::StringRecordsIntoIter<File>,
    /// Records consumed from `records` so far.
    rows_read: u64,
}

impl CsvPageFetcher {
    pub fn open(path: impl AsRef<Path>, settings: CsvSettings) -> Result<Self, FileError> {
        let path = path.as_ref().to_path_buf();
        let entity = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "csv".to_string());

        if !settings.delimiter.is_ascii() {
            return Err(FileError::InvalidFormat(format!(
                "delimiter {:?} is not a single-byte character",
                settings.delimiter
            )));
        }

        let mut reader = Self::reader(&path, &settings)?;
        let headers: Vec<String> = if settings.has_headers {
            reader.headers()?.iter().map(|h| h.trim().to_string()).collect()
        } else {
            // Name columns by position, from the width of the first record.
            let width = Self::reader(&path, &settings)?
                .records()
                .next()
                .transpose()?
                .map(|record| record.len())
                .unwrap_or(0);
            (1..=width).map(|i| format!("column_{i}")).collect()
        };

        // A zero-byte file has no header and no rows; a blank header line is malformed.
        if settings.has_headers && !headers.is_empty() && headers.iter().all(String::is_empty) {
            return Err(FileError::InvalidFormat(format!(
                "{} has no header row",
                path.display()
            )));
        }

        Ok(CsvPageFetcher {
            records: reader.into_records(),
            path,
            settings,
            entity,
            headers,
            rows_read: 0,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    fn reader(path: &Path, settings: &CsvSettings) -> Result<csv::Reader<File>, FileError> {
        let file = File::open(path)?;
        Ok(csv::ReaderBuilder::new()
            .delimiter(settings.delimiter as u8)
            .has_headers(settings.has_headers)
            .flexible(true)
            .from_reader(file))
    }

    fn rewind(&mut self) -> Result<(), FileError> {
        debug!(path = %self.path.display(), "Reopening CSV file");
        self.records = Self::reader(&self.path, &self.settings)?.into_records();
        self.rows_read = 0;
        Ok(())
    }

    /// Cells past the header width are kept under positional names.
    fn to_row(&self, record: &csv::StringRecord) -> Row {
        let width = self.headers.len().max(record.len());
        let fields = (0..width)
            .map(|idx| {
                let value = match record.get(idx) {
                    Some(cell) if !cell.is_empty() => Value::String(cell.to_string()),
                    _ => Value::Null,
                };
                match self.headers.get(idx) {
                    Some(name) => FieldValue::new(name.as_str(), value),
                    None => FieldValue::new(format!("column_{}", idx + 1), value),
                }
            })
            .collect();
        Row::new(&self.entity, fields)
    }
}

impl PageFetcher for CsvPageFetcher {
    type Row = Row;
    type Error = FileError;

    fn fetch_page(&mut self, page_size: u64, offset: u64) -> Result<Vec<Row>, FileError> {
        if offset < self.rows_read {
            self.rewind()?;
        }

        while self.rows_read < offset {
            match self.records.next() {
                Some(record) => {
                    record?;
                    self.rows_read += 1;
                }
                None => return Ok(Vec::new()),
            }
        }

        let mut page = Vec::new();
        while (page.len() as u64) < page_size {
            match self.records.next() {
                Some(record) => {
                    let record = record?;
                    self.rows_read += 1;
                    page.push(self.to_row(&record));
                }
                None => break,
            }
        }

        Ok(page)
    }
}
