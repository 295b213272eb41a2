use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::dataset::{DtaMetadata, StrlTable, ValueLabels, Variable};
use crate::error::{Error, Result, Section};
use crate::logger::{log_error, set_log_prefix};
use crate::parser::{DtaLayout, parse_layout};

/// Construction-time switches for post-processing decoded cells.
///
/// Every switch defaults to `true`. Missing fields keep their defaults when
/// deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ReadOptions {
    resolve_long_strings: bool,
    resolve_category_labels: bool,
    convert_dates: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolve_long_strings: true,
            resolve_category_labels: true,
            convert_dates: true,
        }
    }

    /// Substitute long-string text for raw strl references.
    #[must_use]
    pub const fn with_resolve_long_strings(mut self, enabled: bool) -> Self {
        self.resolve_long_strings = enabled;
        self
    }

    /// Substitute category-label text for byte codes.
    #[must_use]
    pub const fn with_resolve_category_labels(mut self, enabled: bool) -> Self {
        self.resolve_category_labels = enabled;
        self
    }

    /// Convert `%td` / `%tc` columns to timestamps.
    #[must_use]
    pub const fn with_convert_dates(mut self, enabled: bool) -> Self {
        self.convert_dates = enabled;
        self
    }

    #[must_use]
    pub const fn resolve_long_strings(&self) -> bool {
        self.resolve_long_strings
    }

    #[must_use]
    pub const fn resolve_category_labels(&self) -> bool {
        self.resolve_category_labels
    }

    #[must_use]
    pub const fn convert_dates(&self) -> bool {
        self.convert_dates
    }
}

/// Reader over one dta byte source.
///
/// Construction runs the whole metadata pass; [`DtaReader::read`] then
/// consumes observations incrementally. The reader owns a single cursor and
/// must not be shared between callers without external synchronization.
pub struct DtaReader<R: Read + Seek> {
    reader: R,
    layout: DtaLayout,
    options: ReadOptions,
    rows_read: u64,
}

impl DtaReader<File> {
    /// Opens a dta file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or if the metadata
    /// cannot be parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ReadOptions::new())
    }

    /// Opens a dta file from disk with explicit read options.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or if the metadata
    /// cannot be parsed.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let _prefix = set_log_prefix(path.display().to_string());
        let result = File::open(path)
            .map_err(Error::from)
            .and_then(|file| Self::from_reader_with_options(file, options));
        if let Err(err) = &result {
            log_error(&format!("failed to initialise reader: {err}"));
        }
        result
    }
}

impl<R: Read + Seek> DtaReader<R> {
    /// Builds a reader from any `Read + Seek` implementor.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata parsing fails.
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ReadOptions::new())
    }

    /// Builds a reader with explicit read options.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata parsing fails.
    pub fn from_reader_with_options(mut reader: R, options: ReadOptions) -> Result<Self> {
        let layout = parse_layout(&mut reader)?;
        Ok(Self {
            reader,
            layout,
            options,
            rows_read: 0,
        })
    }

    pub const fn metadata(&self) -> &DtaMetadata {
        &self.layout.metadata
    }

    pub const fn layout(&self) -> &DtaLayout {
        &self.layout
    }

    pub const fn options(&self) -> &ReadOptions {
        &self.options
    }

    pub fn variables(&self) -> &[Variable] {
        &self.layout.metadata.variables
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.variables().iter().map(|v| v.name.as_str()).collect()
    }

    pub fn formats(&self) -> Vec<&str> {
        self.variables().iter().map(|v| v.format.as_str()).collect()
    }

    /// Long descriptive label of each column.
    pub fn variable_labels(&self) -> Vec<&str> {
        self.variables().iter().map(|v| v.label.as_str()).collect()
    }

    pub fn value_label_names(&self) -> Vec<&str> {
        self.variables()
            .iter()
            .map(|v| v.value_label_set.as_str())
            .collect()
    }

    /// Normalized type tag of each column.
    pub fn var_types(&self) -> Vec<u16> {
        self.variables().iter().map(Variable::type_tag).collect()
    }

    pub fn dataset_label(&self) -> &str {
        &self.layout.metadata.dataset_label
    }

    pub fn timestamp(&self) -> &str {
        &self.layout.metadata.timestamp
    }

    pub const fn value_labels(&self) -> &ValueLabels {
        &self.layout.value_labels
    }

    pub const fn strls(&self) -> &StrlTable {
        &self.layout.strls
    }

    pub const fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub const fn remaining_rows(&self) -> u64 {
        self.layout.metadata.row_count.saturating_sub(self.rows_read)
    }

    /// Decodes up to `rows` further observations, or every remaining one when
    /// `rows` is negative.
    ///
    /// Returns one column per variable. On error nothing is returned and the
    /// cursor stays where it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the data section cannot be read.
    pub fn read(&mut self, rows: i64) -> Result<Vec<Column>> {
        let remaining = self.remaining_rows();
        let requested = u64::try_from(rows).map_or(remaining, |rows| rows.min(remaining));
        let count = usize::try_from(requested).map_err(|_| {
            Error::invalid(
                Section::Data,
                format!("{requested} rows do not fit in memory on this platform"),
            )
        })?;
        let columns = self
            .layout
            .decode_rows(&mut self.reader, &self.options, self.rows_read, count)?;
        self.rows_read += requested;
        Ok(columns)
    }

    /// Decodes every remaining observation.
    ///
    /// # Errors
    ///
    /// Returns an error if the data section cannot be read.
    pub fn read_all(&mut self) -> Result<Vec<Column>> {
        self.read(-1)
    }

    /// Reads the value-label dictionary and replaces the current one.
    ///
    /// Tagged files load it during construction; 114/115 files keep their
    /// labels after the data and need this call before category labels can
    /// be substituted.
    ///
    /// # Errors
    ///
    /// Returns an error if the section cannot be decoded.
    pub fn load_value_labels(&mut self) -> Result<&ValueLabels> {
        self.layout.value_labels = self.layout.read_value_labels(&mut self.reader)?;
        Ok(&self.layout.value_labels)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
