use std::io::{Read, Seek};

use super::header::parse_header;
use super::rows::decode_rows;
use super::sections::{
    locate_data, read_formats, read_value_label_names, read_variable_labels,
    read_variable_names, read_variable_types, section_offsets, skip_expansion_fields,
    skip_sortlist,
};
use super::strls::read_strls;
use super::value_labels::{read_legacy_value_labels, read_tagged_value_labels};
use crate::api::ReadOptions;
use crate::column::Column;
use crate::dataset::{DateKind, DtaMetadata, StrlTable, ValueLabels, Variable};
use crate::error::{Error, Result, Section};

/// Everything the one-time initialization pass learns about a file.
#[derive(Debug, Clone)]
pub struct DtaLayout {
    pub metadata: DtaMetadata,
    pub value_labels: ValueLabels,
    pub strls: StrlTable,
    /// Absolute offset of the first observation.
    pub data_start: u64,
    /// Bytes per observation.
    pub row_width: usize,
    /// Start of each column within an observation.
    pub column_offsets: Vec<usize>,
}

impl DtaLayout {
    /// Absolute offset of observation `row`.
    ///
    /// # Errors
    ///
    /// Returns an error if the offset overflows.
    pub fn row_offset(&self, row: u64) -> Result<u64> {
        (self.row_width as u64)
            .checked_mul(row)
            .and_then(|bytes| bytes.checked_add(self.data_start))
            .ok_or_else(|| Error::invalid(Section::Row { index: row }, "row offset overflows"))
    }

    /// Absolute offset just past the last observation.
    ///
    /// # Errors
    ///
    /// Returns an error if the offset overflows.
    pub fn data_end(&self) -> Result<u64> {
        self.row_offset(self.metadata.row_count)
    }

    /// Decodes `count` observations starting at `first_row`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be read.
    pub fn decode_rows<R: Read + Seek>(
        &self,
        reader: &mut R,
        options: &ReadOptions,
        first_row: u64,
        count: usize,
    ) -> Result<Vec<Column>> {
        decode_rows(reader, self, options, first_row, count)
    }

    /// Reads the value-label dictionary from wherever this format keeps it.
    ///
    /// # Errors
    ///
    /// Returns an error if the section cannot be decoded.
    pub fn read_value_labels<R: Read + Seek>(&self, reader: &mut R) -> Result<ValueLabels> {
        let metadata = &self.metadata;
        let encoding = metadata.version.encoding();
        match &metadata.section_offsets {
            Some(offsets) => {
                read_tagged_value_labels(reader, offsets, metadata.endianness, encoding)
            }
            None => read_legacy_value_labels(
                reader,
                metadata.endianness,
                encoding,
                self.data_end()?,
            ),
        }
    }
}

/// Runs the initialization pass: header, every metadata section, and for
/// tagged files the strl and value-label dictionaries.
///
/// # Errors
///
/// Returns an error if any section cannot be decoded; no partial layout is
/// produced.
pub fn parse_layout<R: Read + Seek>(reader: &mut R) -> Result<DtaLayout> {
    let header = parse_header(reader)?;
    let tagged = header.version.is_tagged();

    let types = read_variable_types(reader, &header)?;
    let names = read_variable_names(reader, &header)?;
    skip_sortlist(reader, &header)?;
    let formats = read_formats(reader, &header)?;
    let value_label_names = read_value_label_names(reader, &header)?;
    let labels = read_variable_labels(reader, &header)?;
    if !tagged {
        skip_expansion_fields(reader, header.endianness)?;
    }
    let data_start = locate_data(reader, &header)?;

    let (strls, value_labels) = if tagged {
        let strls = read_strls(reader, &header)?;
        let value_labels = read_tagged_value_labels(
            reader,
            section_offsets(&header)?,
            header.endianness,
            header.version.encoding(),
        )?;
        (strls, value_labels)
    } else {
        (StrlTable::new(), ValueLabels::new())
    };

    let variables: Vec<Variable> = types
        .into_iter()
        .zip(names)
        .zip(formats)
        .zip(value_label_names.into_iter().zip(labels))
        .enumerate()
        .map(|(index, (((kind, name), format), (value_label_set, label)))| Variable {
            index,
            name,
            kind,
            date: DateKind::from_format(&format),
            format,
            value_label_set,
            label,
        })
        .collect();

    let mut column_offsets = Vec::with_capacity(variables.len());
    let mut row_width = 0usize;
    for variable in &variables {
        column_offsets.push(row_width);
        row_width += variable.kind.storage_width();
    }

    Ok(DtaLayout {
        metadata: header.into_metadata(variables),
        value_labels,
        strls,
        data_start,
        row_width,
        column_offsets,
    })
}
