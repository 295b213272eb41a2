use std::io::{Read, Seek, SeekFrom};

use byteorder::ReadBytesExt;
use encoding_rs::Encoding;

use super::byteorder::{read_bytes, read_i32, read_u16, skip};
use super::encoding::decode_text;
use super::header::DtaHeader;
use crate::dataset::{Endianness, SectionOffsets, VariableType};
use crate::error::{Error, Result, Section};

const VARIABLE_TYPES_TAG: &[u8] = b"<variable_types>";
const VARIABLE_NAMES_TAG: &[u8] = b"<varnames>";
const FORMATS_TAG: &[u8] = b"<formats>";
const VALUE_LABEL_NAMES_TAG: &[u8] = b"<value_label_names>";
const VARIABLE_LABELS_TAG: &[u8] = b"<variable_labels>";
const DATA_TAG: &[u8] = b"<data>";

/// Returns the section map of a tagged file.
///
/// # Errors
///
/// Returns an error if the header carries no map.
pub fn section_offsets(header: &DtaHeader) -> Result<&SectionOffsets> {
    header
        .section_offsets
        .as_ref()
        .ok_or_else(|| Error::invalid(Section::Map, "tagged file without a section map"))
}

/// Seeks to `offset` and consumes the section's opening tag.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] if the bytes at `offset` are not `tag`.
pub fn enter_section<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    tag: &[u8],
    section: Section,
) -> Result<()> {
    reader.seek(SeekFrom::Start(offset))?;
    let found = read_bytes(reader, tag.len())?;
    if found != tag {
        return Err(Error::invalid(
            section,
            format!(
                "expected {} at offset {offset}",
                String::from_utf8_lossy(tag)
            ),
        ));
    }
    Ok(())
}

/// Reads one type code per variable and normalizes legacy codes.
///
/// # Errors
///
/// Returns [`Error::UnknownTypeTag`] for codes outside every known range.
pub fn read_variable_types<R: Read + Seek>(
    reader: &mut R,
    header: &DtaHeader,
) -> Result<Vec<VariableType>> {
    let count = header.variable_count;
    let mut types = Vec::with_capacity(count);
    if header.version.is_tagged() {
        let offsets = section_offsets(header)?;
        enter_section(
            reader,
            offsets.variable_types,
            VARIABLE_TYPES_TAG,
            Section::VariableTypes,
        )?;
        for column in 0..count {
            let tag = read_u16(reader, header.endianness)?;
            types.push(
                VariableType::from_tag(tag).ok_or(Error::UnknownTypeTag { column, tag })?,
            );
        }
    } else {
        for column in 0..count {
            let code = reader.read_u8()?;
            let tag = VariableType::translate_legacy(code).ok_or(Error::UnknownTypeTag {
                column,
                tag: u16::from(code),
            })?;
            types.push(
                VariableType::from_tag(tag).ok_or(Error::UnknownTypeTag { column, tag })?,
            );
        }
    }
    Ok(types)
}

/// # Errors
///
/// Returns an error on short reads or a misplaced section tag.
pub fn read_variable_names<R: Read + Seek>(
    reader: &mut R,
    header: &DtaHeader,
) -> Result<Vec<String>> {
    if header.version.is_tagged() {
        let offsets = section_offsets(header)?;
        enter_section(
            reader,
            offsets.variable_names,
            VARIABLE_NAMES_TAG,
            Section::VariableNames,
        )?;
    }
    read_fixed_strings(
        reader,
        header.variable_count,
        header.version.variable_name_width(),
        header.version.encoding(),
    )
}

/// Skips the legacy sort list, which sits between names and formats.
///
/// # Errors
///
/// Returns an error if the seek fails.
pub fn skip_sortlist<R: Seek>(reader: &mut R, header: &DtaHeader) -> Result<()> {
    if header.version.is_tagged() {
        return Ok(());
    }
    let entries = i64::try_from(header.variable_count + 1)
        .map_err(|_| Error::invalid(Section::VariableNames, "sort list too large"))?;
    skip(reader, 2 * entries)?;
    Ok(())
}

/// # Errors
///
/// Returns an error on short reads or a misplaced section tag.
pub fn read_formats<R: Read + Seek>(reader: &mut R, header: &DtaHeader) -> Result<Vec<String>> {
    if header.version.is_tagged() {
        let offsets = section_offsets(header)?;
        enter_section(reader, offsets.formats, FORMATS_TAG, Section::Formats)?;
    }
    read_fixed_strings(
        reader,
        header.variable_count,
        header.version.format_width(),
        header.version.encoding(),
    )
}

/// Reads the value-label set name attached to each column. Formats without
/// the section yield an empty name per column and consume nothing.
///
/// # Errors
///
/// Returns an error on short reads or a misplaced section tag.
pub fn read_value_label_names<R: Read + Seek>(
    reader: &mut R,
    header: &DtaHeader,
) -> Result<Vec<String>> {
    let Some(width) = header.version.value_label_name_width() else {
        return Ok(vec![String::new(); header.variable_count]);
    };
    if header.version.is_tagged() {
        let offsets = section_offsets(header)?;
        enter_section(
            reader,
            offsets.value_label_names,
            VALUE_LABEL_NAMES_TAG,
            Section::ValueLabelNames,
        )?;
    }
    read_fixed_strings(
        reader,
        header.variable_count,
        width,
        header.version.encoding(),
    )
}

/// # Errors
///
/// Returns an error on short reads or a misplaced section tag.
pub fn read_variable_labels<R: Read + Seek>(
    reader: &mut R,
    header: &DtaHeader,
) -> Result<Vec<String>> {
    if header.version.is_tagged() {
        let offsets = section_offsets(header)?;
        enter_section(
            reader,
            offsets.variable_labels,
            VARIABLE_LABELS_TAG,
            Section::VariableLabels,
        )?;
    }
    read_fixed_strings(
        reader,
        header.variable_count,
        header.version.variable_label_width(),
        header.version.encoding(),
    )
}

/// Skips legacy expansion fields: `(tag: u8, length: i32)` records followed
/// by `length` bytes, ending at the first record where both are zero.
///
/// # Errors
///
/// Returns an error on short reads or a negative record length.
pub fn skip_expansion_fields<R: Read + Seek>(reader: &mut R, endianness: Endianness) -> Result<()> {
    loop {
        let tag = reader.read_u8()?;
        let length = read_i32(reader, endianness)?;
        if tag == 0 && length == 0 {
            return Ok(());
        }
        if length < 0 {
            return Err(Error::invalid(
                Section::Characteristics,
                format!("negative expansion field length {length}"),
            ));
        }
        skip(reader, i64::from(length))?;
    }
}

/// Locates the first observation byte.
///
/// Tagged files are entered through the map; legacy files start the data
/// wherever the metadata pass stopped.
///
/// # Errors
///
/// Returns an error if the `<data>` tag is missing or the position cannot be
/// queried.
pub fn locate_data<R: Read + Seek>(reader: &mut R, header: &DtaHeader) -> Result<u64> {
    if header.version.is_tagged() {
        let offsets = section_offsets(header)?;
        enter_section(reader, offsets.data, DATA_TAG, Section::Data)?;
    }
    Ok(reader.stream_position()?)
}

fn read_fixed_strings<R: Read>(
    reader: &mut R,
    count: usize,
    width: usize,
    encoding: &'static Encoding,
) -> Result<Vec<String>> {
    let mut buf = vec![0u8; width];
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        reader.read_exact(&mut buf)?;
        values.push(decode_text(&buf, encoding));
    }
    Ok(values)
}
