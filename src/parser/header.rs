use std::io::{Read, Seek, SeekFrom};

use byteorder::ReadBytesExt;

use super::byteorder::{read_bytes, read_u64, read_uint, skip};
use super::encoding::{decode_raw, decode_text};
use crate::dataset::{DtaMetadata, Endianness, FormatVersion, SectionOffsets, Variable};
use crate::error::{Error, Result, Section};

const TAGGED_MAGIC: &[u8; 11] = b"<stata_dta>";
// <stata_dta><header><release>
const TAGGED_PREAMBLE_LEN: usize = 28;
const RELEASE_LEN: usize = 3;
// </release><byteorder>
const AFTER_RELEASE: i64 = 21;
const BYTE_ORDER_LEN: usize = 3;
const BIG_ENDIAN_TOKEN: &[u8; 3] = b"MSF";
// </byteorder><K>
const AFTER_BYTE_ORDER: i64 = 15;
// </K><N>
const AFTER_VARIABLE_COUNT: i64 = 7;
// </N><label>
const AFTER_ROW_COUNT: i64 = 11;
// </label><timestamp>
const AFTER_LABEL: i64 = 19;
// </timestamp></header><map> plus the two leading map entries
const AFTER_TIMESTAMP: i64 = 42;

const LEGACY_BIG_ENDIAN: u8 = 1;
const LEGACY_RESERVED_LEN: i64 = 2;
const LEGACY_LABEL_LEN: usize = 81;
const LEGACY_TIMESTAMP_LEN: usize = 18;

/// Fields shared by both header encodings.
#[derive(Debug, Clone)]
pub struct DtaHeader {
    pub version: FormatVersion,
    pub endianness: Endianness,
    pub variable_count: usize,
    pub row_count: u64,
    pub dataset_label: String,
    pub timestamp: String,
    pub section_offsets: Option<SectionOffsets>,
}

impl DtaHeader {
    #[must_use]
    pub fn into_metadata(self, variables: Vec<Variable>) -> DtaMetadata {
        DtaMetadata {
            version: self.version,
            endianness: self.endianness,
            variable_count: self.variable_count,
            row_count: self.row_count,
            dataset_label: self.dataset_label,
            timestamp: self.timestamp,
            section_offsets: self.section_offsets,
            variables,
        }
    }
}

/// Sniffs the first byte and parses whichever header encoding the file uses.
///
/// # Errors
///
/// Returns an error if the header cannot be read, lacks the tagged magic, or
/// names an unsupported format version.
pub fn parse_header<R: Read + Seek>(reader: &mut R) -> Result<DtaHeader> {
    reader.seek(SeekFrom::Start(0))?;
    let first = reader.read_u8()?;
    reader.seek(SeekFrom::Start(0))?;

    if first == b'<' {
        parse_tagged_header(reader)
    } else {
        parse_legacy_header(reader)
    }
}

fn parse_legacy_header<R: Read + Seek>(reader: &mut R) -> Result<DtaHeader> {
    let version = FormatVersion::from_code(u16::from(reader.read_u8()?))?;
    let endianness = if reader.read_u8()? == LEGACY_BIG_ENDIAN {
        Endianness::Big
    } else {
        Endianness::Little
    };
    skip(reader, LEGACY_RESERVED_LEN)?;

    let variable_count = read_variable_count(reader, version, endianness)?;
    let row_count = read_uint(reader, endianness, version.row_count_width())?;

    let encoding = version.encoding();
    let dataset_label = decode_text(&read_bytes(reader, LEGACY_LABEL_LEN)?, encoding);
    let timestamp = decode_text(&read_bytes(reader, LEGACY_TIMESTAMP_LEN)?, encoding);

    Ok(DtaHeader {
        version,
        endianness,
        variable_count,
        row_count,
        dataset_label,
        timestamp,
        section_offsets: None,
    })
}

fn parse_tagged_header<R: Read + Seek>(reader: &mut R) -> Result<DtaHeader> {
    let preamble = read_bytes(reader, TAGGED_PREAMBLE_LEN)?;
    if !preamble.starts_with(TAGGED_MAGIC) {
        return Err(Error::invalid(Section::Header, "missing <stata_dta> tag"));
    }

    let release = read_bytes(reader, RELEASE_LEN)?;
    let code = std::str::from_utf8(&release)
        .ok()
        .and_then(|text| text.parse::<u16>().ok())
        .ok_or_else(|| Error::invalid(Section::Header, "release field is not a decimal number"))?;
    let version = FormatVersion::from_code(code)?;
    let Some(label_prefix_width) = version.label_prefix_width() else {
        return Err(Error::invalid(
            Section::Header,
            format!("release {code} does not use the tagged header"),
        ));
    };

    skip(reader, AFTER_RELEASE)?;
    let byte_order = read_bytes(reader, BYTE_ORDER_LEN)?;
    let endianness = if byte_order.as_slice() == BIG_ENDIAN_TOKEN {
        Endianness::Big
    } else {
        Endianness::Little
    };

    skip(reader, AFTER_BYTE_ORDER)?;
    let variable_count = read_variable_count(reader, version, endianness)?;

    skip(reader, AFTER_VARIABLE_COUNT)?;
    let row_count = read_uint(reader, endianness, version.row_count_width())?;

    skip(reader, AFTER_ROW_COUNT)?;
    let encoding = version.encoding();
    let label_len = read_uint(reader, endianness, label_prefix_width)?;
    let dataset_label = decode_raw(&read_bytes(reader, length(label_len)?)?, encoding);

    skip(reader, AFTER_LABEL)?;
    let timestamp_len = reader.read_u8()?;
    let timestamp = decode_raw(&read_bytes(reader, usize::from(timestamp_len))?, encoding);

    skip(reader, AFTER_TIMESTAMP)?;
    let section_offsets = read_map(reader, endianness)?;

    Ok(DtaHeader {
        version,
        endianness,
        variable_count,
        row_count,
        dataset_label,
        timestamp,
        section_offsets: Some(section_offsets),
    })
}

fn read_variable_count<R: Read>(
    reader: &mut R,
    version: FormatVersion,
    endianness: Endianness,
) -> Result<usize> {
    let count = read_uint(reader, endianness, version.variable_count_width())?;
    length(count)
}

fn read_map<R: Read>(reader: &mut R, endianness: Endianness) -> Result<SectionOffsets> {
    Ok(SectionOffsets {
        variable_types: read_u64(reader, endianness)?,
        variable_names: read_u64(reader, endianness)?,
        sortlist: read_u64(reader, endianness)?,
        formats: read_u64(reader, endianness)?,
        value_label_names: read_u64(reader, endianness)?,
        variable_labels: read_u64(reader, endianness)?,
        characteristics: read_u64(reader, endianness)?,
        data: read_u64(reader, endianness)?,
        strls: read_u64(reader, endianness)?,
        value_labels: read_u64(reader, endianness)?,
    })
}

fn length(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        Error::invalid(Section::Header, format!("length {value} exceeds address space"))
    })
}
