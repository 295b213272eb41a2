use std::io::{Read, Seek, SeekFrom};

use encoding_rs::Encoding;

use super::byteorder::{read_bytes, read_i32, read_marker, read_u32, skip};
use super::encoding::decode_text;
use super::sections::enter_section;
use crate::dataset::{Endianness, SectionOffsets, ValueLabelSet, ValueLabels};
use crate::error::{Error, Result, Section};

const VALUE_LABELS_TAG: &[u8] = b"<value_labels>";
const LBL_OPEN: &[u8; 5] = b"<lbl>";
// </lbl>
const LBL_CLOSE_LEN: i64 = 6;
const RECORD_LENGTH_LEN: i64 = 4;
const TAGGED_SET_NAME_LEN: usize = 129;
const LEGACY_SET_NAME_LEN: usize = 33;
const SET_NAME_PADDING: i64 = 3;

/// Reads every `<lbl>` record of a tagged file.
///
/// # Errors
///
/// Returns an error if the `<value_labels>` tag is missing or a record is
/// truncated or inconsistent.
pub fn read_tagged_value_labels<R: Read + Seek>(
    reader: &mut R,
    offsets: &SectionOffsets,
    endianness: Endianness,
    encoding: &'static Encoding,
) -> Result<ValueLabels> {
    enter_section(
        reader,
        offsets.value_labels,
        VALUE_LABELS_TAG,
        Section::ValueLabels,
    )?;
    scan_tagged_value_labels(reader, endianness, encoding)
}

/// Consumes `<lbl>` records until the first other marker.
///
/// # Errors
///
/// Returns an error if a record is truncated or inconsistent.
pub fn scan_tagged_value_labels<R: Read + Seek>(
    reader: &mut R,
    endianness: Endianness,
    encoding: &'static Encoding,
) -> Result<ValueLabels> {
    let mut sets = ValueLabels::new();
    loop {
        let Some(marker) = read_marker::<_, 5>(reader)? else {
            break;
        };
        if &marker != LBL_OPEN {
            break;
        }
        skip(reader, RECORD_LENGTH_LEN)?;
        let name = decode_text(&read_bytes(reader, TAGGED_SET_NAME_LEN)?, encoding);
        skip(reader, SET_NAME_PADDING)?;
        let set = read_label_table(reader, endianness, encoding, name)?;
        skip(reader, LBL_CLOSE_LEN)?;
        sets.insert(set.name.clone(), set);
    }
    Ok(sets)
}

/// Reads the value labels that follow the data in 114/115 files. The
/// section runs to the end of the stream.
///
/// # Errors
///
/// Returns an error if a record is truncated or inconsistent.
pub fn read_legacy_value_labels<R: Read + Seek>(
    reader: &mut R,
    endianness: Endianness,
    encoding: &'static Encoding,
    start: u64,
) -> Result<ValueLabels> {
    reader.seek(SeekFrom::Start(start))?;
    let mut sets = ValueLabels::new();
    while read_marker::<_, 4>(reader)?.is_some() {
        let name = decode_text(&read_bytes(reader, LEGACY_SET_NAME_LEN)?, encoding);
        skip(reader, SET_NAME_PADDING)?;
        let set = read_label_table(reader, endianness, encoding, name)?;
        sets.insert(set.name.clone(), set);
    }
    Ok(sets)
}

/// Decodes one label table: entry count, text length, offsets, codes and the
/// text block the offsets point into.
fn read_label_table<R: Read>(
    reader: &mut R,
    endianness: Endianness,
    encoding: &'static Encoding,
    name: String,
) -> Result<ValueLabelSet> {
    let count = read_u32(reader, endianness)?;
    let text_len = read_u32(reader, endianness)?;

    let mut offsets = Vec::new();
    for _ in 0..count {
        offsets.push(read_u32(reader, endianness)?);
    }
    let mut codes = Vec::new();
    for _ in 0..count {
        codes.push(read_i32(reader, endianness)?);
    }
    let text_len = usize::try_from(text_len)
        .map_err(|_| Error::invalid(Section::ValueLabels, "text block exceeds address space"))?;
    let text = read_bytes(reader, text_len)?;

    let mut set = ValueLabelSet::new(name);
    for (offset, code) in offsets.into_iter().zip(codes) {
        let tail = usize::try_from(offset)
            .ok()
            .and_then(|start| text.get(start..))
            .ok_or_else(|| {
                Error::invalid(
                    Section::ValueLabels,
                    format!(
                        "label offset {offset} outside {text_len}-byte text block of set '{}'",
                        set.name
                    ),
                )
            })?;
        set.labels.insert(code, decode_text(tail, encoding));
    }
    Ok(set)
}
