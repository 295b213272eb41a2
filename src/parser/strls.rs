use std::io::{Read, Seek};

use byteorder::ReadBytesExt;
use encoding_rs::Encoding;

use super::byteorder::{read_bytes, read_marker, read_u32, read_u64};
use super::encoding::decode_text;
use super::header::DtaHeader;
use super::sections::{enter_section, section_offsets};
use crate::dataset::{Endianness, STRL_BINARY, STRL_TEXT, StrlTable, StrlValue};
use crate::error::{Error, Result, Section};
use crate::logger::log_warn;

const STRLS_TAG: &[u8] = b"<strls>";
const GSO_MARKER: &[u8; 3] = b"GSO";

/// Reads the long-string dictionary of a tagged file.
///
/// The scan is bounded by the value-label section that follows it in the map.
///
/// # Errors
///
/// Returns an error if the `<strls>` tag is missing, a record is truncated,
/// or a record's payload would run into the next section.
pub fn read_strls<R: Read + Seek>(reader: &mut R, header: &DtaHeader) -> Result<StrlTable> {
    let offsets = section_offsets(header)?;
    enter_section(reader, offsets.strls, STRLS_TAG, Section::Strls)?;
    let boundary = (offsets.value_labels > offsets.strls).then_some(offsets.value_labels);
    scan_strls(
        reader,
        header.endianness,
        header.version.encoding(),
        boundary,
    )
}

/// Consumes GSO records until the first non-`GSO` marker.
///
/// # Errors
///
/// Returns an error on truncated records or payloads crossing `boundary`.
pub fn scan_strls<R: Read + Seek>(
    reader: &mut R,
    endianness: Endianness,
    encoding: &'static Encoding,
    boundary: Option<u64>,
) -> Result<StrlTable> {
    let mut table = StrlTable::new();
    loop {
        if let Some(limit) = boundary
            && reader.stream_position()? >= limit
        {
            log_warn(&format!(
                "strl scan reached offset {limit} without a closing tag"
            ));
            break;
        }
        let Some(marker) = read_marker::<_, 3>(reader)? else {
            break;
        };
        if &marker != GSO_MARKER {
            break;
        }

        let v = read_u32(reader, endianness)?;
        let o = read_u64(reader, endianness)?;
        let subtype = reader.read_u8()?;
        let length = read_u32(reader, endianness)?;

        if let Some(limit) = boundary {
            let end = reader.stream_position()? + u64::from(length);
            if end > limit {
                return Err(Error::invalid(
                    Section::Strls,
                    format!("record ({v}, {o}) of {length} bytes runs past offset {limit}"),
                ));
            }
        }
        let length = usize::try_from(length)
            .map_err(|_| Error::invalid(Section::Strls, "record length exceeds address space"))?;
        let payload = read_bytes(reader, length)?;
        let key = StrlTable::pack_key(v, o);

        match subtype {
            STRL_TEXT => table.insert(key, StrlValue::Text(decode_text(&payload, encoding))),
            STRL_BINARY => table.insert(key, StrlValue::Binary(payload)),
            other => log_warn(&format!(
                "skipping strl ({v}, {o}) with unknown subtype {other}"
            )),
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use encoding_rs::UTF_8;

    use super::*;

    fn gso(v: u32, o: u64, subtype: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = GSO_MARKER.to_vec();
        bytes.extend_from_slice(&v.to_le_bytes());
        bytes.extend_from_slice(&o.to_le_bytes());
        bytes.push(subtype);
        bytes.extend_from_slice(&u32::try_from(payload.len()).unwrap().to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn scan_terminates_on_closing_tag_for_any_record_count() {
        for repeats in [0u32, 1, 7] {
            let mut bytes = Vec::new();
            for v in 1..=repeats {
                bytes.extend(gso(v, 1, STRL_TEXT, format!("text {v}\0").as_bytes()));
            }
            let closing = bytes.len() as u64;
            bytes.extend_from_slice(b"</strls><value_labels>");

            let mut cursor = Cursor::new(bytes);
            let table = scan_strls(&mut cursor, Endianness::Little, UTF_8, None).unwrap();
            assert_eq!(table.len(), repeats as usize + 1);
            assert_eq!(cursor.position(), closing + 3, "{repeats} records");
            if repeats > 0 {
                let key = StrlTable::pack_key(repeats, 1);
                assert_eq!(table.resolve_text(key), format!("text {repeats}"));
            }
        }
    }

    #[test]
    fn binary_and_text_payloads_are_kept_apart() {
        let mut bytes = gso(7, 3, STRL_TEXT, b"seven\0junk");
        bytes.extend(gso(8, 3, STRL_BINARY, &[0, 1, 2]));
        bytes.extend(gso(9, 3, 42, b"ignored"));
        bytes.extend_from_slice(b"</strls>");

        let mut cursor = Cursor::new(bytes);
        let table = scan_strls(&mut cursor, Endianness::Little, UTF_8, None).unwrap();
        assert_eq!(table.resolve_text(196_615), "seven");
        assert_eq!(
            table.get(StrlTable::pack_key(8, 3)),
            Some(&StrlValue::Binary(vec![0, 1, 2]))
        );
        assert!(table.get(StrlTable::pack_key(9, 3)).is_none());
    }

    #[test]
    fn payload_crossing_the_boundary_is_rejected() {
        let bytes = gso(1, 1, STRL_TEXT, b"0123456789");
        let limit = (bytes.len() - 4) as u64;
        let mut cursor = Cursor::new(bytes);
        assert!(matches!(
            scan_strls(&mut cursor, Endianness::Little, UTF_8, Some(limit)),
            Err(Error::InvalidFormat { section: Section::Strls, .. })
        ));
    }

    #[test]
    fn scan_stops_at_boundary() {
        let mut bytes = gso(1, 1, STRL_TEXT, b"a");
        let limit = bytes.len() as u64;
        bytes.extend(gso(2, 1, STRL_TEXT, b"b"));
        let mut cursor = Cursor::new(bytes);
        let table = scan_strls(&mut cursor, Endianness::Little, UTF_8, Some(limit)).unwrap();
        assert_eq!(table.resolve_text(StrlTable::pack_key(1, 1)), "a");
        assert!(table.get(StrlTable::pack_key(2, 1)).is_none());
        assert_eq!(cursor.position(), limit);
    }
}
