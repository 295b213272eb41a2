use encoding_rs::{Encoding, UTF_8};
use simdutf8::basic;

/// Returns everything before the first NUL byte.
#[inline]
#[must_use]
pub fn until_nul(bytes: &[u8]) -> &[u8] {
    bytes
        .iter()
        .position(|b| *b == 0)
        .map_or(bytes, |end| &bytes[..end])
}

/// Decodes a NUL-terminated field using the file's text encoding.
#[must_use]
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> String {
    decode_raw(until_nul(bytes), encoding)
}

/// Decodes bytes that carry their own length and are not NUL-terminated.
#[must_use]
pub fn decode_raw(bytes: &[u8], encoding: &'static Encoding) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    if let Ok(text) = basic::from_utf8(bytes) {
        return text.to_owned();
    }
    if encoding == UTF_8 {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let (decoded, _had_errors) = encoding.decode_without_bom_handling(bytes);
    decoded.into_owned()
}
