use std::collections::HashMap;

use serde::Serialize;

/// GSO subtype for binary payloads.
pub const STRL_BINARY: u8 = 129;
/// GSO subtype for NUL-terminated text.
pub const STRL_TEXT: u8 = 130;

/// Payload of one long-string record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StrlValue {
    Text(String),
    Binary(Vec<u8>),
}

/// Long-string dictionary keyed by the packed in-row reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrlTable {
    entries: HashMap<u64, StrlValue>,
}

impl Default for StrlTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StrlTable {
    /// Creates a table holding only the zero key, mapped to empty text.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(0, StrlValue::Text(String::new()));
        Self { entries }
    }

    /// Packs a GSO header's `v` and `o` fields into the key stored in rows.
    #[must_use]
    pub const fn pack_key(v: u32, o: u64) -> u64 {
        (v as u64) | (o << 16)
    }

    pub fn insert(&mut self, key: u64, value: StrlValue) {
        self.entries.insert(key, value);
    }

    #[must_use]
    pub fn get(&self, key: u64) -> Option<&StrlValue> {
        self.entries.get(&key)
    }

    /// Resolves a key to text. Absent keys and binary payloads yield `""`.
    #[must_use]
    pub fn resolve_text(&self, key: u64) -> &str {
        match self.entries.get(&key) {
            Some(StrlValue::Text(text)) => text,
            Some(StrlValue::Binary(_)) | None => "",
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &StrlValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_packing_matches_row_reference() {
        assert_eq!(StrlTable::pack_key(7, 3), 196_615);
        assert_eq!(StrlTable::pack_key(1, 0), 1);
    }

    #[test]
    fn zero_key_is_preseeded() {
        let table = StrlTable::new();
        assert_eq!(table.get(0), Some(&StrlValue::Text(String::new())));
        assert_eq!(table.resolve_text(0), "");
        assert_eq!(table.resolve_text(42), "");
    }

    #[test]
    fn binary_payloads_do_not_resolve_to_text() {
        let mut table = StrlTable::new();
        table.insert(5, StrlValue::Binary(vec![1, 2, 3]));
        table.insert(6, StrlValue::Text("six".into()));
        assert_eq!(table.resolve_text(5), "");
        assert_eq!(table.resolve_text(6), "six");
        assert_eq!(table.len(), 3);
    }
}
