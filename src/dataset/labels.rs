use std::collections::HashMap;

use serde::Serialize;

/// Named mapping from integer codes to display text, shared by every column
/// that names it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValueLabelSet {
    pub name: String,
    pub labels: HashMap<i32, String>,
}

impl ValueLabelSet {
    #[must_use]
    pub fn new(name: String) -> Self {
        Self {
            name,
            labels: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, code: i32) -> Option<&str> {
        self.labels.get(&code).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Every value-label set in the file, keyed by set name.
pub type ValueLabels = HashMap<String, ValueLabelSet>;
