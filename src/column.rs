use time::OffsetDateTime;

/// Typed storage of one decoded column.
///
/// The variant is fixed per column by its type tag and the read options, so
/// every cell in a column shares one representation.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Fixed-width strings, resolved long strings or category labels.
    Text(Vec<String>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    /// Date-formatted columns after conversion from the 1960 epoch.
    Timestamp(Vec<OffsetDateTime>),
    /// Unresolved long-string references.
    StrlRef(Vec<u64>),
}

impl ColumnData {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(values) => values.len(),
            Self::Int8(values) => values.len(),
            Self::Int16(values) => values.len(),
            Self::Int32(values) => values.len(),
            Self::Float32(values) => values.len(),
            Self::Float64(values) => values.len(),
            Self::Timestamp(values) => values.len(),
            Self::StrlRef(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Self::Text(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamps(&self) -> Option<&[OffsetDateTime]> {
        match self {
            Self::Timestamp(values) => Some(values),
            _ => None,
        }
    }
}

/// A named column paired with a missing-value mask of the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
    missing: Vec<bool>,
}

impl Column {
    pub(crate) fn new(name: String, data: ColumnData, missing: Vec<bool>) -> Self {
        debug_assert_eq!(data.len(), missing.len());
        Self {
            name,
            data,
            missing,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn data(&self) -> &ColumnData {
        &self.data
    }

    #[must_use]
    pub fn missing(&self) -> &[bool] {
        &self.missing
    }

    #[must_use]
    pub fn is_missing(&self, row: usize) -> bool {
        self.missing.get(row).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.missing.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }

    #[must_use]
    pub fn into_parts(self) -> (String, ColumnData, Vec<bool>) {
        (self.name, self.data, self.missing)
    }
}
