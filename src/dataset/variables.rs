use serde::Serialize;

/// Largest type tag that still denotes a fixed-width string.
pub const MAX_FIXED_STRING_TAG: u16 = 2045;
pub const STRL_TAG: u16 = 32768;
pub const DOUBLE_TAG: u16 = 65526;
pub const FLOAT_TAG: u16 = 65527;
pub const LONG_TAG: u16 = 65528;
pub const INT_TAG: u16 = 65529;
pub const BYTE_TAG: u16 = 65530;

/// Largest legacy single-byte code that denotes a fixed-width string.
const MAX_LEGACY_STRING_CODE: u8 = 244;

/// Storage type of a variable, decided once from its normalized type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VariableType {
    /// Fixed-width string of the given byte length.
    FixedString(u16),
    /// Reference into the long-string dictionary.
    Strl,
    Double,
    Float,
    Long,
    Int,
    Byte,
}

impl VariableType {
    /// Interprets a normalized (117+ style) type tag.
    #[must_use]
    pub const fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0..=MAX_FIXED_STRING_TAG => Some(Self::FixedString(tag)),
            STRL_TAG => Some(Self::Strl),
            DOUBLE_TAG => Some(Self::Double),
            FLOAT_TAG => Some(Self::Float),
            LONG_TAG => Some(Self::Long),
            INT_TAG => Some(Self::Int),
            BYTE_TAG => Some(Self::Byte),
            _ => None,
        }
    }

    /// Translates a legacy (114/115) single-byte code into the normalized
    /// tag space.
    #[must_use]
    pub const fn translate_legacy(code: u8) -> Option<u16> {
        match code {
            0..=MAX_LEGACY_STRING_CODE => Some(code as u16),
            251 => Some(BYTE_TAG),
            252 => Some(INT_TAG),
            253 => Some(LONG_TAG),
            254 => Some(FLOAT_TAG),
            255 => Some(DOUBLE_TAG),
            _ => None,
        }
    }

    #[must_use]
    pub const fn tag(self) -> u16 {
        match self {
            Self::FixedString(width) => width,
            Self::Strl => STRL_TAG,
            Self::Double => DOUBLE_TAG,
            Self::Float => FLOAT_TAG,
            Self::Long => LONG_TAG,
            Self::Int => INT_TAG,
            Self::Byte => BYTE_TAG,
        }
    }

    /// Number of bytes one value occupies in a data row.
    #[must_use]
    pub const fn storage_width(self) -> usize {
        match self {
            Self::FixedString(width) => width as usize,
            Self::Strl | Self::Double => 8,
            Self::Float | Self::Long => 4,
            Self::Int => 2,
            Self::Byte => 1,
        }
    }
}

/// Time unit of a date-formatted column, relative to 1960-01-01.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateKind {
    /// `%td`: whole days.
    Days,
    /// `%tc`: milliseconds.
    Milliseconds,
}

impl DateKind {
    #[must_use]
    pub fn from_format(format: &str) -> Option<Self> {
        if format.starts_with("%td") {
            Some(Self::Days)
        } else if format.starts_with("%tc") {
            Some(Self::Milliseconds)
        } else {
            None
        }
    }
}

/// Per-column metadata assembled from the parallel metadata sections.
#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    pub index: usize,
    pub name: String,
    pub kind: VariableType,
    pub format: String,
    pub date: Option<DateKind>,
    /// Name of the value-label set; empty when none is attached.
    pub value_label_set: String,
    pub label: String,
}

impl Variable {
    #[must_use]
    pub const fn type_tag(&self) -> u16 {
        self.kind.tag()
    }

    #[must_use]
    pub const fn is_date(&self) -> bool {
        self.date.is_some()
    }
}
