use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use serde::Serialize;

use super::variables::Variable;
use crate::error::{Error, Result};

/// Supported dta format versions.
///
/// Every layout decision that depends on the version is an exhaustive match
/// on this enum, so an unlisted version is rejected once, at header time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FormatVersion {
    V114,
    V115,
    V117,
    V118,
}

impl FormatVersion {
    /// Maps the on-disk release number to a supported version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] for anything outside
    /// 114, 115, 117 and 118.
    pub const fn from_code(code: u16) -> Result<Self> {
        match code {
            114 => Ok(Self::V114),
            115 => Ok(Self::V115),
            117 => Ok(Self::V117),
            118 => Ok(Self::V118),
            version => Err(Error::UnsupportedVersion { version }),
        }
    }

    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::V114 => 114,
            Self::V115 => 115,
            Self::V117 => 117,
            Self::V118 => 118,
        }
    }

    /// Versions 117 and later use the tagged header with a section map.
    #[must_use]
    pub const fn is_tagged(self) -> bool {
        matches!(self, Self::V117 | Self::V118)
    }

    #[must_use]
    pub const fn variable_count_width(self) -> usize {
        match self {
            Self::V114 | Self::V115 | Self::V117 | Self::V118 => 2,
        }
    }

    #[must_use]
    pub const fn row_count_width(self) -> usize {
        match self {
            Self::V114 | Self::V115 | Self::V117 => 4,
            Self::V118 => 8,
        }
    }

    /// Width of the length prefix in front of the tagged dataset label.
    #[must_use]
    pub const fn label_prefix_width(self) -> Option<usize> {
        match self {
            Self::V114 | Self::V115 => None,
            Self::V117 => Some(1),
            Self::V118 => Some(2),
        }
    }

    #[must_use]
    pub const fn variable_name_width(self) -> usize {
        match self {
            Self::V114 | Self::V115 => 33,
            Self::V117 | Self::V118 => 129,
        }
    }

    #[must_use]
    pub const fn format_width(self) -> usize {
        match self {
            Self::V114 | Self::V115 => 49,
            Self::V117 | Self::V118 => 57,
        }
    }

    /// Format 114 carries no value-label-name section.
    #[must_use]
    pub const fn value_label_name_width(self) -> Option<usize> {
        match self {
            Self::V114 => None,
            Self::V115 => Some(33),
            Self::V117 | Self::V118 => Some(129),
        }
    }

    #[must_use]
    pub const fn variable_label_width(self) -> usize {
        match self {
            Self::V114 | Self::V115 => 81,
            Self::V117 | Self::V118 => 321,
        }
    }

    /// Character encoding of stored text.
    #[must_use]
    pub fn encoding(self) -> &'static Encoding {
        match self {
            Self::V114 | Self::V115 | Self::V117 => WINDOWS_1252,
            Self::V118 => UTF_8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Endianness {
    Little,
    Big,
}

/// Absolute offsets of the sections listed in the map of a tagged file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionOffsets {
    pub variable_types: u64,
    pub variable_names: u64,
    pub sortlist: u64,
    pub formats: u64,
    pub value_label_names: u64,
    pub variable_labels: u64,
    pub characteristics: u64,
    pub data: u64,
    pub strls: u64,
    pub value_labels: u64,
}

/// Dataset-level metadata decoded during initialization.
#[derive(Debug, Clone, Serialize)]
pub struct DtaMetadata {
    pub version: FormatVersion,
    pub endianness: Endianness,
    pub variable_count: usize,
    pub row_count: u64,
    pub dataset_label: String,
    pub timestamp: String,
    /// Present only for tagged (117+) files.
    pub section_offsets: Option<SectionOffsets>,
    pub variables: Vec<Variable>,
}

impl DtaMetadata {
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.variables
            .iter()
            .position(|variable| variable.name == name)
    }
}
