use std::borrow::Cow;
use std::fmt;
use std::io;

/// Result type used across the dta reader.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type surfaced while decoding a dta file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure while reading from the underlying data source, including
    /// short reads.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The format version is not one of 114, 115, 117 or 118.
    #[error("unsupported dta format version {version}")]
    UnsupportedVersion { version: u16 },

    /// A structural marker was not found where the layout requires it.
    #[error("invalid dta file while processing {section}: {details}")]
    InvalidFormat {
        section: Section,
        details: Cow<'static, str>,
    },

    /// A variable type code outside every recognised range.
    #[error("unknown type tag {tag} for column {column}")]
    UnknownTypeTag { column: usize, tag: u16 },

    /// An output sink was driven out of order or rejected a batch.
    #[error("sink error: {details}")]
    Sink { details: Cow<'static, str> },
}

impl Error {
    pub(crate) fn invalid(section: Section, details: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidFormat {
            section,
            details: details.into(),
        }
    }
}

/// Logical section of the file used for diagnostic reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Map,
    VariableTypes,
    VariableNames,
    Formats,
    ValueLabelNames,
    VariableLabels,
    Characteristics,
    Data,
    Strls,
    ValueLabels,
    Row { index: u64 },
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "file header"),
            Self::Map => write!(f, "section map"),
            Self::VariableTypes => write!(f, "variable types"),
            Self::VariableNames => write!(f, "variable names"),
            Self::Formats => write!(f, "formats"),
            Self::ValueLabelNames => write!(f, "value label names"),
            Self::VariableLabels => write!(f, "variable labels"),
            Self::Characteristics => write!(f, "characteristics"),
            Self::Data => write!(f, "data"),
            Self::Strls => write!(f, "strls"),
            Self::ValueLabels => write!(f, "value labels"),
            Self::Row { index } => write!(f, "row {index}"),
        }
    }
}
