mod labels;
mod metadata;
pub mod missing;
mod strls;
mod variables;

pub use labels::{ValueLabelSet, ValueLabels};
pub use metadata::{DtaMetadata, Endianness, FormatVersion, SectionOffsets};
pub use strls::{STRL_BINARY, STRL_TEXT, StrlTable, StrlValue};
pub use variables::{
    BYTE_TAG, DOUBLE_TAG, DateKind, FLOAT_TAG, INT_TAG, LONG_TAG, MAX_FIXED_STRING_TAG, STRL_TAG,
    Variable, VariableType,
};
