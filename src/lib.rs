pub mod api;
pub mod column;
pub mod dataset;
pub mod error;
pub mod logger;
pub mod parser;
pub mod sinks;
pub use crate::error::{Error, Result, Section};
pub use api::{DtaReader, ReadOptions};
pub use column::{Column, ColumnData};
pub use sinks::{ColumnSink, CsvSink};

/// Runs the metadata pass over `reader` and returns the decoded layout.
///
/// # Errors
///
/// Returns an error if the header or any metadata section cannot be decoded.
pub fn parse_layout<R: std::io::Read + std::io::Seek>(
    reader: &mut R,
) -> Result<parser::DtaLayout> {
    parser::parse_layout(reader)
}
