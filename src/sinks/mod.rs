mod csv;

use crate::column::Column;
use crate::dataset::DtaMetadata;
use crate::error::Result;

pub use self::csv::CsvSink;

/// Trait implemented by sinks that consume decoded column batches.
pub trait ColumnSink {
    /// Called before any batch is written to allow the sink to initialise internal state.
    fn begin(&mut self, metadata: &DtaMetadata) -> Result<()>;

    /// Invoked for every batch returned by [`crate::DtaReader::read`].
    fn write_batch(&mut self, columns: &[Column]) -> Result<()>;

    /// Called once all batches have been forwarded to the sink.
    fn finish(&mut self) -> Result<()>;
}
