use std::borrow::Cow;
use std::io::Write;

use ::csv::{ByteRecord, Writer, WriterBuilder};
use itoa::Buffer as ItoaBuffer;
use ryu::Buffer as RyuBuffer;
use time::OffsetDateTime;

use crate::column::{Column, ColumnData};
use crate::dataset::{DateKind, DtaMetadata};
use crate::error::{Error, Result};
use crate::sinks::ColumnSink;

/// Writes decoded columns into a delimited text file (CSV/TSV).
///
/// Missing cells become empty fields. `%td` columns render as dates and
/// `%tc` columns as `YYYY-MM-DD HH:MM:SS[.mmm]`.
pub struct CsvSink<W: Write> {
    output: Option<W>,
    writer: Option<Writer<W>>,
    delimiter: u8,
    write_headers: bool,
    dates: Vec<Option<DateKind>>,
    record: ByteRecord,
    scratch: Vec<u8>,
}

impl<W: Write> CsvSink<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            output: Some(writer),
            writer: None,
            delimiter: b',',
            write_headers: true,
            dates: Vec::new(),
            record: ByteRecord::new(),
            scratch: Vec::with_capacity(64),
        }
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub const fn with_headers(mut self, headers: bool) -> Self {
        self.write_headers = headers;
        self
    }

    /// Returns the underlying writer once [`ColumnSink::finish`] has run.
    pub fn into_inner(self) -> Option<W> {
        self.output
    }

    fn writer(&mut self) -> Result<&mut Writer<W>> {
        self.writer.as_mut().ok_or_else(|| Error::Sink {
            details: Cow::from("CSV sink used before begin"),
        })
    }

    fn encode_cell(
        data: &ColumnData,
        row: usize,
        date: Option<DateKind>,
        out: &mut Vec<u8>,
        ryu: &mut RyuBuffer,
        itoa: &mut ItoaBuffer,
    ) {
        match data {
            ColumnData::Text(values) => out.extend_from_slice(values[row].as_bytes()),
            ColumnData::Int8(values) => out.extend_from_slice(itoa.format(values[row]).as_bytes()),
            ColumnData::Int16(values) => {
                out.extend_from_slice(itoa.format(values[row]).as_bytes());
            }
            ColumnData::Int32(values) => {
                out.extend_from_slice(itoa.format(values[row]).as_bytes());
            }
            ColumnData::StrlRef(values) => {
                out.extend_from_slice(itoa.format(values[row]).as_bytes());
            }
            ColumnData::Float32(values) => {
                out.extend_from_slice(ryu.format(values[row]).as_bytes());
            }
            ColumnData::Float64(values) => {
                out.extend_from_slice(ryu.format(values[row]).as_bytes());
            }
            ColumnData::Timestamp(values) => match date {
                Some(DateKind::Days) => write_date(&values[row], out),
                _ => write_datetime(&values[row], out),
            },
        }
    }
}

impl<W: Write> ColumnSink for CsvSink<W> {
    fn begin(&mut self, metadata: &DtaMetadata) -> Result<()> {
        let output = self.output.take().ok_or_else(|| Error::Sink {
            details: Cow::from("CSV sink cannot be reused without finishing"),
        })?;
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(output);

        if self.write_headers {
            let mut header = ByteRecord::with_capacity(0, metadata.variables.len());
            for variable in &metadata.variables {
                header.push_field(variable.name.as_bytes());
            }
            writer
                .write_byte_record(&header)
                .map_err(std::io::Error::from)?;
        }

        self.dates = metadata.variables.iter().map(|v| v.date).collect();
        self.writer = Some(writer);
        Ok(())
    }

    fn write_batch(&mut self, columns: &[Column]) -> Result<()> {
        if columns.len() != self.dates.len() {
            return Err(Error::Sink {
                details: Cow::Owned(format!(
                    "batch has {} columns, expected {}",
                    columns.len(),
                    self.dates.len()
                )),
            });
        }
        let rows = columns.first().map_or(0, Column::len);
        if let Some(column) = columns
            .iter()
            .find(|column| column.len() != rows || column.data().len() != rows)
        {
            return Err(Error::Sink {
                details: Cow::Owned(format!(
                    "column `{}` has {} rows, expected {rows}",
                    column.name(),
                    column.data().len()
                )),
            });
        }
        let mut ryu = RyuBuffer::new();
        let mut itoa = ItoaBuffer::new();
        let mut record = std::mem::take(&mut self.record);
        let mut scratch = std::mem::take(&mut self.scratch);

        for row in 0..rows {
            record.clear();
            for (column, &date) in columns.iter().zip(&self.dates) {
                scratch.clear();
                if !column.is_missing(row) {
                    Self::encode_cell(column.data(), row, date, &mut scratch, &mut ryu, &mut itoa);
                }
                record.push_field(&scratch);
            }
            self.writer()?
                .write_byte_record(&record)
                .map_err(std::io::Error::from)?;
        }

        self.record = record;
        self.scratch = scratch;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            let output = writer.into_inner().map_err(|e| Error::Sink {
                details: Cow::Owned(format!("csv into_inner failed: {e}")),
            })?;
            self.output = Some(output);
        }
        self.dates.clear();
        Ok(())
    }
}

fn write_date(dt: &OffsetDateTime, out: &mut Vec<u8>) {
    out.extend_from_slice(dt.date().to_string().as_bytes());
}

fn write_datetime(dt: &OffsetDateTime, out: &mut Vec<u8>) {
    let date = dt.date();
    let time = dt.time();
    out.extend_from_slice(date.to_string().as_bytes());
    out.push(b' ');
    write_two(time.hour(), out);
    out.push(b':');
    write_two(time.minute(), out);
    out.push(b':');
    write_two(time.second(), out);
    let millis = time.millisecond();
    if millis != 0 {
        out.push(b'.');
        write_three(millis, out);
    }
}

#[inline]
fn write_two(v: u8, out: &mut Vec<u8>) {
    out.push(b'0' + (v / 10));
    out.push(b'0' + (v % 10));
}

#[inline]
#[allow(clippy::cast_possible_truncation)]
fn write_three(v: u16, out: &mut Vec<u8>) {
    out.push(b'0' + (v / 100) as u8);
    out.push(b'0' + ((v / 10) % 10) as u8);
    out.push(b'0' + (v % 10) as u8);
}
