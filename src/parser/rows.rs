use std::io::{Read, Seek, SeekFrom};

use encoding_rs::Encoding;

use super::byteorder::{slice_f32, slice_f64, slice_i16, slice_i32, slice_u64};
use super::dates::convert_dates;
use super::encoding::decode_text;
use super::meta::DtaLayout;
use crate::api::ReadOptions;
use crate::column::{Column, ColumnData};
use crate::dataset::missing::{
    byte_is_missing, double_is_missing, float_is_missing, int_is_missing, long_is_missing,
};
use crate::dataset::{Endianness, StrlTable, ValueLabelSet, Variable, VariableType};
use crate::error::Result;

/// Per-column accumulator whose variant is chosen once from the type tag and
/// the read options.
enum ColumnBuilder<'a> {
    FixedString(Vec<String>),
    StrlText(Vec<String>),
    StrlRef(Vec<u64>),
    Double(Vec<f64>),
    Float(Vec<f32>),
    Long(Vec<i32>),
    Int(Vec<i16>),
    ByteLabel {
        values: Vec<String>,
        labels: Option<&'a ValueLabelSet>,
    },
    Byte(Vec<i8>),
}

/// Shared state needed to decode a cell.
struct CellContext<'a> {
    endianness: Endianness,
    encoding: &'static Encoding,
    strls: &'a StrlTable,
}

impl<'a> ColumnBuilder<'a> {
    fn new(variable: &Variable, layout: &'a DtaLayout, options: &ReadOptions, rows: usize) -> Self {
        match variable.kind {
            VariableType::FixedString(_) => Self::FixedString(Vec::with_capacity(rows)),
            VariableType::Strl if options.resolve_long_strings() => {
                Self::StrlText(Vec::with_capacity(rows))
            }
            VariableType::Strl => Self::StrlRef(Vec::with_capacity(rows)),
            VariableType::Double => Self::Double(Vec::with_capacity(rows)),
            VariableType::Float => Self::Float(Vec::with_capacity(rows)),
            VariableType::Long => Self::Long(Vec::with_capacity(rows)),
            VariableType::Int => Self::Int(Vec::with_capacity(rows)),
            VariableType::Byte if options.resolve_category_labels() => Self::ByteLabel {
                values: Vec::with_capacity(rows),
                labels: layout.value_labels.get(&variable.value_label_set),
            },
            VariableType::Byte => Self::Byte(Vec::with_capacity(rows)),
        }
    }

    /// Decodes one cell and reports whether it is missing.
    fn push(&mut self, bytes: &[u8], ctx: &CellContext<'_>) -> bool {
        let endian = ctx.endianness;
        match self {
            Self::FixedString(values) => {
                values.push(decode_text(bytes, ctx.encoding));
                false
            }
            Self::StrlText(values) => {
                values.push(ctx.strls.resolve_text(slice_u64(endian, bytes)).to_owned());
                false
            }
            Self::StrlRef(values) => {
                values.push(slice_u64(endian, bytes));
                false
            }
            Self::Double(values) => {
                let value = slice_f64(endian, bytes);
                values.push(value);
                double_is_missing(value)
            }
            Self::Float(values) => {
                let value = slice_f32(endian, bytes);
                values.push(value);
                float_is_missing(value)
            }
            Self::Long(values) => {
                let value = slice_i32(endian, bytes);
                values.push(value);
                long_is_missing(value)
            }
            Self::Int(values) => {
                let value = slice_i16(endian, bytes);
                values.push(value);
                int_is_missing(value)
            }
            Self::ByteLabel { values, labels } => {
                let value = i8::from_ne_bytes([bytes[0]]);
                let text = labels
                    .and_then(|set| set.get(i32::from(value)))
                    .map_or_else(|| itoa::Buffer::new().format(value).to_owned(), str::to_owned);
                values.push(text);
                byte_is_missing(value)
            }
            Self::Byte(values) => {
                let value = i8::from_ne_bytes([bytes[0]]);
                values.push(value);
                byte_is_missing(value)
            }
        }
    }

    fn finish(self) -> ColumnData {
        match self {
            Self::FixedString(values) | Self::StrlText(values) => ColumnData::Text(values),
            Self::ByteLabel { values, .. } => ColumnData::Text(values),
            Self::StrlRef(values) => ColumnData::StrlRef(values),
            Self::Double(values) => ColumnData::Float64(values),
            Self::Float(values) => ColumnData::Float32(values),
            Self::Long(values) => ColumnData::Int32(values),
            Self::Int(values) => ColumnData::Int16(values),
            Self::Byte(values) => ColumnData::Int8(values),
        }
    }
}

/// Decodes `count` observations starting at `first_row`.
///
/// Rows are stored row-major; each is read whole and split into the
/// per-column builders. Any failure discards everything decoded so far.
///
/// # Errors
///
/// Returns an error if the data cannot be read.
pub fn decode_rows<R: Read + Seek>(
    reader: &mut R,
    layout: &DtaLayout,
    options: &ReadOptions,
    first_row: u64,
    count: usize,
) -> Result<Vec<Column>> {
    let metadata = &layout.metadata;
    let start = layout.row_offset(first_row)?;
    let stream_end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(start))?;

    // The row count comes from the header; never reserve more rows than the
    // stream can hold.
    let available = stream_end.saturating_sub(start) / (layout.row_width.max(1) as u64);
    let capacity = usize::try_from(available).map_or(count, |rows| rows.min(count));

    let mut builders: Vec<ColumnBuilder<'_>> = metadata
        .variables
        .iter()
        .map(|variable| ColumnBuilder::new(variable, layout, options, capacity))
        .collect();
    let mut masks: Vec<Vec<bool>> = (0..builders.len())
        .map(|_| Vec::with_capacity(capacity))
        .collect();

    let ctx = CellContext {
        endianness: metadata.endianness,
        encoding: metadata.version.encoding(),
        strls: &layout.strls,
    };

    let rows = if builders.is_empty() { 0 } else { count };
    let mut row = vec![0u8; layout.row_width];
    for _ in 0..rows {
        reader.read_exact(&mut row)?;
        for ((builder, mask), (variable, &offset)) in builders
            .iter_mut()
            .zip(masks.iter_mut())
            .zip(metadata.variables.iter().zip(&layout.column_offsets))
        {
            let cell = &row[offset..offset + variable.kind.storage_width()];
            mask.push(builder.push(cell, &ctx));
        }
    }

    let columns = builders
        .into_iter()
        .zip(masks)
        .zip(&metadata.variables)
        .map(|((builder, mut missing), variable)| {
            let mut data = builder.finish();
            if options.convert_dates()
                && let Some(kind) = variable.date
            {
                data = convert_dates(&variable.name, data, &mut missing, kind);
            }
            Column::new(variable.name.clone(), data, missing)
        })
        .collect();
    Ok(columns)
}
