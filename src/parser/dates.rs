use time::{Duration, OffsetDateTime};

use crate::column::ColumnData;
use crate::dataset::DateKind;
use crate::logger::log_warn;

/// Seconds from 1960-01-01 to the Unix epoch.
const STATA_EPOCH_OFFSET_SECONDS: i64 = -3653 * 86_400;
const SECONDS_PER_DAY: i64 = 86_400;
/// Beyond this magnitude a float offset cannot be held exactly as an integer.
const MAX_EXACT_FLOAT_OFFSET: f64 = 9.007_199_254_740_992e15;

#[must_use]
pub fn stata_epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH - Duration::seconds(-STATA_EPOCH_OFFSET_SECONDS)
}

/// Converts an integer offset from 1960-01-01 in the unit `kind` names.
#[must_use]
pub fn offset_to_datetime(offset: i64, kind: DateKind) -> Option<OffsetDateTime> {
    let delta = match kind {
        DateKind::Days => Duration::seconds(offset.checked_mul(SECONDS_PER_DAY)?),
        DateKind::Milliseconds => Duration::milliseconds(offset),
    };
    stata_epoch().checked_add(delta)
}

#[allow(clippy::cast_possible_truncation)]
fn float_offset(value: f64) -> Option<i64> {
    let rounded = value.round();
    (rounded.is_finite() && rounded.abs() <= MAX_EXACT_FLOAT_OFFSET).then_some(rounded as i64)
}

/// Replaces a numeric column with timestamps. Entries already flagged
/// missing, or whose offset has no timestamp, become the epoch and are
/// flagged missing. Text columns are returned unchanged.
#[must_use]
pub fn convert_dates(
    name: &str,
    data: ColumnData,
    missing: &mut [bool],
    kind: DateKind,
) -> ColumnData {
    let offsets: Vec<Option<i64>> = match &data {
        ColumnData::Int8(values) => values.iter().map(|v| Some(i64::from(*v))).collect(),
        ColumnData::Int16(values) => values.iter().map(|v| Some(i64::from(*v))).collect(),
        ColumnData::Int32(values) => values.iter().map(|v| Some(i64::from(*v))).collect(),
        ColumnData::Float32(values) => values.iter().map(|v| float_offset(f64::from(*v))).collect(),
        ColumnData::Float64(values) => values.iter().map(|v| float_offset(*v)).collect(),
        ColumnData::Text(_) | ColumnData::Timestamp(_) | ColumnData::StrlRef(_) => return data,
    };

    let epoch = stata_epoch();
    let mut unrepresentable = 0usize;
    let converted = offsets
        .into_iter()
        .zip(missing.iter_mut())
        .map(|(offset, is_missing)| {
            if *is_missing {
                return epoch;
            }
            match offset.and_then(|offset| offset_to_datetime(offset, kind)) {
                Some(datetime) => datetime,
                None => {
                    unrepresentable += 1;
                    *is_missing = true;
                    epoch
                }
            }
        })
        .collect();

    if unrepresentable > 0 {
        log_warn(&format!(
            "column '{name}': {unrepresentable} date values out of range were flagged missing"
        ));
    }
    ColumnData::Timestamp(converted)
}
