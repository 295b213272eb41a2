//! Missing-value ranges per storage type.
//!
//! Stata reserves the top of each numeric range for missing codes; values in
//! that band decode normally but are flagged in the column's missing mask.

pub const DOUBLE_MISSING_MAGNITUDE: f64 = 8.988e307;
pub const FLOAT_MISSING_MAGNITUDE: f32 = 1.701e38;
pub const LONG_MAX_VALID: i32 = 2_147_483_620;
pub const LONG_MIN_VALID: i32 = -2_147_483_647;
pub const INT_MAX_VALID: i16 = 32_740;
pub const INT_MIN_VALID: i16 = -32_767;
pub const BYTE_MAX_VALID: i8 = 100;
pub const BYTE_MIN_VALID: i8 = -127;

#[inline]
#[must_use]
pub fn double_is_missing(value: f64) -> bool {
    value > DOUBLE_MISSING_MAGNITUDE || value < -DOUBLE_MISSING_MAGNITUDE
}

#[inline]
#[must_use]
pub fn float_is_missing(value: f32) -> bool {
    value > FLOAT_MISSING_MAGNITUDE || value < -FLOAT_MISSING_MAGNITUDE
}

#[inline]
#[must_use]
pub const fn long_is_missing(value: i32) -> bool {
    value > LONG_MAX_VALID || value < LONG_MIN_VALID
}

#[inline]
#[must_use]
pub const fn int_is_missing(value: i16) -> bool {
    value > INT_MAX_VALID || value < INT_MIN_VALID
}

#[inline]
#[must_use]
pub const fn byte_is_missing(value: i8) -> bool {
    value > BYTE_MAX_VALID || value < BYTE_MIN_VALID
}
