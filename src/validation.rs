//! Small reusable validators for configuration and numeric parameters.
//!
//! Each validator returns `Ok(())` or a static message so callers can wrap the
//! message in whatever error variant fits their context.

use std::ops::RangeInclusive;

/// Validates that a value is a finite real number (not NaN, not infinite).
pub fn is_finite(value: f64) -> Result<(), &'static str> {
    if value.is_finite() {
        Ok(())
    } else {
        Err("Value must be finite")
    }
}

/// Validates that a value is finite and not zero.
///
/// Used for divisors such as the magnification factor, where IEEE arithmetic
/// would silently produce `inf` or `NaN`.
pub fn is_non_zero_finite(value: f64) -> Result<(), &'static str> {
    is_finite(value)?;
    if value != 0.0 {
        Ok(())
    } else {
        Err("Value must be non-zero")
    }
}

/// Validates that `low < high` and both bounds are finite.
pub fn is_ordered_range(low: f64, high: f64) -> Result<(), &'static str> {
    if !low.is_finite() || !high.is_finite() {
        return Err("Range bounds must be finite");
    }
    if low < high {
        Ok(())
    } else {
        Err("Range lower bound must be below upper bound")
    }
}

/// Validates if a given value is within a specified numeric range.
pub fn is_in_range<T: PartialOrd>(value: T, range: RangeInclusive<T>) -> Result<(), &'static str> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err("Value is outside the specified range")
    }
}

/// Validates if a given string is not empty (after trimming).
pub fn is_not_empty(value: &str) -> Result<(), &'static str> {
    if !value.trim().is_empty() {
        Ok(())
    } else {
        Err("Value cannot be empty")
    }
}
