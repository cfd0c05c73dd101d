//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn count_to_f64(value: u32) -> f64 {
    cast::<u32, f64>(value).unwrap_or(0.0)
}

/// Convert a usize length to u32, saturating on overflow.
#[must_use]
pub fn len_to_u32(value: usize) -> u32 {
    cast::<usize, u32>(value).unwrap_or(u32::MAX)
}

/// Percentage of `part` over `whole`, `0.0` when `whole` is zero.
#[must_use]
pub fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    count_to_f64(part) * 100.0 / count_to_f64(whole)
}

/// Round a f64 to one decimal place, returning 0.0 for non-finite values.
#[must_use]
pub fn round_tenths(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 10.0).round() / 10.0
}
