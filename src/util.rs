// Utility helpers for parsing and basic statistics.
//
// The raw API payload is loosely typed, so numeric coercion and column-name
// cleanup live here and the rest of the code works with typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64`.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects anything that is not a plain finite number (`NA`, `1,200`,
///   `NaN` and empty strings all come back as `None`).
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a year-like value. Accepts `2010` as well as `2010.0`, since some
/// exports write years as floats.
pub fn parse_year_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let v = parse_f64_safe(Some(s))?;
    if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
        Some(v as i32)
    } else {
        None
    }
}

/// Lowercase a column name and replace spaces with underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    if !n.is_finite() {
        return n.to_string();
    }
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    // Rounding can turn a tiny negative into "0"; don't print "-0".
    let is_zero = s.chars().all(|c| c == '0' || c == '.');
    if n.is_sign_negative() && !is_zero {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Table cell renderer for tonnes.
pub fn display_quantity(v: &f64) -> String {
    format_number(*v, 0)
}

/// Table cell renderer for millimetres of rain.
pub fn display_rainfall(v: &f64) -> String {
    format_number(*v, 1)
}
