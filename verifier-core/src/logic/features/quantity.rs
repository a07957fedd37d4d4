//! Quantity Parser - Kubernetes-style resource quantities
//!
//! Grammar: `<number>[<exponent> | <suffix>]`
//! - binary suffixes: Ki Mi Gi Ti Pi Ei (powers of 1024)
//! - decimal suffixes: n u m k M G T P E (powers of 1000)
//! - exponent: e3, E-2, ...
//!
//! Values come back in base units: cores for CPU, bytes for memory.

use once_cell::sync::Lazy;
use regex::Regex;

static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+))(?:([eE][+-]?[0-9]+)|(Ki|Mi|Gi|Ti|Pi|Ei|n|u|m|k|M|G|T|P|E))?$")
        .expect("quantity pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,
    #[error("'{0}' is not a recognised quantity")]
    Unrecognised(String),
    #[error("'{0}' must not be negative")]
    Negative(String),
    #[error("'{0}' is out of range")]
    OutOfRange(String),
}

/// Parse a quantity string into base units
pub fn parse_quantity(text: &str) -> Result<f64, QuantityError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(QuantityError::Empty);
    }

    let captures = QUANTITY_RE
        .captures(trimmed)
        .ok_or_else(|| QuantityError::Unrecognised(trimmed.to_string()))?;

    let mantissa: f64 = captures[1]
        .parse()
        .map_err(|_| QuantityError::Unrecognised(trimmed.to_string()))?;

    let value = if let Some(exponent) = captures.get(2) {
        let exp: i32 = exponent.as_str()[1..]
            .parse()
            .map_err(|_| QuantityError::OutOfRange(trimmed.to_string()))?;
        scale_decimal(mantissa, exp)
    } else if let Some(suffix) = captures.get(3) {
        apply_suffix(mantissa, suffix.as_str())
    } else {
        mantissa
    };

    check_magnitude(value, trimmed)
}

/// Validate a plain number (from a YAML scalar) the same way
pub fn check_magnitude(value: f64, original: &str) -> Result<f64, QuantityError> {
    if !value.is_finite() {
        return Err(QuantityError::OutOfRange(original.to_string()));
    }
    if value < 0.0 {
        return Err(QuantityError::Negative(original.to_string()));
    }
    // normalise -0.0
    Ok(value.abs())
}

fn apply_suffix(mantissa: f64, suffix: &str) -> f64 {
    match suffix {
        "Ki" => mantissa * 1024f64,
        "Mi" => mantissa * 1024f64.powi(2),
        "Gi" => mantissa * 1024f64.powi(3),
        "Ti" => mantissa * 1024f64.powi(4),
        "Pi" => mantissa * 1024f64.powi(5),
        "Ei" => mantissa * 1024f64.powi(6),
        "n" => scale_decimal(mantissa, -9),
        "u" => scale_decimal(mantissa, -6),
        "m" => scale_decimal(mantissa, -3),
        "k" => scale_decimal(mantissa, 3),
        "M" => scale_decimal(mantissa, 6),
        "G" => scale_decimal(mantissa, 9),
        "T" => scale_decimal(mantissa, 12),
        "P" => scale_decimal(mantissa, 15),
        "E" => scale_decimal(mantissa, 18),
        _ => mantissa,
    }
}

/// Divide for negative exponents so "200m" is exactly 0.2
fn scale_decimal(mantissa: f64, exp: i32) -> f64 {
    if exp >= 0 {
        mantissa * 10f64.powi(exp)
    } else {
        mantissa / 10f64.powi(-exp)
    }
}

/// Memory is counted in whole bytes, rounding up
pub fn to_bytes(value: f64, original: &str) -> Result<u64, QuantityError> {
    let bytes = value.ceil();
    // 2^64 is the first value that does not fit
    if bytes >= 18_446_744_073_709_551_616.0 {
        return Err(QuantityError::OutOfRange(original.to_string()));
    }
    Ok(bytes as u64)
}
