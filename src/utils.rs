use crate::error::{CalcError, CalcResult};
use std::path::PathBuf;

/// Largest precision that still rounds exactly through `f64` scaling
pub const MAX_PRECISION: u32 = 15;

/// Round `value` to `precision` decimal places
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(precision.min(MAX_PRECISION) as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / factor;
    // avoid printing "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Format a number with at most `precision` decimals, trailing zeros trimmed
pub fn format_number(value: f64, precision: u32) -> String {
    let formatted = format!("{:.*}", precision.min(MAX_PRECISION) as usize, value);
    if formatted.contains('.') {
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
        if trimmed == "-0" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        formatted
    }
}

/// Parse operand text typed at the prompt
pub fn parse_operand(text: &str) -> CalcResult<f64> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .replace('_', "")
        .parse()
        .map_err(|_| CalcError::invalid_input(trimmed))?;
    if value.is_nan() {
        return Err(CalcError::invalid_input(trimmed));
    }
    Ok(value)
}

/// Expand `~` and environment variables in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).into_owned()),
    }
}

/// Plural suffix helper for counts in messages
pub fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}
