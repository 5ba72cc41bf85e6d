// Lighthouse display values ("1.2 s", "1,230 ms", "0.05") to milliseconds.

use crate::error::PipelineError;

/// Parse a human-readable duration into milliseconds.
///
/// `ms` suffix: value as-is. `s` suffix: value × 1000. No suffix: value as-is (already
/// numeric, e.g. a layout-shift score). Whitespace around the number and unit is ignored.
pub fn parse_duration_ms(text: &str) -> Result<f64, PipelineError> {
    let trimmed = text.trim();
    let (number, scale) = if let Some(n) = trimmed.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = trimmed.strip_suffix('s') {
        (n, 1000.0)
    } else {
        (trimmed, 1.0)
    };

    let value: f64 = normalize_commas(number.trim())
        .parse()
        .map_err(|_| PipelineError::UnparseableDuration(text.to_string()))?;
    if !value.is_finite() {
        return Err(PipelineError::UnparseableDuration(text.to_string()));
    }
    Ok(value * scale)
}

/// Commas are digit grouping when every group after the first has three digits or the
/// number already has a decimal point; otherwise the comma is a decimal comma.
fn normalize_commas(number: &str) -> String {
    if !number.contains(',') {
        return number.to_string();
    }
    let grouped = number.contains('.')
        || number
            .split(',')
            .skip(1)
            .all(|group| group.len() == 3 && group.bytes().all(|b| b.is_ascii_digit()));
    if grouped {
        number.replace(',', "")
    } else {
        number.replace(',', ".")
    }
}
