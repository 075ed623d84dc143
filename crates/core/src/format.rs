//! Locale formatting for table cells.
//!
//! Numbers follow the en-US convention: comma thousands separators, a dot
//! for decimals, at most three fraction digits with trailing zeros
//! removed.

/// Maximum number of fraction digits kept when formatting.
pub const MAX_FRACTION_DIGITS: usize = 3;

/// Format a number with thousands separators, e.g. `1234567.5` ->
/// `"1,234,567.5"`.
///
/// Zero and non-finite values render as `"0"`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }

    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac)) => (int_part, frac.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let grouped = group_thousands(int_part);
    if grouped == "0" && frac_part.is_empty() {
        return "0".to_string();
    }

    let mut out = String::with_capacity(grouped.len() + frac_part.len() + 2);
    if value < 0.0 {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Insert a comma every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
