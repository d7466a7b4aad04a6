// src/chart/format.rs

/// Format a number as a thousands-separated integer: `1234567.4 -> "1,234,567"`.
/// Halves round to the nearest even integer.
pub fn thousands(value: f64) -> String {
    let rounded = value.round_ties_even();
    if !rounded.is_finite() {
        return rounded.to_string();
    }

    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
