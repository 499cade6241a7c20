pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Linear interpolation rounded to the nearest integer, halves away from zero.
pub(crate) fn lerp_round(a: f64, b: f64, t: f64) -> f64 {
    lerp(a, b, t).round()
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Format `v` as a rounded integer with `,` thousands separators.
pub fn format_grouped(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let n = v.round() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format `v` with thousands separators and a fixed number of decimals.
pub(crate) fn format_grouped_decimals(v: f64, decimals: usize) -> String {
    if decimals == 0 {
        return format_grouped(v);
    }
    let fixed = format!("{:.*}", decimals, v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let int_value: f64 = int_part.parse().unwrap_or(0.0);
    let sign = if v < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{}.{frac_part}", format_grouped(int_value))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
