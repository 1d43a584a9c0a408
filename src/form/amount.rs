//! Number handling for the memo: lenient input parsing and cent rounding.

/// Round to two decimal places, half away from zero.
/// Magnitudes too large to scale by 100 have no cents and are returned as is.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}

/// Round a computed total to cents. A result that is not a finite number
/// counts as 0, the same as an unreadable input, and `-0.0` becomes `0.0`.
pub fn settle_amount(value: f64) -> f64 {
    let rounded = round2(value);
    if rounded.is_finite() { rounded + 0.0 } else { 0.0 }
}

/// Interpret a quantity or price field the way a browser's `parseFloat` does:
/// skip leading whitespace, take the longest numeric prefix, and fall back to
/// 0 when there is none. Non-finite results also become 0.
pub fn parse_amount(input: &str) -> f64 {
    let text = input.trim_start();
    let bytes = text.as_bytes();
    let len = bytes.len();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return 0.0;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Two-decimal display used on screen and in exported memos.
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value + 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_rounds_to_cents() {
        assert_eq!(round2(135.0), 135.0);
        assert_eq!(round2(0.1 * 3.0), 0.3);
        assert_eq!(round2(2.5 * 3.333), 8.33);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
    }

    #[test]
    fn round2_keeps_huge_values() {
        assert_eq!(round2(1e307), 1e307);
        assert_eq!(round2(-1e307), -1e307);
        assert_eq!(round2(f64::MAX), f64::MAX);
    }

    #[test]
    fn settled_amounts_are_finite_and_unsigned_zero() {
        assert_eq!(settle_amount(2.5 * 3.333), 8.33);
        assert_eq!(settle_amount(1e200 * 1e200), 0.0);
        assert_eq!(settle_amount(f64::NAN), 0.0);
        assert!(settle_amount(-0.0).is_sign_positive());
        assert!(settle_amount(-0.001).is_sign_positive());
    }

    #[test]
    fn negative_zero_displays_as_zero() {
        assert_eq!(format_amount(-0.0), "0.00");
        assert_eq!(format_amount(-1.5), "-1.50");
    }

    #[test]
    fn plain_numbers_parse() {
        assert_eq!(parse_amount("135"), 135.0);
        assert_eq!(parse_amount("12.50"), 12.5);
        assert_eq!(parse_amount("  7"), 7.0);
        assert_eq!(parse_amount(".5"), 0.5);
        assert_eq!(parse_amount("-2"), -2.0);
        assert_eq!(parse_amount("1e2"), 100.0);
    }

    #[test]
    fn numeric_prefix_wins() {
        assert_eq!(parse_amount("12abc"), 12.0);
        assert_eq!(parse_amount("3.5.1"), 3.5);
        assert_eq!(parse_amount("4."), 4.0);
        assert_eq!(parse_amount("2e"), 2.0);
        assert_eq!(parse_amount("9e+"), 9.0);
    }

    #[test]
    fn garbage_and_blank_are_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("   "), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("."), 0.0);
        assert_eq!(parse_amount("-"), 0.0);
        assert_eq!(parse_amount("1e999"), 0.0);
    }

    #[test]
    fn amounts_display_with_two_decimals() {
        assert_eq!(format_amount(135.0), "135.00");
        assert_eq!(format_amount(8.33), "8.33");
        assert_eq!(format_amount(0.0), "0.00");
    }
}
