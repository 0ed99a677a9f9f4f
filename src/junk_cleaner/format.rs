const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable `(value, unit)` pair, e.g. `("12.3", "MB")`.
///
/// Picks the largest binary unit (up to TB) that keeps the value at or above
/// one, rounds to one decimal (dropped when zero) and groups thousands with
/// commas. Zero is `("0", "B")`.
pub fn format_file_size(bytes: u64) -> (String, String) {
    if bytes == 0 {
        return ("0".to_string(), UNITS[0].to_string());
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let tenths = (value * 10.0).round() as u64;
    let whole = group_thousands(tenths / 10);
    let formatted = match tenths % 10 {
        0 => whole,
        frac => format!("{}.{}", whole, frac),
    };
    (formatted, UNITS[unit].to_string())
}

/// [`format_file_size`] joined with a space.
pub fn format_size(bytes: u64) -> String {
    let (value, unit) = format_file_size(bytes);
    format!("{} {}", value, unit)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(value: &str, unit: &str) -> (String, String) {
        (value.to_string(), unit.to_string())
    }

    #[test]
    fn zero_and_small_values_stay_in_bytes() {
        assert_eq!(format_file_size(0), pair("0", "B"));
        assert_eq!(format_file_size(1), pair("1", "B"));
        assert_eq!(format_file_size(1023), pair("1,023", "B"));
    }

    #[test]
    fn scales_and_rounds_to_one_decimal() {
        assert_eq!(format_file_size(1024), pair("1", "KB"));
        assert_eq!(format_file_size(1536), pair("1.5", "KB"));
        assert_eq!(format_file_size(12_939_428), pair("12.3", "MB"));
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn rounding_can_carry_into_grouped_integer() {
        // 1023.999 KB
        assert_eq!(format_file_size(1_048_575), pair("1,024", "KB"));
    }

    #[test]
    fn terabytes_are_the_ceiling() {
        let five_thousand_tb = 5_000u64 * 1024 * 1024 * 1024 * 1024;
        assert_eq!(format_file_size(five_thousand_tb), pair("5,000", "TB"));
    }
}
