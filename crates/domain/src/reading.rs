//! Lenient parsing of free-form device values.
//!
//! A value is read by its leading numeric prefix (`"38.5°C"` → `38.5`).
//! Composite values such as `"38.5 / 45%"` are split on `/` first.
//! Unreadable or absent values resolve to a caller-supplied default and the
//! result records that the default was used.

/// A parsed reading, tagged with whether it came from the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample<T> {
    Measured(T),
    Defaulted(T),
}

impl<T: Copy> Sample<T> {
    /// The value, measured or not.
    #[must_use]
    pub fn get(self) -> T {
        match self {
            Self::Measured(v) | Self::Defaulted(v) => v,
        }
    }

    #[must_use]
    pub fn is_defaulted(self) -> bool {
        matches!(self, Self::Defaulted(_))
    }
}

/// Leading decimal number of `text`, if any.
#[must_use]
pub fn leading_f64(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if frac_end > frac_start || digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    text[..end].trim_end_matches('.').parse().ok()
}

/// Leading integer of `text`, if any (`"65.7%"` → `65`).
#[must_use]
pub fn leading_i64(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    text[..end].parse().ok()
}

/// The `index`-th `/`-separated segment of a composite value, trimmed.
#[must_use]
pub fn segment(value: &str, index: usize) -> Option<&str> {
    value.split('/').nth(index).map(str::trim)
}

/// Leading decimal of `value`, or `default`.
#[must_use]
pub fn float_or(value: Option<&str>, default: f64) -> Sample<f64> {
    match value.and_then(leading_f64) {
        Some(v) => Sample::Measured(v),
        None => Sample::Defaulted(default),
    }
}

/// Leading integer of `value`, or `default`.
#[must_use]
pub fn int_or(value: Option<&str>, default: i64) -> Sample<i64> {
    match value.and_then(leading_i64) {
        Some(v) => Sample::Measured(v),
        None => Sample::Defaulted(default),
    }
}

/// Leading decimal of the `index`-th segment of `value`, or `default`.
#[must_use]
pub fn float_segment_or(value: Option<&str>, index: usize, default: f64) -> Sample<f64> {
    match value.and_then(|v| segment(v, index)).and_then(leading_f64) {
        Some(v) => Sample::Measured(v),
        None => Sample::Defaulted(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_leading_decimal_with_unit_suffix() {
        assert_eq!(leading_f64("38.5°C"), Some(38.5));
        assert_eq!(leading_f64("  0.2 m/s"), Some(0.2));
        assert_eq!(leading_f64("-4"), Some(-4.0));
        assert_eq!(leading_f64(".5"), Some(0.5));
        assert_eq!(leading_f64("7."), Some(7.0));
    }

    #[test]
    fn should_reject_values_without_leading_number() {
        assert_eq!(leading_f64("ABIERTA"), None);
        assert_eq!(leading_f64(""), None);
        assert_eq!(leading_f64("."), None);
        assert_eq!(leading_f64("N/A"), None);
    }

    #[test]
    fn should_truncate_integer_reading() {
        assert_eq!(leading_i64("65.7%"), Some(65));
        assert_eq!(leading_i64("100"), Some(100));
        assert_eq!(leading_i64("CORTADO"), None);
    }

    #[test]
    fn should_pick_composite_segment() {
        assert_eq!(segment("1.1A / 253W", 1), Some("253W"));
        assert_eq!(segment("38.5", 1), None);
        assert_eq!(
            float_segment_or(Some("1.1A / 253W"), 1, 0.0),
            Sample::Measured(253.0)
        );
    }

    #[test]
    fn should_default_when_value_absent_or_malformed() {
        assert_eq!(float_or(None, 35.0), Sample::Defaulted(35.0));
        assert_eq!(float_or(Some("error"), 35.0), Sample::Defaulted(35.0));
        assert_eq!(int_or(Some("??"), 65), Sample::Defaulted(65));
        assert_eq!(float_segment_or(Some("2.0A"), 1, 253.0), Sample::Defaulted(253.0));
    }

    #[test]
    fn should_keep_zero_as_measured_value() {
        let airflow = float_or(Some("0"), 1.5);
        assert_eq!(airflow, Sample::Measured(0.0));
        assert!(!airflow.is_defaulted());
    }

    #[test]
    fn should_read_first_segment_of_composite_temperature() {
        assert_eq!(float_or(Some("42.3 / 51%"), 35.0).get(), 42.3);
    }
}
