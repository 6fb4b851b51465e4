//! Conversion between percentages and raw hardware ranges
//!
//! Neither direction clamps. Callers validate or clamp percentages before
//! converting to a raw value.

/// Map a raw value in `[min, max]` onto 0-100%
///
/// A degenerate range (`min == max`) reads as 0%.
pub fn value_to_percent(min: i64, max: i64, value: i64) -> f64 {
    if min == max {
        return 0.0;
    }
    (value - min) as f64 / (max - min) as f64 * 100.0
}

/// Map a percentage onto the nearest raw value of `[min, max]`
///
/// A degenerate range (`min == max`) maps every percentage to `min`.
pub fn percent_to_value(min: i64, max: i64, percent: f64) -> i64 {
    if min == max {
        return min;
    }
    min + ((max - min) as f64 * percent / 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_to_percent_byte_range() {
        let percent = value_to_percent(0, 255, 128);
        assert!((percent - 50.2).abs() < 0.1);
    }

    #[test]
    fn test_percent_to_value_identity_range() {
        assert_eq!(percent_to_value(0, 100, 50.0), 50);
        assert_eq!(percent_to_value(0, 100, 0.0), 0);
        assert_eq!(percent_to_value(0, 100, 100.0), 100);
    }

    #[test]
    fn test_offset_range() {
        assert_eq!(value_to_percent(-50, 50, 0), 50.0);
        assert_eq!(percent_to_value(-50, 50, 50.0), 0);
        assert_eq!(percent_to_value(10, 20, 100.0), 20);
    }

    #[test]
    fn test_round_trip_within_one_unit() {
        let ranges = [(0, 87), (0, 255), (-10239, 400), (3, 7), (0, 1), (-65536, 0)];
        for (min, max) in ranges {
            for value in min..=max {
                let back = percent_to_value(min, max, value_to_percent(min, max, value));
                assert!(
                    (back - value).abs() <= 1,
                    "range [{min}, {max}] value {value} came back as {back}"
                );
            }
        }
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(value_to_percent(42, 42, 42), 0.0);
        assert_eq!(percent_to_value(42, 42, 0.0), 42);
        assert_eq!(percent_to_value(42, 42, 73.5), 42);
        assert_eq!(percent_to_value(42, 42, 100.0), 42);
    }

    #[test]
    fn test_no_clamping() {
        assert_eq!(percent_to_value(0, 100, 150.0), 150);
        assert_eq!(value_to_percent(0, 100, -10), -10.0);
    }
}
