/// Floor a second count (timestamp or duration) to a multiple of `minutes`.
/// Values of `minutes` ≤ 0 leave the input untouched.
pub fn floor(seconds: i64, minutes: i64) -> i64 {
    if minutes <= 0 {
        return seconds;
    }
    let step = minutes * 60;
    seconds - seconds.rem_euclid(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_rounding_is_identity() {
        assert_eq!(floor(1_306_747_813, 0), 1_306_747_813);
        assert_eq!(floor(1_306_747_813, -5), 1_306_747_813);
    }

    #[test]
    fn test_floor_to_quarter_hour() {
        // 10:07:30 -> 10:00:00
        assert_eq!(floor(10 * 3600 + 7 * 60 + 30, 15), 10 * 3600);
        // already aligned
        assert_eq!(floor(10 * 3600 + 45 * 60, 15), 10 * 3600 + 45 * 60);
    }

    #[test]
    fn test_floor_duration() {
        assert_eq!(floor(4500, 60), 3600);
        assert_eq!(floor(59, 1), 0);
    }
}
