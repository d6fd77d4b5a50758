use std::time::Duration;

/// Whole-number percentage of `part` in `total`; 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

/// Elapsed time rounded to the nearest whole second
pub fn round_secs(elapsed: Duration) -> u64 {
    elapsed.as_secs_f64().round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(3, 4), 75);
        assert_eq!(percent(3, 5), 60);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(5, 5), 100);
    }

    #[test]
    fn test_percent_of_nothing_is_zero() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(3, 0), 0);
    }

    #[test]
    fn test_round_secs() {
        assert_eq!(round_secs(Duration::from_millis(1499)), 1);
        assert_eq!(round_secs(Duration::from_millis(1500)), 2);
        assert_eq!(round_secs(Duration::ZERO), 0);
    }
}
