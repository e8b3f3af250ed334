//! Integer rounding helpers for percent/step conversions.

/// Divide rounding to nearest, ties away from zero. `den` must be non-zero.
#[inline]
pub fn div_round_nearest_i64(num: i64, den: i64) -> i64 {
    debug_assert!(den != 0, "div_round_nearest_i64: zero denominator");
    let half = den.abs() / 2;
    if (num >= 0) == (den > 0) {
        (num + half) / den
    } else {
        (num - half) / den
    }
}

/// Absolute position for a percentage of the travel window.
/// `percent` is expected in -100..=100; callers clamp the result.
#[inline]
pub fn percent_to_steps(percent: i32, max_position: i32) -> i32 {
    div_round_nearest_i64(i64::from(percent) * i64::from(max_position), 100) as i32
}

/// Rounded percentage for a position within the travel window.
/// Position 0 is always 0% regardless of `max_position`.
#[inline]
pub fn steps_to_percent(position: i32, max_position: i32) -> i32 {
    if position == 0 {
        return 0;
    }
    let den = i64::from(max_position.max(1));
    div_round_nearest_i64(i64::from(position) * 100, den) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_with_ties_away_from_zero() {
        assert_eq!(div_round_nearest_i64(5, 2), 3);
        assert_eq!(div_round_nearest_i64(-5, 2), -3);
        assert_eq!(div_round_nearest_i64(4, 2), 2);
        assert_eq!(div_round_nearest_i64(1, 3), 0);
    }

    #[test]
    fn percent_round_trip_within_one() {
        let max = 50_000;
        for p in 0..=100 {
            let steps = percent_to_steps(p, max);
            let back = steps_to_percent(steps, max);
            assert!((back - p).abs() <= 1, "p={p} steps={steps} back={back}");
        }
    }

    #[test]
    fn half_travel_is_fifty_percent() {
        assert_eq!(percent_to_steps(50, 50_000), 25_000);
        assert_eq!(steps_to_percent(25_000, 50_000), 50);
    }

    #[test]
    fn zero_position_is_zero_percent_even_uncalibrated() {
        assert_eq!(steps_to_percent(0, 0), 0);
    }
}
