//! Easing curves for the card entrance.

/// Default overshoot constant of the "back" easing family.
pub const EASE_BACK_OVERSHOOT: f32 = 1.70158;

/// Ease-out with overshoot: `1 + (x-1)^2 * ((k+1)(x-1) + k)`.
///
/// `x` is clamped to `[0, 1]` first so float noise outside the unit interval
/// never reaches the polynomial. Returns exactly `0.0` at `x = 0` and `1.0` at
/// `x = 1`, and rises above `1.0` in between before settling.
pub fn ease_out_back(x: f32) -> f32 {
    let k = EASE_BACK_OVERSHOOT;
    let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
    let u = x - 1.0;
    1.0 + u * u * ((k + 1.0) * u + k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_values() {
        assert!(ease_out_back(0.0).abs() < 1e-6);
        assert!((ease_out_back(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(ease_out_back(-0.5), ease_out_back(0.0));
        assert_eq!(ease_out_back(1.5), ease_out_back(1.0));
        assert_eq!(ease_out_back(f32::NAN), ease_out_back(0.0));
    }

    #[test]
    fn test_overshoot_peak_location() {
        let mut peak_x = 0.0;
        let mut peak = f32::MIN;
        for i in 0..=1000 {
            let x = i as f32 / 1000.0;
            let y = ease_out_back(x);
            if y > peak {
                peak = y;
                peak_x = x;
            }
        }
        assert!(peak > 1.0, "no overshoot, peak {peak}");
        assert!(peak_x > 0.5 && peak_x < 1.0, "peak at {peak_x}");
        // Analytic maximum: x = 1 - 2k / (3(k+1)) ≈ 0.58, value ≈ 1.10.
        assert!((peak_x - 0.58).abs() < 0.02, "peak at {peak_x}");
        assert!((peak - 1.1).abs() < 0.01, "peak value {peak}");
    }

    #[test]
    fn test_exceeds_one_between_point_seven_and_one() {
        for x in [0.7_f32, 0.8, 0.9, 0.99] {
            assert!(ease_out_back(x) > 1.0, "x = {x}");
        }
    }
}
