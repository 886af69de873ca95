use shared::ConfidenceLevel;

use crate::config::ConfidenceThresholds;

/// Mean of the vision and reasoning confidences, clamped to [0, 1] and
/// rounded to 4 decimal places.
pub fn composite(vision: f64, reasoning: f64) -> f64 {
    let mean = (clamp_unit(vision) + clamp_unit(reasoning)) / 2.0;
    round4(mean)
}

pub fn level(score: f64, thresholds: &ConfidenceThresholds) -> ConfidenceLevel {
    if score >= thresholds.high {
        ConfidenceLevel::High
    } else if score >= thresholds.medium {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_is_the_rounded_mean() {
        assert_eq!(composite(0.95, 0.89), 0.92);
        assert_eq!(composite(0.9, 0.8), 0.85);
        assert_eq!(composite(0.71, 0.66666), 0.6883);
        assert_eq!(composite(1.0, 1.0), 1.0);
        assert_eq!(composite(0.0, 0.0), 0.0);
    }

    #[test]
    fn composite_clamps_out_of_range_inputs() {
        assert_eq!(composite(1.5, 1.0), 1.0);
        assert_eq!(composite(-0.5, 0.0), 0.0);
        assert_eq!(composite(f64::NAN, 1.0), 0.5);
    }

    #[test]
    fn composite_is_monotonic_in_both_inputs() {
        let grid: Vec<f64> = (0..=20).map(|i| i as f64 / 20.0).collect();
        for &v in &grid {
            for pair in grid.windows(2) {
                assert!(composite(v, pair[0]) <= composite(v, pair[1]));
                assert!(composite(pair[0], v) <= composite(pair[1], v));
            }
        }
    }

    #[test]
    fn levels_use_inclusive_lower_bounds() {
        let thresholds = ConfidenceThresholds::default();
        assert_eq!(level(0.92, &thresholds), ConfidenceLevel::High);
        assert_eq!(level(0.85, &thresholds), ConfidenceLevel::High);
        assert_eq!(level(0.8499, &thresholds), ConfidenceLevel::Medium);
        assert_eq!(level(0.65, &thresholds), ConfidenceLevel::Medium);
        assert_eq!(level(0.64, &thresholds), ConfidenceLevel::Low);
    }
}
