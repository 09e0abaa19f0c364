use crate::model::{FormValues, PaceType};

/// Grade at which climbing or descending is treated as fully steep.
const SATURATING_GRADE: f64 = 0.12;
const MIN_FACTOR: f64 = 0.6;
const MAX_FACTOR: f64 = 1.6;

/// Baseline minutes per km from whichever of pace or speed is authoritative.
pub fn base_minutes_per_km(values: &FormValues) -> Option<f64> {
    let minutes = match values.pace_type {
        PaceType::Pace => values.pace_minutes + values.pace_seconds / 60.0,
        PaceType::Speed => {
            if values.speed_kph > 0.0 {
                60.0 / values.speed_kph
            } else {
                return None;
            }
        }
    };
    (minutes.is_finite() && minutes > 0.0).then_some(minutes)
}

/// km/h for a pace, rounded to 0.1.
pub fn pace_to_speed(pace_minutes: f64, pace_seconds: f64) -> Option<f64> {
    let total = pace_minutes + pace_seconds / 60.0;
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    Some((60.0 / total * 10.0).round() / 10.0)
}

/// (minutes, seconds) per km for a speed, seconds rounded to whole numbers.
pub fn speed_to_pace(speed_kph: f64) -> Option<(f64, f64)> {
    if !(speed_kph.is_finite() && speed_kph > 0.0) {
        return None;
    }
    let total_seconds = (3600.0 / speed_kph).round();
    Some(((total_seconds / 60.0).floor(), total_seconds % 60.0))
}

/// Bring the non-authoritative half of pace/speed in line with the other.
pub fn sync_pace_and_speed(values: &mut FormValues) {
    match values.pace_type {
        PaceType::Pace => {
            if let Some(speed) = pace_to_speed(values.pace_minutes, values.pace_seconds) {
                values.speed_kph = speed;
            }
        }
        PaceType::Speed => {
            if let Some((minutes, seconds)) = speed_to_pace(values.speed_kph) {
                values.pace_minutes = minutes;
                values.pace_seconds = seconds;
            }
        }
    }
}

/// Baseline pace plus the effort sliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffortModel {
    pub base_minutes_per_km: f64,
    pub uphill_effort: f64,
    pub downhill_effort: f64,
}

impl EffortModel {
    pub fn from_values(values: &FormValues) -> Option<Self> {
        Some(Self {
            base_minutes_per_km: base_minutes_per_km(values)?,
            uphill_effort: values.uphill_effort,
            downhill_effort: values.downhill_effort,
        })
    }

    /// Multiplier on flat pace for a segment, within [0.6, 1.6].
    pub fn adjustment_factor(&self, segment_km: f64, ascent_m: f64, descent_m: f64) -> f64 {
        if segment_km <= 0.0 {
            return 1.0;
        }
        let meters = segment_km * 1000.0;
        let ascent_per_km = ascent_m.max(0.0) / meters;
        let descent_per_km = descent_m.max(0.0) / meters;

        let uphill_steepness = (ascent_per_km / SATURATING_GRADE).min(1.0);
        let downhill_steepness = (descent_per_km / SATURATING_GRADE).min(1.0);

        let uphill = self.uphill_effort.clamp(0.0, 100.0);
        let downhill = self.downhill_effort.clamp(0.0, 100.0);
        let uphill_intensity = 1.35 - (uphill / 100.0) * 0.7;
        let downhill_intensity = 0.5 + (downhill / 100.0) * 0.9;

        let penalty = ascent_per_km * 10.0 * uphill_intensity * (1.0 - 0.35 * uphill_steepness);
        let bonus = descent_per_km * 6.0 * downhill_intensity * (1.0 - 0.3 * downhill_steepness);

        (1.0 + penalty - bonus).clamp(MIN_FACTOR, MAX_FACTOR)
    }

    /// Minutes to cover a segment with the given climb.
    pub fn segment_minutes(&self, segment_km: f64, ascent_m: f64, descent_m: f64) -> f64 {
        if segment_km <= 0.0 {
            return 0.0;
        }
        segment_km
            * self.base_minutes_per_km
            * self.adjustment_factor(segment_km, ascent_m, descent_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> EffortModel {
        EffortModel {
            base_minutes_per_km: 6.0,
            uphill_effort: 50.0,
            downhill_effort: 50.0,
        }
    }

    #[test]
    fn test_flat_segment_uses_base_pace() {
        assert_eq!(model().segment_minutes(5.0, 0.0, 0.0), 30.0);
    }

    #[test]
    fn test_known_factor() {
        // 50 m/km at effort 50: 0.05 * 10 * 1.0 * (1 - 0.35 * 0.05/0.12)
        let expected = 1.0 + 0.5 * (1.0 - 0.35 * (0.05 / 0.12));
        let factor = model().adjustment_factor(2.0, 100.0, 0.0);
        assert!((factor - expected).abs() < 1e-12);
    }

    #[test]
    fn test_factor_is_clamped() {
        let m = model();
        assert_eq!(m.adjustment_factor(1.0, 2000.0, 0.0), 1.6);
        assert_eq!(m.adjustment_factor(1.0, 0.0, 2000.0), 0.6);
    }

    #[test]
    fn test_monotonic_in_ascent_and_descent() {
        let m = model();
        let mut last = 0.0;
        for ascent in (0..=400).step_by(20) {
            let minutes = m.segment_minutes(3.0, ascent as f64, 50.0);
            assert!(minutes >= last);
            assert!(minutes >= 0.6 * 18.0 - 1e-9 && minutes <= 1.6 * 18.0 + 1e-9);
            last = minutes;
        }
        let mut last = f64::INFINITY;
        for descent in (0..=400).step_by(20) {
            let minutes = m.segment_minutes(3.0, 50.0, descent as f64);
            assert!(minutes <= last);
            last = minutes;
        }
    }

    #[test]
    fn test_effort_changes_climb_cost() {
        let easy = EffortModel {
            uphill_effort: 0.0,
            ..model()
        };
        let hard = EffortModel {
            uphill_effort: 100.0,
            ..model()
        };
        assert!(easy.segment_minutes(2.0, 150.0, 0.0) > hard.segment_minutes(2.0, 150.0, 0.0));
    }

    #[test]
    fn test_zero_length_segment() {
        assert_eq!(model().segment_minutes(0.0, 100.0, 0.0), 0.0);
    }

    #[test]
    fn test_base_pace_from_pace_and_speed() {
        let pace = FormValues {
            pace_minutes: 5.0,
            pace_seconds: 30.0,
            ..Default::default()
        };
        assert_eq!(base_minutes_per_km(&pace), Some(5.5));

        let speed = FormValues {
            pace_type: PaceType::Speed,
            speed_kph: 10.0,
            ..Default::default()
        };
        assert_eq!(base_minutes_per_km(&speed), Some(6.0));

        let stopped = FormValues {
            pace_type: PaceType::Speed,
            speed_kph: 0.0,
            ..Default::default()
        };
        assert_eq!(base_minutes_per_km(&stopped), None);
    }

    #[test]
    fn test_pace_speed_conversion_round_trips() {
        assert_eq!(speed_to_pace(10.0), Some((6.0, 0.0)));
        assert_eq!(speed_to_pace(11.0), Some((5.0, 27.0)));
        assert_eq!(pace_to_speed(5.0, 27.0), Some(11.0));
        assert_eq!(pace_to_speed(0.0, 0.0), None);
    }

    #[test]
    fn test_sync_updates_the_derived_side() {
        let mut values = FormValues {
            pace_type: PaceType::Speed,
            speed_kph: 12.0,
            ..Default::default()
        };
        sync_pace_and_speed(&mut values);
        assert_eq!((values.pace_minutes, values.pace_seconds), (5.0, 0.0));
    }
}
