use log::debug;
use serde::Serialize;

use crate::geo::{flat_profile, scale_profile};
use crate::model::{ElevationPoint, FormValues, PlanTotals, Segment};
use crate::options::PlannerOptions;
use crate::pace::EffortModel;
use crate::segments::{build_segments, plan_totals};
use crate::smoothing::{SpeedSample, derive_speed_samples, smooth_speed_samples};

/// Everything derived from the planner inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutput {
    /// Profile actually used, stretched onto the race distance; flat when the
    /// input had fewer than 2 points.
    pub profile: Vec<ElevationPoint>,
    pub segments: Vec<Segment>,
    pub totals: PlanTotals,
    pub speed_samples: Vec<SpeedSample>,
    pub smoothed_speed_samples: Vec<SpeedSample>,
}

/// Recompute the whole plan. The host calls this after every input change.
pub fn recompute(
    values: &FormValues,
    profile: &[ElevationPoint],
    opts: &PlannerOptions,
) -> PlanOutput {
    let profile = if profile.len() >= 2 {
        scale_profile(profile, values.race_distance_km)
    } else {
        flat_profile(values.race_distance_km)
    };

    let segments = build_segments(values, &profile);
    let totals = plan_totals(&segments);

    let speed_samples = EffortModel::from_values(values)
        .map(|model| derive_speed_samples(&profile, &model))
        .unwrap_or_default();
    let smoothed_speed_samples = smooth_speed_samples(&speed_samples, opts.smoothing_window_km);

    debug!(
        "recomputed plan: {} segments, {:.1} min, {} speed samples",
        segments.len(),
        totals.duration_minutes,
        speed_samples.len()
    );

    PlanOutput {
        profile,
        segments,
        totals,
        speed_samples,
        smoothed_speed_samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaceType;

    #[test]
    fn test_short_profile_falls_back_to_flat() {
        let values = FormValues {
            race_distance_km: 15.0,
            elevation_gain: 0.0,
            pace_type: PaceType::Speed,
            speed_kph: 10.0,
            aid_stations: Vec::new(),
            ..Default::default()
        };
        let out = recompute(
            &values,
            &[ElevationPoint::new(0.0, 300.0)],
            &PlannerOptions::default(),
        );
        assert_eq!(out.profile, flat_profile(15.0));
        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.totals.duration_minutes, 90.0);
        assert_eq!(out.speed_samples.len(), 1);
        assert_eq!(out.smoothed_speed_samples, out.speed_samples);
    }

    #[test]
    fn test_speed_samples_use_race_distance() {
        let values = FormValues {
            race_distance_km: 10.0,
            elevation_gain: 0.0,
            aid_stations: Vec::new(),
            ..Default::default()
        };
        let profile = vec![
            ElevationPoint::new(0.0, 0.0),
            ElevationPoint::new(5.0, 0.0),
            ElevationPoint::new(20.0, 0.0),
        ];
        let out = recompute(&values, &profile, &PlannerOptions::default());
        let distances: Vec<f64> = out.speed_samples.iter().map(|s| s.distance_km).collect();
        assert_eq!(distances, vec![2.5, 10.0]);
        assert_eq!(out.profile.last().map(|p| p.distance_km), Some(10.0));
        assert_eq!(out.segments[0].distance_km, 10.0);
    }

    #[test]
    fn test_unusable_pace_gives_empty_output() {
        let values = FormValues {
            pace_minutes: 0.0,
            pace_seconds: 0.0,
            ..Default::default()
        };
        let out = recompute(&values, &[], &PlannerOptions::default());
        assert!(out.segments.is_empty());
        assert!(out.speed_samples.is_empty());
        assert_eq!(out.totals, PlanTotals::default());
    }
}
