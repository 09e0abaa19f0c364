use log::{debug, warn};

use crate::aid_stations::dedupe_aid_stations;
use crate::geo::{climb_between, scale_profile, total_distance_km};
use crate::model::{
    AidStation, DISTANCE_TOLERANCE_KM, ElevationPoint, FormValues, PlanTotals, Segment,
};
use crate::pace::EffortModel;

/// Where per-segment climb comes from.
enum ClimbSource {
    /// Real profile, stretched onto the race distance.
    Profile(Vec<ElevationPoint>),
    /// Declared gain spread evenly over the distance.
    Proportional { gain_m: f64, race_km: f64 },
}

impl ClimbSource {
    fn climb(&self, start_km: f64, end_km: f64) -> (f64, f64) {
        match self {
            ClimbSource::Profile(profile) => climb_between(profile, start_km, end_km),
            ClimbSource::Proportional { gain_m, race_km } => {
                let share = gain_m.max(0.0) * (end_km - start_km) / race_km;
                (share, share)
            }
        }
    }
}

/// Ordered checkpoints for a race: valid stations then the Finish marker.
pub fn checkpoints(values: &FormValues) -> Vec<AidStation> {
    let race_km = values.race_distance_km;
    let mut out: Vec<AidStation> = dedupe_aid_stations(&values.aid_stations)
        .into_iter()
        .filter(|s| {
            let keep = s.distance_km >= 0.0 && s.distance_km < race_km - DISTANCE_TOLERANCE_KM;
            if !keep {
                warn!(
                    "dropping aid station '{}' at {} km (race is {race_km} km)",
                    s.name, s.distance_km
                );
            }
            keep
        })
        .collect();
    out.push(AidStation::finish(race_km));
    out
}

/// Segment-by-segment timeline with ETA and fueling loads.
///
/// A profile with more than two points drives the climb per segment;
/// otherwise the declared elevation gain is shared out by distance.
/// Returns an empty list when the distance or pace is unusable.
pub fn build_segments(values: &FormValues, profile: &[ElevationPoint]) -> Vec<Segment> {
    let race_km = values.race_distance_km;
    if !(race_km.is_finite() && race_km > 0.0) {
        debug!("no segments: race distance {race_km}");
        return Vec::new();
    }
    let Some(model) = EffortModel::from_values(values) else {
        debug!("no segments: pace/speed not set");
        return Vec::new();
    };

    let source = if profile.len() > 2 && total_distance_km(profile) > 0.0 {
        ClimbSource::Profile(scale_profile(profile, race_km))
    } else {
        ClimbSource::Proportional {
            gain_m: values.elevation_gain,
            race_km,
        }
    };

    let mut segments = Vec::new();
    let mut previous_km = 0.0;
    let mut eta_minutes = 0.0;

    for checkpoint in checkpoints(values) {
        let segment_km = (checkpoint.distance_km - previous_km).max(0.0);
        let (ascent_m, descent_m) = source.climb(previous_km, checkpoint.distance_km);
        let segment_minutes = model.segment_minutes(segment_km, ascent_m, descent_m);
        eta_minutes += segment_minutes;

        let hours = segment_minutes / 60.0;
        segments.push(Segment {
            checkpoint: checkpoint.name,
            distance_km: checkpoint.distance_km,
            segment_km,
            eta_minutes,
            segment_minutes,
            fuel_grams: hours * values.target_intake_per_hour,
            water_ml: hours * values.water_intake_per_hour,
            sodium_mg: hours * values.sodium_intake_per_hour,
            ascent_m,
            descent_m,
        });
        previous_km = checkpoint.distance_km;
    }

    segments
}

pub fn plan_totals(segments: &[Segment]) -> PlanTotals {
    let mut totals = segments.iter().fold(PlanTotals::default(), |mut acc, s| {
        acc.distance_km += s.segment_km;
        acc.fuel_grams += s.fuel_grams;
        acc.water_ml += s.water_ml;
        acc.sodium_mg += s.sodium_mg;
        acc.ascent_m += s.ascent_m;
        acc.descent_m += s.descent_m;
        acc
    });
    totals.duration_minutes = segments.last().map(|s| s.eta_minutes).unwrap_or(0.0);
    totals
}
