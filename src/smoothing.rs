use serde::{Deserialize, Serialize};

use crate::model::ElevationPoint;
use crate::pace::EffortModel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedSample {
    pub distance_km: f64,
    pub speed_kph: f64,
}

/// Modelled speed over each profile interval, sampled at the interval end.
pub fn derive_speed_samples(profile: &[ElevationPoint], model: &EffortModel) -> Vec<SpeedSample> {
    profile
        .windows(2)
        .filter_map(|w| {
            let segment_km = w[1].distance_km - w[0].distance_km;
            if segment_km <= 0.0 {
                return None;
            }
            let delta = w[1].elevation_m - w[0].elevation_m;
            let minutes = model.segment_minutes(segment_km, delta.max(0.0), (-delta).max(0.0));
            if minutes <= 0.0 {
                return None;
            }
            Some(SpeedSample {
                distance_km: w[1].distance_km,
                speed_kph: segment_km / (minutes / 60.0),
            })
        })
        .collect()
}

/// Centered moving average over `±window_km/2` of each sample's distance.
///
/// Samples must be sorted by distance. Two pointers keep a running sum, so
/// the whole pass is O(n). The sum holds offsets from the first speed, which
/// keeps a constant series exactly constant.
pub fn smooth_speed_samples(samples: &[SpeedSample], window_km: f64) -> Vec<SpeedSample> {
    if samples.len() <= 2 || !(window_km > 0.0) {
        return samples.to_vec();
    }

    let half = window_km / 2.0;
    let n = samples.len();
    let origin = samples[0].speed_kph;
    let mut out = Vec::with_capacity(n);
    let mut lo = 0;
    let mut hi = 0;
    let mut sum = 0.0;

    for sample in samples {
        while hi < n && samples[hi].distance_km <= sample.distance_km + half {
            sum += samples[hi].speed_kph - origin;
            hi += 1;
        }
        while samples[lo].distance_km < sample.distance_km - half {
            sum -= samples[lo].speed_kph - origin;
            lo += 1;
        }
        out.push(SpeedSample {
            distance_km: sample.distance_km,
            speed_kph: origin + sum / (hi - lo) as f64,
        });
    }

    out
}
