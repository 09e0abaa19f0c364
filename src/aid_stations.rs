use log::debug;

use crate::geo::haversine_km;
use crate::gpx_types::GpxPoint;
use crate::model::{AidStation, DISTANCE_TOLERANCE_KM};

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sort stations by distance and drop repeats of the same name at the same
/// spot. Applying it twice yields the same list.
pub fn dedupe_aid_stations(stations: &[AidStation]) -> Vec<AidStation> {
    let mut sorted = stations.to_vec();
    sorted.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let mut out: Vec<AidStation> = Vec::with_capacity(sorted.len());
    for station in sorted {
        let duplicate = out.iter().any(|kept| {
            kept.name == station.name
                && (kept.distance_km - station.distance_km).abs() <= DISTANCE_TOLERANCE_KM
        });
        if !duplicate {
            out.push(station);
        }
    }
    out
}

/// Append the Finish marker at `total_km` and dedupe.
pub fn with_finish(stations: &[AidStation], total_km: f64) -> Vec<AidStation> {
    let mut all = stations.to_vec();
    all.push(AidStation::finish(round_to_tenth(total_km)));
    dedupe_aid_stations(&all)
}

/// Place each waypoint at the cumulative distance of its nearest track
/// point, rounded to 0.1 km. The first point reaching the minimum wins.
pub fn match_waypoints(
    waypoints: &[GpxPoint],
    track: &[GpxPoint],
    cumulative_km: &[f64],
) -> Vec<AidStation> {
    if track.is_empty() {
        return Vec::new();
    }

    waypoints
        .iter()
        .enumerate()
        .map(|(i, wpt)| {
            let mut best_idx = 0;
            let mut best_dist = f64::INFINITY;
            for (j, tp) in track.iter().enumerate() {
                let d = haversine_km(wpt.lat, wpt.lon, tp.lat, tp.lon);
                if d < best_dist {
                    best_dist = d;
                    best_idx = j;
                }
            }

            let name = wpt
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Aid station {}", i + 1));
            let distance_km = round_to_tenth(cumulative_km.get(best_idx).copied().unwrap_or(0.0));
            debug!(
                "matched waypoint '{name}' to track point {best_idx} at {distance_km} km \
                 ({best_dist:.3} km off-track)"
            );
            AidStation::new(name, distance_km)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::cumulative_distances;

    #[test]
    fn test_dedupe_sorts_and_removes_duplicates() {
        let stations = vec![
            AidStation::new("B", 12.0),
            AidStation::new("A", 5.0),
            AidStation::new("B", 12.005),
            AidStation::new("C", 12.0),
        ];
        let out = dedupe_aid_stations(&stations);
        let names: Vec<&str> = out.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let stations = vec![
            AidStation::new("X", 30.0),
            AidStation::new("Y", 10.0),
            AidStation::new("X", 30.0),
        ];
        let once = dedupe_aid_stations(&stations);
        let twice = dedupe_aid_stations(&once);
        assert_eq!(once, twice);
        assert!(once.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn test_same_name_far_apart_kept() {
        let stations = vec![AidStation::new("Water", 5.0), AidStation::new("Water", 5.5)];
        assert_eq!(dedupe_aid_stations(&stations).len(), 2);
    }

    #[test]
    fn test_with_finish_appends_once() {
        let stations = vec![AidStation::new("Col", 8.0), AidStation::finish(21.1)];
        let out = with_finish(&stations, 21.1);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], AidStation::finish(21.1));
    }

    #[test]
    fn test_match_waypoints_to_nearest_point() {
        let track: Vec<GpxPoint> = (0..=10)
            .map(|i| GpxPoint::new(0.0, i as f64 * 0.01))
            .collect();
        let distances = cumulative_distances(&track);

        let mut wpt = GpxPoint::new(0.0005, 0.0502);
        wpt.name = Some("Refuge".to_string());
        let unnamed = GpxPoint::new(0.0, 0.1);

        let stations = match_waypoints(&[wpt, unnamed], &track, &distances);
        assert_eq!(stations[0].name, "Refuge");
        assert_eq!(stations[0].distance_km, round_to_tenth(distances[5]));
        assert_eq!(stations[1].name, "Aid station 2");
        assert_eq!(stations[1].distance_km, 11.1);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(12.34), 12.3);
        assert_eq!(round_to_tenth(12.35001), 12.4);
    }
}
