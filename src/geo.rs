use crate::gpx_types::GpxPoint;
use crate::model::ElevationPoint;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in km between two lat/lon pairs in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Cumulative distance in km at every point of the track.
pub fn cumulative_distances(points: &[GpxPoint]) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, pt) in points.iter().enumerate() {
        if i > 0 {
            let prev = &points[i - 1];
            total += haversine_km(prev.lat, prev.lon, pt.lat, pt.lon);
        }
        out.push(total);
    }
    out
}

/// Distance-vs-elevation profile of a track.
///
/// Missing or non-finite elevations repeat the previous point's value.
pub fn build_profile(points: &[GpxPoint]) -> Vec<ElevationPoint> {
    let distances = cumulative_distances(points);
    let mut last_ele = 0.0;
    points
        .iter()
        .zip(distances)
        .map(|(pt, distance_km)| {
            if let Some(ele) = pt.ele.filter(|e| e.is_finite()) {
                last_ele = ele;
            }
            ElevationPoint::new(distance_km, last_ele)
        })
        .collect()
}

/// Two-point profile at sea level used when no track is available.
pub fn flat_profile(distance_km: f64) -> Vec<ElevationPoint> {
    vec![
        ElevationPoint::new(0.0, 0.0),
        ElevationPoint::new(distance_km.max(0.0), 0.0),
    ]
}

pub fn total_distance_km(profile: &[ElevationPoint]) -> f64 {
    profile.last().map(|p| p.distance_km).unwrap_or(0.0)
}

/// Stretch the profile so it ends exactly at `race_km`.
///
/// Profiles with no length, or an unusable race distance, come back as-is.
pub fn scale_profile(profile: &[ElevationPoint], race_km: f64) -> Vec<ElevationPoint> {
    let profile_km = total_distance_km(profile);
    if !(profile_km > 0.0 && race_km.is_finite() && race_km > 0.0) {
        return profile.to_vec();
    }
    let factor = race_km / profile_km;
    let mut scaled: Vec<ElevationPoint> = profile
        .iter()
        .map(|p| ElevationPoint::new(p.distance_km * factor, p.elevation_m))
        .collect();
    if let Some(last) = scaled.last_mut() {
        last.distance_km = race_km;
    }
    scaled
}

/// Sum of positive elevation deltas.
pub fn total_elevation_gain(profile: &[ElevationPoint]) -> f64 {
    profile
        .windows(2)
        .map(|w| (w[1].elevation_m - w[0].elevation_m).max(0.0))
        .fold(0.0, |acc, d| acc + d)
}

/// Linearly interpolated elevation at `distance_km`, clamped to the ends.
pub fn elevation_at(profile: &[ElevationPoint], distance_km: f64) -> f64 {
    let (first, last) = match (profile.first(), profile.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return 0.0,
    };
    if distance_km <= first.distance_km {
        return first.elevation_m;
    }
    if distance_km >= last.distance_km {
        return last.elevation_m;
    }

    let idx = profile.partition_point(|p| p.distance_km <= distance_km);
    let a = &profile[idx - 1];
    let b = &profile[idx];
    let span = b.distance_km - a.distance_km;
    if span <= 0.0 {
        return b.elevation_m;
    }
    let t = (distance_km - a.distance_km) / span;
    a.elevation_m + (b.elevation_m - a.elevation_m) * t
}

/// Ascent and descent in metres between two distances on the profile.
pub fn climb_between(profile: &[ElevationPoint], start_km: f64, end_km: f64) -> (f64, f64) {
    if profile.len() < 2 || end_km <= start_km {
        return (0.0, 0.0);
    }

    let mut ascent = 0.0;
    let mut descent = 0.0;
    let mut prev = elevation_at(profile, start_km);

    let inner = profile
        .iter()
        .filter(|p| p.distance_km > start_km && p.distance_km < end_km)
        .map(|p| p.elevation_m);
    for ele in inner.chain(std::iter::once(elevation_at(profile, end_km))) {
        let delta = ele - prev;
        if delta > 0.0 {
            ascent += delta;
        } else {
            descent -= delta;
        }
        prev = ele;
    }

    (ascent, descent)
}
