use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::error::PlannerError;
use crate::geo::{build_profile, cumulative_distances};
use crate::gpx_types::GpxPoint;
use crate::model::{FormValues, Segment};
use crate::options::PlannerOptions;
use crate::parser::parse_gpx;
use crate::segments::build_segments;

/// Parse a GPX course and lay the plan for `values` over it.
pub fn course_from_gpx(
    xml: &str,
    values: &FormValues,
    opts: &PlannerOptions,
) -> Result<FeatureCollection, PlannerError> {
    let points = parse_gpx(xml)?.course_points();
    if points.is_empty() {
        return Err(PlannerError::NoTrackPoints);
    }
    let segments = build_segments(values, &build_profile(&points));
    Ok(to_feature_collection(&points, &segments, opts))
}

/// Map layer for a planned course: the course line plus one point per
/// checkpoint carrying its timing and fueling numbers.
pub fn to_feature_collection(
    points: &[GpxPoint],
    segments: &[Segment],
    opts: &PlannerOptions,
) -> FeatureCollection {
    let mut features = Vec::new();

    if points.len() >= 2 {
        features.push(course_feature(points, opts));
    }

    if opts.include_checkpoints && !points.is_empty() {
        features.extend(checkpoint_features(points, segments, opts));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn course_feature(points: &[GpxPoint], opts: &PlannerOptions) -> Feature {
    let coords: Vec<Vec<f64>> = points
        .iter()
        .map(|pt| point_coords(pt, opts.include_elevation))
        .collect();
    let distances = cumulative_distances(points);

    let mut props = Map::new();
    props.insert("kind".to_string(), JsonValue::String("course".to_string()));
    props.insert("name".to_string(), JsonValue::String(opts.plan_name.clone()));
    insert_number(
        &mut props,
        "distanceKm",
        distances.last().copied().unwrap_or(0.0),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coords))),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// Checkpoints sit on the track point closest to their distance, with
/// segment distances scaled onto the track length.
fn checkpoint_features(
    points: &[GpxPoint],
    segments: &[Segment],
    opts: &PlannerOptions,
) -> Vec<Feature> {
    let distances = cumulative_distances(points);
    let track_km = distances.last().copied().unwrap_or(0.0);
    let race_km = segments.last().map(|s| s.distance_km).unwrap_or(0.0);
    let scale = if race_km > 0.0 { track_km / race_km } else { 0.0 };

    segments
        .iter()
        .map(|seg| {
            let pt = &points[nearest_index(&distances, seg.distance_km * scale)];

            let mut props = Map::new();
            props.insert(
                "kind".to_string(),
                JsonValue::String("checkpoint".to_string()),
            );
            props.insert("name".to_string(), JsonValue::String(seg.checkpoint.clone()));
            insert_number(&mut props, "distanceKm", seg.distance_km);
            insert_number(&mut props, "etaMinutes", seg.eta_minutes);
            insert_number(&mut props, "fuelGrams", seg.fuel_grams);
            insert_number(&mut props, "waterMl", seg.water_ml);
            insert_number(&mut props, "sodiumMg", seg.sodium_mg);

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(point_coords(
                    pt,
                    opts.include_elevation,
                )))),
                id: None,
                properties: Some(props),
                foreign_members: None,
            }
        })
        .collect()
}

fn nearest_index(distances: &[f64], target: f64) -> usize {
    let idx = distances.partition_point(|&d| d < target);
    if idx == 0 {
        return 0;
    }
    if idx >= distances.len() {
        return distances.len() - 1;
    }
    if target - distances[idx - 1] <= distances[idx] - target {
        idx - 1
    } else {
        idx
    }
}

/// Build [lon, lat] or [lon, lat, ele] coordinate array.
fn point_coords(pt: &GpxPoint, include_elevation: bool) -> Vec<f64> {
    match (include_elevation, pt.ele) {
        (true, Some(ele)) => vec![pt.lon, pt.lat, ele],
        _ => vec![pt.lon, pt.lat],
    }
}

fn insert_number(props: &mut Map<String, JsonValue>, key: &str, value: f64) {
    props.insert(
        key.to_string(),
        JsonValue::Number(serde_json::Number::from_f64(value).unwrap_or(0.into())),
    );
}
