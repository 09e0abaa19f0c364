use log::{debug, warn};
use serde::Serialize;

use crate::aid_stations::{match_waypoints, round_to_tenth, with_finish};
use crate::error::PlannerError;
use crate::geo::{build_profile, cumulative_distances, total_elevation_gain};
use crate::gpx_types::{GpxData, GpxPoint};
use crate::model::{ElevationPoint, PartialFormValues};
use crate::parser::parse_gpx;
use crate::state_codec::{STATE_VERSION, decode_planner_state};

/// What a GPX import contributes to the planner form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedCourse {
    pub name: Option<String>,
    pub values: PartialFormValues,
    pub elevation_profile: Vec<ElevationPoint>,
    /// True when the values came from an embedded planner state blob.
    pub from_planner_state: bool,
}

/// Import a GPX document.
///
/// An embedded planner state wins over the geometry. Without one, the
/// course is rebuilt from track (or route) points and waypoints. Any
/// error rejects the whole file.
pub fn import_gpx(xml: &str) -> Result<ImportedCourse, PlannerError> {
    let data = parse_gpx(xml)?;
    let points = data.course_points();

    if let Some(blob) = data.planner_state.as_deref() {
        let payload = decode_planner_state(blob)?;
        if payload.version > STATE_VERSION {
            warn!(
                "planner state version {} is newer than supported {STATE_VERSION}",
                payload.version
            );
        }
        let mut elevation_profile = payload.elevation_profile;
        if elevation_profile.is_empty() && !points.is_empty() {
            elevation_profile = build_profile(&points);
        }
        debug!(
            "imported planner state v{} with {} profile points",
            payload.version,
            elevation_profile.len()
        );
        return Ok(ImportedCourse {
            name: data.name,
            values: payload.values,
            elevation_profile,
            from_planner_state: true,
        });
    }

    if points.is_empty() {
        return Err(PlannerError::NoTrackPoints);
    }
    Ok(course_from_track(&data, &points))
}

fn course_from_track(data: &GpxData, points: &[GpxPoint]) -> ImportedCourse {
    let elevation_profile = build_profile(points);
    let name = data
        .name
        .clone()
        .or_else(|| data.tracks.iter().find_map(|t| t.name.clone()))
        .or_else(|| data.routes.iter().find_map(|r| r.name.clone()));

    // One point has no length: keep the form's distance, gain and stations.
    if points.len() < 2 {
        warn!("track has a single point; course values left unchanged");
        return ImportedCourse {
            name,
            values: PartialFormValues::default(),
            elevation_profile,
            from_planner_state: false,
        };
    }

    let distances = cumulative_distances(points);
    let total_km = distances.last().copied().unwrap_or(0.0);
    let matched = match_waypoints(&data.waypoints, points, &distances);
    let aid_stations = with_finish(&matched, total_km);
    debug!(
        "imported track: {} points, {:.2} km, {} stations",
        points.len(),
        total_km,
        aid_stations.len()
    );

    ImportedCourse {
        name,
        values: PartialFormValues {
            race_distance_km: Some(round_to_tenth(total_km)),
            elevation_gain: Some(total_elevation_gain(&elevation_profile).round()),
            aid_stations: Some(aid_stations),
            ..Default::default()
        },
        elevation_profile,
        from_planner_state: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FINISH_NAME;

    #[test]
    fn test_track_only_import() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <wpt lat="0" lon="0.05"><name>Midway</name></wpt>
  <trk><name>Equator run</name><trkseg>
    <trkpt lat="0" lon="0"><ele>100</ele></trkpt>
    <trkpt lat="0" lon="0.05"><ele>180</ele></trkpt>
    <trkpt lat="0" lon="0.1"><ele>120</ele></trkpt>
  </trkseg></trk>
</gpx>"#;
        let course = import_gpx(xml).unwrap();
        assert!(!course.from_planner_state);
        assert_eq!(course.name.as_deref(), Some("Equator run"));
        assert_eq!(course.values.race_distance_km, Some(11.1));
        assert_eq!(course.values.elevation_gain, Some(80.0));
        let stations = course.values.aid_stations.unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "Midway");
        assert_eq!(stations[0].distance_km, 5.6);
        assert_eq!(stations[1].name, FINISH_NAME);
        assert_eq!(course.elevation_profile.len(), 3);
        assert!(course.values.pace_type.is_none());
    }

    #[test]
    fn test_no_points_and_no_state() {
        let xml = r#"<gpx version="1.1"><wpt lat="1" lon="1"/></gpx>"#;
        assert!(matches!(import_gpx(xml), Err(PlannerError::NoTrackPoints)));
    }

    #[test]
    fn test_corrupt_state_rejects_file() {
        let xml = r#"<gpx version="1.1" xmlns:trailplanner="https://trailplanner.app/gpx/1">
  <metadata><extensions><trailplanner:state>%%%</trailplanner:state></extensions></metadata>
  <trk><trkseg><trkpt lat="0" lon="0"/><trkpt lat="0" lon="0.1"/></trkseg></trk>
</gpx>"#;
        assert!(matches!(
            import_gpx(xml),
            Err(PlannerError::InvalidPlannerState(_))
        ));
    }

    #[test]
    fn test_state_with_empty_profile_uses_track() {
        // {"version":1,"values":{"raceDistanceKm":30.0}}
        let xml = r#"<gpx version="1.1" xmlns:trailplanner="https://trailplanner.app/gpx/1">
  <metadata><extensions><trailplanner:state>eyJ2ZXJzaW9uIjoxLCJ2YWx1ZXMiOnsicmFjZURpc3RhbmNlS20iOjMwLjB9fQ==</trailplanner:state></extensions></metadata>
  <trk><trkseg><trkpt lat="0" lon="0"><ele>5</ele></trkpt><trkpt lat="0" lon="0.1"><ele>9</ele></trkpt></trkseg></trk>
</gpx>"#;
        let course = import_gpx(xml).unwrap();
        assert!(course.from_planner_state);
        assert_eq!(course.values.race_distance_km, Some(30.0));
        assert_eq!(course.elevation_profile.len(), 2);
        assert_eq!(course.elevation_profile[1].elevation_m, 9.0);
    }
}
