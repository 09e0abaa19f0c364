use std::io::Write;

use log::debug;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::PlannerError;
use crate::geo::{elevation_at, flat_profile, scale_profile};
use crate::model::{AidStation, ElevationPoint, FormValues};
use crate::options::PlannerOptions;
use crate::segments::checkpoints;
use crate::state_codec::{STATE_ELEMENT, STATE_NAMESPACE, STATE_PREFIX, encode_planner_state};

type Result<T> = std::result::Result<T, PlannerError>;

pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

/// Kilometres per degree used for the pseudo-coordinates.
const KM_PER_DEGREE: f64 = 111.0;

fn write_err(e: impl std::fmt::Display) -> PlannerError {
    PlannerError::XmlWrite(e.to_string())
}

/// Longitude that stores a distance along the course. Latitude is always 0.
pub fn pseudo_lon(distance_km: f64) -> String {
    format!("{:.6}", distance_km / KM_PER_DEGREE)
}

/// Serialize a plan to a GPX 1.1 document.
///
/// Geometry uses `lat=0, lon=km/111`, so the file only round-trips through
/// this planner; it is not a map-accurate course. The track carries a point
/// at every checkpoint so waypoints snap back onto their own distance.
pub fn export_gpx(
    values: &FormValues,
    profile: &[ElevationPoint],
    opts: &PlannerOptions,
) -> Result<String> {
    let stations = checkpoints(values);
    let track_profile = if profile.len() >= 2 {
        scale_profile(profile, values.race_distance_km)
    } else {
        flat_profile(values.race_distance_km)
    };
    let track_profile = with_checkpoint_points(track_profile, &stations);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_err)?;

    let ns_attr = format!("xmlns:{STATE_PREFIX}");
    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("creator", opts.creator.as_str()));
    gpx.push_attribute(("xmlns", GPX_NAMESPACE));
    gpx.push_attribute((ns_attr.as_str(), STATE_NAMESPACE));
    writer.write_event(Event::Start(gpx)).map_err(write_err)?;

    write_metadata(&mut writer, values, profile, opts)?;

    if opts.include_waypoints {
        for station in &stations {
            let ele = format!("{:.1}", elevation_at(&track_profile, station.distance_km));
            write_point(
                &mut writer,
                "wpt",
                station.distance_km,
                Some(&ele),
                Some(&station.name),
            )?;
        }
        debug!("exported {} waypoints", stations.len());
    }

    if opts.include_track {
        writer
            .write_event(Event::Start(BytesStart::new("trk")))
            .map_err(write_err)?;
        write_text_element(&mut writer, "name", &opts.plan_name)?;
        writer
            .write_event(Event::Start(BytesStart::new("trkseg")))
            .map_err(write_err)?;
        for point in &track_profile {
            let ele = format!("{:.1}", point.elevation_m);
            write_point(&mut writer, "trkpt", point.distance_km, Some(&ele), None)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("trkseg")))
            .map_err(write_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("trk")))
            .map_err(write_err)?;
        debug!("exported {} track points", track_profile.len());
    }

    writer
        .write_event(Event::End(BytesEnd::new("gpx")))
        .map_err(write_err)?;

    String::from_utf8(writer.into_inner()).map_err(write_err)
}

/// Insert an interpolated point at each checkpoint distance missing from
/// the profile.
fn with_checkpoint_points(
    mut profile: Vec<ElevationPoint>,
    stations: &[AidStation],
) -> Vec<ElevationPoint> {
    for station in stations {
        let km = station.distance_km;
        let idx = profile.partition_point(|p| p.distance_km < km);
        if profile.get(idx).is_some_and(|p| p.distance_km - km < 1e-9) {
            continue;
        }
        let ele = elevation_at(&profile, km);
        profile.insert(idx, ElevationPoint::new(km, ele));
    }
    profile
}

fn write_metadata<W: Write>(
    writer: &mut Writer<W>,
    values: &FormValues,
    profile: &[ElevationPoint],
    opts: &PlannerOptions,
) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("metadata")))
        .map_err(write_err)?;
    write_text_element(writer, "name", &opts.plan_name)?;

    if opts.include_planner_state {
        let blob = encode_planner_state(values, profile)?;
        writer
            .write_event(Event::Start(BytesStart::new("extensions")))
            .map_err(write_err)?;
        write_text_element(writer, STATE_ELEMENT, &blob)?;
        writer
            .write_event(Event::End(BytesEnd::new("extensions")))
            .map_err(write_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("metadata")))
        .map_err(write_err)?;
    Ok(())
}

fn write_point<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    distance_km: f64,
    ele: Option<&str>,
    name: Option<&str>,
) -> Result<()> {
    let lon = pseudo_lon(distance_km);
    let mut start = BytesStart::new(tag);
    start.push_attribute(("lat", "0"));
    start.push_attribute(("lon", lon.as_str()));
    writer.write_event(Event::Start(start)).map_err(write_err)?;
    if let Some(ele) = ele {
        write_text_element(writer, "ele", ele)?;
    }
    if let Some(name) = name {
        write_text_element(writer, "name", name)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(write_err)?;
    Ok(())
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(write_err)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(write_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AidStation;
    use crate::parser::parse_gpx;

    fn values() -> FormValues {
        FormValues {
            race_distance_km: 22.2,
            aid_stations: vec![AidStation::new("Col & Lac", 11.1)],
            ..Default::default()
        }
    }

    #[test]
    fn test_pseudo_lon() {
        assert_eq!(pseudo_lon(111.0), "1.000000");
        assert_eq!(pseudo_lon(0.0), "0.000000");
    }

    #[test]
    fn test_document_shape() {
        let profile = vec![
            ElevationPoint::new(0.0, 100.0),
            ElevationPoint::new(11.1, 600.0),
            ElevationPoint::new(22.2, 100.0),
        ];
        let xml = export_gpx(&values(), &profile, &PlannerOptions::default()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"xmlns:trailplanner="https://trailplanner.app/gpx/1""#));
        assert!(xml.contains("<trailplanner:state>"));
        assert!(xml.contains(r#"<wpt lat="0" lon="0.100000">"#));
        assert!(xml.contains("Col &amp; Lac"));

        let data = parse_gpx(&xml).unwrap();
        assert!(data.planner_state.is_some());
        assert_eq!(data.waypoints.len(), 2);
        assert_eq!(data.waypoints[0].ele, Some(600.0));
        assert_eq!(data.waypoints[1].name.as_deref(), Some("Finish"));
        assert_eq!(data.course_points().len(), 3);
    }

    #[test]
    fn test_options_disable_sections() {
        let opts = PlannerOptions {
            include_planner_state: false,
            include_track: false,
            ..Default::default()
        };
        let xml = export_gpx(&values(), &[], &opts).unwrap();
        let data = parse_gpx(&xml).unwrap();
        assert!(data.planner_state.is_none());
        assert!(data.tracks.is_empty());
        assert_eq!(data.waypoints.len(), 2);
    }

    #[test]
    fn test_missing_profile_exports_flat_track() {
        let xml = export_gpx(&values(), &[], &PlannerOptions::default()).unwrap();
        let points = parse_gpx(&xml).unwrap().course_points();
        let lons: Vec<String> = points.iter().map(|p| format!("{:.6}", p.lon)).collect();
        assert_eq!(lons, vec![pseudo_lon(0.0), pseudo_lon(11.1), pseudo_lon(22.2)]);
        assert!(points.iter().all(|p| p.ele == Some(0.0)));
    }

    #[test]
    fn test_track_gets_point_at_each_checkpoint() {
        let profile = vec![
            ElevationPoint::new(0.0, 100.0),
            ElevationPoint::new(20.0, 300.0),
            ElevationPoint::new(22.2, 300.0),
        ];
        let track = with_checkpoint_points(profile, &checkpoints(&values()));
        let kms: Vec<f64> = track.iter().map(|p| p.distance_km).collect();
        assert_eq!(kms, vec![0.0, 11.1, 20.0, 22.2]);
        assert!((track[1].elevation_m - 211.0).abs() < 1e-9);
    }

    #[test]
    fn test_waypoint_elevation_uses_race_distance() {
        let values = FormValues {
            race_distance_km: 10.0,
            aid_stations: vec![AidStation::new("Top", 5.0)],
            ..Default::default()
        };
        let profile = vec![
            ElevationPoint::new(0.0, 0.0),
            ElevationPoint::new(10.0, 1000.0),
            ElevationPoint::new(20.0, 0.0),
        ];
        let xml = export_gpx(&values, &profile, &PlannerOptions::default()).unwrap();
        let data = parse_gpx(&xml).unwrap();
        assert_eq!(data.waypoints[0].ele, Some(1000.0));
        assert_eq!(data.course_points().len(), 3);
    }
}
