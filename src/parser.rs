use log::warn;
use quick_xml::NsReader;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::events::{BytesStart, Event};

use crate::error::PlannerError;
use crate::gpx_types::*;
use crate::state_codec::{STATE_LOCAL_NAME, STATE_NAMESPACE, STATE_PREFIX};

type Result<T> = std::result::Result<T, PlannerError>;

/// Parse a GPX XML string into GpxData.
///
/// Track and route points with bad coordinates fail the whole parse;
/// waypoints with bad coordinates are skipped.
pub fn parse_gpx(xml: &str) -> Result<GpxData> {
    let mut reader = NsReader::from_str(xml);
    let mut data = GpxData::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if is_state_element(&reader, &e) {
                    data.planner_state = Some(read_text_owned(&mut reader, &e)?);
                    continue;
                }
                match e.local_name().as_ref() {
                    b"metadata" => parse_metadata(&mut reader, &mut data)?,
                    b"wpt" => {
                        if let Some(pt) = parse_waypoint(&e, &mut reader)? {
                            data.waypoints.push(pt);
                        }
                    }
                    b"rte" => data.routes.push(parse_route(&mut reader)?),
                    b"trk" => data.tracks.push(parse_track(&mut reader)?),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"wpt" {
                    match parse_lat_lon(&e, "wpt") {
                        Ok((lat, lon)) => data.waypoints.push(GpxPoint::new(lat, lon)),
                        Err(err) => warn!("skipping waypoint: {err}"),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(PlannerError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(data)
}

/// The planner state element, bound to its namespace under any prefix.
/// An undeclared `trailplanner:` prefix is accepted as well.
fn is_state_element(reader: &NsReader<&[u8]>, start: &BytesStart<'_>) -> bool {
    let (ns, local) = reader.resolve_element(start.name());
    if local.as_ref() != STATE_LOCAL_NAME.as_bytes() {
        return false;
    }
    match ns {
        ResolveResult::Bound(Namespace(uri)) => uri == STATE_NAMESPACE.as_bytes(),
        ResolveResult::Unknown(prefix) => prefix == STATE_PREFIX.as_bytes(),
        ResolveResult::Unbound => false,
    }
}

fn parse_coordinate(raw: &[u8], element: &'static str, limit: f64) -> Result<f64> {
    let val = std::str::from_utf8(raw).unwrap_or_default().trim();
    match val.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() <= limit => Ok(v),
        _ => Err(PlannerError::InvalidCoordinates {
            element,
            value: val.to_string(),
        }),
    }
}

/// Parse lat/lon attributes from a point element's start tag.
fn parse_lat_lon(e: &BytesStart<'_>, element: &'static str) -> Result<(f64, f64)> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| PlannerError::XmlParse(e.into()))?;
        match attr.key.local_name().as_ref() {
            b"lat" => lat = Some(parse_coordinate(&attr.value, element, 90.0)?),
            b"lon" => lon = Some(parse_coordinate(&attr.value, element, 180.0)?),
            _ => {}
        }
    }

    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok((lat, lon)),
        (None, _) => Err(PlannerError::InvalidCoordinates {
            element,
            value: "missing lat".to_string(),
        }),
        (_, None) => Err(PlannerError::InvalidCoordinates {
            element,
            value: "missing lon".to_string(),
        }),
    }
}

/// <metadata>: document name and extensions, where the planner state lives.
fn parse_metadata<'a>(reader: &mut NsReader<&'a [u8]>, data: &mut GpxData) -> Result<()> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if is_state_element(reader, &e) {
                    data.planner_state = Some(read_text_owned(reader, &e)?);
                    continue;
                }
                match e.local_name().as_ref() {
                    b"name" => data.name = Some(read_text_owned(reader, &e)?),
                    // descend so the state element is reached
                    b"extensions" => {}
                    _ => {
                        reader
                            .read_to_end(e.name())
                            .map_err(PlannerError::XmlParse)?;
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"metadata" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(PlannerError::XmlParse(e)),
            _ => {}
        }
    }
    Ok(())
}

/// A <wpt> start tag; bad coordinates skip the waypoint.
fn parse_waypoint<'a>(
    start: &BytesStart<'a>,
    reader: &mut NsReader<&'a [u8]>,
) -> Result<Option<GpxPoint>> {
    match parse_lat_lon(start, "wpt") {
        Ok((lat, lon)) => parse_point_body(GpxPoint::new(lat, lon), start, reader).map(Some),
        Err(err) => {
            warn!("skipping waypoint: {err}");
            reader
                .read_to_end(start.name())
                .map_err(PlannerError::XmlParse)?;
            Ok(None)
        }
    }
}

/// Children of a point element (wpt, rtept, trkpt).
/// Called after receiving Event::Start for the point element.
fn parse_point_body<'a>(
    mut point: GpxPoint,
    start: &BytesStart<'a>,
    reader: &mut NsReader<&'a [u8]>,
) -> Result<GpxPoint> {
    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"ele" => {
                    let text = read_text_owned(reader, &e)?;
                    point.ele = text.trim().parse::<f64>().ok();
                }
                b"name" => point.name = Some(read_text_owned(reader, &e)?),
                _ => {
                    // Skip unknown/extensions elements
                    reader
                        .read_to_end(e.name())
                        .map_err(PlannerError::XmlParse)?;
                }
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(PlannerError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(point)
}

/// Parse a <rte> element.
fn parse_route<'a>(reader: &mut NsReader<&'a [u8]>) -> Result<GpxRoute> {
    let mut route = GpxRoute::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => route.name = Some(read_text_owned(reader, &e)?),
                b"rtept" => {
                    let (lat, lon) = parse_lat_lon(&e, "rtept")?;
                    route
                        .points
                        .push(parse_point_body(GpxPoint::new(lat, lon), &e, reader)?);
                }
                _ => {
                    reader
                        .read_to_end(e.name())
                        .map_err(PlannerError::XmlParse)?;
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"rtept" {
                    let (lat, lon) = parse_lat_lon(&e, "rtept")?;
                    route.points.push(GpxPoint::new(lat, lon));
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"rte" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(PlannerError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(route)
}

/// Parse a <trk> element.
fn parse_track<'a>(reader: &mut NsReader<&'a [u8]>) -> Result<GpxTrack> {
    let mut track = GpxTrack::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => track.name = Some(read_text_owned(reader, &e)?),
                b"trkseg" => {
                    let seg = parse_segment(reader)?;
                    if !seg.points.is_empty() {
                        track.segments.push(seg);
                    }
                }
                _ => {
                    reader
                        .read_to_end(e.name())
                        .map_err(PlannerError::XmlParse)?;
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trk" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(PlannerError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(track)
}

/// Parse a <trkseg> element.
fn parse_segment<'a>(reader: &mut NsReader<&'a [u8]>) -> Result<GpxSegment> {
    let mut segment = GpxSegment::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    let (lat, lon) = parse_lat_lon(&e, "trkpt")?;
                    segment
                        .points
                        .push(parse_point_body(GpxPoint::new(lat, lon), &e, reader)?);
                }
                _ => {
                    reader
                        .read_to_end(e.name())
                        .map_err(PlannerError::XmlParse)?;
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    let (lat, lon) = parse_lat_lon(&e, "trkpt")?;
                    segment.points.push(GpxPoint::new(lat, lon));
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(PlannerError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(segment)
}

/// Read text content of an element as an owned String.
/// Handles regular text, CDATA sections, and entity references (Event::GeneralRef).
fn read_text_owned<'a>(reader: &mut NsReader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(PlannerError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(text)
}
