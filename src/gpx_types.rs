/// Parsed GPX data relevant to the planner.
#[derive(Debug, Default)]
pub struct GpxData {
    pub name: Option<String>,
    pub waypoints: Vec<GpxPoint>,
    pub routes: Vec<GpxRoute>,
    pub tracks: Vec<GpxTrack>,
    /// Raw text of the `<trailplanner:state>` extension, if present.
    pub planner_state: Option<String>,
}

impl GpxData {
    /// All track points in document order, or route points when the file
    /// has no tracks.
    pub fn course_points(&self) -> Vec<GpxPoint> {
        let track_points: Vec<GpxPoint> = self
            .tracks
            .iter()
            .flat_map(|t| t.segments.iter())
            .flat_map(|s| s.points.iter().cloned())
            .collect();
        if !track_points.is_empty() {
            return track_points;
        }
        self.routes
            .iter()
            .flat_map(|r| r.points.iter().cloned())
            .collect()
    }
}

/// A single GPX point (used for wpt, rtept, trkpt).
#[derive(Debug, Clone, PartialEq)]
pub struct GpxPoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
    pub name: Option<String>,
}

impl GpxPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ele: None,
            name: None,
        }
    }
}

/// A GPX route (<rte>).
#[derive(Debug, Default)]
pub struct GpxRoute {
    pub name: Option<String>,
    pub points: Vec<GpxPoint>,
}

/// A GPX track (<trk>).
#[derive(Debug, Default)]
pub struct GpxTrack {
    pub name: Option<String>,
    pub segments: Vec<GpxSegment>,
}

/// A GPX track segment (<trkseg>).
#[derive(Debug, Default)]
pub struct GpxSegment {
    pub points: Vec<GpxPoint>,
}
