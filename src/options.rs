use serde::Deserialize;

pub const DEFAULT_SMOOTHING_WINDOW_KM: f64 = 1.6;

/// Options shared by recompute, GPX export and the map layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerOptions {
    /// Width of the speed smoothing window in km (default: 1.6)
    #[serde(default = "default_window")]
    pub smoothing_window_km: f64,

    /// Embed the planner state blob in exported GPX (default: true)
    #[serde(default = "default_true")]
    pub include_planner_state: bool,

    /// Write the elevation profile as a <trk> (default: true)
    #[serde(default = "default_true")]
    pub include_track: bool,

    /// Write aid stations as <wpt> elements (default: true)
    #[serde(default = "default_true")]
    pub include_waypoints: bool,

    /// Name written to <metadata> and <trk> (default: "Trail plan")
    #[serde(default = "default_plan_name")]
    pub plan_name: String,

    /// Value of the gpx creator attribute (default: "trailplanner")
    #[serde(default = "default_creator")]
    pub creator: String,

    /// Include elevation as the 3rd GeoJSON coordinate (default: true)
    #[serde(default = "default_true")]
    pub include_elevation: bool,

    /// Emit one Point feature per checkpoint in GeoJSON (default: true)
    #[serde(default = "default_true")]
    pub include_checkpoints: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            smoothing_window_km: DEFAULT_SMOOTHING_WINDOW_KM,
            include_planner_state: true,
            include_track: true,
            include_waypoints: true,
            plan_name: default_plan_name(),
            creator: default_creator(),
            include_elevation: true,
            include_checkpoints: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_window() -> f64 {
    DEFAULT_SMOOTHING_WINDOW_KM
}

fn default_plan_name() -> String {
    "Trail plan".to_string()
}

fn default_creator() -> String {
    "trailplanner".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let opts: PlannerOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.smoothing_window_km, DEFAULT_SMOOTHING_WINDOW_KM);
        assert!(opts.include_planner_state);
        assert_eq!(opts.plan_name, "Trail plan");
    }

    #[test]
    fn test_camel_case_overrides() {
        let opts: PlannerOptions =
            serde_json::from_str(r#"{"smoothingWindowKm": 0.5, "includeTrack": false}"#).unwrap();
        assert_eq!(opts.smoothing_window_km, 0.5);
        assert!(!opts.include_track);
        assert!(opts.include_waypoints);
    }
}
