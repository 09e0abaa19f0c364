use serde::{Deserialize, Serialize};

/// Distances closer than this are treated as the same checkpoint.
pub const DISTANCE_TOLERANCE_KM: f64 = 0.01;

pub const FINISH_NAME: &str = "Finish";

/// One sample of the course profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevationPoint {
    pub distance_km: f64,
    pub elevation_m: f64,
}

impl ElevationPoint {
    pub fn new(distance_km: f64, elevation_m: f64) -> Self {
        Self {
            distance_km,
            elevation_m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AidStation {
    pub name: String,
    pub distance_km: f64,
}

impl AidStation {
    pub fn new(name: impl Into<String>, distance_km: f64) -> Self {
        Self {
            name: name.into(),
            distance_km,
        }
    }

    pub fn finish(distance_km: f64) -> Self {
        Self::new(FINISH_NAME, distance_km)
    }
}

/// Which of pace or speed the athlete typed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaceType {
    #[default]
    Pace,
    Speed,
}

/// Full planner input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormValues {
    pub race_distance_km: f64,
    /// Declared positive elevation gain in metres.
    pub elevation_gain: f64,
    pub pace_type: PaceType,
    pub pace_minutes: f64,
    pub pace_seconds: f64,
    pub speed_kph: f64,
    /// 0 = conservative climbing, 100 = aggressive.
    pub uphill_effort: f64,
    /// 0 = careful descending, 100 = aggressive.
    pub downhill_effort: f64,
    /// Carbohydrate grams per hour.
    pub target_intake_per_hour: f64,
    pub water_intake_per_hour: f64,
    pub sodium_intake_per_hour: f64,
    pub aid_stations: Vec<AidStation>,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            race_distance_km: 50.0,
            elevation_gain: 2500.0,
            pace_type: PaceType::Pace,
            pace_minutes: 6.0,
            pace_seconds: 0.0,
            speed_kph: 10.0,
            uphill_effort: 50.0,
            downhill_effort: 50.0,
            target_intake_per_hour: 70.0,
            water_intake_per_hour: 500.0,
            sodium_intake_per_hour: 600.0,
            aid_stations: vec![
                AidStation::new("Aid station 1", 12.0),
                AidStation::new("Aid station 2", 25.0),
                AidStation::new("Aid station 3", 38.0),
            ],
        }
    }
}

/// Planner input where every field may be absent, as stored in the GPX
/// state blob and produced by track-only imports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialFormValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_type: Option<PaceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_kph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uphill_effort: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downhill_effort: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_intake_per_hour: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_intake_per_hour: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_intake_per_hour: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aid_stations: Option<Vec<AidStation>>,
}

impl PartialFormValues {
    /// Overlay the present fields onto `base`.
    pub fn apply_to(&self, base: &FormValues) -> FormValues {
        let mut out = base.clone();
        if let Some(v) = self.race_distance_km {
            out.race_distance_km = v;
        }
        if let Some(v) = self.elevation_gain {
            out.elevation_gain = v;
        }
        if let Some(v) = self.pace_type {
            out.pace_type = v;
        }
        if let Some(v) = self.pace_minutes {
            out.pace_minutes = v;
        }
        if let Some(v) = self.pace_seconds {
            out.pace_seconds = v;
        }
        if let Some(v) = self.speed_kph {
            out.speed_kph = v;
        }
        if let Some(v) = self.uphill_effort {
            out.uphill_effort = v;
        }
        if let Some(v) = self.downhill_effort {
            out.downhill_effort = v;
        }
        if let Some(v) = self.target_intake_per_hour {
            out.target_intake_per_hour = v;
        }
        if let Some(v) = self.water_intake_per_hour {
            out.water_intake_per_hour = v;
        }
        if let Some(v) = self.sodium_intake_per_hour {
            out.sodium_intake_per_hour = v;
        }
        if let Some(stations) = &self.aid_stations {
            out.aid_stations = stations.clone();
        }
        out
    }
}

impl From<&FormValues> for PartialFormValues {
    fn from(v: &FormValues) -> Self {
        Self {
            race_distance_km: Some(v.race_distance_km),
            elevation_gain: Some(v.elevation_gain),
            pace_type: Some(v.pace_type),
            pace_minutes: Some(v.pace_minutes),
            pace_seconds: Some(v.pace_seconds),
            speed_kph: Some(v.speed_kph),
            uphill_effort: Some(v.uphill_effort),
            downhill_effort: Some(v.downhill_effort),
            target_intake_per_hour: Some(v.target_intake_per_hour),
            water_intake_per_hour: Some(v.water_intake_per_hour),
            sodium_intake_per_hour: Some(v.sodium_intake_per_hour),
            aid_stations: Some(v.aid_stations.clone()),
        }
    }
}

/// One leg of the race, ending at `checkpoint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub checkpoint: String,
    /// Cumulative distance of the checkpoint from the start.
    pub distance_km: f64,
    pub segment_km: f64,
    /// Cumulative elapsed minutes at the checkpoint.
    pub eta_minutes: f64,
    pub segment_minutes: f64,
    pub fuel_grams: f64,
    pub water_ml: f64,
    pub sodium_mg: f64,
    pub ascent_m: f64,
    pub descent_m: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTotals {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub fuel_grams: f64,
    pub water_ml: f64,
    pub sodium_mg: f64,
    pub ascent_m: f64,
    pub descent_m: f64,
}

/// Wire format of the state blob embedded in exported GPX files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerStatePayload {
    pub version: u32,
    #[serde(default)]
    pub values: PartialFormValues,
    #[serde(default)]
    pub elevation_profile: Vec<ElevationPoint>,
}

/// Plan record as stored by the persistence service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlan {
    pub id: String,
    pub name: String,
    pub updated_at: String,
    pub planner_values: FormValues,
    #[serde(default)]
    pub elevation_profile: Vec<ElevationPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
