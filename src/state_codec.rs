//! Planner state blob: JSON, Base64-encoded, stored in a GPX extension.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::PlannerError;
use crate::model::{ElevationPoint, FormValues, PartialFormValues, PlannerStatePayload};

pub const STATE_VERSION: u32 = 1;
pub const STATE_NAMESPACE: &str = "https://trailplanner.app/gpx/1";
pub const STATE_PREFIX: &str = "trailplanner";
pub const STATE_LOCAL_NAME: &str = "state";
pub const STATE_ELEMENT: &str = "trailplanner:state";

pub fn build_payload(values: &FormValues, profile: &[ElevationPoint]) -> PlannerStatePayload {
    PlannerStatePayload {
        version: STATE_VERSION,
        values: PartialFormValues::from(values),
        elevation_profile: profile.to_vec(),
    }
}

/// Base64 text of the JSON payload.
pub fn encode_planner_state(
    values: &FormValues,
    profile: &[ElevationPoint],
) -> Result<String, PlannerError> {
    encode_payload(&build_payload(values, profile))
}

pub fn encode_payload(payload: &PlannerStatePayload) -> Result<String, PlannerError> {
    let json = serde_json::to_string(payload)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Reverse of [`encode_payload`]. Any failure is `InvalidPlannerState`.
pub fn decode_planner_state(encoded: &str) -> Result<PlannerStatePayload, PlannerError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| PlannerError::InvalidPlannerState(format!("base64: {e}")))?;
    let json = String::from_utf8(bytes)
        .map_err(|e| PlannerError::InvalidPlannerState(format!("utf-8: {e}")))?;
    serde_json::from_str(&json)
        .map_err(|e| PlannerError::InvalidPlannerState(format!("json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AidStation;

    fn sample() -> (FormValues, Vec<ElevationPoint>) {
        let values = FormValues {
            aid_stations: vec![
                AidStation::new("Ref. Bonatti", 12.5),
                AidStation::new("Champex-Lac ⛰", 30.0),
            ],
            ..Default::default()
        };
        let profile = vec![
            ElevationPoint::new(0.0, 1035.0),
            ElevationPoint::new(12.5, 2025.0),
            ElevationPoint::new(50.0, 1040.0),
        ];
        (values, profile)
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let (values, profile) = sample();
        let encoded = encode_planner_state(&values, &profile).unwrap();
        let decoded = decode_planner_state(&encoded).unwrap();
        assert_eq!(decoded, build_payload(&values, &profile));
        assert_eq!(encode_payload(&decoded).unwrap(), encoded);
        assert_eq!(decoded.values.apply_to(&FormValues::default()), values);
    }

    #[test]
    fn test_non_ascii_names_survive() {
        let (values, profile) = sample();
        let encoded = encode_planner_state(&values, &profile).unwrap();
        let decoded = decode_planner_state(&encoded).unwrap();
        let stations = decoded.values.aid_stations.unwrap();
        assert_eq!(stations[1].name, "Champex-Lac ⛰");
    }

    #[test]
    fn test_whitespace_in_blob_tolerated() {
        let (values, profile) = sample();
        let encoded = encode_planner_state(&values, &profile).unwrap();
        let wrapped = format!("\n   {}\n  {}\n", &encoded[..10], &encoded[10..]);
        assert!(decode_planner_state(&wrapped).is_ok());
    }

    #[test]
    fn test_partial_payload_decodes() {
        let encoded = STANDARD.encode(br#"{"version":1,"values":{"raceDistanceKm":21.1}}"#);
        let payload = decode_planner_state(&encoded).unwrap();
        assert_eq!(payload.values.race_distance_km, Some(21.1));
        assert!(payload.elevation_profile.is_empty());
    }

    #[test]
    fn test_corrupt_blob_is_invalid_state() {
        for blob in ["not base64!!", "aGVsbG8=", ""] {
            assert!(matches!(
                decode_planner_state(blob),
                Err(PlannerError::InvalidPlannerState(_))
            ));
        }
        let bad_utf8 = STANDARD.encode([0xffu8, 0xfe, 0xfd]);
        assert!(matches!(
            decode_planner_state(&bad_utf8),
            Err(PlannerError::InvalidPlannerState(_))
        ));
    }
}
