use crate::error::PlannerError;
use crate::model::{FieldError, FormValues, PaceType};

/// Check planner input, returning every field problem at once.
pub fn validate_form_values(values: FormValues) -> Result<FormValues, Vec<FieldError>> {
    let mut errors = Vec::new();

    if !(values.race_distance_km.is_finite() && values.race_distance_km > 0.0) {
        errors.push(FieldError::new("raceDistanceKm", "must be greater than 0"));
    }
    if !(values.elevation_gain.is_finite() && values.elevation_gain >= 0.0) {
        errors.push(FieldError::new("elevationGain", "must be 0 or more"));
    }

    match values.pace_type {
        PaceType::Pace => {
            if !(values.pace_minutes.is_finite() && values.pace_minutes >= 0.0) {
                errors.push(FieldError::new("paceMinutes", "must be 0 or more"));
            }
            if !(values.pace_seconds.is_finite()
                && (0.0..60.0).contains(&values.pace_seconds))
            {
                errors.push(FieldError::new("paceSeconds", "must be between 0 and 59"));
            }
            if values.pace_minutes * 60.0 + values.pace_seconds <= 0.0 {
                errors.push(FieldError::new("paceMinutes", "pace must be greater than 0"));
            }
        }
        PaceType::Speed => {
            if !(values.speed_kph.is_finite() && values.speed_kph > 0.0) {
                errors.push(FieldError::new("speedKph", "must be greater than 0"));
            }
        }
    }

    for (field, value) in [
        ("uphillEffort", values.uphill_effort),
        ("downhillEffort", values.downhill_effort),
    ] {
        if !(0.0..=100.0).contains(&value) {
            errors.push(FieldError::new(field, "must be between 0 and 100"));
        }
    }

    for (field, value) in [
        ("targetIntakePerHour", values.target_intake_per_hour),
        ("waterIntakePerHour", values.water_intake_per_hour),
        ("sodiumIntakePerHour", values.sodium_intake_per_hour),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            errors.push(FieldError::new(field, "must be 0 or more"));
        }
    }

    for (i, station) in values.aid_stations.iter().enumerate() {
        if station.name.trim().is_empty() {
            errors.push(FieldError::new(
                format!("aidStations[{i}].name"),
                "must not be empty",
            ));
        }
        if !(station.distance_km.is_finite() && station.distance_km >= 0.0) {
            errors.push(FieldError::new(
                format!("aidStations[{i}].distanceKm"),
                "must be 0 or more",
            ));
        } else if values.race_distance_km > 0.0 && station.distance_km > values.race_distance_km {
            errors.push(FieldError::new(
                format!("aidStations[{i}].distanceKm"),
                "must not exceed the race distance",
            ));
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(errors)
    }
}

/// [`validate_form_values`] for callers that only proceed with a valid plan.
pub fn require_valid(values: FormValues) -> Result<FormValues, PlannerError> {
    validate_form_values(values).map_err(PlannerError::Validation)
}
