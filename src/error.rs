use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::model::FieldError;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("XML write error: {0}")]
    XmlWrite(String),

    #[error("Invalid coordinates on <{element}>: '{value}'")]
    InvalidCoordinates { element: &'static str, value: String },

    #[error("Invalid planner state: {0}")]
    InvalidPlannerState(String),

    #[error("GPX file contains no track points")]
    NoTrackPoints,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid planner values: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Unknown plan '{0}'")]
    UnknownPlan(String),

    #[error("Unknown pending operation #{0}")]
    UnknownOperation(u64),
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<PlannerError> for JsValue {
    fn from(e: PlannerError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = PlannerError::Validation(vec![
            FieldError::new("raceDistanceKm", "must be greater than 0"),
            FieldError::new("uphillEffort", "must be between 0 and 100"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid planner values: raceDistanceKm: must be greater than 0; uphillEffort: must be between 0 and 100"
        );
    }

    #[test]
    fn test_invalid_coordinates_message() {
        let err = PlannerError::InvalidCoordinates {
            element: "trkpt",
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid coordinates on <trkpt>: 'abc'");
    }
}
