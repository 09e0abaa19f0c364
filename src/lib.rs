pub mod aid_stations;
pub mod course_geojson;
pub mod error;
pub mod geo;
pub mod gpx_export;
pub mod gpx_import;
pub mod gpx_types;
pub mod model;
pub mod options;
pub mod pace;
pub mod parser;
pub mod plan_cache;
pub mod planner;
pub mod segments;
pub mod smoothing;
pub mod state_codec;
pub mod validation;

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::model::{ElevationPoint, FieldError, FormValues};
use crate::options::{DEFAULT_SMOOTHING_WINDOW_KM, PlannerOptions};
use crate::smoothing::SpeedSample;

/// Recompute segments, totals and speed series for the current form.
#[wasm_bindgen(js_name = recomputePlan)]
pub fn recompute_plan(
    values: JsValue,
    profile: JsValue,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let values: FormValues = from_js(values)?;
    let profile: Vec<ElevationPoint> = from_js(profile)?;
    let opts: PlannerOptions = from_js(options)?;
    to_js(&planner::recompute(&values, &profile, &opts))
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum ValidationOutcome {
    Valid { values: FormValues },
    Invalid { errors: Vec<FieldError> },
}

/// Validate the form, returning `{status: "valid", values}` or
/// `{status: "invalid", errors}`.
#[wasm_bindgen(js_name = validatePlannerValues)]
pub fn validate_planner_values(values: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let values: FormValues = from_js(values)?;
    let outcome = match validation::validate_form_values(values) {
        Ok(values) => ValidationOutcome::Valid { values },
        Err(errors) => ValidationOutcome::Invalid { errors },
    };
    to_js(&outcome)
}

/// Import a GPX file; throws on any malformed input.
#[wasm_bindgen(js_name = importGpx)]
pub fn import_gpx(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let course = gpx_import::import_gpx(gpx_string)?;
    to_js(&course)
}

/// Export the plan as a GPX 1.1 string; throws when the values are invalid.
#[wasm_bindgen(js_name = exportGpx)]
pub fn export_gpx(values: JsValue, profile: JsValue, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let values = validation::require_valid(from_js(values)?)?;
    let profile: Vec<ElevationPoint> = from_js(profile)?;
    let opts: PlannerOptions = from_js(options)?;
    Ok(gpx_export::export_gpx(&values, &profile, &opts)?)
}

#[wasm_bindgen(js_name = encodePlannerState)]
pub fn encode_planner_state(values: JsValue, profile: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let values = validation::require_valid(from_js(values)?)?;
    let profile: Vec<ElevationPoint> = from_js(profile)?;
    Ok(state_codec::encode_planner_state(&values, &profile)?)
}

#[wasm_bindgen(js_name = decodePlannerState)]
pub fn decode_planner_state(encoded: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let payload = state_codec::decode_planner_state(encoded)?;
    to_js(&payload)
}

/// Smooth a `[{distanceKm, speedKph}]` series; the window defaults to 1.6 km.
#[wasm_bindgen(js_name = smoothSpeedSamples)]
pub fn smooth_speed_samples(samples: JsValue, window_km: Option<f64>) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let samples: Vec<SpeedSample> = from_js(samples)?;
    let window = window_km.unwrap_or(DEFAULT_SMOOTHING_WINDOW_KM);
    to_js(&smoothing::smooth_speed_samples(&samples, window))
}

/// GeoJSON map layer for a GPX course, returned as a JS object.
#[wasm_bindgen(js_name = courseToGeoJson)]
pub fn course_to_geojson(
    gpx_string: &str,
    values: JsValue,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let values: FormValues = from_js(values)?;
    let opts: PlannerOptions = from_js(options)?;
    let fc = course_geojson::course_from_gpx(gpx_string, &values, &opts)?;
    to_js(&fc)
}

/// GeoJSON map layer for a GPX course, returned as a JSON string.
#[wasm_bindgen(js_name = courseToGeoJsonString)]
pub fn course_to_geojson_string(
    gpx_string: &str,
    values: JsValue,
    options: JsValue,
) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let values: FormValues = from_js(values)?;
    let opts: PlannerOptions = from_js(options)?;
    let fc = course_geojson::course_from_gpx(gpx_string, &values, &opts)?;
    serde_json::to_string(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// km/h for a pace, or undefined when the pace is not positive.
#[wasm_bindgen(js_name = convertPaceToSpeed)]
pub fn convert_pace_to_speed(pace_minutes: f64, pace_seconds: f64) -> Option<f64> {
    pace::pace_to_speed(pace_minutes, pace_seconds)
}

/// `[minutes, seconds]` per km for a speed, or null when not positive.
#[wasm_bindgen(js_name = convertSpeedToPace)]
pub fn convert_speed_to_pace(speed_kph: f64) -> Result<JsValue, JsValue> {
    to_js(&pace::speed_to_pace(speed_kph))
}

/// `undefined` and `null` mean "use the defaults".
fn from_js<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        Ok(T::default())
    } else {
        serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
