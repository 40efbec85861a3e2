use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use cervirisk_classifiers::error::ModelError;
use cervirisk_classifiers::io::ArtifactBundle;
use cervirisk_classifiers::models::random_forest::class_from_proba;

use super::state::SharedState;

pub const HIGH_RISK: &str = "High Risk";
pub const LOW_RISK: &str = "Low Risk";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: String,
    /// Positive-class probability in percent, two decimals.
    pub probability: f64,
    pub full_probabilities: Vec<f64>,
}

/// Every way `/predict` can fail; all map to HTTP 400.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("model artifacts are not loaded: {0}")]
    ArtifactsUnavailable(String),

    #[error("request body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("request body must be a JSON object of feature values")]
    NotAnObject,

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        log::error!("Prediction failed: {}", self);
        (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Numeric value of a request field, if it has one.
///
/// Finite numbers are used as-is, strings are trimmed and parsed, booleans
/// map to `1.0`/`0.0`. Everything else is `None`.
pub fn coerce_value(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// Feature vector in schema order, substituting training medians for
/// missing or unusable fields.
pub fn assemble_features(payload: &Map<String, Value>, bundle: &ArtifactBundle) -> Array1<f64> {
    bundle
        .feature_names()
        .iter()
        .map(|name| {
            let raw = payload.get(name);
            coerce_value(raw).unwrap_or_else(|| {
                let fallback = bundle.median(name);
                log::warn!(
                    "Invalid value for {}: {}, using median: {}",
                    name,
                    raw.map_or_else(|| "<missing>".to_string(), Value::to_string),
                    fallback
                );
                fallback
            })
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn predict_payload(bundle: &ArtifactBundle, body: &Value) -> Result<PredictionResponse, PredictError> {
    let payload = body.as_object().ok_or(PredictError::NotAnObject)?;
    let features = assemble_features(payload, bundle);
    let proba = bundle.predict_proba(features.view())?;

    let prediction = if class_from_proba(&proba) == 1 {
        HIGH_RISK
    } else {
        LOW_RISK
    };
    Ok(PredictionResponse {
        prediction: prediction.to_string(),
        probability: round2(proba[1] * 100.0),
        full_probabilities: proba,
    })
}

/// `POST /predict`
pub async fn predict(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, PredictError> {
    let bundle = state
        .artifacts()
        .map_err(|reason| PredictError::ArtifactsUnavailable(reason.to_string()))?;
    let payload: Value = serde_json::from_slice(&body)?;
    let response = predict_payload(bundle, &payload)?;
    log::debug!("{} ({}%)", response.prediction, response.probability);
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_accepts_numbers_strings_and_bools() {
        assert_eq!(coerce_value(Some(&json!(3))), Some(3.0));
        assert_eq!(coerce_value(Some(&json!(2.5))), Some(2.5));
        assert_eq!(coerce_value(Some(&json!(" 4.0 "))), Some(4.0));
        assert_eq!(coerce_value(Some(&json!(true))), Some(1.0));
        assert_eq!(coerce_value(Some(&json!(false))), Some(0.0));
    }

    #[test]
    fn coerce_rejects_everything_else() {
        assert_eq!(coerce_value(None), None);
        assert_eq!(coerce_value(Some(&Value::Null)), None);
        assert_eq!(coerce_value(Some(&json!("abc"))), None);
        assert_eq!(coerce_value(Some(&json!("NaN"))), None);
        assert_eq!(coerce_value(Some(&json!("inf"))), None);
        assert_eq!(coerce_value(Some(&json!([1]))), None);
        assert_eq!(coerce_value(Some(&json!({"v": 1}))), None);
    }

    #[test]
    fn probability_rounds_to_two_decimals() {
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(100.0), 100.0);
    }
}
