use std::collections::HashMap;

use rocket::serde::json::Value;
use serde::{Deserialize, Serialize};

/// Body of `POST /predict`. Both fields are optional at the wire level so the
/// handler can answer absent or empty fields with its own 400 instead of a
/// deserialization failure.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub disease_type: Option<String>,
    pub features: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub prediction: u8,
    pub probability: f64,
    pub disease_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfoResponse {
    pub disease_type: String,
    pub num_features: usize,
    pub trained: bool,
}
