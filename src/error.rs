use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::response::{self, Responder};
use rocket::serde::json::{json, Json, Value};
use rocket::Request;

use crate::classifier::ClassifierError;

/// Everything that can go wrong while serving `/predict`, with a fixed
/// mapping to HTTP status and JSON body.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Missing disease_type or features")]
    MissingFields,

    #[error("Model or feature list for {0} not found")]
    ModelNotFound(String),

    #[error("Missing required features")]
    MissingFeatures { missing: Vec<String> },

    #[error("Feature shape mismatch, expected: {expected}, got: {got}")]
    ShapeMismatch {
        expected: usize,
        got: usize,
        received_features: Vec<String>,
        expected_features: Vec<String>,
    },

    #[error("could not convert value {value} of feature '{feature}' to a number")]
    InvalidValue { feature: String, value: String },

    #[error("{0}")]
    Classifier(#[from] ClassifierError),
}

impl PredictError {
    pub fn status(&self) -> Status {
        match self {
            Self::MissingFields => Status::BadRequest,
            Self::ModelNotFound(_) => Status::InternalServerError,
            Self::MissingFeatures { .. } => Status::BadRequest,
            Self::ShapeMismatch { .. } => Status::BadRequest,
            // Coercion failures land in the generic 500 bucket, not 400.
            Self::InvalidValue { .. } => Status::InternalServerError,
            Self::Classifier(_) => Status::InternalServerError,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::MissingFeatures { missing } => json!({
                "error": self.to_string(),
                "missing_features": missing,
            }),
            Self::ShapeMismatch {
                received_features,
                expected_features,
                ..
            } => json!({
                "error": self.to_string(),
                "received_features": received_features,
                "expected_features": expected_features,
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

impl<'r> Responder<'r, 'static> for PredictError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        log::warn!("prediction request failed: {self}");
        Custom(self.status(), Json(self.body())).respond_to(req)
    }
}
