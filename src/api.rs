use std::collections::HashMap;
use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::{json, Json, Value};
use rocket::{catch, get, post, Request, State};

use crate::error::PredictError;
use crate::model_store::ModelStore;
use crate::types::{HealthResponse, ModelInfoResponse, PredictRequest, PredictResponse};

#[get("/health")]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[get("/models")]
pub async fn list_models(store: &State<Arc<ModelStore>>) -> Json<Vec<ModelInfoResponse>> {
    let mut resp: Vec<ModelInfoResponse> = store
        .iter()
        .map(|(disease_type, entry)| ModelInfoResponse {
            disease_type: disease_type.clone(),
            num_features: entry.feature_names().len(),
            trained: entry.classifier().is_trained(),
        })
        .collect();
    resp.sort_by(|a, b| a.disease_type.cmp(&b.disease_type));

    Json(resp)
}

#[post("/predict", data = "<req>")]
pub async fn predict(
    store: &State<Arc<ModelStore>>,
    req: Json<PredictRequest>,
) -> Result<Json<PredictResponse>, PredictError> {
    let PredictRequest {
        disease_type,
        features,
    } = req.into_inner();

    let disease_type = disease_type
        .filter(|t| !t.is_empty())
        .ok_or(PredictError::MissingFields)?;
    let features = features
        .filter(|f| !f.is_empty())
        .ok_or(PredictError::MissingFields)?;

    let entry = store
        .entry(&disease_type)
        .ok_or_else(|| PredictError::ModelNotFound(disease_type.clone()))?;
    let expected = entry.feature_names();

    let input = build_input_vector(expected, &features)?;

    // Redundant with the presence check inside build_input_vector, kept as a
    // final guard before the model sees the vector.
    if input.len() != expected.len() {
        return Err(PredictError::ShapeMismatch {
            expected: expected.len(),
            got: input.len(),
            received_features: features.keys().cloned().collect(),
            expected_features: expected.to_vec(),
        });
    }

    let outcome = entry.classifier().predict(&input)?;
    log::info!(
        "{disease_type}: prediction={} probability={:.4}",
        outcome.label,
        outcome.probability,
    );

    Ok(Json(PredictResponse {
        prediction: outcome.label,
        probability: outcome.probability,
        disease_type,
    }))
}

/// Keeps non-route failures (malformed JSON bodies, unknown paths) on the
/// same `{"error": ...}` wire shape as the handler errors.
#[catch(default)]
pub fn error_catcher(status: Status, _req: &Request<'_>) -> Json<Value> {
    Json(json!({ "error": status.reason_lossy() }))
}

/// Reorder the submitted mapping into the model's fixed feature order,
/// coercing each value to f64. Presence is checked for the whole set before
/// any value is coerced.
fn build_input_vector(
    expected: &[String],
    submitted: &HashMap<String, Value>,
) -> Result<Vec<f64>, PredictError> {
    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !submitted.contains_key(name.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(PredictError::MissingFeatures { missing });
    }

    expected
        .iter()
        .map(|name| coerce_feature_value(name, &submitted[name]))
        .collect()
}

/// Numbers pass through, numeric strings parse, booleans map to 1/0.
fn coerce_feature_value(feature: &str, value: &Value) -> Result<f64, PredictError> {
    let invalid = || PredictError::InvalidValue {
        feature: feature.to_string(),
        value: value.to_string(),
    };

    match value {
        Value::Number(n) => n.as_f64().ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid()),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::ContentType;
    use rocket::local::blocking::Client;

    fn test_client() -> Client {
        let dir = tempfile::tempdir().expect("tmpdir");
        let store = ModelStore::bootstrap(dir.path()).expect("bootstrap");
        let rocket = rocket::build()
            .manage(Arc::new(store))
            .mount("/", rocket::routes![health, list_models, predict])
            .register("/", rocket::catchers![error_catcher]);
        Client::tracked(rocket).expect("client")
    }

    fn post_predict(client: &Client, body: &Value) -> (Status, Value) {
        let response = client
            .post("/predict")
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch();
        let status = response.status();
        let body = response.into_json::<Value>().expect("json body");
        (status, body)
    }

    fn full_diabetes_features() -> Value {
        json!({
            "age": 33,
            "bloodPressure": 70,
            "bmi": 28.1,
            "diabetesPedigreeFunction": 0.5,
            "glucose": 120,
            "insulin": 80,
            "pregnancies": 2,
            "skinThickness": 20,
        })
    }

    #[test]
    fn health_reports_ok() {
        let client = test_client();
        let response = client.get("/health").dispatch();
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_json::<Value>().expect("json body");
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn models_lists_the_builtin_types() {
        let client = test_client();
        let response = client.get("/models").dispatch();
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_json::<Value>().expect("json body");
        let listing = body.as_array().expect("array");
        assert_eq!(listing.len(), 3);
        assert_eq!(listing[0]["disease_type"], "diabetes");
        assert_eq!(listing[0]["num_features"], 8);
        assert_eq!(listing[0]["trained"], false);
        assert_eq!(listing[1]["disease_type"], "heart");
        assert_eq!(listing[1]["num_features"], 13);
        assert_eq!(listing[2]["disease_type"], "kidney");
        assert_eq!(listing[2]["num_features"], 23);
    }

    #[test]
    fn full_diabetes_submission_predicts() {
        let client = test_client();
        let (status, body) = post_predict(
            &client,
            &json!({ "disease_type": "diabetes", "features": full_diabetes_features() }),
        );

        assert_eq!(status, Status::Ok);
        assert_eq!(body["disease_type"], "diabetes");
        let prediction = body["prediction"].as_u64().expect("prediction");
        assert!(prediction == 0 || prediction == 1);
        let probability = body["probability"].as_f64().expect("probability");
        assert!((0.0..=1.0).contains(&probability));
    }

    #[test]
    fn extra_features_are_ignored() {
        let client = test_client();
        let mut features = full_diabetes_features();
        features["smoker"] = json!(1);
        features["clinicNotes"] = json!(42.5);

        let (status, body) = post_predict(
            &client,
            &json!({ "disease_type": "diabetes", "features": features }),
        );
        assert_eq!(status, Status::Ok);
        assert_eq!(body["disease_type"], "diabetes");
    }

    #[test]
    fn missing_features_are_listed_exactly() {
        let client = test_client();
        let (status, body) = post_predict(
            &client,
            &json!({ "disease_type": "diabetes", "features": { "age": 33 } }),
        );

        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["error"], "Missing required features");
        assert_eq!(
            body["missing_features"],
            json!([
                "bloodPressure",
                "bmi",
                "diabetesPedigreeFunction",
                "glucose",
                "insulin",
                "pregnancies",
                "skinThickness",
            ])
        );
    }

    #[test]
    fn unknown_disease_type_is_a_server_error() {
        let client = test_client();
        let (status, body) = post_predict(
            &client,
            &json!({ "disease_type": "flu", "features": { "x": 1 } }),
        );

        assert_eq!(status, Status::InternalServerError);
        assert_eq!(body["error"], "Model or feature list for flu not found");
    }

    #[test]
    fn absent_or_empty_fields_are_a_bad_request() {
        let client = test_client();
        let cases = [
            json!({}),
            json!({ "disease_type": "diabetes" }),
            json!({ "features": { "age": 33 } }),
            json!({ "disease_type": "", "features": { "age": 33 } }),
            json!({ "disease_type": "diabetes", "features": {} }),
        ];

        for case in cases {
            let (status, body) = post_predict(&client, &case);
            assert_eq!(status, Status::BadRequest, "case: {case}");
            assert_eq!(body["error"], "Missing disease_type or features");
        }
    }

    #[test]
    fn non_numeric_value_hits_the_generic_bucket() {
        let client = test_client();
        let mut features = full_diabetes_features();
        features["glucose"] = json!("high");

        let (status, body) = post_predict(
            &client,
            &json!({ "disease_type": "diabetes", "features": features }),
        );
        assert_eq!(status, Status::InternalServerError);
        let message = body["error"].as_str().expect("error message");
        assert!(message.contains("glucose"), "message: {message}");
    }

    #[test]
    fn numeric_strings_and_booleans_coerce() {
        let client = test_client();
        let mut features = full_diabetes_features();
        features["glucose"] = json!("120.5");
        features["insulin"] = json!(true);

        let (status, _body) = post_predict(
            &client,
            &json!({ "disease_type": "diabetes", "features": features }),
        );
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn repeated_requests_are_identical() {
        let client = test_client();
        let request = json!({ "disease_type": "heart", "features": {
            "age": 54, "sex": 1, "cp": 0, "trestbps": 130, "chol": 246,
            "fbs": 0, "restecg": 1, "thalach": 150, "exang": 0,
            "oldpeak": 1.0, "slope": 2, "ca": 0, "thal": 2,
        }});

        let (first_status, first_body) = post_predict(&client, &request);
        let (second_status, second_body) = post_predict(&client, &request);
        assert_eq!(first_status, Status::Ok);
        assert_eq!(first_status, second_status);
        assert_eq!(first_body, second_body);
    }

    #[test]
    fn malformed_body_still_answers_json() {
        let client = test_client();
        let response = client
            .post("/predict")
            .header(ContentType::JSON)
            .body("this is not json")
            .dispatch();

        assert_eq!(response.status(), Status::BadRequest);
        let body = response.into_json::<Value>().expect("json body");
        assert!(body["error"].is_string());
    }

    #[test]
    fn vector_follows_model_order_not_submission_order() {
        let expected = vec!["glucose".to_string(), "bmi".to_string(), "age".to_string()];
        let submitted: HashMap<String, Value> = [
            ("age".to_string(), json!(30)),
            ("glucose".to_string(), json!(110)),
            ("bmi".to_string(), json!("27.5")),
        ]
        .into_iter()
        .collect();

        let vector = build_input_vector(&expected, &submitted).expect("vector");
        assert_eq!(vector, vec![110.0, 27.5, 30.0]);
    }

    #[test]
    fn coercion_matches_the_accepted_forms() {
        assert_eq!(coerce_feature_value("x", &json!(1.5)).expect("number"), 1.5);
        assert_eq!(
            coerce_feature_value("x", &json!(" 2.25 ")).expect("padded string"),
            2.25
        );
        assert_eq!(coerce_feature_value("x", &json!(false)).expect("bool"), 0.0);
        assert!(coerce_feature_value("x", &json!("sugar")).is_err());
        assert!(coerce_feature_value("x", &json!(null)).is_err());
        assert!(coerce_feature_value("x", &json!([1, 2])).is_err());
    }
}
