use feature_extractor::{FeatureSet, TrainingData};
use insurance_structs::{HyperParameters, RegressionMetrics, ResultRecord};
use ml_model::{GradientBoostingRegressor, ModelConfig};
use performance_api::{AppState, ServerConfig, router};
use reqwest::StatusCode;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use results_store::ResultCollection;
use serde_json::{Value, json};
use tokio::net::TcpListener;

fn state() -> AppState {
    let mut records = Vec::new();
    for n in [50, 100, 200] {
        for lr in [0.01, 0.05, 0.1] {
            for depth in [2, 3, 5] {
                records.push(ResultRecord::new(
                    HyperParameters::new(n, lr, depth),
                    RegressionMetrics {
                        rmse: 5000.0,
                        mae: 2500.0,
                        r2: 0.8,
                    },
                ));
            }
        }
    }

    let features: Vec<Vec<f64>> = (0..12)
        .map(|i| vec![f64::from(20 + i), 28.0, f64::from(i % 2)])
        .collect();
    let targets: Vec<f64> = (0..12).map(|i| 3000.0 + 100.0 * f64::from(i)).collect();
    let data = TrainingData::new(FeatureSet::Numeric, features, targets);
    let model =
        GradientBoostingRegressor::fit(&data, HyperParameters::new(5, 0.1, 2), &ModelConfig::default())
            .unwrap();

    AppState::new(ResultCollection::new(records).unwrap(), model, data)
}

/// Serves the router on an ephemeral port and returns its base URL.
async fn spawn(config: &ServerConfig) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let app = router(state(), config);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{address}")
}

async fn get(path: &str) -> reqwest::Response {
    let base = spawn(&ServerConfig::default()).await;
    reqwest::get(format!("{base}{path}")).await.unwrap()
}

fn cors(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(ACCESS_CONTROL_ALLOW_ORIGIN)
        .map(|v| v.to_str().unwrap())
}

#[tokio::test]
async fn test_full_collection_without_filters() {
    let response = get("/api/model-performance").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cors(&response), Some("*"));
    let json: Value = response.json().await.unwrap();
    assert_eq!(json.as_array().unwrap().len(), 27);
}

#[tokio::test]
async fn test_filter_by_two_parameters() {
    let response = get("/api/model-performance?n_estimators=100&max_depth=3&unknown=x").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r["n_estimators"] == 100 && r["max_depth"] == 3));
}

#[tokio::test]
async fn test_filter_by_learning_rate() {
    let json: Value = get("/api/model-performance?learning_rate=0.05")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(json.as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_malformed_filter_is_bad_request() {
    let response = get("/api/model-performance?max_depth=deep").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(cors(&response), Some("*"));
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("max_depth"));
}

#[tokio::test]
async fn test_parameter_ranges() {
    let response = get("/api/parameter-ranges").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["n_estimators"], json!([50, 100, 200]));
    assert_eq!(json["learning_rates"], json!([0.01, 0.05, 0.1]));
    assert_eq!(json["max_depths"], json!([2, 3, 5]));
}

#[tokio::test]
async fn test_predict_rejects_get() {
    let response = get("/api/predict").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "Method not allowed");
}

#[tokio::test]
async fn test_predict_over_http() {
    let base = spawn(&ServerConfig::default()).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/predict"))
        .json(&json!({"age": 41, "bmi": 28.0, "children": 0, "sex": "male", "smoker": "yes"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cors(&response), Some("*"));
    let json: Value = response.json().await.unwrap();
    assert!(json["prediction"].is_f64());
}

#[tokio::test]
async fn test_predict_missing_age() {
    let base = spawn(&ServerConfig::default()).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/predict"))
        .json(&json!({"bmi": 28.0, "children": 0, "sex": "male", "smoker": "yes"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("age"));
}

#[tokio::test]
async fn test_oversized_hyperparameters_are_rejected() {
    let base = spawn(&ServerConfig::default()).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/predict"))
        .json(&json!({"n_estimators": 1_000_000_000_000_u64, "learning_rate": 0.1, "max_depth": 2}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("n_estimators"));

    let health = client.get(format!("{base}/api/health")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_body_over_limit_is_json_error() {
    let base = spawn(&ServerConfig::default()).await;
    let padding = " ".repeat(3 * 1024 * 1024);
    let response = reqwest::Client::new()
        .post(format!("{base}/api/predict"))
        .header(CONTENT_TYPE, "application/json")
        .body(format!("{{\"age\": 41{padding}}}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_unknown_path() {
    let response = get("/api/unknown").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "Not found: /api/unknown");
}

#[tokio::test]
async fn test_cors_can_be_disabled() {
    let base = spawn(&ServerConfig::default().without_cors()).await;
    let response = reqwest::get(format!("{base}/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cors(&response), None);
}
