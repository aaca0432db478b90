//! In-process tests for the HTTP server.
//!
//! The router is driven through tower's `oneshot` with a stub model, so no weights or TCP
//! listener are needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use candle_core::{Device, Tensor};
use tower::ServiceExt; // for oneshot()

use film_review_sentiment::error::{PipelineError, Result};
use film_review_sentiment::loaders::load_tokenizer;
use film_review_sentiment::review::{
    EncodedInput, HeadOutputs, Prediction, ReviewModel, ReviewPipeline, Sentiment,
    MAX_SEQUENCE_LENGTH,
};
use film_review_sentiment::server::models::{ErrorResponse, HealthResponse};
use film_review_sentiment::server::{build_app, AppState, ServerConfig};

const VOCAB: &str = "[PAD]\n[UNK]\n[CLS]\n[SEP]\n[MASK]\nthe\nmovie\nwas\ngreat\nbad\n";

const VALID_REVIEW: &str =
    "This is an amazing movie, I really enjoyed it! It had great performances and a compelling storyline.";

/// Positive logits and a fixed rating, or an error when `fail` is set.
struct StubModel {
    fail: bool,
    calls: Arc<AtomicUsize>,
    device: Device,
}

impl ReviewModel for StubModel {
    fn forward(&self, _input: &EncodedInput) -> Result<HeadOutputs> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PipelineError::Unexpected("stub model failure".into()));
        }
        Ok(HeadOutputs {
            sentiment_logits: Tensor::new(&[[0.0f32, 2.0]], &Device::Cpu)?,
            rating: Tensor::new(&[[7.5f32]], &Device::Cpu)?,
        })
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

struct TestApp {
    app: Router,
    calls: Arc<AtomicUsize>,
}

fn test_app(fail: bool, validate_input: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("vocab.txt"), VOCAB).unwrap();
    let tokenizer = load_tokenizer(dir.path()).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let model = StubModel {
        fail,
        calls: Arc::clone(&calls),
        device: Device::Cpu,
    };
    let pipeline = ReviewPipeline::new(model, tokenizer, MAX_SEQUENCE_LENGTH)
        .unwrap()
        .into_dyn();

    let config = ServerConfig {
        validate_input,
        ..ServerConfig::default()
    };
    let app = build_app(AppState::new(pipeline, &config).unwrap());
    TestApp { app, calls }
}

fn predict_request(text: &str) -> Request<Body> {
    let body = serde_json::json!({ "text": text }).to_string();
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn expect_rejection(text: &str, detail: &str) {
    let TestApp { app, calls } = test_app(false, true);
    let response = app.oneshot(predict_request(text)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error.detail, detail);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "model must not run");
}

#[tokio::test]
async fn health_endpoint_returns_healthy() {
    let TestApp { app, .. } = test_app(false, true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(body, br#"{"status":"healthy"}"#);
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn predict_valid_review() {
    let TestApp { app, calls } = test_app(false, true);
    let response = app.oneshot(predict_request(VALID_REVIEW)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    let prediction: Prediction = serde_json::from_slice(&body).unwrap();
    assert_eq!(prediction.sentiment, Sentiment::Positive);
    assert!(prediction.confidence > 0.5 && prediction.confidence <= 1.0);
    assert_eq!(prediction.rating, 7.5);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(raw["sentiment"], "Positive");
}

#[tokio::test]
async fn short_review_is_rejected() {
    expect_rejection("Bad movie", "The review must contain at least 10 words.").await;
}

#[tokio::test]
async fn long_review_is_rejected() {
    let text = vec!["Word"; 300].join(" ");
    expect_rejection(&text, "The review must contain no more than 256 words.").await;
}

#[tokio::test]
async fn blank_review_is_rejected() {
    expect_rejection("     ", "The review cannot be empty.").await;
}

#[tokio::test]
async fn review_without_letters_is_rejected() {
    expect_rejection(
        "123 456 789 !!! ??? 10 11 12 13 14 15",
        "The review must contain at least one letter.",
    )
    .await;
}

#[tokio::test]
async fn overlong_word_is_rejected() {
    let text = format!("This film has one {} word in its review text", "a".repeat(40));
    expect_rejection(
        &text,
        "Each word in the review must not exceed 30 characters.",
    )
    .await;
}

#[tokio::test]
async fn inference_failure_is_500_without_prediction() {
    let TestApp { app, calls } = test_app(true, true);
    let response = app.oneshot(predict_request(VALID_REVIEW)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let raw: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(raw, serde_json::json!({ "detail": "Internal server error" }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unvalidated_front_end_scores_any_text() {
    let TestApp { app, calls } = test_app(false, false);
    let response = app.oneshot(predict_request("Bad movie")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prediction: Prediction =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(prediction.sentiment, Sentiment::Positive);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

fn raw_predict_request(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn expect_json_detail(body: &'static str, status: StatusCode) {
    for validate_input in [true, false] {
        let TestApp { app, calls } = test_app(false, validate_input);
        let response = app.oneshot(raw_predict_request(body)).await.unwrap();

        assert_eq!(response.status(), status, "body {body:?}");
        let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(!error.detail.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn malformed_json_gets_json_detail() {
    expect_json_detail("{\"text\": ", StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn missing_text_field_gets_json_detail() {
    expect_json_detail("{\"review\": \"a fine film\"}", StatusCode::UNPROCESSABLE_ENTITY).await;
}

#[tokio::test]
async fn non_string_text_gets_json_detail() {
    expect_json_detail("{\"text\": 42}", StatusCode::UNPROCESSABLE_ENTITY).await;
}

#[tokio::test]
async fn cors_allows_the_frontend_origin() {
    let TestApp { app, .. } = test_app(false, true);
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/predict")
                .header(header::ORIGIN, "http://localhost:80")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:80"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn cors_ignores_unknown_origins() {
    let TestApp { app, .. } = test_app(false, true);
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/predict")
                .header(header::ORIGIN, "http://evil.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
