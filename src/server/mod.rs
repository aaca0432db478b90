//! HTTP front-end for the review pipeline.
//!
//! ## Endpoints
//!
//! - `GET /health` - liveness check
//! - `POST /predict` - sentiment and rating for `{"text": "..."}`
//!
//! Whether `/predict` validates the review first is decided by
//! [`ServerConfig::validate_input`].

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

/// Build the Axum router around a pre-built [`AppState`].
///
/// # Example
///
/// ```no_run
/// use film_review_sentiment::review::{ModelArtifacts, ReviewPipelineBuilder};
/// use film_review_sentiment::server::{build_app, AppState, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::default();
///     let pipeline = ReviewPipelineBuilder::distilbert(ModelArtifacts::default())
///         .build()
///         .await?;
///     let app = build_app(AppState::new(pipeline.into_dyn(), &config)?);
///     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
///     axum::serve(listener, app).await?;
///     Ok(())
/// }
/// ```
pub fn build_app(state: Arc<AppState>) -> Router {
    let predict = if state.validate_input {
        post(routes::predict)
    } else {
        post(routes::predict_unvalidated)
    };

    let cors = CorsLayer::new()
        .allow_origin(state.allowed_origins.clone())
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    Router::new()
        .route("/health", get(routes::health))
        .route("/predict", predict)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
