//! Query API - read-only views over the aggregator

use crate::aggregator_core::{SlidingWindowAggregator, Summary};
use axum::{extract::Extension, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub const ROOT_MESSAGE: &str = "Sliding Window API is running. Use /processed to get data.";

pub fn router(aggregator: Arc<SlidingWindowAggregator>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/processed", get(processed))
        .layer(Extension(aggregator))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn root() -> Json<Value> {
    Json(json!({ "message": ROOT_MESSAGE }))
}

async fn processed(Extension(aggregator): Extension<Arc<SlidingWindowAggregator>>) -> Json<Summary> {
    Json(aggregator.snapshot())
}
