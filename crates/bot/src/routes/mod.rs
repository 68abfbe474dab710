//! HTTP route handlers for the relay server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Banner
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store ping)
//! POST /send-message           - Relay a message (multipart)
//! ```

pub mod health;
pub mod relay;

use axum::{Router, middleware::from_fn_with_state, routing::get};

use crate::config::CorsConfig;
use crate::middleware::{cors_layer, origin_guard_middleware};
use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(relay::routes().route_layer(from_fn_with_state(
            cors.clone(),
            origin_guard_middleware,
        )))
        .layer(cors_layer(cors))
        .with_state(state)
}
