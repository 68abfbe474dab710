//! CORS policy for browser callers of the relay endpoint.
//!
//! [`cors_layer`] only decides which response headers a browser sees. A
//! multipart POST needs no preflight, so [`origin_guard_middleware`] refuses
//! requests from disallowed origins before they reach a handler. Requests
//! without an `Origin` header (curl, server-side callers) pass through.

use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;
use crate::error::AppError;

/// Build the CORS layer for `config`.
///
/// Disallowed origins get no CORS headers and are logged at debug level.
#[must_use]
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allow_origin = match config {
        CorsConfig::Any => AllowOrigin::any(),
        CorsConfig::List(_) => {
            let config = config.clone();
            AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
                let allowed = origin.to_str().is_ok_and(|origin| config.allows(origin));
                if !allowed {
                    tracing::debug!(origin = ?origin, "CORS origin rejected");
                }
                allowed
            })
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Reject requests whose `Origin` is not on the allow-list.
///
/// # Errors
///
/// Returns [`AppError::Forbidden`] for a disallowed or unreadable origin.
pub async fn origin_guard_middleware(
    State(config): State<CorsConfig>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        let allowed = origin.to_str().is_ok_and(|origin| config.allows(origin));
        if !allowed {
            tracing::warn!(origin = ?origin, path = %request.uri().path(), "Request from disallowed origin refused");
            return Err(AppError::Forbidden("Origin not allowed".to_string()));
        }
    }

    Ok(next.run(request).await)
}
