//! HTTP middleware stack for the relay server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. CORS (origin allow-list from configuration)
//! 4. Origin guard (refuses disallowed origins, relay route only)
//! 5. Body limit (Discord attachment ceiling, relay route only)

pub mod cors;

pub use cors::{cors_layer, origin_guard_middleware};
