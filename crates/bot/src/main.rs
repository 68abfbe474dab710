//! Nonogram Relay bot.
//!
//! One process runs two surfaces:
//! - the Discord gateway worker reviewing submissions in the target channel
//! - the relay HTTP server (`POST /send-message`) on port 3001
//!
//! # Architecture
//!
//! - Serenity gateway session feeding a single review worker
//! - Discord REST v10 via reqwest for every outbound call
//! - Axum for the relay endpoint
//! - `PostgreSQL` for pending and approved Nonograms

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::Router;
use nonogram_relay_bot::config::{BotConfig, ConfigError};
use nonogram_relay_bot::db::{self, PgNonogramRepository};
use nonogram_relay_bot::discord::{ChatPlatform, DiscordClient, DiscordError, Gateway};
use nonogram_relay_bot::routes;
use nonogram_relay_bot::services::{ReviewWorkflow, relay, run_event_loop};
use nonogram_relay_bot::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tokio::sync::mpsc;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Failures that stop the process before it starts serving.
#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Discord error: {0}")]
    Discord(#[from] DiscordError),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &BotConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(json_logs: bool) {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nonogram_relay_bot=info,tower_http=debug".into());

    let json_layer =
        json_logs.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

// Tracing is not set up until configuration has loaded
#[allow(clippy::print_stderr)]
fn main() -> std::process::ExitCode {
    // Load configuration from environment (needed for Sentry init)
    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber and runtime)
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.json_logs);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Nonogram relay bot failed");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(config: BotConfig) -> Result<(), StartupError> {
    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p nonogram-relay-cli -- migrate
    let repository = Arc::new(PgNonogramRepository::new(pool));

    let chat: Arc<dyn ChatPlatform> =
        Arc::new(DiscordClient::new(&config.discord.bot_token));
    let me = chat.current_user().await?;
    tracing::info!(user = %me.tag(), "Authenticated with Discord");

    let channel_id = config.discord.channel_id.clone();
    let delivery = relay::from_config(&config.delivery, Arc::clone(&chat), channel_id.clone());
    tracing::info!(delivery = delivery.name(), channel = %channel_id, "Relay delivery configured");

    // Gateway events are handled one at a time by a single worker
    let workflow = Arc::new(ReviewWorkflow::new(
        Arc::clone(&chat),
        repository.clone(),
        channel_id,
        me.id,
    ));
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(run_event_loop(workflow, events_rx));
    let mut gateway = Gateway::start(&config.discord.bot_token, events_tx).await?;

    let state = AppState::new(repository, delivery);
    let app = with_observability(routes::router(state, &config.cors));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("relay listening on http://{}", addr);

    let server = async {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };

    // A dead gateway means no reviews, so it takes the relay down with it
    let stopped = tokio::select! {
        served = server => Stopped::Server(served),
        error = gateway.stopped() => Stopped::Gateway(error),
    };

    // Closing the gateway drops the last event sender, which stops the worker
    let result = match stopped {
        Stopped::Server(served) => {
            gateway.shutdown().await;
            served.map_err(StartupError::from)
        }
        Stopped::Gateway(error) => {
            tracing::error!(error = %error, "Discord gateway stopped, shutting down");
            Err(StartupError::Discord(error))
        }
    };

    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Review worker panicked");
    }

    result
}

/// Which half of the process finished first.
enum Stopped {
    Server(std::io::Result<()>),
    Gateway(DiscordError),
}

/// Request tracing and Sentry layers around the application router.
fn with_observability(app: Router) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(
            |response: &axum::http::Response<_>, latency: std::time::Duration, span: &Span| {
                span.record("status", response.status().as_u16());
                span.record(
                    "latency_ms",
                    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                );
                DefaultOnResponse::default().on_response(response, latency, span);
            },
        );

    app.layer(trace)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
