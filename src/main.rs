mod config;
mod error;
mod models;
mod routes;
mod services;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::relay::RelayService;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub relay: RelayService,
    pub start_time: Instant,
}

/// Build the CORS layer from configuration instead of a hardcoded policy
fn build_cors_layer(allowed_origins: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.trim() == "*" {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .filter_map(|o| o.trim().parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}

/// Wrap the router in an IP-keyed rate limiter when enabled
fn add_rate_limiter(router: Router, config: &Config) -> Router {
    if !config.rate_limit_enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_millisecond(config.rate_limit_period_ms)
        .burst_size(config.rate_limit_burst)
        .finish();

    match governor_conf {
        Some(conf) => router.layer(GovernorLayer {
            config: Arc::new(conf),
        }),
        None => {
            tracing::error!("Failed to initialize rate limiter, continuing without it");
            router
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "streamrelay=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;
    let max_upload_bytes = config.max_upload_size_mb * 1024 * 1024;

    tracing::info!("Starting StreamRelay v{}", env!("CARGO_PKG_VERSION"));

    let relay = RelayService::new(&config);

    let cors = build_cors_layer(&config.allowed_origins);

    // Build application state
    let state = Arc::new(AppState {
        relay,
        start_time: Instant::now(),
        config,
    });

    // Build router
    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Playlist ingestion
        .route("/playlist/fetch", post(routes::playlist::fetch_playlist))
        .route("/playlist/upload", post(routes::playlist::upload_playlist))
        .route("/playlist/text", post(routes::playlist::text_playlist))
        // Relay
        .route("/relay/stream", get(routes::relay::relay_stream))
        .route("/download", get(routes::relay::download))
        .route("/epg/fetch", post(routes::relay::fetch_epg))
        .route("/stream/check", post(routes::relay::check_stream))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state.clone());

    let app = add_rate_limiter(app, &state.config);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
