//! api-server — HTTP API for the car catalog.
//!
//! Serves CRUD endpoints under `/v1/cars` and supports:
//! - Storage: SQLite file (default) or in-memory when `STORAGE_PROVIDER=memory`.
//! - Seeding: three default cars are inserted on startup if the store is empty.
//! - CORS: Configurable via CORS_ALLOW_ORIGIN (origin string).
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # throwaway store, JSON logs
//! STORAGE_PROVIDER=memory LOG_FORMAT=json cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod cars;
mod config;
mod repo;

use std::net::SocketAddr;

use axum::http::HeaderValue;
use axum::Router;
use domain::seed::SeedOutcome;
use domain::service::CarService;
use domain::SystemClock;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cars::AppState;
use crate::repo::AnyRepo;

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_ephemeral();

    let repo = build_repo(&cfg);
    info!(backend = repo.backend(), "storage ready");
    let service = CarService::new(repo, SystemClock);

    info!("initializing database");
    match service.seed_if_empty() {
        Ok(SeedOutcome::Seeded(rows)) => info!(rows, "database initialized"),
        Ok(SeedOutcome::AlreadySeeded) => info!("database already initialized"),
        Err(e) => {
            error!(err = %e, "seeding failed");
            std::process::exit(1);
        }
    }

    let app = with_http_layers(cars::router(AppState::new(service)), &cfg);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "bind failed");
            std::process::exit(1);
        }
    };
    info!(%addr, "api-server listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct a repository instance based on config and feature flags.
fn build_repo(cfg: &config::Config) -> AnyRepo {
    match cfg.storage_provider {
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => match AnyRepo::sqlite(&cfg.db_path) {
            Ok(r) => r,
            Err(e) => {
                error!(path = %cfg.db_path.display(), err = %e, "failed to open sqlite store; falling back to memory");
                AnyRepo::memory()
            }
        },
        #[cfg(not(feature = "sqlite"))]
        config::StorageProvider::Sqlite => {
            error!("built without the `sqlite` feature; falling back to memory");
            AnyRepo::memory()
        }
        config::StorageProvider::Memory => AnyRepo::memory(),
    }
}

/// Request ids, tracing spans and CORS around the route table.
fn with_http_layers(app: Router, cfg: &config::Config) -> Router {
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let app = app
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
            .expose_headers([axum::http::header::LOCATION])
    };
    app.layer(cors)
}
