#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for environmental anomaly analysis.
//!
//! Exposes `GET /api/v1/health` and `POST /api/v1/analyze`. Each analysis
//! is delegated to [`eo_anomaly::analyze`] against a shared Earth
//! Observation Service client.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use eo_anomaly::AnalysisSettings;
use eo_anomaly_eos::{EarthObservationService, EosConfig, HttpEos};
use eo_anomaly_server_models::ApiError;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

/// Shared application state.
pub struct AppState {
    /// Earth Observation Service client shared by all requests.
    pub eos: Arc<dyn EarthObservationService>,
    /// Analysis tunables.
    pub settings: AnalysisSettings,
}

/// Reads `BIND_ADDR` and `PORT`, defaulting to `127.0.0.1:8000`.
#[must_use]
pub fn bind_from_env() -> (String, u16) {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    (bind_addr, port)
}

/// Registers the API routes. Malformed JSON bodies are answered with a
/// 400 and an `{"error": ...}` body.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid request body: {err}");
        log::warn!("{message}");
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(ApiError::new(message)))
            .into()
    });

    cfg.service(
        web::scope("/api/v1")
            .app_data(json)
            .route("/health", web::get().to(handlers::health))
            .route("/analyze", web::post().to(handlers::analyze)),
    );
}

/// Starts the analysis API server.
///
/// Builds the EOS client and analysis settings from the environment,
/// opens an EOS session (a failure is logged and retried per request),
/// and starts the Actix-Web HTTP server. The caller is responsible for
/// providing the async runtime (e.g. via `#[actix_web::main]`) and for
/// initializing logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the EOS client cannot be built,
/// or if the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(bind_addr: String, port: u16) -> std::io::Result<()> {
    let config = EosConfig::from_env();
    log::info!("Connecting to Earth Observation Service at {}...", config.base_url);
    let eos = HttpEos::new(config).map_err(std::io::Error::other)?;

    if let Err(e) = eos.reinitialize().await {
        log::warn!("Could not open EOS session at startup: {e}");
    }

    let settings = AnalysisSettings::from_env();
    log::info!(
        "Baseline from {}, timeout {}s, missing baseline policy '{}'",
        settings.baseline_start,
        settings.timeout.as_secs(),
        settings.missing_baseline
    );

    let state = web::Data::new(AppState {
        eos: Arc::new(eos),
        settings,
    });

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
