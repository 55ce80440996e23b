mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use crate::config::Settings;
use crate::core::Ranker;
use crate::routes::recommend::AppState;
use crate::services::{
    backend_from_settings, CatalogCache, CatalogStore, PreferenceAnalyzer, SearchLogger,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap_or_default())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting AIEat recommendation engine...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Connect to SQLite and warm the catalog snapshot
    let db_max_conn = settings.database.max_connections.unwrap_or(5);
    let store = CatalogStore::connect(&settings.database.url, db_max_conn)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to open database {}: {}", settings.database.url, e);
            panic!("Database error: {}", e);
        });

    let logger = SearchLogger::new(store.pool().clone())
        .await
        .unwrap_or_else(|e| {
            error!("Failed to initialize search history: {}", e);
            panic!("Database error: {}", e);
        });

    let catalog = Arc::new(CatalogCache::new(store).await.unwrap_or_else(|e| {
        error!("Failed to load catalog: {}", e);
        panic!("Database error: {}", e);
    }));

    info!(
        "Catalog loaded: {} restaurants",
        catalog.snapshot().await.len()
    );

    // Initialize the preference analyzer with the configured LLM backend
    let backend = backend_from_settings(&settings.interpreter);
    let analyzer = Arc::new(PreferenceAnalyzer::with_cache(
        backend,
        Duration::from_secs(settings.interpreter.timeout_secs),
        settings.interpreter.cache_size,
        Duration::from_secs(settings.interpreter.cache_ttl_secs),
    ));

    info!(
        "Preference analyzer initialized (backend: {}, timeout: {}s)",
        analyzer.backend_name(),
        settings.interpreter.timeout_secs
    );

    let ranker = Ranker::new(settings.ranking.score_threshold, settings.ranking.top_n);

    // Build application state
    let app_state = AppState {
        catalog,
        analyzer,
        logger,
        ranker,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
