use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::Ranker;
use crate::models::{
    ErrorResponse, HealthResponse, RecommendRequest, RecommendResponse, RecommendedRestaurant,
    RefreshResponse,
};
use crate::services::{CatalogCache, PreferenceAnalyzer, SearchLogger, SearchRecord};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogCache>,
    pub analyzer: Arc<PreferenceAnalyzer>,
    pub logger: SearchLogger,
    pub ranker: Ranker,
}

/// Configure all recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/recommend", web::post().to(recommend))
        .route("/catalog/refresh", web::post().to(refresh_catalog));
}

/// Health check endpoint, mounted both at /health and /api/v1/health.
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let ai_status = state.analyzer.backend_status().await;
    let restaurants_loaded = state.catalog.snapshot().await.len();

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ai_service: state.analyzer.backend_name().to_string(),
        ai_status,
        restaurants_loaded,
        timestamp: chrono::Utc::now(),
    })
}

/// Recommendation endpoint
///
/// POST /api/v1/recommend
///
/// Request body:
/// ```json
/// {
///   "preferences": "string",
///   "budget": "$101-200",
///   "district": "Central",
///   "language": "en",
///   "conversationHistory": [{"role": "user", "content": "string"}],
///   "sessionId": "string"
/// }
/// ```
async fn recommend(
    state: web::Data<AppState>,
    req: web::Json<RecommendRequest>,
) -> impl Responder {
    // Validate request
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for recommend request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();
    let session_id = req
        .session_id
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "anonymous".to_string());
    let mut query = req.into_query();

    tracing::info!(
        "Recommend request: preferences='{}', budget='{}', district='{}'",
        query.preferences,
        query.budget,
        query.district
    );

    // One interpretation call; falls back internally so this never fails
    let analysis = state.analyzer.analyze(&query).await;
    query.apply_overrides(&analysis);

    let catalog = state.catalog.snapshot().await;
    let result = state.ranker.rank(&catalog, &analysis, &query);

    tracing::info!(
        "Returning {} recommendations ({} matched, {} in catalog)",
        result.candidates.len(),
        result.total_matches,
        catalog.len()
    );

    // Best-effort history write, off the request path
    let cuisine = if analysis.cuisine_types.is_empty() {
        None
    } else {
        Some(analysis.cuisine_types.join(", "))
    };
    state.logger.log_detached(SearchRecord {
        preferences: query.preferences.clone(),
        cuisine,
        district: query.district.clone(),
        budget: query.budget.clone(),
        results_count: result.candidates.len(),
        language: query.language,
        session_id,
    });

    HttpResponse::Ok().json(RecommendResponse {
        success: true,
        recommendations: result
            .candidates
            .into_iter()
            .map(RecommendedRestaurant::from)
            .collect(),
        analysis,
        total_matches: result.total_matches,
    })
}

/// Reload the catalog snapshot from the database
///
/// POST /api/v1/catalog/refresh
async fn refresh_catalog(state: web::Data<AppState>) -> impl Responder {
    match state.catalog.refresh().await {
        Ok(count) => {
            tracing::info!("Catalog refreshed: {} restaurants", count);
            HttpResponse::Ok().json(RefreshResponse {
                success: true,
                restaurants_loaded: count,
            })
        }
        Err(e) => {
            tracing::error!("Catalog refresh failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Catalog refresh failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
