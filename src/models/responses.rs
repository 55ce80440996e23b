use serde::{Deserialize, Serialize};

use crate::models::domain::{PreferenceAnalysis, ScoredCandidate};

/// One recommendation as returned to the client: the full catalog record
/// flattened with its match score and reasons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedRestaurant {
    pub name_en: String,
    pub name_zh: String,
    pub cuisine_en: String,
    pub cuisine_zh: String,
    pub district_en: String,
    pub district_zh: String,
    pub address_en: String,
    pub address_zh: String,
    pub price: String,
    pub phone: String,
    pub opening_hours_en: String,
    pub opening_hours_zh: String,
    pub description_en: String,
    pub description_zh: String,
    pub popular_dishes_en: String,
    pub popular_dishes_zh: String,
    pub rating_smile: String,
    pub rating_ok: String,
    pub rating_cry: String,
    pub url: String,
    pub match_score: i32,
    pub match_reasons: Vec<String>,
}

impl From<ScoredCandidate> for RecommendedRestaurant {
    fn from(candidate: ScoredCandidate) -> Self {
        let r = candidate.restaurant;
        let text = |v: Option<String>| v.unwrap_or_default();
        Self {
            name_en: text(r.name_en),
            name_zh: text(r.name_zh),
            cuisine_en: text(r.cuisine_en),
            cuisine_zh: text(r.cuisine_zh),
            district_en: text(r.district_en),
            district_zh: text(r.district_zh),
            address_en: text(r.address_en),
            address_zh: text(r.address_zh),
            price: text(r.price),
            phone: text(r.phone),
            opening_hours_en: text(r.opening_hours_en),
            opening_hours_zh: text(r.opening_hours_zh),
            description_en: text(r.description_en),
            description_zh: text(r.description_zh),
            popular_dishes_en: text(r.popular_dishes_en),
            popular_dishes_zh: text(r.popular_dishes_zh),
            rating_smile: r.rating_smile.unwrap_or_else(|| "0".to_string()),
            rating_ok: r.rating_ok.unwrap_or_else(|| "0".to_string()),
            rating_cry: r.rating_cry.unwrap_or_else(|| "0".to_string()),
            url: text(r.url),
            match_score: candidate.score,
            match_reasons: candidate.reasons,
        }
    }
}

/// Response for the recommend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub success: bool,
    pub recommendations: Vec<RecommendedRestaurant>,
    pub analysis: PreferenceAnalysis,
    pub total_matches: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ai_service: String,
    pub ai_status: String,
    pub restaurants_loaded: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Response for a catalog refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub restaurants_loaded: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
