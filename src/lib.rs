//! AIEat Engine - restaurant recommendation service for Hong Kong diners
//!
//! This library turns a free-text dining preference into a ranked list of
//! restaurants. An LLM backend extracts structured preferences from the
//! text, a taxonomy expander widens cuisine terms into searchable keyword
//! families, and an additive scoring engine ranks the catalog against the
//! result.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{expand, score_restaurant, RankResult, Ranker};
pub use crate::models::{
    PreferenceAnalysis, RecommendQuery, RecommendRequest, RecommendResponse, Restaurant,
    ScoredCandidate,
};
