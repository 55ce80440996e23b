// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BudgetTier, ChatRole, ChatTurn, Language, PreferenceAnalysis, RecommendQuery, Restaurant,
    ScoredCandidate, ANY,
};
pub use requests::RecommendRequest;
pub use responses::{
    ErrorResponse, HealthResponse, RecommendResponse, RecommendedRestaurant, RefreshResponse,
};
