use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{ChatTurn, Language, RecommendQuery};

/// Request for restaurant recommendations
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendRequest {
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub preferences: String,
    #[serde(default = "default_any")]
    pub budget: String,
    #[serde(default = "default_any")]
    pub district: String,
    #[serde(default, alias = "language")]
    pub lang: Language,
    #[serde(default, alias = "conversationHistory")]
    pub conversation_history: Vec<ChatTurn>,
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

fn default_any() -> String {
    "Any".to_string()
}

impl RecommendRequest {
    /// Lift the request into the query the scoring engine consumes.
    /// Overrides extracted by the interpreter are applied later.
    pub fn into_query(self) -> RecommendQuery {
        RecommendQuery {
            preferences: self.preferences,
            budget: self.budget,
            district: self.district,
            language: self.lang,
            history: self.conversation_history,
        }
    }
}
