use serde::{Deserialize, Serialize};

/// Sentinel used by the UI filters when the user does not care.
pub const ANY: &str = "Any";

/// The six ordered budget tiers used by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BudgetTier {
    Below50,
    From51To100,
    From101To200,
    From201To400,
    From401To800,
    Above800,
}

impl BudgetTier {
    /// Parse a tier label as stored in the catalog. Unknown labels map to
    /// `None`; scoring treats those as rank-less rather than failing.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Below $50" => Some(Self::Below50),
            "$51-100" => Some(Self::From51To100),
            "$101-200" => Some(Self::From101To200),
            "$201-400" => Some(Self::From201To400),
            "$401-800" => Some(Self::From401To800),
            "Above $800" => Some(Self::Above800),
            _ => None,
        }
    }

    /// Ordinal rank 1..=6, cheapest first.
    pub fn rank(self) -> u8 {
        match self {
            Self::Below50 => 1,
            Self::From51To100 => 2,
            Self::From101To200 => 3,
            Self::From201To400 => 4,
            Self::From401To800 => 5,
            Self::Above800 => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Below50 => "Below $50",
            Self::From51To100 => "$51-100",
            Self::From101To200 => "$101-200",
            Self::From201To400 => "$201-400",
            Self::From401To800 => "$401-800",
            Self::Above800 => "Above $800",
        }
    }
}

/// Supported UI languages. Reasons and the interpreter prompt follow this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Zh,
}

/// A restaurant record as stored in the catalog. All text columns are
/// nullable in the legacy schema, and the rating counts are TEXT.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Restaurant {
    #[serde(default)]
    pub id: i64,
    pub name_en: Option<String>,
    pub name_zh: Option<String>,
    pub address_en: Option<String>,
    pub address_zh: Option<String>,
    pub district_en: Option<String>,
    pub district_zh: Option<String>,
    pub cuisine_en: Option<String>,
    pub cuisine_zh: Option<String>,
    pub price: Option<String>,
    pub phone: Option<String>,
    pub opening_hours_en: Option<String>,
    pub opening_hours_zh: Option<String>,
    pub rating_smile: Option<String>,
    pub rating_ok: Option<String>,
    pub rating_cry: Option<String>,
    pub description_en: Option<String>,
    pub description_zh: Option<String>,
    pub popular_dishes_en: Option<String>,
    pub popular_dishes_zh: Option<String>,
    pub url: Option<String>,
}

impl Restaurant {
    pub fn name_en(&self) -> &str {
        self.name_en.as_deref().unwrap_or("")
    }

    pub fn name_zh(&self) -> &str {
        self.name_zh.as_deref().unwrap_or("")
    }

    pub fn district_en(&self) -> &str {
        self.district_en.as_deref().unwrap_or("")
    }

    pub fn district_zh(&self) -> &str {
        self.district_zh.as_deref().unwrap_or("")
    }

    pub fn cuisine_en(&self) -> &str {
        self.cuisine_en.as_deref().unwrap_or("")
    }

    pub fn cuisine_zh(&self) -> &str {
        self.cuisine_zh.as_deref().unwrap_or("")
    }

    pub fn price(&self) -> &str {
        self.price.as_deref().unwrap_or("")
    }

    pub fn description_en(&self) -> &str {
        self.description_en.as_deref().unwrap_or("")
    }

    pub fn description_zh(&self) -> &str {
        self.description_zh.as_deref().unwrap_or("")
    }

    pub fn popular_dishes_en(&self) -> &str {
        self.popular_dishes_en.as_deref().unwrap_or("")
    }

    pub fn popular_dishes_zh(&self) -> &str {
        self.popular_dishes_zh.as_deref().unwrap_or("")
    }

    /// Parsed reaction counts (positive, neutral, negative). The legacy
    /// store keeps these as TEXT; anything unparsable counts as zero.
    pub fn rating_counts(&self) -> (u32, u32, u32) {
        let parse = |v: &Option<String>| {
            v.as_deref()
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(0)
        };
        (
            parse(&self.rating_smile),
            parse(&self.rating_ok),
            parse(&self.rating_cry),
        )
    }

    /// Records without a name or cuisine are never scored and never
    /// counted in totals.
    pub fn is_eligible(&self) -> bool {
        !self.name_en().is_empty() && !self.cuisine_en().is_empty()
    }
}

/// One prior conversation turn, supplied by the client with each request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub message: String,
    /// Analysis attached to assistant turns so cuisine continuation can be
    /// decided by the interpreter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<PreferenceAnalysis>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Structured interpretation of the user's free-text preferences, produced
/// by the LLM backend. Every field defaults so partially valid JSON from
/// the model still parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceAnalysis {
    #[serde(default)]
    pub cuisine_types: Vec<String>,
    #[serde(default)]
    pub atmosphere: String,
    #[serde(default)]
    pub key_requirements: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub extracted_budget: Option<String>,
    #[serde(default)]
    pub extracted_district: Option<String>,
    #[serde(default)]
    pub ai_message: String,
}

impl PreferenceAnalysis {
    /// The canonical empty analysis used whenever the interpreter is
    /// absent, slow, or returns something unusable.
    pub fn fallback() -> Self {
        Self {
            atmosphere: "casual".to_string(),
            ..Self::default()
        }
    }
}

/// Values the interpreter emits for "nothing extracted".
fn is_null_like(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("null") || v == "None"
}

/// The effective query fed to the scoring engine: user filters after any
/// interpreter-extracted overrides have been applied.
#[derive(Debug, Clone)]
pub struct RecommendQuery {
    pub preferences: String,
    pub budget: String,
    pub district: String,
    pub language: Language,
    pub history: Vec<ChatTurn>,
}

impl RecommendQuery {
    /// Replace the budget/district filters with values the interpreter
    /// pulled out of the free text. Applied exactly once, before scoring.
    pub fn apply_overrides(&mut self, analysis: &PreferenceAnalysis) {
        if let Some(budget) = analysis.extracted_budget.as_deref() {
            if !is_null_like(budget) {
                tracing::debug!("Budget extracted from message: {}", budget);
                self.budget = budget.to_string();
            }
        }
        if let Some(district) = analysis.extracted_district.as_deref() {
            if !is_null_like(district) {
                tracing::debug!("District extracted from message: {}", district);
                self.district = district.to_string();
            }
        }
    }
}

/// A restaurant that passed the score threshold, with the factor reasons
/// in evaluation order.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub restaurant: Restaurant,
    pub score: i32,
    pub reasons: Vec<String>,
}
