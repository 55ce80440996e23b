//! Match scoring: one restaurant against one analysis and one effective
//! query.
//!
//! The score is the sum of six independent factors evaluated in a fixed
//! order: budget, district, cuisine, dietary restrictions, ratings,
//! atmosphere. Each factor may also append localized human-readable
//! reasons. The whole engine is a pure function over its inputs; no I/O,
//! no shared state.

use crate::core::taxonomy::{char_len, expand};
use crate::models::{BudgetTier, Language, PreferenceAnalysis, RecommendQuery, Restaurant, ANY};

/// Tokens that denote a dining style rather than a cuisine.
const STYLE_TOKENS: &[&str] = &["fine dining", "fine-dining", "fine_dining", "upscale", "high-end"];

/// Cuisines typically associated with fine dining.
const UPSCALE_CUISINES: &[&str] = &[
    "french",
    "italian",
    "japanese",
    "european",
    "contemporary",
    "modern",
    "fusion",
    "international",
    "steakhouse",
    "seafood",
];

/// Price tiers appropriate for a fine-dining match. The `$101-200` mid
/// tier gets a partial match instead; this asymmetry is intentional and
/// must not be folded into the general cuisine path.
const UPSCALE_PRICE_TIERS: &[&str] = &["$201-400", "$401-800", "Above $800"];

/// Score one restaurant against the analysis and effective query.
///
/// Returns the total score (may be negative) and the reasons in factor
/// evaluation order.
pub fn score_restaurant(
    restaurant: &Restaurant,
    analysis: &PreferenceAnalysis,
    query: &RecommendQuery,
) -> (i32, Vec<String>) {
    let mut reasons = Vec::new();
    let lang = query.language;

    let mut score = budget_factor(restaurant, query, lang, &mut reasons);
    score += district_factor(restaurant, query, lang, &mut reasons);
    score += cuisine_factor(restaurant, analysis, lang, &mut reasons);
    score += dietary_factor(restaurant, analysis, lang, &mut reasons);
    score += rating_factor(restaurant, lang, &mut reasons);
    score += atmosphere_factor(restaurant, analysis, lang, &mut reasons);

    (score, reasons)
}

/// Budget factor: +5 for "Any", +40 exact tier, +15 adjacent tier, -15
/// further apart. Unrecognized tiers on either side contribute nothing.
fn budget_factor(
    restaurant: &Restaurant,
    query: &RecommendQuery,
    lang: Language,
    reasons: &mut Vec<String>,
) -> i32 {
    let user_budget = query.budget.as_str();
    let rest_budget = restaurant.price();

    if user_budget == ANY {
        return 5;
    }

    if user_budget == rest_budget {
        reasons.push(match lang {
            Language::Zh => format!("預算完美配對 ({user_budget})"),
            Language::En => format!("Perfect budget match ({user_budget})"),
        });
        return 40;
    }

    if let (Some(user), Some(rest)) = (BudgetTier::parse(user_budget), BudgetTier::parse(rest_budget))
    {
        let diff = (user.rank() as i32 - rest.rank() as i32).abs();
        if diff == 1 {
            reasons.push(match lang {
                Language::Zh => "預算接近".to_string(),
                Language::En => "Close budget match".to_string(),
            });
            return 15;
        }
        return -15;
    }

    0
}

/// District factor: +40 when the English district matches
/// case-insensitively or the Chinese district matches exactly; -20 when a
/// district was requested but neither matches. Skipped for empty/"Any".
fn district_factor(
    restaurant: &Restaurant,
    query: &RecommendQuery,
    lang: Language,
    reasons: &mut Vec<String>,
) -> i32 {
    let wanted = query.district.as_str();
    if wanted.is_empty() || wanted == ANY {
        return 0;
    }

    let en_match = restaurant.district_en().to_lowercase() == wanted.to_lowercase();
    let zh_match = restaurant.district_zh() == wanted;

    if en_match || zh_match {
        let name = match lang {
            Language::Zh => restaurant.district_zh(),
            Language::En => restaurant.district_en(),
        };
        let name = if name.is_empty() { wanted } else { name };
        reasons.push(match lang {
            Language::Zh => format!("位於{name}"),
            Language::En => format!("Located in {name}"),
        });
        40
    } else {
        -20
    }
}

/// Cuisine factor. Tokens are tried in order; the first match wins and
/// stops the whole factor. Style tokens ("fine dining" and friends) are
/// matched against upscale cuisines plus price tier instead of the
/// taxonomy. A complete miss costs -20, softened to -10 when the query
/// carried a style token.
fn cuisine_factor(
    restaurant: &Restaurant,
    analysis: &PreferenceAnalysis,
    lang: Language,
    reasons: &mut Vec<String>,
) -> i32 {
    if analysis.cuisine_types.is_empty() {
        return 0;
    }

    let cuisine_en = restaurant.cuisine_en().to_lowercase();
    let cuisine_zh = restaurant.cuisine_zh().to_lowercase();
    let name_en = restaurant.name_en().to_lowercase();
    let name_zh = restaurant.name_zh().to_lowercase();
    let desc_en = restaurant.description_en().to_lowercase();
    let desc_zh = restaurant.description_zh().to_lowercase();
    let rest_price = restaurant.price();

    let mut total = 0;
    let mut matched = false;
    let mut style_query = false;

    'cuisines: for cuisine in &analysis.cuisine_types {
        let token = cuisine.trim().to_lowercase();

        if STYLE_TOKENS.contains(&token.as_str()) {
            style_query = true;
            if UPSCALE_CUISINES.iter().any(|c| cuisine_en.contains(c)) {
                if UPSCALE_PRICE_TIERS.contains(&rest_price) {
                    total += 40;
                    reasons.push(match lang {
                        Language::Zh => "符合fine dining菜系".to_string(),
                        Language::En => "Matches fine dining cuisine".to_string(),
                    });
                    matched = true;
                    break 'cuisines;
                } else if rest_price == "$101-200" {
                    // Mid tier: partial match, no reason appended.
                    total += 20;
                    matched = true;
                    break 'cuisines;
                }
            }
            continue;
        }

        for term in &expand(&token) {
            let mut match_score = 0;

            // The chain is exclusive on containment: a term found in the
            // cuisine field that fails its length rule does not fall
            // through to name or description.
            if cuisine_en.contains(term.as_str()) || cuisine_zh.contains(term.as_str()) {
                if char_len(term) >= 4 || *term == cuisine_en || *term == cuisine_zh {
                    match_score = 40;
                }
            } else if name_en.contains(term.as_str()) || name_zh.contains(term.as_str()) {
                if char_len(term) >= 3 {
                    match_score = 35;
                }
            } else if desc_en.contains(term.as_str()) || desc_zh.contains(term.as_str()) {
                if char_len(term) >= 4 {
                    match_score = 30;
                }
            }

            if match_score > 0 {
                total += match_score;
                reasons.push(match lang {
                    Language::Zh => format!("符合{cuisine}菜系"),
                    Language::En => format!("Matches {cuisine} cuisine"),
                });
                matched = true;
                break 'cuisines;
            }
        }
    }

    if !matched {
        total += if style_query { -10 } else { -20 };
    }

    total
}

/// Dietary restrictions: -50 per restriction token whose expanded keywords
/// hit the record's cuisine, name, description, or dishes in either
/// language. One penalty per restriction, not per keyword.
fn dietary_factor(
    restaurant: &Restaurant,
    analysis: &PreferenceAnalysis,
    lang: Language,
    reasons: &mut Vec<String>,
) -> i32 {
    if analysis.dietary_restrictions.is_empty() {
        return 0;
    }

    let haystacks = [
        restaurant.cuisine_en().to_lowercase(),
        restaurant.cuisine_zh().to_lowercase(),
        restaurant.name_en().to_lowercase(),
        restaurant.name_zh().to_lowercase(),
        restaurant.description_en().to_lowercase(),
        restaurant.description_zh().to_lowercase(),
        restaurant.popular_dishes_en().to_lowercase(),
        restaurant.popular_dishes_zh().to_lowercase(),
    ];

    let mut total = 0;

    for restriction in &analysis.dietary_restrictions {
        // expand() already filters below three characters
        for keyword in &expand(restriction) {
            if haystacks.iter().any(|h| h.contains(keyword.as_str())) {
                total -= 50;
                reasons.push(match lang {
                    Language::Zh => format!("⚠️ 包含不想要的：{restriction}"),
                    Language::En => format!("⚠️ Contains unwanted: {restriction}"),
                });
                break;
            }
        }
    }

    total
}

/// Rating factor. Two bands with literal breakpoints: 20+ ratings get the
/// full rewards and reasons, 10-19 get reduced silent ones, fewer than 10
/// contribute nothing.
fn rating_factor(restaurant: &Restaurant, lang: Language, reasons: &mut Vec<String>) -> i32 {
    let (smile, ok, cry) = restaurant.rating_counts();
    let total = smile + ok + cry;

    if total >= 20 {
        let ratio = smile as f64 / total as f64;
        if ratio >= 0.75 {
            reasons.push(match lang {
                Language::Zh => "顧客評價極高".to_string(),
                Language::En => "Highly rated by customers".to_string(),
            });
            20
        } else if ratio >= 0.6 {
            reasons.push(match lang {
                Language::Zh => "顧客評價良好".to_string(),
                Language::En => "Well rated by customers".to_string(),
            });
            12
        } else if ratio >= 0.5 {
            5
        } else if ratio < 0.4 {
            -10
        } else {
            0
        }
    } else if total >= 10 {
        let ratio = smile as f64 / total as f64;
        if ratio >= 0.75 {
            10
        } else if ratio >= 0.6 {
            5
        } else if ratio < 0.4 {
            -5
        } else {
            0
        }
    } else {
        0
    }
}

/// Atmosphere bonus: +10 when the requested atmosphere appears in the
/// English description.
fn atmosphere_factor(
    restaurant: &Restaurant,
    analysis: &PreferenceAnalysis,
    lang: Language,
    reasons: &mut Vec<String>,
) -> i32 {
    if analysis.atmosphere.is_empty() || restaurant.description_en().is_empty() {
        return 0;
    }

    let atmosphere = analysis.atmosphere.to_lowercase();
    if restaurant.description_en().to_lowercase().contains(&atmosphere) {
        reasons.push(match lang {
            Language::Zh => format!("符合{atmosphere}氛圍"),
            Language::En => format!("Matches {atmosphere} atmosphere"),
        });
        10
    } else {
        0
    }
}
