//! Ranking: eligibility filter, scoring pass, threshold, stable ordering.

use std::cmp::Reverse;

use crate::core::scoring::score_restaurant;
use crate::models::{PreferenceAnalysis, RecommendQuery, Restaurant, ScoredCandidate};

/// Default minimum score a candidate needs to appear in results: at least
/// one full match criterion.
pub const DEFAULT_SCORE_THRESHOLD: i32 = 30;

/// Default number of recommendations returned.
pub const DEFAULT_TOP_N: usize = 10;

/// Result of a ranking pass
#[derive(Debug)]
pub struct RankResult {
    pub candidates: Vec<ScoredCandidate>,
    /// Candidates past the threshold, counted before truncation.
    pub total_matches: usize,
}

/// Ranking orchestrator over a catalog snapshot.
///
/// Scoring is a pure map over the catalog in insertion order. The sort is
/// stable by construction: candidates with equal scores keep their
/// relative catalog order. That ordering is part of the contract, not an
/// implementation accident.
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    score_threshold: i32,
    top_n: usize,
}

impl Ranker {
    pub fn new(score_threshold: i32, top_n: usize) -> Self {
        Self {
            score_threshold,
            top_n,
        }
    }

    /// Rank the catalog against one analysis and effective query.
    ///
    /// Records with an empty name or cuisine are ineligible and excluded
    /// from scoring and from `total_matches`.
    pub fn rank(
        &self,
        catalog: &[Restaurant],
        analysis: &PreferenceAnalysis,
        query: &RecommendQuery,
    ) -> RankResult {
        let mut skipped = 0usize;

        let mut scored: Vec<ScoredCandidate> = catalog
            .iter()
            .filter(|r| {
                let eligible = r.is_eligible();
                if !eligible {
                    skipped += 1;
                }
                eligible
            })
            .filter_map(|restaurant| {
                let (score, reasons) = score_restaurant(restaurant, analysis, query);
                if score >= self.score_threshold {
                    Some(ScoredCandidate {
                        restaurant: restaurant.clone(),
                        score,
                        reasons,
                    })
                } else {
                    None
                }
            })
            .collect();

        if skipped > 0 {
            tracing::debug!("Skipped {} restaurants with missing data", skipped);
        }

        let total_matches = scored.len();

        // Vec::sort_by_key is stable; equal scores retain catalog order.
        scored.sort_by_key(|c| Reverse(c.score));
        scored.truncate(self.top_n);

        RankResult {
            candidates: scored,
            total_matches,
        }
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE_THRESHOLD, DEFAULT_TOP_N)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn restaurant(id: i64, name: &str, cuisine: &str, price: &str) -> Restaurant {
        Restaurant {
            id,
            name_en: Some(name.to_string()),
            cuisine_en: Some(cuisine.to_string()),
            price: Some(price.to_string()),
            ..Default::default()
        }
    }

    fn query(budget: &str, district: &str) -> RecommendQuery {
        RecommendQuery {
            preferences: String::new(),
            budget: budget.to_string(),
            district: district.to_string(),
            language: Language::En,
            history: vec![],
        }
    }

    #[test]
    fn test_threshold_boundary_at_30() {
        // Budget exact match alone contributes +40; an adjacent budget
        // with no other factor lands at 15 and must be excluded.
        let catalog = vec![
            restaurant(1, "Exact", "Cantonese", "$101-200"),
            restaurant(2, "Adjacent", "Cantonese", "$51-100"),
        ];

        let result = Ranker::default().rank(
            &catalog,
            &PreferenceAnalysis::default(),
            &query("$101-200", "Any"),
        );

        assert_eq!(result.total_matches, 1);
        assert_eq!(result.candidates[0].restaurant.name_en(), "Exact");
        assert_eq!(result.candidates[0].score, 40);
    }

    #[test]
    fn test_score_30_is_retained_29_is_not() {
        let catalog = vec![restaurant(1, "Borderline", "Cantonese", "$101-200")];
        let analysis = PreferenceAnalysis::default();
        let q = query("$101-200", "Any");

        let keep = Ranker::new(30, 10).rank(&catalog, &analysis, &q);
        assert_eq!(keep.total_matches, 1);

        let strict = Ranker::new(41, 10).rank(&catalog, &analysis, &q);
        assert_eq!(strict.total_matches, 0);
    }

    #[test]
    fn test_equal_scores_keep_catalog_order() {
        let catalog: Vec<Restaurant> = (1..=5)
            .map(|i| restaurant(i, &format!("Place {i}"), "Cantonese", "$101-200"))
            .collect();

        let result = Ranker::default().rank(
            &catalog,
            &PreferenceAnalysis::default(),
            &query("$101-200", "Any"),
        );

        let ids: Vec<i64> = result
            .candidates
            .iter()
            .map(|c| c.restaurant.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_ineligible_records_not_counted() {
        let mut nameless = restaurant(1, "", "Cantonese", "$101-200");
        nameless.name_en = None;
        let catalog = vec![
            nameless,
            restaurant(2, "No Cuisine", "", "$101-200"),
            restaurant(3, "Valid", "Cantonese", "$101-200"),
        ];

        let result = Ranker::default().rank(
            &catalog,
            &PreferenceAnalysis::default(),
            &query("$101-200", "Any"),
        );

        assert_eq!(result.total_matches, 1);
        assert_eq!(result.candidates[0].restaurant.id, 3);
    }

    #[test]
    fn test_truncation_does_not_affect_total() {
        let catalog: Vec<Restaurant> = (1..=25)
            .map(|i| restaurant(i, &format!("Place {i}"), "Cantonese", "$101-200"))
            .collect();

        let result = Ranker::new(30, 10).rank(
            &catalog,
            &PreferenceAnalysis::default(),
            &query("$101-200", "Any"),
        );

        assert_eq!(result.candidates.len(), 10);
        assert_eq!(result.total_matches, 25);
    }

    #[test]
    fn test_higher_scores_sort_first() {
        let mut rated = restaurant(1, "Rated", "Cantonese", "$101-200");
        rated.rating_smile = Some("18".to_string());
        rated.rating_ok = Some("1".to_string());
        rated.rating_cry = Some("1".to_string());

        let catalog = vec![restaurant(2, "Plain", "Cantonese", "$101-200"), rated];

        let result = Ranker::default().rank(
            &catalog,
            &PreferenceAnalysis::default(),
            &query("$101-200", "Any"),
        );

        assert_eq!(result.candidates[0].restaurant.name_en(), "Rated");
        assert!(result.candidates[0].score > result.candidates[1].score);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let catalog: Vec<Restaurant> = (1..=8)
            .map(|i| restaurant(i, &format!("Place {i}"), "Japanese", "$201-400"))
            .collect();
        let analysis = PreferenceAnalysis {
            cuisine_types: vec!["japanese".to_string()],
            ..Default::default()
        };
        let q = query("$201-400", "Any");

        let ranker = Ranker::default();
        let first = ranker.rank(&catalog, &analysis, &q);
        let second = ranker.rank(&catalog, &analysis, &q);

        let first_json = serde_json::to_string(&first.candidates).unwrap();
        let second_json = serde_json::to_string(&second.candidates).unwrap();
        assert_eq!(first_json, second_json);
        assert_eq!(first.total_matches, second.total_matches);
    }
}
