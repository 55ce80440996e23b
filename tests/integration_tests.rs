// Integration tests for the AIEat recommendation engine

use std::sync::Arc;
use std::time::Duration;

use aieat_engine::models::{Language, PreferenceAnalysis, RecommendRequest};
use aieat_engine::services::{
    CatalogCache, CatalogStore, DisabledBackend, InterpreterBackend, OllamaBackend,
    OpenRouterBackend, PreferenceAnalyzer,
};
use aieat_engine::Ranker;

async fn seeded_catalog() -> CatalogCache {
    let store = CatalogStore::connect("sqlite::memory:", 1).await.unwrap();

    let rows: &[(&str, &str, &str, &str, &str)] = &[
        ("Sakura House", "Japanese", "Central", "$201-400", "Elegant sushi and sashimi"),
        ("Golden Duck", "Cantonese", "Mong Kok", "$101-200", "Casual roast goose institution"),
        ("Taco Loco", "Mexican", "Wan Chai", "Below $50", "Street-style tacos"),
        ("Ocean Table", "Seafood", "Sai Kung", "$201-400", "Fresh crab and lobster"),
        ("Ramen Alley", "Japanese", "Causeway Bay", "$51-100", "Late-night tonkotsu ramen"),
    ];
    for (name, cuisine, district, price, desc) in rows {
        sqlx::query(
            "INSERT INTO restaurants (name_en, cuisine_en, district_en, price, description_en)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(cuisine)
        .bind(district)
        .bind(price)
        .bind(desc)
        .execute(store.pool())
        .await
        .unwrap();
    }

    CatalogCache::new(store).await.unwrap()
}

#[tokio::test]
async fn test_end_to_end_recommendation_pipeline() {
    let catalog = seeded_catalog().await;
    let analyzer = PreferenceAnalyzer::new(Arc::new(DisabledBackend), Duration::from_secs(1));
    let ranker = Ranker::new(30, 10);

    let request: RecommendRequest = serde_json::from_str(
        r#"{"preferences": "japanese food please", "district": "Central", "language": "en"}"#,
    )
    .unwrap();

    let mut query = request.into_query();
    let mut analysis = analyzer.analyze(&query).await;
    // The disabled backend falls back; inject what a live model would extract
    analysis.cuisine_types = vec!["japanese".to_string()];
    query.apply_overrides(&analysis);

    let snapshot = catalog.snapshot().await;
    let result = ranker.rank(&snapshot, &analysis, &query);

    assert!(!result.candidates.is_empty());
    assert_eq!(result.candidates[0].restaurant.name_en(), "Sakura House");
    for candidate in &result.candidates {
        assert!(candidate.score >= 30);
    }
}

#[tokio::test]
async fn test_extracted_district_overrides_filter() {
    let catalog = seeded_catalog().await;
    let ranker = Ranker::new(30, 10);

    let request: RecommendRequest = serde_json::from_str(
        r#"{"preferences": "ramen in causeway bay", "language": "en"}"#,
    )
    .unwrap();
    let mut query = request.into_query();

    let analysis = PreferenceAnalysis {
        cuisine_types: vec!["ramen".to_string()],
        extracted_district: Some("Causeway Bay".to_string()),
        ..PreferenceAnalysis::fallback()
    };
    query.apply_overrides(&analysis);
    assert_eq!(query.district, "Causeway Bay");

    let snapshot = catalog.snapshot().await;
    let result = ranker.rank(&snapshot, &analysis, &query);

    assert_eq!(result.candidates[0].restaurant.name_en(), "Ramen Alley");
    assert!(result.candidates[0]
        .reasons
        .iter()
        .any(|m| m.contains("Causeway Bay")));
}

#[tokio::test]
async fn test_dietary_restriction_sinks_seafood() {
    let catalog = seeded_catalog().await;
    let ranker = Ranker::new(0, 10);

    let analysis = PreferenceAnalysis {
        dietary_restrictions: vec!["seafood".to_string()],
        ..PreferenceAnalysis::fallback()
    };
    let query = aieat_engine::RecommendQuery {
        preferences: "no seafood".to_string(),
        budget: "Any".to_string(),
        district: "Any".to_string(),
        language: Language::En,
        history: vec![],
    };

    let snapshot = catalog.snapshot().await;
    let result = ranker.rank(&snapshot, &analysis, &query);

    // The seafood place takes the -50 hit and drops below zero
    assert_eq!(result.candidates.len(), 4);
    for candidate in &result.candidates {
        assert_ne!(candidate.restaurant.name_en(), "Ocean Table");
    }
}

#[tokio::test]
async fn test_top_n_truncation_keeps_total() {
    let catalog = seeded_catalog().await;
    let ranker = Ranker::new(0, 2);

    let query = aieat_engine::RecommendQuery {
        preferences: String::new(),
        budget: "Any".to_string(),
        district: "Any".to_string(),
        language: Language::En,
        history: vec![],
    };
    let analysis = PreferenceAnalysis::fallback();

    let snapshot = catalog.snapshot().await;
    let result = ranker.rank(&snapshot, &analysis, &query);

    assert_eq!(result.candidates.len(), 2);
    assert_eq!(result.total_matches, 5);
}

#[tokio::test]
async fn test_ollama_backend_parses_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"response": "{\"cuisine_types\": [\"thai\"], \"atmosphere\": \"casual\"}"}"#)
        .create_async()
        .await;

    let backend = OllamaBackend::new(server.url(), "llama3.2".to_string());
    let raw = backend.complete("prompt").await.unwrap();
    assert!(raw.contains("thai"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_openrouter_backend_reads_chat_completion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"cuisine_types\": []}"}}]}"#,
        )
        .create_async()
        .await;

    let backend = OpenRouterBackend::with_base_url(server.url(), "test-key".to_string());
    let raw = backend.complete("prompt").await.unwrap();
    assert_eq!(raw, r#"{"cuisine_types": []}"#);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_analyzer_parses_live_backend_output() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"response": "Sure! {\"cuisine_types\": [\"korean\"], \"atmosphere\": \"lively\", \"extracted_budget\": \"$101-200\"}"}"#,
        )
        .create_async()
        .await;

    let backend = Arc::new(OllamaBackend::new(server.url(), "llama3.2".to_string()));
    let analyzer = PreferenceAnalyzer::new(backend, Duration::from_secs(5));

    let query = aieat_engine::RecommendQuery {
        preferences: "korean bbq".to_string(),
        budget: "Any".to_string(),
        district: "Any".to_string(),
        language: Language::En,
        history: vec![],
    };

    let analysis = analyzer.analyze(&query).await;
    assert_eq!(analysis.cuisine_types, vec!["korean".to_string()]);
    assert_eq!(analysis.atmosphere, "lively");
    assert_eq!(analysis.extracted_budget.as_deref(), Some("$101-200"));
}

#[tokio::test]
async fn test_backend_error_degrades_to_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(500)
        .create_async()
        .await;

    let backend = Arc::new(OllamaBackend::new(server.url(), "llama3.2".to_string()));
    let analyzer = PreferenceAnalyzer::new(backend, Duration::from_secs(5));

    let query = aieat_engine::RecommendQuery {
        preferences: "anything".to_string(),
        budget: "Any".to_string(),
        district: "Any".to_string(),
        language: Language::En,
        history: vec![],
    };

    let analysis = analyzer.analyze(&query).await;
    assert_eq!(analysis, PreferenceAnalysis::fallback());
}
