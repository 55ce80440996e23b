//! Preference-analysis adapter.
//!
//! Turns raw user text plus conversation history into a structured
//! `PreferenceAnalysis` by calling exactly one configured LLM backend.
//! The adapter never fails outwardly: timeouts, transport errors, bad
//! statuses, and unparsable responses all degrade to the canonical
//! fallback analysis.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::config::InterpreterSettings;
use crate::models::{ChatRole, Language, PreferenceAnalysis, RecommendQuery};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";
const OPENROUTER_MODEL: &str = "meta-llama/llama-3.1-8b-instruct:free";
const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Errors from a single backend call. These never escape the analyzer.
#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("No interpretation backend configured")]
    NotConfigured,
}

/// One LLM completion backend. Exactly one implementation is selected at
/// startup; the scoring core never sees this seam.
#[async_trait]
pub trait InterpreterBackend: Send + Sync {
    /// Send a prompt, return the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String, InterpreterError>;

    fn name(&self) -> &'static str;

    /// Cheap reachability probe for the health endpoint.
    async fn ping(&self) -> String;
}

/// Local Ollama backend (`/api/generate`, non-streaming).
pub struct OllamaBackend {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaBackend {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: http_client(),
        }
    }
}

#[async_trait]
impl InterpreterBackend for OllamaBackend {
    async fn complete(&self, prompt: &str) -> Result<String, InterpreterError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InterpreterError::ApiError(format!(
                "Ollama returned {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        json.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| InterpreterError::InvalidResponse("missing response field".into()))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn ping(&self) -> String {
        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));
        let probe = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(2))
            .send()
            .await;
        match probe {
            Ok(r) if r.status().is_success() => "Connected".to_string(),
            _ => "Disconnected".to_string(),
        }
    }
}

/// OpenRouter chat-completions backend.
pub struct OpenRouterBackend {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenRouterBackend {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(OPENROUTER_URL.to_string(), api_key)
    }

    pub fn with_base_url(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            client: http_client(),
        }
    }
}

#[async_trait]
impl InterpreterBackend for OpenRouterBackend {
    async fn complete(&self, prompt: &str) -> Result<String, InterpreterError> {
        chat_completion(
            &self.client,
            &format!("{}/chat/completions", self.base_url.trim_end_matches('/')),
            &self.api_key,
            &serde_json::json!({
                "model": OPENROUTER_MODEL,
                "messages": [{"role": "user", "content": prompt}],
            }),
        )
        .await
    }

    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn ping(&self) -> String {
        if self.api_key.is_empty() {
            "Not Configured".to_string()
        } else {
            "OpenRouter".to_string()
        }
    }
}

/// OpenAI chat-completions backend.
pub struct OpenAiBackend {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(OPENAI_URL.to_string(), api_key, model)
    }

    pub fn with_base_url(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url,
            api_key,
            model,
            client: http_client(),
        }
    }
}

#[async_trait]
impl InterpreterBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> Result<String, InterpreterError> {
        chat_completion(
            &self.client,
            &format!("{}/chat/completions", self.base_url.trim_end_matches('/')),
            &self.api_key,
            &serde_json::json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": 0.7,
            }),
        )
        .await
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    async fn ping(&self) -> String {
        if self.api_key.is_empty() {
            "Not Configured".to_string()
        } else {
            "OpenAI".to_string()
        }
    }
}

/// Stand-in used when no backend is configured; every call degrades to
/// the fallback analysis.
pub struct DisabledBackend;

#[async_trait]
impl InterpreterBackend for DisabledBackend {
    async fn complete(&self, _prompt: &str) -> Result<String, InterpreterError> {
        Err(InterpreterError::NotConfigured)
    }

    fn name(&self) -> &'static str {
        "none"
    }

    async fn ping(&self) -> String {
        "Not Configured".to_string()
    }
}

fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client")
}

async fn chat_completion(
    client: &Client,
    url: &str,
    api_key: &str,
    payload: &Value,
) -> Result<String, InterpreterError> {
    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(payload)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(InterpreterError::ApiError(format!(
            "chat completion returned {}",
            response.status()
        )));
    }

    let json: Value = response.json().await?;
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| InterpreterError::InvalidResponse("missing completion content".into()))
}

/// Select the single backend named in configuration.
pub fn backend_from_settings(settings: &InterpreterSettings) -> Arc<dyn InterpreterBackend> {
    match settings.service.as_str() {
        "ollama" => Arc::new(OllamaBackend::new(
            settings.ollama_url.clone(),
            settings.ollama_model.clone(),
        )),
        "openrouter" => Arc::new(OpenRouterBackend::new(
            settings.openrouter_api_key.clone().unwrap_or_default(),
        )),
        "openai" => Arc::new(OpenAiBackend::new(
            settings.openai_api_key.clone().unwrap_or_default(),
            settings.openai_model.clone(),
        )),
        other => {
            tracing::warn!("Unknown interpreter service '{}', analysis disabled", other);
            Arc::new(DisabledBackend)
        }
    }
}

/// The adapter: prompt construction, one bounded backend call, tolerant
/// parsing, and a TTL-bounded result cache keyed by the full prompt.
pub struct PreferenceAnalyzer {
    backend: Arc<dyn InterpreterBackend>,
    timeout: Duration,
    cache: moka::future::Cache<String, PreferenceAnalysis>,
}

impl PreferenceAnalyzer {
    pub fn new(backend: Arc<dyn InterpreterBackend>, timeout: Duration) -> Self {
        Self::with_cache(backend, timeout, 1000, Duration::from_secs(3600))
    }

    pub fn with_cache(
        backend: Arc<dyn InterpreterBackend>,
        timeout: Duration,
        cache_size: u64,
        cache_ttl: Duration,
    ) -> Self {
        let cache = moka::future::CacheBuilder::new(cache_size)
            .time_to_live(cache_ttl)
            .build();
        Self {
            backend,
            timeout,
            cache,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn backend_status(&self) -> String {
        self.backend.ping().await
    }

    /// Analyze the user's preferences. Never fails: any backend problem
    /// yields the canonical fallback analysis.
    pub async fn analyze(&self, query: &RecommendQuery) -> PreferenceAnalysis {
        let prompt = build_prompt(query);

        if let Some(cached) = self.cache.get(&prompt).await {
            tracing::debug!("Analysis cache hit");
            return cached;
        }

        let raw = match tokio::time::timeout(self.timeout, self.backend.complete(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!("Interpreter backend {} failed: {}", self.backend.name(), e);
                return PreferenceAnalysis::fallback();
            }
            Err(_) => {
                tracing::warn!(
                    "Interpreter backend {} timed out after {:?}",
                    self.backend.name(),
                    self.timeout
                );
                return PreferenceAnalysis::fallback();
            }
        };

        let Some(json) = extract_json(&raw) else {
            tracing::warn!("No JSON object found in interpreter response");
            return PreferenceAnalysis::fallback();
        };

        match serde_json::from_str::<PreferenceAnalysis>(json) {
            Ok(analysis) => {
                tracing::debug!("Parsed analysis: {:?}", analysis);
                self.cache.insert(prompt, analysis.clone()).await;
                analysis
            }
            Err(e) => {
                tracing::warn!("Failed to parse interpreter JSON: {}", e);
                PreferenceAnalysis::fallback()
            }
        }
    }
}

/// Extract the first balanced JSON object from raw completion text.
/// Brace depth is tracked outside string literals so prose around the
/// object, or braces inside its strings, do not confuse the scan.
pub fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Build the interpretation prompt, embedding up to the last four history
/// turns. Assistant turns that previously carried extracted cuisines are
/// summarized back in so the model can decide continuation vs replacement.
pub fn build_prompt(query: &RecommendQuery) -> String {
    let lang = query.language;
    let mut context = String::new();

    if !query.history.is_empty() {
        context.push_str(match lang {
            Language::Zh => "\n\n對話歷史 (用於理解上下文):\n",
            Language::En => "\n\nConversation History (for context):\n",
        });

        let start = query.history.len().saturating_sub(4);
        for turn in &query.history[start..] {
            let role = match (lang, turn.role) {
                (Language::Zh, ChatRole::User) => "用戶",
                (Language::Zh, ChatRole::Assistant) => "AI",
                (Language::En, ChatRole::User) => "User",
                (Language::En, ChatRole::Assistant) => "Assistant",
            };
            context.push_str(&format!("{role}: {}\n", turn.message));

            if turn.role == ChatRole::Assistant {
                if let Some(analysis) = &turn.analysis {
                    if !analysis.cuisine_types.is_empty() {
                        let cuisines = analysis.cuisine_types.join(", ");
                        context.push_str(&match lang {
                            Language::Zh => format!("  (之前推薦: {cuisines})\n"),
                            Language::En => format!("  (Previous: {cuisines})\n"),
                        });
                    }
                }
            }
        }
    }

    let preferences = &query.preferences;
    let budget = &query.budget;
    let district = &query.district;

    match lang {
        Language::Zh => format!(
            r#"分析以下餐廳偏好，提取關鍵信息並生成一個友好的回應：
{context}
當前用戶輸入：{preferences}
預算：{budget}
地區：{district}

**重要規則 - 必須嚴格遵守**:
1. **如果用戶提到新的菜系/餐廳類型**（例如「日本菜」、「酒吧」、「bar」、「pub」、「cafe」），使用新的類型，**忽略歷史**
2. **如果用戶只提到地區**（例如「旺角呢」、「尖沙咀有冇」）而**沒有提到任何菜系**，從對話歷史中複製之前的cuisine_types
3. 如果是第一次對話，cuisine_types可以是空數組

**例子**:
- 對話歷史: 意大利菜
- 用戶說: "旺角呢?" → 返回: "cuisine_types": ["意大利菜"] (保持)
- 用戶說: "想搵bar/酒吧" → 返回: "cuisine_types": ["bar", "pub"] (新類型)
- 用戶說: "食完想去飲嘢" → 返回: "cuisine_types": ["bar", "pub", "cafe"] (新需求)

請提供：
1. 匹配的菜系類型（例如：意大利菜、日本菜、中菜等）
2. 用餐氛圍（休閒、高級、浪漫、家庭友好、慶祝等）
3. 關鍵要求
4. 飲食限制
5. **從用戶輸入中提取的預算範圍**（如果提到，返回："Below $50", "$51-100", "$101-200", "$201-400", "$401-800", "Above $800"，如果沒提到返回null）
6. **從用戶輸入中提取的地區**（如果提到香港地區名稱，返回該地區的英文或中文名，如果沒提到返回null）
7. 一個簡短、友好、口語化的回應（用廣東話風格，像朋友聊天一樣）

**負面提示詞（用戶不想要的）**：
- 如果用戶說「唔要」、「避免」、「不喜歡」、「no」、「avoid」、「don't want」等，將這些加入dietary_restrictions
- 例如：「唔要海鮮」→ dietary_restrictions: ["seafood"]
- 例如：「避免辣」→ dietary_restrictions: ["spicy"]
- 例如：「no pork」→ dietary_restrictions: ["pork"]

只返回JSON格式：{{"cuisine_types": ["菜系"], "atmosphere": "氛圍", "key_requirements": ["要求"], "dietary_restrictions": ["不想要的"], "extracted_budget": "預算範圍或null", "extracted_district": "地區或null", "ai_message": "友好的回應"}}"#
        ),
        Language::En => format!(
            r#"Analyze the following restaurant preference and generate a friendly response:
{context}
Current User Input: {preferences}
Budget: {budget}
District: {district}

**Important Rules - MUST FOLLOW STRICTLY**:
1. **If user mentions NEW cuisine/restaurant type** (e.g., "japanese", "bar", "pub", "cafe", "after dinner drinks"), use the NEW type, **ignore history**
2. **If user only mentions location** (e.g., "how about Mong Kok", "any in TST") and **does NOT mention any cuisine**, copy cuisine_types from conversation history
3. If this is the first conversation, cuisine_types can be empty array

**Examples**:
- History: italian
- User: "how about Mong Kok?" → Return: "cuisine_types": ["italian"] (keep)
- User: "looking for bars" → Return: "cuisine_types": ["bar", "pub"] (new type)
- User: "after dinner drinks" → Return: "cuisine_types": ["bar", "pub", "cafe"] (new need)

Provide:
1. Cuisine types that match (e.g., italian, japanese, chinese, etc.)
2. Dining atmosphere (casual, fine dining, romantic, family-friendly, celebration, etc.)
3. Key requirements or must-haves
4. Any dietary restrictions
5. **Extracted budget range from user input** (if mentioned, return: "Below $50", "$51-100", "$101-200", "$201-400", "$401-800", "Above $800", otherwise return null)
6. **Extracted district from user input** (if Hong Kong district mentioned, return the district name in English or Chinese, otherwise return null)
7. A short, friendly, conversational response (like chatting with a friend)

**Negative prompts (what user doesn't want)**:
- If user says "no", "avoid", "don't want", "not", "without", etc., add these to dietary_restrictions
- Example: "no seafood" → dietary_restrictions: ["seafood"]
- Example: "avoid spicy" → dietary_restrictions: ["spicy"]
- Example: "don't like pork" → dietary_restrictions: ["pork"]

Return ONLY JSON format: {{"cuisine_types": ["cuisine"], "atmosphere": "vibe", "key_requirements": ["requirements"], "dietary_restrictions": ["things to avoid"], "extracted_budget": "budget or null", "extracted_district": "district or null", "ai_message": "friendly response"}}"#
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatTurn;

    fn query_with_history(history: Vec<ChatTurn>) -> RecommendQuery {
        RecommendQuery {
            preferences: "how about Mong Kok?".to_string(),
            budget: "Any".to_string(),
            district: "Any".to_string(),
            language: Language::En,
            history,
        }
    }

    #[test]
    fn test_extract_json_ignores_surrounding_prose() {
        let raw = r#"Sure! Here is the result: {"cuisine_types": ["japanese"]} hope it helps"#;
        assert_eq!(extract_json(raw), Some(r#"{"cuisine_types": ["japanese"]}"#));
    }

    #[test]
    fn test_extract_json_handles_nested_objects_and_strings() {
        let raw = r#"{"a": {"b": "braces } inside {"}, "c": 1} trailing"#;
        assert_eq!(extract_json(raw), Some(r#"{"a": {"b": "braces } inside {"}, "c": 1}"#));
    }

    #[test]
    fn test_extract_json_none_when_missing() {
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("{unterminated"), None);
    }

    #[test]
    fn test_prompt_embeds_only_last_four_turns() {
        let history: Vec<ChatTurn> = (0..6)
            .map(|i| ChatTurn {
                role: ChatRole::User,
                message: format!("turn {i}"),
                analysis: None,
            })
            .collect();

        let prompt = build_prompt(&query_with_history(history));
        assert!(!prompt.contains("turn 0"));
        assert!(!prompt.contains("turn 1"));
        assert!(prompt.contains("turn 2"));
        assert!(prompt.contains("turn 5"));
    }

    #[test]
    fn test_prompt_summarizes_previous_cuisines() {
        let history = vec![ChatTurn {
            role: ChatRole::Assistant,
            message: "Try these Italian places".to_string(),
            analysis: Some(PreferenceAnalysis {
                cuisine_types: vec!["italian".to_string()],
                ..Default::default()
            }),
        }];

        let prompt = build_prompt(&query_with_history(history));
        assert!(prompt.contains("(Previous: italian)"));
    }

    #[test]
    fn test_prompt_localized_by_language() {
        let mut q = query_with_history(vec![]);
        q.language = Language::Zh;
        let zh = build_prompt(&q);
        assert!(zh.contains("分析以下餐廳偏好"));

        q.language = Language::En;
        let en = build_prompt(&q);
        assert!(en.contains("Analyze the following restaurant preference"));
    }

    #[tokio::test]
    async fn test_disabled_backend_yields_fallback() {
        let analyzer = PreferenceAnalyzer::new(Arc::new(DisabledBackend), Duration::from_secs(1));
        let analysis = analyzer.analyze(&query_with_history(vec![])).await;
        assert_eq!(analysis, PreferenceAnalysis::fallback());
    }

    struct CannedBackend(String);

    #[async_trait]
    impl InterpreterBackend for CannedBackend {
        async fn complete(&self, _prompt: &str) -> Result<String, InterpreterError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &'static str {
            "canned"
        }

        async fn ping(&self) -> String {
            "Connected".to_string()
        }
    }

    #[tokio::test]
    async fn test_analyze_parses_canned_response() {
        let backend = CannedBackend(
            r#"Here you go: {"cuisine_types": ["japanese"], "atmosphere": "celebration",
                "dietary_restrictions": ["seafood"], "extracted_budget": "$201-400",
                "extracted_district": "Mong Kok", "ai_message": "Happy birthday!"}"#
                .to_string(),
        );
        let analyzer = PreferenceAnalyzer::new(Arc::new(backend), Duration::from_secs(5));
        let analysis = analyzer.analyze(&query_with_history(vec![])).await;

        assert_eq!(analysis.cuisine_types, vec!["japanese"]);
        assert_eq!(analysis.atmosphere, "celebration");
        assert_eq!(analysis.extracted_budget.as_deref(), Some("$201-400"));
        assert_eq!(analysis.ai_message, "Happy birthday!");
    }

    #[tokio::test]
    async fn test_analyze_falls_back_on_garbage() {
        let backend = CannedBackend("I could not find anything matching.".to_string());
        let analyzer = PreferenceAnalyzer::new(Arc::new(backend), Duration::from_secs(5));
        let analysis = analyzer.analyze(&query_with_history(vec![])).await;
        assert_eq!(analysis, PreferenceAnalysis::fallback());
    }

    struct SlowBackend;

    #[async_trait]
    impl InterpreterBackend for SlowBackend {
        async fn complete(&self, _prompt: &str) -> Result<String, InterpreterError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("{}".to_string())
        }

        fn name(&self) -> &'static str {
            "slow"
        }

        async fn ping(&self) -> String {
            "Connected".to_string()
        }
    }

    #[tokio::test]
    async fn test_analyze_falls_back_on_timeout() {
        let analyzer = PreferenceAnalyzer::new(Arc::new(SlowBackend), Duration::from_millis(50));
        let analysis = analyzer.analyze(&query_with_history(vec![])).await;
        assert_eq!(analysis, PreferenceAnalysis::fallback());
    }
}
