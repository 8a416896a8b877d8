use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::assessment::{Assessment, Grade, Source};
use crate::error::{ClassifyError, ClassifyResult};
use crate::heuristic::estimate_footprint;
use crate::traits::Classifier;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

const PROMPT: &str = "You are a product sustainability auditor. From the product text below, \
infer the product type and its materials, then judge how environmentally sustainable it is. \
Reward natural or organic fibres, recycled content, durable, reusable and refillable designs, \
and minimal paper, glass or metal packaging. Penalise conventional plastics and synthetics, \
single-use items, harsh chemicals and heavy plastic packaging.\n\
Respond with one JSON object and nothing else, using these keys:\n\
  \"numericScore\": integer from -10 (very harmful) to 10 (very eco-friendly)\n\
  \"materials\": array of material names\n\
  \"carbonFootprintKg\": number between 0.2 and 12\n\
  \"waterUsageLiters\": number between 50 and 3000\n\
  \"explanation\": one or two plain sentences\n\n\
Product text:\n";

/// Connection settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL; `/chat/completions` is appended.
    pub api_url: String,
    pub model: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    /// Seconds the model gets before the keyword fallback answers.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            model: DEFAULT_MODEL.into(),
            api_key_env: DEFAULT_API_KEY_ENV.into(),
            timeout_secs: 10,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Classifier backed by a hosted language model.
///
/// Any transport, status, or parse failure surfaces as a [`ClassifyError`];
/// wrap it in a [`FallbackClassifier`](crate::FallbackClassifier) to keep
/// answering when the model is down.
#[derive(Clone)]
pub struct ModelClassifier {
    client: Client,
    config: ModelConfig,
    api_key: Option<String>,
}

impl ModelClassifier {
    pub fn new(config: ModelConfig, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            config,
            api_key,
        }
    }

    /// Read the API key from the configured environment variable.
    pub fn from_env(config: ModelConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self::new(config, api_key)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Classifier for ModelClassifier {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn classify(&self, text: &str) -> ClassifyResult<Assessment> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ClassifyError::Unavailable(format!("{} is not set", self.config.api_key_env))
        })?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: format!("{PROMPT}{text}"),
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifyError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Unavailable(format!("HTTP {status}: {body}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::InvalidResponse(e.to_string()))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ClassifyError::InvalidResponse("no choices in reply".into()))?;

        parse_reply(&content)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReply {
    numeric_score: f64,
    #[serde(default)]
    materials: Vec<String>,
    carbon_footprint_kg: Option<f64>,
    water_usage_liters: Option<f64>,
    explanation: Option<String>,
}

/// Turn the model's text into an assessment.
///
/// Models sometimes wrap the object in prose; the last blank-line separated
/// block that looks like a JSON object is tried when the whole text is not.
/// The grade is always derived from the score.
fn parse_reply(content: &str) -> ClassifyResult<Assessment> {
    let content = content.trim();
    let reply: ModelReply = serde_json::from_str(content).or_else(|first| {
        content
            .split("\n\n")
            .map(str::trim)
            .filter(|block| block.starts_with('{') && block.ends_with('}'))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .find_map(|block| serde_json::from_str(block).ok())
            .ok_or_else(|| ClassifyError::InvalidResponse(first.to_string()))
    })?;

    let (carbon, water) = estimate_footprint(reply.numeric_score);
    let mut materials = reply.materials;
    materials.sort();
    materials.dedup();

    Ok(Assessment {
        numeric_score: reply.numeric_score,
        grade: Grade::from_score(reply.numeric_score),
        materials,
        explanation: reply.explanation.unwrap_or_default(),
        carbon_footprint_kg: reply.carbon_footprint_kg.unwrap_or(carbon),
        water_usage_liters: reply.water_usage_liters.unwrap_or(water),
        source: Source::Model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config(api_url: String) -> ModelConfig {
        ModelConfig {
            api_url,
            ..ModelConfig::default()
        }
    }

    fn chat_reply(content: &str) -> Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    // -----------------------------------------------------------------------
    // Reply parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parses_plain_object() {
        let a = parse_reply(
            r#"{"numericScore": 7, "materials": ["hemp", "cotton"], "carbonFootprintKg": 2.5,
                "waterUsageLiters": 900, "explanation": "Mostly natural fibres."}"#,
        )
        .unwrap();
        assert_eq!(a.numeric_score, 7.0);
        assert_eq!(a.grade, Grade::B);
        assert_eq!(a.materials, vec!["cotton", "hemp"]);
        assert_eq!(a.carbon_footprint_kg, 2.5);
        assert_eq!(a.water_usage_liters, 900.0);
        assert_eq!(a.source, Source::Model);
    }

    #[test]
    fn finds_object_after_prose() {
        let a = parse_reply("Here is my analysis.\n\n{\"numericScore\": -3}\n").unwrap();
        assert_eq!(a.numeric_score, -3.0);
        assert_eq!(a.grade, Grade::F);
        assert!(a.materials.is_empty());
        assert_eq!((a.carbon_footprint_kg, a.water_usage_liters), estimate_footprint(-3.0));
    }

    #[test]
    fn text_without_an_object_is_invalid() {
        let err = parse_reply("I cannot rate this product.").unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidResponse(_)));
    }

    // -----------------------------------------------------------------------
    // HTTP
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_api_key_is_unavailable() {
        let classifier = ModelClassifier::new(config("http://127.0.0.1:9".into()), None);
        assert!(!classifier.has_api_key());
        let err = classifier.classify("hemp tote").await.unwrap_err();
        assert!(matches!(err, ClassifyError::Unavailable(msg) if msg.contains(DEFAULT_API_KEY_ENV)));
    }

    #[tokio::test]
    async fn classifies_through_chat_completions() {
        let router = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], DEFAULT_MODEL);
                let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
                assert!(prompt.ends_with("Organic hemp tote"));
                Json(chat_reply(r#"{"numericScore": 9, "materials": ["hemp"]}"#))
            }),
        );
        let url = serve(router).await;

        let classifier = ModelClassifier::new(config(url), Some("test-key".into()));
        assert_eq!(classifier.name(), DEFAULT_MODEL);
        let a = classifier.classify("Organic hemp tote").await.unwrap();
        assert_eq!(a.numeric_score, 9.0);
        assert_eq!(a.grade, Grade::A);
        assert_eq!(a.source, Source::Model);
    }

    #[tokio::test]
    async fn error_status_is_unavailable() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let url = serve(router).await;

        let classifier = ModelClassifier::new(config(format!("{url}/")), Some("k".into()));
        let err = classifier.classify("anything").await.unwrap_err();
        assert!(matches!(err, ClassifyError::Unavailable(msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn empty_choices_are_invalid() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let url = serve(router).await;

        let classifier = ModelClassifier::new(config(url), Some("k".into()));
        let err = classifier.classify("anything").await.unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidResponse(_)));
    }

    #[test]
    fn config_defaults() {
        let c = ModelConfig::default();
        assert_eq!(c.api_url, DEFAULT_API_URL);
        assert_eq!(c.timeout(), Duration::from_secs(10));
    }
}
