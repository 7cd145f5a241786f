//! Gemini-backed primary reasoner
//!
//! Calls the generateContent endpoint with a structured prompt and expects
//! a single JSON object back. Model output is scanned for an embedded JSON
//! object before parsing, since models wrap answers in prose or code fences.

use super::{PriceDirection, RawAssessment, Reasoner};
use crate::market::MarketSnapshot;
use crate::news::NewsItem;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the Gemini reasoner
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL for the generative language API
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// API key
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
}

/// Client for the Gemini generateContent API
pub struct GeminiReasoner {
    config: GeminiConfig,
    client: Client,
}

impl GeminiReasoner {
    /// Create a new reasoner with the given configuration
    pub fn with_config(config: GeminiConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Reasoner for GeminiReasoner {
    async fn assess(
        &self,
        news: &NewsItem,
        market: &MarketSnapshot,
    ) -> anyhow::Result<RawAssessment> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": build_prompt(news, market)}]}],
            "generationConfig": {"maxOutputTokens": 500, "temperature": 0.2}
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error: {} - {}", status, text);
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = payload
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| anyhow::anyhow!("Empty Gemini response"))?;

        parse_assessment(text)
    }
}

/// Build the reasoning prompt for a news/market pair
fn build_prompt(news: &NewsItem, market: &MarketSnapshot) -> String {
    format!(
        "You are an expert at analyzing news impact on prediction markets.\n\
         \n\
         NEWS ARTICLE:\n\
         Title: {}\n\
         Summary: {}\n\
         \n\
         PREDICTION MARKET:\n\
         Question: {}\n\
         End Date: {}\n\
         \n\
         Respond with ONLY a JSON object of this exact shape:\n\
         {{\"relevance\": 0.75, \"direction\": \"up\", \"confidence\": 0.8, \
         \"expected_magnitude\": 0.15, \"reasoning\": \"brief explanation\"}}\n\
         \n\
         relevance, confidence and expected_magnitude are in [0, 1]; \
         direction is one of \"up\", \"down\", \"neutral\".",
        news.headline,
        news.summary,
        market.question,
        market
            .end_date
            .map(|d| d.to_rfc3339())
            .unwrap_or_else(|| "open-ended".to_string()),
    )
}

/// Parse model output into a raw assessment
fn parse_assessment(text: &str) -> anyhow::Result<RawAssessment> {
    let json = extract_json(text)
        .ok_or_else(|| anyhow::anyhow!("No JSON object in model output: {}", text))?;
    let parsed: ModelAssessment = serde_json::from_str(json)?;

    let direction = match parsed.direction.as_str() {
        "up" => PriceDirection::Up,
        "down" => PriceDirection::Down,
        "neutral" => PriceDirection::Neutral,
        other => anyhow::bail!("Unknown direction in model output: {}", other),
    };

    Ok(RawAssessment {
        relevance: parsed.relevance,
        direction,
        confidence: parsed.confidence,
        expected_magnitude: parsed.expected_magnitude,
        reasoning: parsed.reasoning,
    })
}

/// Slice out the first top-level JSON object in free-form model text
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Assessment fields as emitted by the model
#[derive(Debug, Deserialize)]
struct ModelAssessment {
    relevance: Decimal,
    direction: String,
    confidence: Decimal,
    #[serde(default)]
    expected_magnitude: Decimal,
    #[serde(default)]
    reasoning: String,
}

/// generateContent response envelope
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}
