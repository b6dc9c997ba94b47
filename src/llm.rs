//! LLM generation client.
//!
//! Generation is an opaque external service: prompt in, text out, invoked
//! at most once per cache miss. The concrete backend is a local Ollama
//! server's non-streaming generate endpoint.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::LlmConfig;

/// Text generation service consumed by the answer pipeline.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn model_name(&self) -> &str;

    /// Generate a completion for the prompt. May block for seconds.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub fn create_llm(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    Ok(Box::new(OllamaGenerator::new(config)?))
}

/// Generation client backed by a local Ollama server.
///
/// Calls `POST {base_url}/api/generate` with `stream: false` and returns
/// the full response body.
pub struct OllamaGenerator {
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl LlmClient for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama generate API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response field"))?;

        Ok(text.to_string())
    }
}
