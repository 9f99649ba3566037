use crate::core::config::Config;
use crate::core::error::ModelCallError;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String, // "openai" or "ollama"
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_openai")]
    pub openai: Option<OpenAIConfig>,
    #[serde(default)]
    pub ollama: Option<OllamaConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_seconds: default_timeout_seconds(),
            openai: default_openai(),
            ollama: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_timeout_seconds() -> u64 {
    60
}
fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_openai() -> Option<OpenAIConfig> {
    Some(OpenAIConfig {
        api_key: String::new(),
        model: default_openai_model(),
        base_url: None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    // An empty `system` sends only the user message.
    async fn chat(
        &self,
        system: &str,
        user: &str,
        format: ResponseFormat,
    ) -> Result<String, ModelCallError>;
}

pub fn create_llm(config: &Config) -> Result<Arc<dyn LlmClient>> {
    match config.llm.provider.as_str() {
        "openai" => {
            let cfg = config.llm.openai.as_ref().context("OpenAI config missing")?;
            Ok(Arc::new(OpenAIClient::new(&cfg.api_key, &cfg.model, cfg.base_url.as_deref())))
        }
        "ollama" => {
            let cfg = config.llm.ollama.as_ref().context("Ollama config missing")?;
            Ok(Arc::new(OllamaClient::new(&cfg.base_url, &cfg.model)))
        }
        _ => Err(anyhow!("Unknown LLM provider: {}", config.llm.provider)),
    }
}

fn build_messages(system: &str, user: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if !system.is_empty() {
        messages.push(ChatMessage { role: "system".to_string(), content: system.to_string() });
    }
    messages.push(ChatMessage { role: "user".to_string(), content: user.to_string() });
    messages
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

// --- OpenAI ---

#[derive(Debug)]
pub struct OpenAIClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.unwrap_or("https://api.openai.com/v1").trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageResponse,
}

#[derive(Deserialize)]
struct OpenAIMessageResponse {
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn chat(
        &self,
        system: &str,
        user: &str,
        format: ResponseFormat,
    ) -> Result<String, ModelCallError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = OpenAIRequest {
            model: self.model.clone(),
            messages: build_messages(system, user),
            response_format: match format {
                ResponseFormat::JsonObject => Some(OpenAIResponseFormat { kind: "json_object" }),
                ResponseFormat::Text => None,
            },
        };

        let resp = self.client.post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await?;
            return Err(ModelCallError::Api { status: status.as_u16(), message: error_text });
        }

        let response_text = resp.text().await?;
        let result: OpenAIResponse = serde_json::from_str(&response_text)
            .map_err(|e| ModelCallError::Decode(format!("{}. Body: {}", e, response_text)))?;

        first_choice_content(result)
    }
}

fn first_choice_content(result: OpenAIResponse) -> Result<String, ModelCallError> {
    result
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ModelCallError::EmptyResponse("OpenAI response empty or missing content".to_string()))
}

// --- Ollama ---

#[derive(Debug)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaMessageResponse,
}

#[derive(Deserialize)]
struct OllamaMessageResponse {
    content: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat(
        &self,
        system: &str,
        user: &str,
        format: ResponseFormat,
    ) -> Result<String, ModelCallError> {
        let url = format!("{}/api/chat", self.base_url);

        let request_body = OllamaRequest {
            model: self.model.clone(),
            messages: build_messages(system, user),
            stream: false,
            format: match format {
                ResponseFormat::JsonObject => Some("json"),
                ResponseFormat::Text => None,
            },
        };

        let resp = self.client.post(&url)
            .json(&request_body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await?;
            return Err(ModelCallError::Api { status: status.as_u16(), message: error_text });
        }

        let result: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| ModelCallError::Decode(e.to_string()))?;
        if result.message.content.trim().is_empty() {
            return Err(ModelCallError::EmptyResponse("Ollama returned no content".to_string()));
        }
        Ok(result.message.content)
    }
}
