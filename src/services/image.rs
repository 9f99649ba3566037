use crate::core::config::Config;
use crate::core::error::ModelCallError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageConfig {
    #[serde(default = "default_provider")]
    pub provider: String, // "openai"
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: default_model(),
            size: default_size(),
            quality: default_quality(),
            base_url: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "dall-e-3".to_string()
}
// Cheapest options the image API offers.
fn default_size() -> String {
    "1024x1024".to_string()
}
fn default_quality() -> String {
    "standard".to_string()
}
fn default_timeout_seconds() -> u64 {
    120
}

#[async_trait]
pub trait ImageClient: Send + Sync + Debug {
    /// Returns the URL of the generated image, or `None` when the service
    /// answered without one.
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ModelCallError>;
}

pub fn create_image_client(config: &Config) -> Result<Arc<dyn ImageClient>> {
    match config.image.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIImageClient::new(&config.image))),
        _ => Err(anyhow!("Unknown image provider: {}", config.image.provider)),
    }
}

#[derive(Debug)]
pub struct OpenAIImageClient {
    api_key: String,
    model: String,
    size: String,
    quality: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIImageClient {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            size: config.size.clone(),
            quality: config.quality.clone(),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Maps a non-success response body to an error, singling out refusals from
/// the provider's safety system.
fn classify_error(status: u16, body: &str) -> ModelCallError {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        let detail = parsed.error;
        let refused = detail.code.as_deref() == Some("content_policy_violation")
            || detail.message.contains("safety system");
        if refused {
            return ModelCallError::ContentPolicy(detail.message);
        }
        return ModelCallError::Api { status, message: detail.message };
    }
    ModelCallError::Api { status, message: body.to_string() }
}

fn first_url(response: ImageResponse) -> Option<String> {
    response
        .data
        .into_iter()
        .next()
        .and_then(|d| d.url)
        .filter(|url| !url.is_empty())
}

#[async_trait]
impl ImageClient for OpenAIImageClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ModelCallError> {
        let url = format!("{}/images/generations", self.base_url);

        let request_body = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
            quality: &self.quality,
        };

        let resp = self.client.post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        let result: ImageResponse = serde_json::from_str(&body)
            .map_err(|e| ModelCallError::Decode(format!("{}. Body: {}", e, body)))?;
        Ok(first_url(result))
    }
}
