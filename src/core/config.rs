use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::services::illustrator::IllustrationConfig;
use crate::services::image::ImageConfig;
use crate::services::llm::LlmConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config.yml";
pub const CONFIG_PATH_ENV: &str = "STORYBOOK_CONFIG";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub illustration: IllustrationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(OPENAI_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            if let Some(openai) = self.llm.openai.as_mut() {
                if openai.api_key.is_empty() {
                    openai.api_key = key.clone();
                }
            }
            if self.image.api_key.is_empty() {
                self.image.api_key = key;
            }
        }

        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} value: {}", PORT_ENV, port))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        match self.llm.provider.as_str() {
            "openai" => {
                let openai = self
                    .llm
                    .openai
                    .as_ref()
                    .context("llm.openai section missing")?;
                if openai.api_key.is_empty() {
                    bail!("OpenAI API key missing (set llm.openai.api_key or {})", OPENAI_API_KEY_ENV);
                }
                if let Some(base_url) = &openai.base_url {
                    check_url("llm.openai.base_url", base_url)?;
                }
            }
            "ollama" => {
                let ollama = self
                    .llm
                    .ollama
                    .as_ref()
                    .context("llm.ollama section missing")?;
                check_url("llm.ollama.base_url", &ollama.base_url)?;
            }
            other => bail!("Unknown LLM provider: {}", other),
        }

        match self.image.provider.as_str() {
            "openai" => {
                if self.image.api_key.is_empty() {
                    bail!("Image API key missing (set image.api_key or {})", OPENAI_API_KEY_ENV);
                }
                if let Some(base_url) = &self.image.base_url {
                    check_url("image.base_url", base_url)?;
                }
            }
            other => bail!("Unknown image provider: {}", other),
        }

        check_url("illustration.placeholder_host", &self.illustration.placeholder_host)?;
        Ok(())
    }
}

fn check_url(field: &str, value: &str) -> Result<()> {
    Url::parse(value).with_context(|| format!("{} is not a valid URL: {}", field, value))?;
    Ok(())
}
