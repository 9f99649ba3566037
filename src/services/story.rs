use crate::core::config::Config;
use crate::core::error::{GenerationError, ModelCallError};
use crate::core::story::{StoryDocument, StoryRequest};
use crate::services::illustrator::Illustrator;
use crate::services::image::ImageClient;
use crate::services::llm::{LlmClient, ResponseFormat};
use crate::services::parser::parse_story_response;
use crate::services::prompt::storybook_prompt;
use crate::services::safety::SafetyRewriter;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

/// Prompt, text model, parse, then illustrate or assign placeholders.
#[derive(Debug)]
pub struct StoryGenerator {
    llm: Arc<dyn LlmClient>,
    illustrator: Illustrator,
    timeout: Duration,
}

impl StoryGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, illustrator: Illustrator, timeout: Duration) -> Self {
        Self { llm, illustrator, timeout }
    }

    pub fn from_config(config: &Config, llm: Arc<dyn LlmClient>, image: Arc<dyn ImageClient>) -> Self {
        let llm_timeout = Duration::from_secs(config.llm.timeout_seconds);
        let rewriter = config
            .illustration
            .safety_rewrite
            .then(|| SafetyRewriter::new(llm.clone(), llm_timeout));
        let illustrator = Illustrator::new(
            image,
            rewriter,
            &config.illustration,
            Duration::from_secs(config.image.timeout_seconds),
        );
        Self::new(llm, illustrator, llm_timeout)
    }

    pub async fn generate(&self, request: &StoryRequest) -> Result<StoryDocument, GenerationError> {
        request.validate().map_err(GenerationError::InvalidRequest)?;

        info!("Generating story \"{}\" for age {}...", request.title, request.target_age);
        let prompt = storybook_prompt(&request.title, &request.story, request.target_age);

        let call = self.llm.chat("", &prompt, ResponseFormat::JsonObject);
        let content = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ModelCallError::Timeout(self.timeout.as_secs()))
            .and_then(|result| result)
            .map_err(|e| {
                error!("Story generation call failed: {}", e);
                e
            })?;

        let mut document = parse_story_response(&content).map_err(|e| {
            error!("{}", e);
            e
        })?;
        info!("Story generated with {} pages", document.pages.len());
        info!("generate_images flag: {}", request.generate_images);

        if request.generate_images {
            self.illustrator.illustrate(&mut document).await;
        } else {
            self.illustrator.assign_placeholders(&mut document);
        }

        Ok(document)
    }
}
