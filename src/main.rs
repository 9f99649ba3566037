use anyhow::Result;
use std::sync::Arc;
use storybook::server::{self, AppState};
use storybook::services::image::create_image_client;
use storybook::services::llm::create_llm;
use storybook::{Config, StoryGenerator};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; keys may already be in the environment.
    let _ = dotenvy::dotenv();
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            eprintln!("Please check 'config.yml' or set OPENAI_API_KEY.");
            return Err(e);
        }
    };

    let llm = create_llm(&config)?;
    let image = create_image_client(&config)?;
    let generator = Arc::new(StoryGenerator::from_config(&config, llm, image));

    server::serve(&config.server, AppState::new(generator)).await
}
