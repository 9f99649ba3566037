use crate::core::error::ModelCallError;
use crate::core::story::{CharacterHint, StoryDocument, StoryPage};
use crate::services::enhancer::{derive_character_hint, enhance_image_prompt, StoryContext};
use crate::services::image::ImageClient;
use crate::services::placeholder::{PlaceholderPolicy, DEFAULT_PLACEHOLDER_HOST};
use crate::services::preview;
use crate::services::safety::SafetyRewriter;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IllustrationConfig {
    #[serde(default = "default_placeholder_host")]
    pub placeholder_host: String,
    #[serde(default = "default_character_hint_chars")]
    pub character_hint_chars: usize,
    #[serde(default = "default_safety_rewrite")]
    pub safety_rewrite: bool,
}

impl Default for IllustrationConfig {
    fn default() -> Self {
        Self {
            placeholder_host: default_placeholder_host(),
            character_hint_chars: default_character_hint_chars(),
            safety_rewrite: default_safety_rewrite(),
        }
    }
}

fn default_placeholder_host() -> String {
    DEFAULT_PLACEHOLDER_HOST.to_string()
}
fn default_character_hint_chars() -> usize {
    150
}
fn default_safety_rewrite() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Generated,
    /// No image prompt, so the model was never called.
    Placeholder,
    Failed,
}

/// Diagnostic counts for one illustration run. Not used for control flow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IllustrationReport {
    pub generated: usize,
    pub placeholder: usize,
    pub failed: usize,
}

impl IllustrationReport {
    fn record(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Generated => self.generated += 1,
            PageOutcome::Placeholder => self.placeholder += 1,
            PageOutcome::Failed => self.failed += 1,
        }
    }
}

/// Fills `image_url` on every page. Page 1 goes first and fixes the character
/// design; pages 2..=5 follow one at a time, each carrying the character hint.
/// A page's failure only ever costs that page its image.
#[derive(Debug)]
pub struct Illustrator {
    image: Arc<dyn ImageClient>,
    rewriter: Option<SafetyRewriter>,
    placeholders: PlaceholderPolicy,
    hint_chars: usize,
    timeout: Duration,
}

impl Illustrator {
    pub fn new(
        image: Arc<dyn ImageClient>,
        rewriter: Option<SafetyRewriter>,
        config: &IllustrationConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            image,
            rewriter,
            placeholders: PlaceholderPolicy::new(&config.placeholder_host),
            hint_chars: config.character_hint_chars,
            timeout,
        }
    }

    pub fn placeholders(&self) -> &PlaceholderPolicy {
        &self.placeholders
    }

    pub fn assign_placeholders(&self, document: &mut StoryDocument) {
        info!("Image generation skipped, using static placeholders");
        self.placeholders.assign_all(document);
    }

    pub async fn illustrate(&self, document: &mut StoryDocument) -> IllustrationReport {
        info!("Generating {} images sequentially for character consistency", document.pages.len());

        let mut order: Vec<usize> = (0..document.pages.len()).collect();
        order.sort_by_key(|&i| document.pages[i].page_number);

        // Taken from the raw prompt, so it is available whether or not page 1's image succeeds.
        let hint = document
            .pages
            .iter()
            .find(|p| p.page_number == 1)
            .and_then(|p| derive_character_hint(&p.image_prompt, self.hint_chars));

        let mut report = IllustrationReport::default();
        for idx in order {
            let page = document.pages[idx].clone();
            let page_hint = if page.page_number > 1 { hint.as_ref() } else { None };
            let (page, outcome) = self.illustrate_page(page, page_hint, &document.title).await;
            document.pages[idx] = page;
            report.record(outcome);
        }

        info!(
            "Image generation complete: {} generated, {} placeholder, {} failed",
            report.generated, report.placeholder, report.failed
        );
        info!(
            "Final check: {}/{} pages have image URLs, {} from the image model",
            document.pages_with_images(),
            document.pages.len(),
            self.model_images(document)
        );
        report
    }

    /// Pages whose `image_url` is set and is not one of our placeholders.
    pub fn model_images(&self, document: &StoryDocument) -> usize {
        document
            .pages
            .iter()
            .filter_map(|p| p.image_url.as_deref())
            .filter(|url| !self.placeholders.is_placeholder(url))
            .count()
    }

    /// Illustrates one page in isolation. Always returns the page with
    /// `image_url` set, either to the model's URL or to a placeholder.
    pub async fn illustrate_page(
        &self,
        mut page: StoryPage,
        hint: Option<&CharacterHint>,
        story_title: &str,
    ) -> (StoryPage, PageOutcome) {
        let n = page.page_number;
        info!("[Page {}] Generating image...", n);

        if !page.has_image_prompt() {
            warn!("[Page {}] No image_prompt found, using static placeholder", n);
            page.image_url = Some(self.placeholders.url_for(n));
            return (page, PageOutcome::Placeholder);
        }

        let context = StoryContext { title: story_title, scene: &page.body_text };
        let enhanced = enhance_image_prompt(&page.image_prompt, n, hint, Some(context));
        info!("[Page {}] Enhanced prompt: {}", n, preview(&enhanced, 120));

        let prompt = match &self.rewriter {
            Some(rewriter) => rewriter.rewrite(&enhanced).await,
            None => enhanced,
        };

        let result = tokio::time::timeout(self.timeout, self.image.generate(&prompt))
            .await
            .unwrap_or_else(|_| Err(ModelCallError::Timeout(self.timeout.as_secs())));

        let outcome = match result {
            Ok(Some(url)) => {
                info!("[Page {}] Image generated: {}", n, preview(&url, 50));
                page.image_url = Some(url);
                return (page, PageOutcome::Generated);
            }
            Ok(None) => {
                warn!("[Page {}] No URL in response, using static placeholder", n);
                PageOutcome::Failed
            }
            Err(e) if e.is_content_policy() => {
                warn!("[Page {}] Prompt rejected by content policy: {}", n, e);
                PageOutcome::Failed
            }
            Err(e) => {
                error!("[Page {}] Failed to generate image: {}", n, e);
                PageOutcome::Failed
            }
        };

        info!("[Page {}] Falling back to static placeholder", n);
        page.image_url = Some(self.placeholders.url_for(n));
        (page, outcome)
    }
}
