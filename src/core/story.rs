use serde::{Deserialize, Serialize};

pub const PAGE_COUNT: usize = 5;
pub const MIN_AGE: u8 = 3;
pub const MAX_AGE: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRequest {
    pub title: String,
    pub story: String,
    pub target_age: u8,
    pub generate_images: bool,
}

impl StoryRequest {
    pub fn new(title: impl Into<String>, story: impl Into<String>, target_age: u8) -> Self {
        Self {
            title: title.into(),
            story: story.into(),
            target_age,
            generate_images: true,
        }
    }

    pub fn with_images(mut self, generate_images: bool) -> Self {
        self.generate_images = generate_images;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.story.trim().is_empty() {
            return Err("story must not be empty".to_string());
        }
        if !(MIN_AGE..=MAX_AGE).contains(&self.target_age) {
            return Err(format!(
                "age must be between {} and {}, got {}",
                MIN_AGE, MAX_AGE, self.target_age
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPage {
    pub page_number: u32,
    pub title: String,
    #[serde(rename = "text")]
    pub body_text: String,
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub image_prompt: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl StoryPage {
    pub fn has_image_prompt(&self) -> bool {
        !self.image_prompt.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDocument {
    #[serde(rename = "story_title")]
    pub title: String,
    pub target_age: u8,
    #[serde(default)]
    pub style: String,
    pub pages: Vec<StoryPage>,
}

impl StoryDocument {
    /// Checks the five-page shape: exactly `PAGE_COUNT` pages numbered 1..=5 in order.
    /// Anomalies are reported, never repaired.
    pub fn check_shape(&self) -> Result<(), String> {
        if self.pages.len() != PAGE_COUNT {
            return Err(format!(
                "expected {} pages, got {}",
                PAGE_COUNT,
                self.pages.len()
            ));
        }
        for (i, page) in self.pages.iter().enumerate() {
            let expected = i as u32 + 1;
            if page.page_number != expected {
                return Err(format!(
                    "page at position {} has page_number {}, expected {}",
                    i + 1,
                    page.page_number,
                    expected
                ));
            }
        }
        Ok(())
    }

    pub fn pages_with_images(&self) -> usize {
        self.pages.iter().filter(|p| p.image_url.is_some()).count()
    }
}

/// Short excerpt of page 1's image prompt, re-injected into later pages so
/// the image model keeps drawing the same character. Lives for one
/// illustration run only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterHint(String);

impl CharacterHint {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
pub(crate) fn sample_document() -> StoryDocument {
    let pages = (1..=PAGE_COUNT as u32)
        .map(|n| StoryPage {
            page_number: n,
            title: format!("Page {}", n),
            body_text: format!("Text for page {}.", n),
            emotion: "happy".to_string(),
            image_prompt: format!("A small orange fox on page {}", n),
            image_url: None,
        })
        .collect();

    StoryDocument {
        title: "The Brave Fox".to_string(),
        target_age: 6,
        style: "Disney-Pixar and Looney Toons inspired".to_string(),
        pages,
    }
}
