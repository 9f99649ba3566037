use crate::core::story::StoryDocument;
use log::info;

pub const PALETTE: [&str; 5] = ["4A90E2", "50C878", "FF6B6B", "FFD93D", "6C5CE7"];
pub const DEFAULT_PLACEHOLDER_HOST: &str = "https://via.placeholder.com";

/// Deterministic, network-free artwork references used when illustration is
/// skipped or fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderPolicy {
    host: String,
}

impl Default for PlaceholderPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_HOST)
    }
}

impl PlaceholderPolicy {
    pub fn new(host: &str) -> Self {
        Self { host: host.trim_end_matches('/').to_string() }
    }

    pub fn color_for(page_number: u32) -> &'static str {
        let index = page_number.saturating_sub(1) as usize % PALETTE.len();
        PALETTE[index]
    }

    pub fn url_for(&self, page_number: u32) -> String {
        format!(
            "{}/1024x1024/{}/FFFFFF?text=Page+{}",
            self.host,
            Self::color_for(page_number),
            page_number
        )
    }

    pub fn is_placeholder(&self, url: &str) -> bool {
        url.starts_with(&format!("{}/", self.host))
    }

    pub fn assign_all(&self, document: &mut StoryDocument) {
        for page in &mut document.pages {
            page.image_url = Some(self.url_for(page.page_number));
            info!("[Page {}] Assigned static placeholder URL", page.page_number);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::story::sample_document;

    #[test]
    fn test_color_cycles_by_page() {
        for n in 1..=10u32 {
            assert_eq!(PlaceholderPolicy::color_for(n), PALETTE[((n - 1) % 5) as usize]);
        }
        assert_eq!(PlaceholderPolicy::color_for(1), "4A90E2");
        assert_eq!(PlaceholderPolicy::color_for(6), "4A90E2");
    }

    #[test]
    fn test_url_template() {
        let policy = PlaceholderPolicy::default();
        assert_eq!(
            policy.url_for(3),
            "https://via.placeholder.com/1024x1024/FF6B6B/FFFFFF?text=Page+3"
        );
        assert_eq!(policy.url_for(3), policy.url_for(3));
    }

    #[test]
    fn test_custom_host_trailing_slash() {
        let policy = PlaceholderPolicy::new("https://placehold.example/");
        assert_eq!(
            policy.url_for(1),
            "https://placehold.example/1024x1024/4A90E2/FFFFFF?text=Page+1"
        );
        assert!(policy.is_placeholder(&policy.url_for(1)));
        assert!(!policy.is_placeholder("https://images.example/fox.png"));
    }

    #[test]
    fn test_assign_all() {
        let policy = PlaceholderPolicy::default();
        let mut doc = sample_document();
        policy.assign_all(&mut doc);
        for page in &doc.pages {
            assert_eq!(page.image_url.as_deref(), Some(policy.url_for(page.page_number).as_str()));
        }
    }
}
