use crate::core::error::ModelCallError;
use crate::services::llm::{LlmClient, ResponseFormat};
use crate::services::preview;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You rewrite image prompts for a children's picture book. \
Return only the rewritten prompt, with no preamble, quotes or explanation.";

fn rewrite_instruction(prompt: &str) -> String {
    format!(
        "Rewrite the image prompt below so it is completely safe and cheerful for young children.\n\
        - Remove any reference to harm, fear, danger, violence, sadness or frightening imagery.\n\
        - Replace unsafe verbs and phrases with happy equivalents (e.g. \"chased by\" -> \"playing with\", \
        \"lost in a dark forest\" -> \"exploring a sunny forest\").\n\
        - Keep the characters, their appearance, the setting and every art style and character \
        consistency instruction unchanged.\n\
        \n\
        Prompt:\n{}",
        prompt
    )
}

/// Never fails: on any problem the original prompt is returned unchanged.
#[derive(Debug, Clone)]
pub struct SafetyRewriter {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl SafetyRewriter {
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn rewrite(&self, prompt: &str) -> String {
        match self.try_rewrite(prompt).await {
            Ok(rewritten) => {
                debug!("Safety rewrite: {}", preview(&rewritten, 120));
                rewritten
            }
            Err(e) => {
                warn!("Safety rewrite failed, keeping original prompt: {}", e);
                prompt.to_string()
            }
        }
    }

    async fn try_rewrite(&self, prompt: &str) -> Result<String, ModelCallError> {
        let instruction = rewrite_instruction(prompt);
        let call = self.llm.chat(SYSTEM_PROMPT, &instruction, ResponseFormat::Text);
        let raw = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ModelCallError::Timeout(self.timeout.as_secs()))??;

        let cleaned = unquote(raw.trim()).trim();
        if cleaned.is_empty() {
            return Err(ModelCallError::EmptyResponse("safety rewrite returned no text".to_string()));
        }
        Ok(cleaned.to_string())
    }
}

// Drops one pair of wrapping quotes; quotes inside the prompt are left alone.
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug)]
    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    #[derive(Debug)]
    struct MockLlmClient {
        reply: Reply,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl MockLlmClient {
        fn new(reply: Reply) -> Self {
            Self { reply, prompts: Arc::new(Mutex::new(Vec::new())) }
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn chat(
            &self,
            _system: &str,
            user: &str,
            format: ResponseFormat,
        ) -> Result<String, ModelCallError> {
            assert_eq!(format, ResponseFormat::Text);
            self.prompts.lock().unwrap().push(user.to_string());
            match self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(ModelCallError::Api { status: 500, message: "boom".to_string() }),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("too late".to_string())
                }
            }
        }
    }

    fn rewriter(reply: Reply) -> (SafetyRewriter, Arc<Mutex<Vec<String>>>) {
        let llm = MockLlmClient::new(reply);
        let prompts = llm.prompts.clone();
        (SafetyRewriter::new(Arc::new(llm), Duration::from_secs(5)), prompts)
    }

    #[tokio::test]
    async fn test_rewrite_success() {
        let (rewriter, prompts) = rewriter(Reply::Text("  \"A fox playing in a sunny forest\"  "));
        let out = rewriter.rewrite("A fox chased through a dark forest").await;
        assert_eq!(out, "A fox playing in a sunny forest");

        let sent = prompts.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("A fox chased through a dark forest"));
        assert!(sent[0].contains("frightening"));
    }

    #[tokio::test]
    async fn test_rewrite_failure_returns_original() {
        let original = "A fox chased through a dark forest. Illustration style: cartoon.";
        let (rewriter, _) = rewriter(Reply::Fail);
        assert_eq!(rewriter.rewrite(original).await, original);
    }

    #[tokio::test]
    async fn test_rewrite_empty_reply_returns_original() {
        let (rewriter, _) = rewriter(Reply::Text("   "));
        assert_eq!(rewriter.rewrite("A fox").await, "A fox");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_timeout_returns_original() {
        let (rewriter, _) = rewriter(Reply::Hang);
        assert_eq!(rewriter.rewrite("A fox").await, "A fox");
    }

    #[tokio::test]
    async fn test_rewrite_keeps_inner_quotes() {
        let (plain_rewriter, _) = rewriter(Reply::Text("A fox next to a sign reading \"Hello\""));
        assert_eq!(
            plain_rewriter.rewrite("A fox").await,
            "A fox next to a sign reading \"Hello\""
        );

        let (quoted_rewriter, _) = rewriter(Reply::Text("\"A fox next to a sign reading \"Hello\"\""));
        assert_eq!(
            quoted_rewriter.rewrite("A fox").await,
            "A fox next to a sign reading \"Hello\""
        );
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"A fox\""), "A fox");
        assert_eq!(unquote("A \"fox\""), "A \"fox\"");
        assert_eq!(unquote("\"A fox"), "\"A fox");
        assert_eq!(unquote("\""), "\"");
    }
}
