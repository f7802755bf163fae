use std::sync::Arc;

use crate::{
    dto::{Draft, PolishedResult},
    gateway::{GatewayError, TextGenerator, parse_polished},
    prompt::build_prompt,
};

/// Turns drafts into polished emails through an injected model.
#[derive(Clone)]
pub struct PolishService {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl PolishService {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub const fn ai_available(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn polish(&self, draft: &Draft) -> Result<PolishedResult, GatewayError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(GatewayError::ModelUnavailable)?;

        let prompt = build_prompt(draft);
        tracing::info!(
            "Polishing draft ({} characters, tone '{}')",
            draft.char_count(),
            draft.tone
        );

        let raw = generator.generate_json(&prompt).await?;
        let polished = parse_polished(&raw)?;

        tracing::info!(
            "Draft polished, tone '{}', readability '{}'",
            polished.tone,
            polished.readability
        );
        Ok(polished)
    }
}

#[cfg(test)]
pub mod testing {
    use async_trait::async_trait;

    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use crate::gateway::{GatewayError, TextGenerator};

    /// Returns a canned reply and remembers every prompt it saw.
    pub struct FakeGenerator {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl FakeGenerator {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate_json(&self, prompt: &str) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(GatewayError::UpstreamCall)
        }
    }
}
