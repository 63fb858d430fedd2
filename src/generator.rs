use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::GenerationError;
use crate::llm::TextGenerator;
use crate::normalizer::{normalize, TweetList};
use crate::prompts::TweetPrompt;
use crate::request::GenerationRequest;
use crate::TARGET_LLM_REQUEST;

/// Call boundary between the UI and the text-generation provider.
///
/// Constructed once at startup. An unconfigured generator still exists so the
/// UI can run, but every attempt fails with the configuration error it was
/// built with and the provider is never called.
#[derive(Clone)]
pub struct TweetGenerator {
    backend: Result<Arc<dyn TextGenerator>, GenerationError>,
    prompt: TweetPrompt,
}

impl TweetGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>, prompt: TweetPrompt) -> Self {
        Self {
            backend: Ok(backend),
            prompt,
        }
    }

    pub fn unconfigured(err: GenerationError, prompt: TweetPrompt) -> Self {
        Self {
            backend: Err(err),
            prompt,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_ok()
    }

    pub fn prompt(&self) -> &TweetPrompt {
        &self.prompt
    }

    /// Builds the prompt, calls the provider once and normalizes the completion.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<TweetList, GenerationError> {
        let backend = match &self.backend {
            Ok(backend) => backend,
            Err(err) => {
                warn!("Rejecting generation for '{}': {}", request.topic(), err);
                return Err(err.clone());
            }
        };

        let prompt = self.prompt.build(request);
        info!(
            target: TARGET_LLM_REQUEST,
            "Generating {} tweets on '{}' with {}",
            request.count(),
            request.topic(),
            backend.describe()
        );

        let completion = backend.generate(&prompt).await.map_err(|e| {
            error!(target: TARGET_LLM_REQUEST, "Generation failed for '{}': {}", request.topic(), e);
            e
        })?;

        let tweets = normalize(
            &completion,
            request.count(),
            self.prompt.separator,
            request.topic(),
        );

        info!(
            target: TARGET_LLM_REQUEST,
            "Produced {} tweets on '{}'{}",
            tweets.len(),
            request.topic(),
            if tweets.is_fallback() { " (filler)" } else { "" }
        );

        Ok(tweets)
    }
}

/// Allows at most one submission in flight.
#[derive(Clone, Debug, Default)]
pub struct SubmissionGate {
    busy: Arc<AtomicBool>,
}

/// Held while a submission is being processed; dropping it reopens the gate.
#[derive(Debug)]
pub struct SubmissionPermit {
    busy: Arc<AtomicBool>,
}

impl SubmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` while another submission holds the permit.
    pub fn try_acquire(&self) -> Option<SubmissionPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmissionPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for SubmissionPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
