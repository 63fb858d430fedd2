use serde::Serialize;
use std::ops::RangeInclusive;
use thiserror::Error;

pub const MIN_TWEETS: usize = 1;
pub const MAX_TWEETS: usize = 20;
pub const DEFAULT_TWEETS: usize = 5;
pub const DEFAULT_LANGUAGE: &str = "English";

/// Languages offered when `TWEET_LANGUAGES` is not set.
pub const DEFAULT_LANGUAGES: &[&str] = &["English", "Spanish", "French", "Hindi", "German"];

pub fn tweet_count_range() -> RangeInclusive<usize> {
    MIN_TWEETS..=MAX_TWEETS
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Please enter a topic first.")]
    EmptyTopic,

    #[error("Number of tweets must be between 1 and 20, got {0}")]
    CountOutOfRange(usize),
}

/// One validated form submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    topic: String,
    count: usize,
    language: Option<String>,
}

impl GenerationRequest {
    /// Validates a submission. The topic is trimmed; a blank language is treated as absent.
    pub fn new(
        topic: &str,
        count: usize,
        language: Option<&str>,
    ) -> Result<Self, RequestError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(RequestError::EmptyTopic);
        }
        if !tweet_count_range().contains(&count) {
            return Err(RequestError::CountOutOfRange(count));
        }

        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);

        Ok(Self {
            topic: topic.to_string(),
            count,
            language,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}
