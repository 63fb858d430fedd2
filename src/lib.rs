pub mod environment;
pub mod error;
pub mod gemini;
pub mod generator;
pub mod llm;
pub mod logging;
pub mod normalizer;
pub mod prompts;
pub mod render;
pub mod request;
pub mod web;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;
use std::time::Duration;

pub use error::GenerationError;
pub use generator::{SubmissionGate, TweetGenerator};
pub use normalizer::{normalize, SeparatorStrategy, TweetList};
pub use request::GenerationRequest;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";

#[derive(Clone, Debug)]
pub enum LLMClient {
    Gemini(gemini::GeminiClient),
    Ollama(Ollama),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

#[derive(Clone, Debug)]
pub struct LLMParams {
    pub llm_client: LLMClient,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}
