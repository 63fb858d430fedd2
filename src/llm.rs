use async_openai::types::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    CreateChatCompletionResponse,
};
use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest as OllamaRequest;
use ollama_rs::generation::completion::GenerationResponse as OllamaResponse;
use ollama_rs::generation::options::GenerationOptions;
use ollama_rs::Ollama;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::environment::{ProviderKind, Settings};
use crate::error::GenerationError;
use crate::gemini::GeminiClient;
use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

/// Anything that turns a prompt into completion text.
///
/// Adapters always hand back a plain string, whatever shape the underlying SDK returns.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Short description used in log lines.
    fn describe(&self) -> String;
}

impl LLMParams {
    /// Builds the one client used for the lifetime of the process.
    pub fn from_settings(settings: &Settings) -> Result<Self, GenerationError> {
        let llm_client = match settings.provider {
            ProviderKind::Gemini => {
                let api_key = settings.require_api_key()?;
                LLMClient::Gemini(GeminiClient::new(&settings.gemini_api_base, api_key))
            }
            ProviderKind::OpenAI => {
                let api_key = settings.require_api_key()?;
                let config = OpenAIConfig::new().with_api_key(api_key);
                LLMClient::OpenAI(OpenAIClient::with_config(config))
            }
            ProviderKind::Ollama => {
                info!(
                    "Connecting to Ollama at {}:{}",
                    settings.ollama_host, settings.ollama_port
                );
                LLMClient::Ollama(Ollama::new(
                    settings.ollama_host.clone(),
                    settings.ollama_port,
                ))
            }
        };

        Ok(Self {
            llm_client,
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout: settings.timeout,
        })
    }
}

#[async_trait]
impl TextGenerator for LLMParams {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        generate_llm_response(prompt, self).await
    }

    fn describe(&self) -> String {
        let provider = match self.llm_client {
            LLMClient::Gemini(_) => "gemini",
            LLMClient::OpenAI(_) => "openai",
            LLMClient::Ollama(_) => "ollama",
        };
        format!("{}/{}", provider, self.model)
    }
}

/// Sends a single prompt to the configured provider. Failures and timeouts are
/// returned as `GenerationError::Provider`; nothing is retried.
pub async fn generate_llm_response(
    prompt: &str,
    params: &LLMParams,
) -> Result<String, GenerationError> {
    debug!(target: TARGET_LLM_REQUEST, "Sending LLM request with prompt: {}", prompt);
    let start = Instant::now();

    let result = match &params.llm_client {
        LLMClient::Gemini(client) => {
            timeout(
                params.timeout,
                client.generate(&params.model, prompt, params.temperature),
            )
            .await
        }
        LLMClient::OpenAI(client) => timeout(params.timeout, openai_completion(client, prompt, params)).await,
        LLMClient::Ollama(ollama) => timeout(params.timeout, ollama_completion(ollama, prompt, params)).await,
    };

    match result {
        Ok(Ok(text)) => {
            debug!(
                target: TARGET_LLM_REQUEST,
                "LLM response received in {:?}: {}", start.elapsed(), text
            );
            Ok(text)
        }
        Ok(Err(e)) => {
            warn!(target: TARGET_LLM_REQUEST, "Error generating response: {}", e);
            Err(e)
        }
        Err(_) => {
            error!(
                target: TARGET_LLM_REQUEST,
                "LLM request timed out after {:?}", params.timeout
            );
            Err(GenerationError::provider(format!(
                "request timed out after {} seconds",
                params.timeout.as_secs()
            )))
        }
    }
}

async fn openai_completion(
    client: &OpenAIClient<OpenAIConfig>,
    prompt: &str,
    params: &LLMParams,
) -> Result<String, GenerationError> {
    let request = CreateChatCompletionRequestArgs::default()
        .model(params.model.as_str())
        .temperature(params.temperature)
        .messages([ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?
            .into()])
        .build()?;

    let response = client.chat().create(request).await?;
    Ok(openai_text(response))
}

/// Text of the first choice. A missing choice or content is an empty completion.
fn openai_text(response: CreateChatCompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default()
}

async fn ollama_completion(
    ollama: &Ollama,
    prompt: &str,
    params: &LLMParams,
) -> Result<String, GenerationError> {
    let mut request = OllamaRequest::new(params.model.clone(), prompt.to_string());
    request.options = Some(GenerationOptions::default().temperature(params.temperature));

    let response = ollama.generate(request).await?;
    Ok(ollama_text(response))
}

fn ollama_text(response: OllamaResponse) -> String {
    response.response
}
