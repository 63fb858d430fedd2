//! # Tweet Generator
//!
//! Generates tweets on a topic with a hosted language model, either once from
//! the command line or through a small HTML form server.
//!
//! ## Usage
//!
//! ```
//! # Five tweets on a topic, printed as numbered cards
//! GOOGLE_API_KEY=... cargo run -- generate --topic "Quantum Computing" --count 5 --language French
//!
//! # Ask for tweets separated by --- instead of one per line
//! cargo run -- --prompt delimited generate --topic "AI" --count 4
//!
//! # Serve the form on port 8080
//! cargo run -- serve --port 8080
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tracing::{info, warn};

use tweetgen::environment::{ProviderKind, ServerSettings, Settings};
use tweetgen::logging::configure_logging;
use tweetgen::prompts::{PromptVariant, TweetPrompt};
use tweetgen::render::render_terminal;
use tweetgen::request::DEFAULT_TWEETS;
use tweetgen::web::{self, AppState};
use tweetgen::{GenerationRequest, LLMParams, SeparatorStrategy, TweetGenerator};

#[derive(Parser, Debug)]
#[clap(about = "Generate tweets on a topic with a hosted language model")]
struct Cli {
    /// Built-in prompt to use
    #[clap(long, value_enum, default_value_t = PromptVariant::Localized, global = true)]
    prompt: PromptVariant,

    /// Custom prompt with {number}, {topic} (or {name}) and optional {language} placeholders
    #[clap(long, global = true)]
    template: Option<String>,

    /// How completions of the custom prompt are split into tweets
    #[clap(long, value_enum, default_value_t = SeparatorStrategy::Newline, global = true)]
    separator: SeparatorStrategy,

    /// Overrides LLM_PROVIDER
    #[clap(long, value_enum, global = true)]
    provider: Option<ProviderKind>,

    /// Overrides LLM_MODEL
    #[clap(long, global = true)]
    model: Option<String>,

    /// Overrides LLM_TEMPERATURE
    #[clap(long, global = true)]
    temperature: Option<f32>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate tweets once and print them
    Generate {
        /// Topic to tweet about
        #[clap(long)]
        topic: String,

        /// Number of tweets (1-20)
        #[clap(long, default_value_t = DEFAULT_TWEETS)]
        count: usize,

        /// Language of the tweets
        #[clap(long)]
        language: Option<String>,
    },
    /// Serve the tweet form over HTTP
    Serve {
        /// Overrides PORT
        #[clap(long)]
        port: Option<u16>,
    },
}

impl Cli {
    fn tweet_prompt(&self) -> Result<TweetPrompt> {
        match &self.template {
            Some(text) => TweetPrompt::custom(text, self.separator),
            None => Ok(self.prompt.into()),
        }
    }

    /// Command line values that take precedence over the environment.
    fn overrides(&self) -> HashMap<&'static str, String> {
        let mut overrides = HashMap::new();
        if let Some(provider) = self.provider {
            let name = match provider {
                ProviderKind::Gemini => "gemini",
                ProviderKind::OpenAI => "openai",
                ProviderKind::Ollama => "ollama",
            };
            overrides.insert("LLM_PROVIDER", name.to_string());
        }
        if let Some(model) = &self.model {
            overrides.insert("LLM_MODEL", model.clone());
        }
        if let Some(temperature) = self.temperature {
            overrides.insert("LLM_TEMPERATURE", temperature.to_string());
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_logging();

    let prompt = cli.tweet_prompt()?;
    let overrides = cli.overrides();
    let lookup = |name: &str| {
        overrides
            .get(name)
            .cloned()
            .or_else(|| env::var(name).ok())
    };
    let server = ServerSettings::from_lookup(lookup);

    // The credential is read here, once; a bad configuration still lets the
    // server start so it can explain the problem on every submission.
    let generator = match Settings::from_lookup(lookup).and_then(|settings| {
        let params = LLMParams::from_settings(&settings)?;
        info!("Using {:?} model {}", settings.provider, settings.model);
        Ok(params)
    }) {
        Ok(params) => TweetGenerator::new(Arc::new(params), prompt),
        Err(e) => {
            warn!("{}", e);
            TweetGenerator::unconfigured(e, prompt)
        }
    };

    match cli.command {
        Command::Generate {
            topic,
            count,
            language,
        } => {
            let request = GenerationRequest::new(&topic, count, language.as_deref())?;
            match generator.generate(&request).await {
                Ok(tweets) => print!("{}", render_terminal(request.topic(), &tweets)),
                Err(e) => bail!(e.user_message()),
            }
        }
        Command::Serve { port: cli_port } => {
            web::serve(
                AppState::new(generator, server.languages),
                cli_port.unwrap_or(server.port),
            )
            .await?;
        }
    }

    Ok(())
}
