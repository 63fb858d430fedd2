use std::time::Duration;
use tracing::warn;

use crate::error::GenerationError;
use crate::request::DEFAULT_LANGUAGES;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_PORT: u16 = 8080;

/// Splits a delimited variable value into trimmed, non-empty entries.
fn split_list(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Which hosted text-generation API to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    Gemini,
    #[value(name = "openai")]
    OpenAI,
    Ollama,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Some(ProviderKind::Gemini),
            "openai" => Some(ProviderKind::OpenAI),
            "ollama" => Some(ProviderKind::Ollama),
            _ => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => DEFAULT_GEMINI_MODEL,
            ProviderKind::OpenAI => DEFAULT_OPENAI_MODEL,
            ProviderKind::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }

    /// Environment variable holding the API credential, if the provider needs one.
    pub fn credential_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GOOGLE_API_KEY"),
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

/// Trimmed value of a variable, `None` when unset or blank.
fn lookup_trimmed<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an optional variable, turning a malformed value into a configuration error.
fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, GenerationError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup_trimmed(lookup, name) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| GenerationError::configuration(format!("invalid {} '{}'", name, value))),
        None => Ok(default),
    }
}

/// Form and listener settings. Parsed apart from the provider so a provider
/// misconfiguration never changes where or how the server runs.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerSettings {
    pub languages: Vec<String>,
    pub port: u16,
}

impl ServerSettings {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let languages = lookup_trimmed(&lookup, "TWEET_LANGUAGES")
            .map(|v| split_list(&v, ';'))
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect());

        let port = parse_var(&lookup, "PORT", DEFAULT_PORT).unwrap_or_else(|e| {
            warn!("{}, using port {}", e, DEFAULT_PORT);
            DEFAULT_PORT
        });

        Self { languages, port }
    }
}

/// Provider settings read once at startup.
///
/// The credential is kept as found; a missing one is reported when a client is
/// built, not here, so the process can still start and explain what is wrong.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub gemini_api_base: String,
    pub ollama_host: String,
    pub ollama_port: u16,
}

impl Settings {
    /// Builds settings from an arbitrary variable lookup. Malformed values are
    /// configuration errors rather than silent defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GenerationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup_trimmed(&lookup, name);

        let provider = match get("LLM_PROVIDER") {
            Some(value) => ProviderKind::parse(&value).ok_or_else(|| {
                GenerationError::configuration(format!(
                    "unknown LLM_PROVIDER '{}', expected gemini, openai or ollama",
                    value
                ))
            })?,
            None => ProviderKind::Gemini,
        };

        let api_key = provider.credential_var().and_then(|var| get(var));

        let temperature = parse_var(&lookup, "LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?;

        let timeout_secs = parse_var(&lookup, "LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(GenerationError::configuration(
                "LLM_TIMEOUT_SECS must be at least 1",
            ));
        }

        let ollama_port = parse_var(&lookup, "OLLAMA_PORT", DEFAULT_OLLAMA_PORT)?;

        Ok(Self {
            provider,
            api_key,
            model: get("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            temperature,
            timeout: Duration::from_secs(timeout_secs),
            gemini_api_base: get("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            ollama_host: get("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string()),
            ollama_port,
        })
    }

    /// Returns the credential, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, GenerationError> {
        match (self.provider.credential_var(), self.api_key.as_deref()) {
            (Some(_), Some(key)) => Ok(key),
            (Some(var), None) => Err(GenerationError::configuration(format!(
                "{} is not set",
                var
            ))),
            (None, _) => Ok(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_to_gemini() {
        let settings = Settings::from_lookup(lookup(&[("GOOGLE_API_KEY", "secret")])).unwrap();
        assert_eq!(settings.provider, ProviderKind::Gemini);
        assert_eq!(settings.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let settings = Settings::from_lookup(lookup(&[("GOOGLE_API_KEY", "   ")])).unwrap();
        assert_eq!(settings.api_key, None);
        let err = settings.require_api_key().unwrap_err();
        assert_eq!(
            err,
            GenerationError::Configuration("GOOGLE_API_KEY is not set".to_string())
        );
    }

    #[test]
    fn test_openai_reads_its_own_key() {
        let settings = Settings::from_lookup(lookup(&[
            ("LLM_PROVIDER", "OpenAI"),
            ("GOOGLE_API_KEY", "google"),
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_MODEL", "gpt-4o"),
            ("LLM_TEMPERATURE", "0.2"),
        ]))
        .unwrap();
        assert_eq!(settings.provider, ProviderKind::OpenAI);
        assert_eq!(settings.require_api_key().unwrap(), "sk-test");
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.temperature, 0.2);
    }

    #[test]
    fn test_ollama_needs_no_credential() {
        let settings = Settings::from_lookup(lookup(&[
            ("LLM_PROVIDER", "ollama"),
            ("OLLAMA_PORT", "11500"),
        ]))
        .unwrap();
        assert!(settings.require_api_key().is_ok());
        assert_eq!(settings.ollama_port, 11500);
        assert_eq!(settings.model, DEFAULT_OLLAMA_MODEL);
    }

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let err = Settings::from_lookup(lookup(&[("LLM_PROVIDER", "palm")])).unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    #[test]
    fn test_language_list_from_env() {
        let server =
            ServerSettings::from_lookup(lookup(&[("TWEET_LANGUAGES", "English; Japanese ;;Italian")]));
        assert_eq!(server.languages, vec!["English", "Japanese", "Italian"]);
        assert_eq!(server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_server_settings_survive_bad_provider() {
        let vars = [
            ("LLM_PROVIDER", "palm"),
            ("PORT", "9000"),
            ("TWEET_LANGUAGES", "English;Italian"),
        ];
        assert!(Settings::from_lookup(lookup(&vars)).is_err());

        let server = ServerSettings::from_lookup(lookup(&vars));
        assert_eq!(server.port, 9000);
        assert_eq!(server.languages, vec!["English", "Italian"]);
    }

    #[test]
    fn test_malformed_port_keeps_default() {
        let server = ServerSettings::from_lookup(lookup(&[("PORT", "eighty")]));
        assert_eq!(server.port, DEFAULT_PORT);
        assert_eq!(server.languages.len(), DEFAULT_LANGUAGES.len());
    }

    #[test]
    fn test_malformed_numbers_are_configuration_errors() {
        for vars in [
            [("LLM_TIMEOUT_SECS", "soon")],
            [("LLM_TIMEOUT_SECS", "0")],
            [("OLLAMA_PORT", "70000")],
            [("LLM_TEMPERATURE", "warm")],
        ] {
            let err = Settings::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, GenerationError::Configuration(_)), "{:?}", vars);
        }

        let err = Settings::from_lookup(lookup(&[("LLM_TIMEOUT_SECS", "0")])).unwrap_err();
        assert_eq!(
            err,
            GenerationError::Configuration("LLM_TIMEOUT_SECS must be at least 1".to_string())
        );
        let err = Settings::from_lookup(lookup(&[("OLLAMA_PORT", "70000")])).unwrap_err();
        assert_eq!(
            err,
            GenerationError::Configuration("invalid OLLAMA_PORT '70000'".to_string())
        );
    }
}
