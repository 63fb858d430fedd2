// prompts.rs

use anyhow::{bail, Result};

use crate::normalizer::{SeparatorStrategy, TWEET_SEPARATOR_TOKEN};
use crate::request::{GenerationRequest, DEFAULT_LANGUAGE};

const NUMBER_PLACEHOLDER: &str = "{number}";
const TOPIC_PLACEHOLDER: &str = "{topic}";
const NAME_PLACEHOLDER: &str = "{name}";
const LANGUAGE_PLACEHOLDER: &str = "{language}";

const PLAIN_TEMPLATE: &str = "Give me {number} tweets on the topic {topic}";

const LOCALIZED_TEMPLATE: &str = "Give me {number} tweets on the topic {name} in {language}";

const DELIMITED_TEMPLATE: &str = "Write {number} tweets about {topic} in {language}.

Each tweet must be under 280 characters. Put a line containing only --- between consecutive
tweets. Do not number the tweets, do not add a title, and do not tell me what you're doing.";

/// A prompt with `{number}`, `{topic}` (or `{name}`) and optional `{language}` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: &str) -> Result<Self> {
        if !text.contains(NUMBER_PLACEHOLDER) {
            bail!("Prompt template is missing the {} placeholder", NUMBER_PLACEHOLDER);
        }
        if !text.contains(TOPIC_PLACEHOLDER) && !text.contains(NAME_PLACEHOLDER) {
            bail!(
                "Prompt template is missing the {} or {} placeholder",
                TOPIC_PLACEHOLDER,
                NAME_PLACEHOLDER
            );
        }
        Ok(Self {
            text: text.to_string(),
        })
    }

    pub fn uses_language(&self) -> bool {
        self.text.contains(LANGUAGE_PLACEHOLDER)
    }

    /// Substitutes placeholders in one pass, so values containing braces are copied verbatim.
    pub fn render(&self, number: usize, topic: &str, language: Option<&str>) -> String {
        let number = number.to_string();
        let language = language.unwrap_or(DEFAULT_LANGUAGE);

        let mut rendered = String::with_capacity(self.text.len() + topic.len());
        let mut rest = self.text.as_str();
        while let Some(start) = rest.find('{') {
            rendered.push_str(&rest[..start]);
            rest = &rest[start..];
            let value = [
                (NUMBER_PLACEHOLDER, number.as_str()),
                (TOPIC_PLACEHOLDER, topic),
                (NAME_PLACEHOLDER, topic),
                (LANGUAGE_PLACEHOLDER, language),
            ]
            .into_iter()
            .find(|(placeholder, _)| rest.starts_with(placeholder));

            match value {
                Some((placeholder, value)) => {
                    rendered.push_str(value);
                    rest = &rest[placeholder.len()..];
                }
                None => {
                    rendered.push('{');
                    rest = &rest[1..];
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

/// The built-in prompts, each paired with the separator its completions use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PromptVariant {
    /// One tweet per line, no language.
    Plain,
    /// One tweet per line in the requested language.
    #[default]
    Localized,
    /// Tweets separated by `---` in the requested language.
    Delimited,
}

impl PromptVariant {
    pub fn template(&self) -> PromptTemplate {
        let text = match self {
            PromptVariant::Plain => PLAIN_TEMPLATE,
            PromptVariant::Localized => LOCALIZED_TEMPLATE,
            PromptVariant::Delimited => DELIMITED_TEMPLATE,
        };
        PromptTemplate {
            text: text.to_string(),
        }
    }

    pub fn separator(&self) -> SeparatorStrategy {
        match self {
            PromptVariant::Plain | PromptVariant::Localized => SeparatorStrategy::Newline,
            PromptVariant::Delimited => SeparatorStrategy::Token,
        }
    }
}

/// A template together with the separator used to split what the model returns for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TweetPrompt {
    pub template: PromptTemplate,
    pub separator: SeparatorStrategy,
}

impl TweetPrompt {
    pub fn custom(text: &str, separator: SeparatorStrategy) -> Result<Self> {
        let template = PromptTemplate::new(text)?;
        if separator == SeparatorStrategy::Token && !text.contains(TWEET_SEPARATOR_TOKEN) {
            bail!(
                "Prompt template uses the token separator but never mentions {}",
                TWEET_SEPARATOR_TOKEN
            );
        }
        Ok(Self {
            template,
            separator,
        })
    }

    pub fn build(&self, request: &GenerationRequest) -> String {
        self.template
            .render(request.count(), request.topic(), request.language())
    }
}

impl From<PromptVariant> for TweetPrompt {
    fn from(variant: PromptVariant) -> Self {
        Self {
            template: variant.template(),
            separator: variant.separator(),
        }
    }
}

impl Default for TweetPrompt {
    fn default() -> Self {
        PromptVariant::default().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localized_prompt_matches_form_fields() {
        let request = GenerationRequest::new("Quantum Computing", 5, Some("Hindi")).unwrap();
        let prompt = TweetPrompt::from(PromptVariant::Localized).build(&request);
        assert_eq!(prompt, "Give me 5 tweets on the topic Quantum Computing in Hindi");
    }

    #[test]
    fn test_missing_language_defaults_to_english() {
        let request = GenerationRequest::new("AI", 2, None).unwrap();
        let prompt = TweetPrompt::default().build(&request);
        assert!(prompt.ends_with("in English"));
    }

    #[test]
    fn test_plain_prompt_ignores_language() {
        let request = GenerationRequest::new("AI", 2, Some("German")).unwrap();
        let prompt = TweetPrompt::from(PromptVariant::Plain).build(&request);
        assert_eq!(prompt, "Give me 2 tweets on the topic AI");
        assert!(!PromptVariant::Plain.template().uses_language());
    }

    #[test]
    fn test_delimited_prompt_instructs_separator() {
        let request = GenerationRequest::new("AI", 4, Some("French")).unwrap();
        let prompt = TweetPrompt::from(PromptVariant::Delimited);
        assert_eq!(prompt.separator, SeparatorStrategy::Token);
        let text = prompt.build(&request);
        assert!(text.starts_with("Write 4 tweets about AI in French."));
        assert!(text.contains(TWEET_SEPARATOR_TOKEN));
    }

    #[test]
    fn test_every_placeholder_occurrence_replaced() {
        let template = PromptTemplate::new("{number} on {topic}; again {topic} / {name}").unwrap();
        assert_eq!(template.render(3, "Rust", None), "3 on Rust; again Rust / Rust");
    }

    #[test]
    fn test_topic_with_placeholder_text_is_verbatim() {
        let template = PromptTemplate::new("{number} tweets on {topic} in {language}").unwrap();
        assert_eq!(
            template.render(2, "{name} and {language}", Some("Spanish")),
            "2 tweets on {name} and {language} in Spanish"
        );
    }

    #[test]
    fn test_unknown_braces_left_verbatim() {
        let template = PromptTemplate::new("{number} tweets on {topic} {style}").unwrap();
        assert_eq!(template.render(1, "tea", None), "1 tweets on tea {style}");
    }

    #[test]
    fn test_template_requires_placeholders() {
        assert!(PromptTemplate::new("tweets about {topic}").is_err());
        assert!(PromptTemplate::new("{number} tweets").is_err());
        assert!(PromptTemplate::new("{number} tweets about {name}").is_ok());
    }

    #[test]
    fn test_custom_token_prompt_must_mention_token() {
        assert!(TweetPrompt::custom("{number} tweets on {topic}", SeparatorStrategy::Token).is_err());
        assert!(TweetPrompt::custom(
            "{number} tweets on {topic}, separated by ---",
            SeparatorStrategy::Token
        )
        .is_ok());
        assert!(TweetPrompt::custom("{number} tweets on {topic}", SeparatorStrategy::Newline).is_ok());
    }
}
