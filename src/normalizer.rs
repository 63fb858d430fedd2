use std::ops::Deref;
use tracing::debug;

use crate::TARGET_LLM_REQUEST;

/// Literal token the delimited prompt asks the model to put between tweets.
pub const TWEET_SEPARATOR_TOKEN: &str = "---";

/// How a completion is split into tweet candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SeparatorStrategy {
    /// One tweet per line.
    Newline,
    /// Tweets separated by the literal `---` token.
    Token,
}

impl SeparatorStrategy {
    pub fn token(&self) -> &'static str {
        match self {
            SeparatorStrategy::Newline => "\n",
            SeparatorStrategy::Token => TWEET_SEPARATOR_TOKEN,
        }
    }
}

/// Ordered list of trimmed, non-empty tweets produced from one completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TweetList {
    tweets: Vec<String>,
    fallback: bool,
}

impl TweetList {
    /// True when the model produced nothing usable and the list holds the filler tweet.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tweets
    }
}

impl Deref for TweetList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.tweets
    }
}

/// Placeholder tweet used when a completion yields no usable segments.
pub fn fallback_tweet(topic: &str) -> String {
    format!(
        "Everything is OK with {}! Nothing new to report right now, stay tuned for more updates.",
        topic
    )
}

/// Turns a raw completion into at most `count` tweets.
///
/// Segments are split on `separator`, trimmed, and empty ones dropped. Extra
/// segments are truncated; when the model underproduces, the segments already
/// collected are repeated cyclically from the start until `count` is reached.
/// A completion with no usable segments becomes a single filler tweet naming
/// `topic`, with any separator occurrences in the topic replaced by a space.
pub fn normalize(
    raw_text: &str,
    count: usize,
    separator: SeparatorStrategy,
    topic: &str,
) -> TweetList {
    if count == 0 {
        return TweetList::default();
    }

    let segments: Vec<String> = raw_text
        .split(separator.token())
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .take(count)
        .map(str::to_string)
        .collect();

    if segments.is_empty() {
        debug!(target: TARGET_LLM_REQUEST, "Completion had no usable segments, using filler tweet for '{}'", topic);
        // The filler is an entry like any other, so it must not carry the separator either.
        let topic = topic.replace(separator.token(), " ");
        return TweetList {
            tweets: vec![fallback_tweet(topic.trim())],
            fallback: true,
        };
    }

    let produced = segments.len();
    if produced < count {
        debug!(
            target: TARGET_LLM_REQUEST,
            "Model produced {} of {} tweets, repeating to fill", produced, count
        );
    }

    let tweets = segments.iter().cycle().take(count).cloned().collect();

    TweetList {
        tweets,
        fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_to_count() {
        let list = normalize("A\nB\nC\nD\nE", 3, SeparatorStrategy::Newline, "letters");
        assert_eq!(&*list, &["A", "B", "C"]);
        assert!(!list.is_fallback());
    }

    #[test]
    fn test_pads_cyclically() {
        let list = normalize("X---Y", 5, SeparatorStrategy::Token, "xy");
        assert_eq!(&*list, &["X", "Y", "X", "Y", "X"]);
    }

    #[test]
    fn test_padding_repeats_from_start_of_kept_entries() {
        let list = normalize("  one \n\n two\n   \nthree  ", 7, SeparatorStrategy::Newline, "n");
        assert_eq!(
            list.into_vec(),
            vec!["one", "two", "three", "one", "two", "three", "one"]
        );
    }

    #[test]
    fn test_empty_completion_uses_filler() {
        let list = normalize("", 5, SeparatorStrategy::Newline, "Mars");
        assert_eq!(list.len(), 1);
        assert!(list.is_fallback());
        assert!(list[0].contains("Mars"));
    }

    #[test]
    fn test_whitespace_only_completion_uses_filler() {
        let list = normalize(" \n\t\n  --- \n", 4, SeparatorStrategy::Token, "Deep Sea Fish");
        assert_eq!(list.len(), 1);
        assert!(list[0].contains("Deep Sea Fish"));
    }

    #[test]
    fn test_filler_never_contains_separator() {
        let list = normalize("   ", 3, SeparatorStrategy::Token, "before---after");
        assert!(list.is_fallback());
        assert!(!list[0].contains(TWEET_SEPARATOR_TOKEN));
        assert!(list[0].contains("before after"));

        let list = normalize("", 3, SeparatorStrategy::Token, "a-----b");
        assert!(!list[0].contains(TWEET_SEPARATOR_TOKEN));

        let list = normalize("\n\n", 2, SeparatorStrategy::Newline, "line\nbreak");
        assert!(!list[0].contains('\n'));
        assert!(list[0].contains("line break"));
    }

    #[test]
    fn test_filler_keeps_plain_topic_verbatim() {
        let list = normalize("", 1, SeparatorStrategy::Newline, "Rust - the language");
        assert_eq!(list[0], fallback_tweet("Rust - the language"));
    }

    #[test]
    fn test_zero_count_is_empty() {
        let list = normalize("A\nB", 0, SeparatorStrategy::Newline, "t");
        assert!(list.is_empty());
        let list = normalize("", 0, SeparatorStrategy::Newline, "t");
        assert!(list.is_empty());
    }

    #[test]
    fn test_entries_are_trimmed_and_free_of_separator() {
        let raw = "\n  first tweet  ---second\ttweet\n---\n\n---   third---fourth----fifth ";
        for separator in [SeparatorStrategy::Newline, SeparatorStrategy::Token] {
            for count in 1..=20 {
                let list = normalize(raw, count, separator, "topic");
                assert!(list.len() <= count);
                for entry in list.iter() {
                    assert_eq!(entry.trim(), entry.as_str());
                    assert!(!entry.is_empty());
                    assert!(!entry.contains(separator.token()));
                }
            }
        }
    }

    #[test]
    fn test_token_split_keeps_newlines_inside_tweets() {
        let list = normalize("line one\nline two---next", 2, SeparatorStrategy::Token, "t");
        assert_eq!(&*list, &["line one\nline two", "next"]);
    }

    #[test]
    fn test_end_to_end_token_example() {
        let list = normalize("tip1---tip2---tip3---tip4---tip5", 4, SeparatorStrategy::Token, "AI");
        assert_eq!(&*list, &["tip1", "tip2", "tip3", "tip4"]);
    }

    #[test]
    fn test_count_larger_than_form_bound() {
        let list = normalize("a\nb", 25, SeparatorStrategy::Newline, "t");
        assert_eq!(list.len(), 25);
        assert_eq!(list[24], "a");
    }
}
