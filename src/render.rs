use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;

use crate::normalizer::TweetList;
use crate::request::{DEFAULT_TWEETS, MAX_TWEETS, MIN_TWEETS};

/// A tweet annotated for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TweetCard {
    /// 1-based position in the list.
    pub index: usize,
    pub text: String,
    /// Unicode scalar values, not bytes.
    pub char_count: usize,
}

pub fn cards(tweets: &TweetList) -> Vec<TweetCard> {
    tweets
        .iter()
        .enumerate()
        .map(|(i, text)| TweetCard {
            index: i + 1,
            text: text.clone(),
            char_count: text.chars().count(),
        })
        .collect()
}

pub fn render_terminal(topic: &str, tweets: &TweetList) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("Generated tweets on {}", topic).bold());
    if tweets.is_fallback() {
        let _ = writeln!(
            out,
            "{}",
            "The model returned nothing usable; showing a placeholder.".yellow()
        );
    }
    for card in cards(tweets) {
        let _ = writeln!(
            out,
            "\n{} {}\n{}",
            format!("#{}", card.index).cyan().bold(),
            format!("({} chars)", card.char_count).dimmed(),
            card.text
        );
    }
    out
}

/// Escapes text for use in HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// What the page shows below the form.
pub enum PageBody<'a> {
    Empty,
    Warning(&'a str),
    Error(&'a str),
    Tweets(&'a TweetList),
}

/// Values the form is pre-filled with.
pub struct FormValues<'a> {
    pub topic: &'a str,
    pub count: usize,
    pub language: Option<&'a str>,
}

impl Default for FormValues<'_> {
    fn default() -> Self {
        Self {
            topic: "",
            count: DEFAULT_TWEETS,
            language: None,
        }
    }
}

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; color: #fff;
  background: linear-gradient(90deg, #ff6f61, #ffb88c, #6b7280, #60a5fa) fixed; }
h1 { text-align: center; text-shadow: 0 0 8px rgba(255,255,255,0.6); }
input, select { background: rgba(0,0,0,0.35); color: #fff; border: 1px solid rgba(255,255,255,0.45);
  border-radius: 8px; padding: 10px; font-size: 1.1rem; }
button { background: rgba(255,255,255,0.15); color: #fff; border: 2px solid rgba(255,255,255,0.7);
  padding: 0.6rem 2.5rem; border-radius: 8px; font-weight: bold; }
.tweet-card { background: rgba(255,255,255,0.18); border-left: 4px solid rgba(255,255,255,0.8);
  padding: 15px 20px; margin: 15px 0; border-radius: 8px; white-space: pre-wrap; }
.meta { font-size: 0.8rem; opacity: 0.8; }
.warning { background: rgba(234,179,8,0.4); padding: 10px; border-radius: 8px; }
.error { background: rgba(220,38,38,0.5); padding: 10px; border-radius: 8px; }
"#;

/// Renders the whole form page.
pub fn render_page(
    languages: &[String],
    show_language: bool,
    values: &FormValues<'_>,
    body: PageBody<'_>,
) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Tweet Generator</title><style>{}</style></head><body>",
        STYLE
    );
    html.push_str("<h1>Tweet Generator</h1>");
    html.push_str("<form method=\"post\" action=\"/generate\">");
    let _ = write!(
        html,
        "<p><label>Topic name <input name=\"topic\" value=\"{}\" placeholder=\"e.g. Quantum Computing\"></label></p>",
        escape_html(values.topic)
    );
    let _ = write!(
        html,
        "<p><label>No. of tweets <input type=\"number\" name=\"count\" min=\"{}\" max=\"{}\" step=\"1\" value=\"{}\"></label></p>",
        MIN_TWEETS, MAX_TWEETS, values.count
    );
    if show_language {
        html.push_str("<p><label>Language <select name=\"language\">");
        for language in languages {
            let selected = if values.language == Some(language.as_str()) {
                " selected"
            } else {
                ""
            };
            let escaped = escape_html(language);
            let _ = write!(
                html,
                "<option value=\"{}\"{}>{}</option>",
                escaped, selected, escaped
            );
        }
        html.push_str("</select></label></p>");
    }
    html.push_str("<button type=\"submit\">Generate</button></form><hr>");

    match body {
        PageBody::Empty => {}
        PageBody::Warning(message) => {
            let _ = write!(html, "<p class=\"warning\">{}</p>", escape_html(message));
        }
        PageBody::Error(message) => {
            let _ = write!(html, "<p class=\"error\">{}</p>", escape_html(message));
        }
        PageBody::Tweets(tweets) => {
            html.push_str("<h4>Generated Tweets</h4>");
            for card in cards(tweets) {
                let _ = write!(
                    html,
                    "<div class=\"tweet-card\"><div class=\"meta\">#{} &middot; {} chars</div>{}</div>",
                    card.index,
                    card.char_count,
                    escape_html(&card.text)
                );
            }
        }
    }

    html.push_str("</body></html>");
    html
}
