//! Message format detection and escaping.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::telegram::ParseMode;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref MARKDOWN_MARKUP: Regex =
        Regex::new(r"\*[^*]+\*|_[^_]+_|\[[^\]]+\]\([^)]+\)").unwrap();
}

/// Characters prefixed with a backslash by markdown escaping.
const MARKDOWN_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    Plain,
    Html,
    Markdown,
}

impl MessageFormat {
    /// Classify text by the markup it appears to contain.
    ///
    /// Checked in order: an HTML tag, then markdown emphasis or a link. This is a
    /// loose heuristic; an unclosed or nonsensical tag still counts as HTML.
    pub fn detect(text: &str) -> Self {
        if HTML_TAG.is_match(text) {
            MessageFormat::Html
        } else if MARKDOWN_MARKUP.is_match(text) {
            MessageFormat::Markdown
        } else {
            MessageFormat::Plain
        }
    }

    /// Use the explicit format if it names a known one, otherwise detect it.
    pub fn resolve(explicit: Option<&str>, text: &str) -> Self {
        match explicit.map(str::parse::<MessageFormat>) {
            Some(Ok(format)) => format,
            Some(Err(unknown)) => {
                tracing::debug!(format = %unknown, "Unrecognized format, detecting from content");
                Self::detect(text)
            }
            None => Self::detect(text),
        }
    }

    /// Escape `text` so the platform renders it literally in this format.
    pub fn escape(&self, text: &str) -> String {
        match self {
            MessageFormat::Plain => text.to_string(),
            MessageFormat::Html => escape_html(text),
            MessageFormat::Markdown => escape_markdown(text),
        }
    }

    pub fn parse_mode(&self) -> Option<ParseMode> {
        match self {
            MessageFormat::Plain => None,
            MessageFormat::Html => Some(ParseMode::Html),
            MessageFormat::Markdown => Some(ParseMode::MarkdownV2),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Plain => "plain",
            MessageFormat::Html => "html",
            MessageFormat::Markdown => "markdown",
        }
    }
}

impl FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(MessageFormat::Plain),
            "html" => Ok(MessageFormat::Html),
            "markdown" | "md" => Ok(MessageFormat::Markdown),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `&` must be replaced first so the entities introduced for `<` and `>` stay intact.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
