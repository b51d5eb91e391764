//! # Metadata Parser
//!
//! Extracts channel directives from free-text purpose fields.
//! Each line is `key: value`; anything that is not a recognized directive is inert.

use crate::domain::types::ChannelMeta;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Topic(String),
    Frequency(u32),
    Limit(u32),
    Language(String),
}

/// Parses every recognized directive in `text`, in line order.
pub fn parse_directives(text: &str) -> Vec<Directive> {
    text.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<Directive> {
    let (key, value) = line.split_once(':')?;
    let value = value.trim();
    match key.trim().to_lowercase().as_str() {
        "topic" if !value.is_empty() => Some(Directive::Topic(value.to_string())),
        "frequency" => parse_positive(value).map(Directive::Frequency),
        "limit" => parse_positive(value).map(Directive::Limit),
        "language" if is_language_code(value) => Some(Directive::Language(value.to_lowercase())),
        _ => None,
    }
}

// Zero would break the scheduler's cadence, so it is as malformed as "abc".
fn parse_positive(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|n| *n > 0)
}

fn is_language_code(value: &str) -> bool {
    value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic())
}

impl ChannelMeta {
    /// Merges the directives found in `text` into this metadata.
    pub fn apply_purpose(&mut self, text: &str) {
        for directive in parse_directives(text) {
            match directive {
                Directive::Topic(topic) => self.topics.push(topic),
                Directive::Frequency(minutes) => self.frequency_minutes = minutes,
                Directive::Limit(limit) => self.limit = limit,
                Directive::Language(code) => self.language = code,
            }
        }
    }

    /// Appends the channel's topic field as a fragment.
    pub fn apply_topic(&mut self, topic: &str) {
        let topic = topic.trim();
        if !topic.is_empty() {
            self.topics.push(topic.to_string());
        }
    }

    /// Rebuilds the directive fields from a fresh channel listing.
    pub fn rederive(&mut self, topic: &str, purpose: &str) {
        self.reset_directives();
        self.apply_topic(topic);
        self.apply_purpose(purpose);
    }
}
