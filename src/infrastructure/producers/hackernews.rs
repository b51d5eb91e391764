//! Hacker News producer backed by the Algolia search API. No credentials required.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::http_client;
use crate::domain::config::ProducerConfig;
use crate::domain::error::{BotError, BotResult};
use crate::domain::traits::ContentProducer;
use crate::domain::types::Article;

pub const NAME: &str = "hackernews";
const DEFAULT_ENDPOINT: &str = "https://hn.algolia.com/api/v1";
const DEFAULT_TAGS: &str = "story";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

pub struct HackerNewsProducer {
    client: reqwest::Client,
    endpoint: String,
    tags: String,
}

pub fn build(config: &ProducerConfig) -> BotResult<Arc<dyn ContentProducer>> {
    let tags = config
        .extra
        .get("tags")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_TAGS)
        .to_string();
    Ok(Arc::new(HackerNewsProducer {
        client: http_client(NAME, config)?,
        endpoint: config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        tags,
    }))
}

/// Algolia has no OR operator; the fragments become optional words instead.
fn search_terms(topic: &str) -> String {
    topic
        .split(" OR ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Hit {
    fn into_article(self) -> Option<Article> {
        let title = self.title.filter(|t| !t.is_empty())?;
        let url = self
            .url
            .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", self.object_id));
        Some(Article::new(title).with_url(url))
    }
}

#[async_trait]
impl ContentProducer for HackerNewsProducer {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, topic: &str, limit: usize, language: &str) -> BotResult<Vec<Article>> {
        if language != "en" {
            tracing::debug!(language, "Hacker News only carries English stories");
        }

        let url = format!("{}/search", self.endpoint.trim_end_matches('/'));
        let terms = search_terms(topic);
        let hits_per_page = limit.to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("query", terms.as_str()),
                ("optionalWords", terms.as_str()),
                ("tags", self.tags.as_str()),
                ("hitsPerPage", hits_per_page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BotError::producer(NAME, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BotError::producer(NAME, format!("HTTP {status}")));
        }

        let body: SearchResponse = resp.json().await.map_err(|e| BotError::producer(NAME, e))?;
        Ok(body.hits.into_iter().filter_map(Hit::into_article).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_terms() {
        assert_eq!(search_terms("rockets OR mars landing"), "rockets mars landing");
        assert_eq!(search_terms("general news"), "general news");
    }

    #[test]
    fn test_hits_become_articles() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"hits":[
                {"objectID":"1","title":"Rocket lands","url":"https://example.com/r"},
                {"objectID":"2","title":"Ask HN: rockets?","url":null},
                {"objectID":"3","title":null}
            ]}"#,
        )
        .unwrap();
        let articles: Vec<Article> = body.hits.into_iter().filter_map(Hit::into_article).collect();
        assert_eq!(
            articles,
            vec![
                Article::new("Rocket lands").with_url("https://example.com/r"),
                Article::new("Ask HN: rockets?").with_url("https://news.ycombinator.com/item?id=2"),
            ]
        );
    }

    #[test]
    fn test_tags_from_extra() {
        let mut config = ProducerConfig::default();
        config
            .extra
            .insert("tags".to_string(), serde_yaml::Value::String("show_hn".to_string()));
        assert!(build(&config).is_ok());
    }
}
