//! Twitter recent-search producer (API v2, bearer token auth)

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::{http_client, resolve_api_key};
use crate::domain::config::ProducerConfig;
use crate::domain::error::{BotError, BotResult};
use crate::domain::traits::ContentProducer;
use crate::domain::types::Article;

pub const NAME: &str = "twitter";
const DEFAULT_ENDPOINT: &str = "https://api.twitter.com/2";
// Bounds accepted by `max_results` on the recent search endpoint
const MIN_RESULTS: usize = 10;
const MAX_RESULTS: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
}

pub struct TwitterProducer {
    client: reqwest::Client,
    endpoint: String,
    bearer_token: String,
}

pub fn build(config: &ProducerConfig) -> BotResult<Arc<dyn ContentProducer>> {
    let bearer_token = resolve_api_key(NAME, config)?;
    let client = http_client(NAME, config)?;
    Ok(Arc::new(TwitterProducer {
        client,
        endpoint: config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        bearer_token,
    }))
}

fn build_query(topic: &str, language: &str) -> String {
    format!("({topic}) lang:{language} -is:retweet")
}

#[async_trait]
impl ContentProducer for TwitterProducer {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, topic: &str, limit: usize, language: &str) -> BotResult<Vec<Article>> {
        let url = format!("{}/tweets/search/recent", self.endpoint.trim_end_matches('/'));
        let max_results = limit.clamp(MIN_RESULTS, MAX_RESULTS).to_string();
        let query = build_query(topic, language);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[("query", query.as_str()), ("max_results", max_results.as_str())])
            .send()
            .await
            .map_err(|e| BotError::producer(NAME, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::producer(NAME, format!("HTTP {status}: {body}")));
        }

        let body: SearchResponse = resp.json().await.map_err(|e| BotError::producer(NAME, e))?;
        tracing::debug!(count = body.data.len(), query, "Twitter search returned");

        Ok(body
            .data
            .into_iter()
            .map(|t| {
                Article::new(t.text).with_url(format!("https://twitter.com/i/web/status/{}", t.id))
            })
            .collect())
    }
}
