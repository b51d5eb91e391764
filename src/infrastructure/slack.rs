//! # Slack Service Adapter
//!
//! Implements the `Transport` trait for Slack.
//! Events arrive over the RTM websocket and are buffered by a reader task; listings and
//! posts go through the Web API.

use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::domain::error::{BotError, BotResult};
use crate::domain::traits::Transport;
use crate::domain::types::{ChannelInfo, RawEvent, UserInfo};

const API_BASE: &str = "https://slack.com/api";
const PAGE_LIMIT: &str = "200";
const EVENT_BUFFER: usize = 1024;
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Every Web API reply carries `ok` and, on failure, an `error` code.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Deserialize)]
struct RtmConnect {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Ack {}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct ConversationsPage {
    #[serde(default)]
    channels: Vec<SlackChannel>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Deserialize)]
struct SlackChannel {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_member: bool,
    #[serde(default)]
    topic: Option<TextValue>,
    #[serde(default)]
    purpose: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct UsersPage {
    #[serde(default)]
    members: Vec<SlackUser>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

impl From<SlackChannel> for ChannelInfo {
    fn from(c: SlackChannel) -> Self {
        ChannelInfo {
            id: c.id,
            name: c.name,
            is_member: c.is_member,
            topic: c.topic.map(|t| t.value).unwrap_or_default(),
            purpose: c.purpose.map(|p| p.value).unwrap_or_default(),
        }
    }
}

impl SlackUser {
    fn into_user(self) -> Option<UserInfo> {
        let name = self.name.filter(|n| !n.is_empty())?;
        Some(UserInfo { id: self.id, name })
    }
}

impl<T> Envelope<T> {
    fn into_result(self, method: &str) -> BotResult<T> {
        if self.ok {
            Ok(self.body)
        } else {
            Err(BotError::Transport(format!(
                "{method}: {}",
                self.error.as_deref().unwrap_or("unknown error")
            )))
        }
    }
}

pub struct SlackTransport {
    client: reqwest::Client,
    token: String,
    api_base: String,
    batch_size: usize,
    events: Mutex<Option<mpsc::Receiver<RawEvent>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl SlackTransport {
    /// `batch_size` caps how many buffered events one `read_events` call returns.
    pub fn new(token: impl Into<String>, batch_size: usize) -> BotResult<Self> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            token: token.into(),
            api_base: API_BASE.to_string(),
            batch_size: batch_size.max(1),
            events: Mutex::new(None),
            reader: Mutex::new(None),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), method)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> BotResult<Envelope<T>> {
        let resp = self
            .client
            .get(self.url(method))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        read_envelope(method, resp).await
    }

    /// Walks every page of a cursor-paginated listing.
    async fn paginate<P, T>(
        &self,
        method: &str,
        params: &[(&str, &str)],
        mut split: impl FnMut(P) -> (Vec<T>, String),
    ) -> BotResult<Vec<T>>
    where
        P: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut cursor = String::new();
        loop {
            let page: P = {
                let mut query = params.to_vec();
                query.push(("limit", PAGE_LIMIT));
                if !cursor.is_empty() {
                    query.push(("cursor", cursor.as_str()));
                }
                self.get(method, &query).await?.into_result(method)?
            };
            let (mut batch, next) = split(page);
            items.append(&mut batch);
            if next.is_empty() {
                break;
            }
            cursor = next;
        }
        Ok(items)
    }
}

async fn read_envelope<T: DeserializeOwned>(
    method: &str,
    resp: reqwest::Response,
) -> BotResult<Envelope<T>> {
    let status = resp.status();
    if !status.is_success() {
        let retry = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|v| format!(" (retry after {v}s)"))
            .unwrap_or_default();
        return Err(BotError::Transport(format!("{method}: HTTP {status}{retry}")));
    }
    Ok(resp.json().await?)
}

/// Forwards parsed RTM frames into `tx` until the socket closes or the receiver is gone.
async fn read_loop<S>(mut stream: S, tx: mpsc::Sender<RawEvent>)
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let event = match serde_json::from_str::<RawEvent>(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!("Skipping unparseable frame: {}", e);
                        continue;
                    }
                };
                if event.kind == "goodbye" {
                    tracing::info!("Slack asked us to reconnect");
                    break;
                }
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "RTM socket closed");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("RTM socket error: {}", e);
                break;
            }
        }
    }
}

#[async_trait]
impl Transport for SlackTransport {
    async fn connect(&self) -> BotResult<bool> {
        let rtm: Envelope<RtmConnect> = self.get("rtm.connect", &[]).await?;
        if !rtm.ok {
            tracing::error!(
                "rtm.connect rejected: {}",
                rtm.error.as_deref().unwrap_or("unknown error")
            );
            return Ok(false);
        }
        let Some(url) = rtm.body.url else {
            return Err(BotError::Transport("rtm.connect: no websocket url".to_string()));
        };

        let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| BotError::Transport(format!("websocket: {e}")))?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let handle = tokio::spawn(read_loop(stream, tx));
        *self.events.lock().await = Some(rx);
        if let Some(old) = self.reader.lock().await.replace(handle) {
            old.abort();
        }
        Ok(true)
    }

    async fn read_events(&self) -> BotResult<Vec<RawEvent>> {
        let mut guard = self.events.lock().await;
        let Some(rx) = guard.as_mut() else {
            return Err(BotError::Transport("not connected".to_string()));
        };

        let mut events = Vec::new();
        let mut closed = false;
        while events.len() < self.batch_size {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }

        if closed {
            *guard = None;
            if events.is_empty() {
                return Err(BotError::Transport("event stream closed".to_string()));
            }
        }
        Ok(events)
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> BotResult<()> {
        let method = "chat.postMessage";
        let resp = self
            .client
            .post(self.url(method))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "channel": channel_id, "text": text }))
            .send()
            .await?;
        read_envelope::<Ack>(method, resp).await?.into_result(method)?;
        Ok(())
    }

    async fn list_channels(&self) -> BotResult<Vec<ChannelInfo>> {
        let channels = self
            .paginate(
                "conversations.list",
                &[("types", "public_channel"), ("exclude_archived", "true")],
                |page: ConversationsPage| (page.channels, page.response_metadata.next_cursor),
            )
            .await?;
        Ok(channels.into_iter().map(ChannelInfo::from).collect())
    }

    async fn list_users(&self) -> BotResult<Vec<UserInfo>> {
        let users = self
            .paginate("users.list", &[], |page: UsersPage| {
                (page.members, page.response_metadata.next_cursor)
            })
            .await?;
        Ok(users.into_iter().filter_map(SlackUser::into_user).collect())
    }
}
