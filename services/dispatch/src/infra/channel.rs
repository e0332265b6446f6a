//! HTTP channel provider client.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::domain::repository::ChannelGateway;
use crate::domain::types::ChannelError;
use crate::infra::retry::{RetryPolicy, Sleeper, TokioSleeper, with_retry};

const PUSH_PATH: &str = "/v2/bot/message/push";
const REPLY_PATH: &str = "/v2/bot/message/reply";
const BROADCAST_PATH: &str = "/v2/bot/message/broadcast";
const MULTICAST_PATH: &str = "/v2/bot/message/multicast";

/// Provider endpoint and credentials.
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub api_base: String,
    /// Bearer token. Without it every call is skipped.
    pub access_token: Option<String>,
    /// Recipient for `push_text`.
    pub push_target: Option<String>,
    pub timeout: Duration,
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

fn text_messages(text: &str) -> [TextMessage<'_>; 1] {
    [TextMessage { kind: "text", text }]
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct MulticastRequest<'a> {
    to: &'a [String],
    messages: [TextMessage<'a>; 1],
}

// ── Gateway ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpChannelGateway<S: Sleeper = TokioSleeper> {
    client: reqwest::Client,
    settings: Arc<ChannelSettings>,
    retry: RetryPolicy,
    sleeper: S,
}

impl HttpChannelGateway {
    pub fn new(settings: ChannelSettings, retry: RetryPolicy) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("build channel http client")?;
        Ok(Self {
            client,
            settings: Arc::new(settings),
            retry,
            sleeper: TokioSleeper,
        })
    }
}

impl<S: Sleeper> HttpChannelGateway<S> {
    /// Replace the backoff sleeper.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> HttpChannelGateway<S2> {
        HttpChannelGateway {
            client: self.client,
            settings: self.settings,
            retry: self.retry,
            sleeper,
        }
    }

    fn access_token(&self, operation: &'static str) -> Option<&str> {
        let token = self
            .settings
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::warn!(operation, "channel access token not configured, skipping");
        }
        token
    }

    async fn post<B: Serialize + Sync>(
        &self,
        operation: &'static str,
        path: &str,
        token: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<(), ChannelError> {
        let url = format!("{}{}", self.settings.api_base.trim_end_matches('/'), path);
        let url = url.as_str();
        let client = &self.client;
        with_retry(&self.retry, &self.sleeper, cancel, operation, move || async move {
            let resp = client
                .post(url)
                .bearer_auth(token)
                .json(body)
                .send()
                .await
                .map_err(|e| ChannelError::Transport(e.to_string()))?;
            let status = resp.status();
            if status.is_success() {
                return Ok(());
            }
            let body = resp.text().await.unwrap_or_default();
            Err(ChannelError::Provider {
                status: status.as_u16(),
                body,
            })
        })
        .await
    }
}

impl<S: Sleeper> ChannelGateway for HttpChannelGateway<S> {
    async fn push_text(&self, text: &str, cancel: &CancellationToken) -> Result<(), ChannelError> {
        let Some(token) = self.access_token("push") else {
            return Ok(());
        };
        let Some(to) = self
            .settings
            .push_target
            .as_deref()
            .filter(|t| !t.is_empty())
        else {
            tracing::warn!(operation = "push", "channel push target not configured, skipping");
            return Ok(());
        };
        let body = PushRequest {
            to,
            messages: text_messages(text),
        };
        self.post("push", PUSH_PATH, token, &body, cancel).await
    }

    async fn reply(
        &self,
        reply_token: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ChannelError> {
        let Some(token) = self.access_token("reply") else {
            return Ok(());
        };
        let body = ReplyRequest {
            reply_token,
            messages: text_messages(text),
        };
        self.post("reply", REPLY_PATH, token, &body, cancel).await
    }

    async fn broadcast(&self, text: &str, cancel: &CancellationToken) -> Result<(), ChannelError> {
        let Some(token) = self.access_token("broadcast") else {
            return Ok(());
        };
        let body = BroadcastRequest {
            messages: text_messages(text),
        };
        self.post("broadcast", BROADCAST_PATH, token, &body, cancel)
            .await
    }

    async fn multicast(
        &self,
        targets: &[String],
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ChannelError> {
        if targets.is_empty() {
            return Err(ChannelError::InvalidRequest(
                "multicast needs at least one target".into(),
            ));
        }
        let Some(token) = self.access_token("multicast") else {
            return Ok(());
        };
        let body = MulticastRequest {
            to: targets,
            messages: text_messages(text),
        };
        self.post("multicast", MULTICAST_PATH, token, &body, cancel)
            .await
    }
}
