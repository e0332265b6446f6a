use chrono::{DateTime, Utc};
use serde::Deserialize;

use courier_domain::id::TenantId;

/// Operator account resolved from a webhook destination.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub channel_destination: String,
    pub created_at: DateTime<Utc>,
}

/// Outbound call failure as reported by a [`ChannelGateway`](crate::domain::repository::ChannelGateway).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("channel provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("channel transport error: {0}")]
    Transport(String),
    #[error("invalid channel request: {0}")]
    InvalidRequest(String),
    #[error("channel call cancelled")]
    Cancelled,
}

impl ChannelError {
    /// Provider and transport failures are retried; everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Transport(_))
    }
}

/// Outcome of one scheduler sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Due messages picked up by the sweep.
    pub candidates: usize,
    /// Messages whose send returned no error.
    pub sent: usize,
}

/// Per-callback webhook bookkeeping, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebhookSummary {
    pub events: usize,
    pub replied: usize,
    pub ignored: usize,
    pub failed: usize,
}

// ── Webhook payload ──────────────────────────────────────────────────────────

/// Webhook callback body. Events stay raw so each one is parsed on its own.
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    pub destination: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub events: Vec<serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let events: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(events.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    reply_token: Option<String>,
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// Content of an inbound `message` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    /// Sticker, image, location and so on.
    Other(String),
}

/// A verified inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Follow {
        reply_token: String,
    },
    Message {
        reply_token: String,
        content: MessageContent,
    },
    Unsupported {
        kind: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EventParseError {
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("{0} event without reply token")]
    MissingReplyToken(&'static str),
    #[error("message event without message")]
    MissingMessage,
}

impl InboundEvent {
    pub fn parse(raw: serde_json::Value) -> Result<Self, EventParseError> {
        let event: RawEvent = serde_json::from_value(raw)?;
        match event.kind.as_str() {
            "follow" => Ok(Self::Follow {
                reply_token: event
                    .reply_token
                    .ok_or(EventParseError::MissingReplyToken("follow"))?,
            }),
            "message" => {
                let reply_token = event
                    .reply_token
                    .ok_or(EventParseError::MissingReplyToken("message"))?;
                let message = event.message.ok_or(EventParseError::MissingMessage)?;
                let content = match (message.kind.as_str(), message.text) {
                    ("text", Some(text)) => MessageContent::Text(text),
                    _ => MessageContent::Other(message.kind),
                };
                Ok(Self::Message {
                    reply_token,
                    content,
                })
            }
            _ => Ok(Self::Unsupported { kind: event.kind }),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Follow { .. } => "follow",
            Self::Message { .. } => "message",
            Self::Unsupported { kind } => kind,
        }
    }
}
