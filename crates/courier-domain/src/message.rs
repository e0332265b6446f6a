//! Outbound message (campaign) and its delivery status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{MessageId, TenantId};

/// Delivery status of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Draft,
    Scheduled,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown message status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for MessageStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// A draftable, schedulable, sendable unit of outbound content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub tenant_id: TenantId,
    pub title: String,
    pub body: String,
    pub status: MessageStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// New message in `draft`.
    pub fn draft(tenant_id: TenantId, title: String, body: String, now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::new(),
            tenant_id,
            title,
            body,
            status: MessageStatus::Draft,
            scheduled_at: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `sent` is terminal for ordinary sends; a prior failure may be retried.
    pub fn can_send(&self) -> bool {
        matches!(
            self.status,
            MessageStatus::Draft | MessageStatus::Scheduled | MessageStatus::Failed
        )
    }

    /// Text pushed to the channel: title, blank line, body.
    pub fn outbound_text(&self) -> String {
        compose_text(&self.title, &self.body)
    }

    /// Move into `scheduled`. Returns `false` (and changes nothing) when the
    /// message can no longer be sent.
    pub fn schedule(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if !self.can_send() {
            return false;
        }
        self.status = MessageStatus::Scheduled;
        self.scheduled_at = Some(at);
        self.updated_at = now;
        true
    }

    /// Idempotent: an already-sent message keeps its original `sent_at`.
    pub fn mark_as_sent(&mut self, now: DateTime<Utc>) {
        if self.status != MessageStatus::Sent || self.sent_at.is_none() {
            self.sent_at = Some(now);
        }
        self.status = MessageStatus::Sent;
        self.updated_at = now;
    }

    /// Unconditional; leaves `sent_at` untouched.
    pub fn mark_as_failed(&mut self, now: DateTime<Utc>) {
        self.status = MessageStatus::Failed;
        self.updated_at = now;
    }
}

/// Join a title and body the way the channel displays them.
pub fn compose_text(title: &str, body: &str) -> String {
    format!("{title}\n\n{body}")
}
