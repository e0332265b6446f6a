#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use courier_domain::auto_reply::AutoReplyRule;
use courier_domain::id::{MessageId, RuleId, TenantId};
use courier_domain::message::{Message, compose_text};
use courier_domain::pagination::PageRequest;

use crate::domain::types::{ChannelError, Tenant};
use crate::error::DispatchError;

/// Repository for outbound messages.
pub trait MessageRepository: Send + Sync {
    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, DispatchError>;

    /// Like [`find_by_id`](Self::find_by_id), but inside a transaction the row
    /// stays locked until commit or rollback.
    async fn find_by_id_for_update(&self, id: MessageId)
    -> Result<Option<Message>, DispatchError>;

    async fn create(&self, message: &Message) -> Result<(), DispatchError>;

    async fn update(&self, message: &Message) -> Result<(), DispatchError>;

    /// Tenant's messages, newest first.
    async fn list(
        &self,
        tenant_id: TenantId,
        page: PageRequest,
    ) -> Result<Vec<Message>, DispatchError>;

    /// `scheduled` messages with `scheduled_at <= now`, oldest first, at most `limit`.
    async fn find_due(&self, now: DateTime<Utc>, limit: u64)
    -> Result<Vec<Message>, DispatchError>;
}

/// An open transaction. Dropping it without commit rolls back.
pub trait TransactionScope: Send {
    async fn commit(self) -> Result<(), DispatchError>;
    async fn rollback(self) -> Result<(), DispatchError>;
}

/// Opens transactions whose handle doubles as a transaction-scoped repository.
pub trait TransactionManager: Send + Sync {
    type Tx: MessageRepository + TransactionScope;

    async fn begin(&self) -> Result<Self::Tx, DispatchError>;
}

/// Repository for auto-reply rules.
pub trait AutoReplyRuleRepository: Send + Sync {
    /// All of a tenant's rules, priority ascending.
    async fn find_by_tenant(&self, tenant_id: TenantId)
    -> Result<Vec<AutoReplyRule>, DispatchError>;

    async fn find_by_id(&self, id: RuleId) -> Result<Option<AutoReplyRule>, DispatchError>;

    async fn create(&self, rule: &AutoReplyRule) -> Result<(), DispatchError>;

    async fn update(&self, rule: &AutoReplyRule) -> Result<(), DispatchError>;

    /// Returns `false` when no rule had that id.
    async fn delete(&self, id: RuleId) -> Result<bool, DispatchError>;
}

/// Maps a webhook destination to the owning tenant.
pub trait TenantDirectory: Send + Sync {
    async fn find_by_destination(&self, destination: &str)
    -> Result<Option<Tenant>, DispatchError>;
}

/// Outbound text delivery to the channel provider.
///
/// Every call observes `cancel`; a cancelled call returns
/// [`ChannelError::Cancelled`].
pub trait ChannelGateway: Send + Sync {
    /// Push to the configured default recipient.
    async fn push_text(&self, text: &str, cancel: &CancellationToken)
    -> Result<(), ChannelError>;

    async fn push_message(
        &self,
        title: &str,
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ChannelError> {
        self.push_text(&compose_text(title, body), cancel).await
    }

    /// Answer an inbound event using its one-time reply token.
    async fn reply(
        &self,
        reply_token: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ChannelError>;

    async fn broadcast(&self, text: &str, cancel: &CancellationToken)
    -> Result<(), ChannelError>;

    async fn multicast(
        &self,
        targets: &[String],
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ChannelError>;
}
