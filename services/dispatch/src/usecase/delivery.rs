//! The transactional send of one message.

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use courier_domain::id::{MessageId, TenantId};

use crate::domain::repository::{
    ChannelGateway, MessageRepository, TransactionManager, TransactionScope,
};
use crate::domain::types::ChannelError;
use crate::error::DispatchError;

/// Result of a send attempt that reached the gateway. Both outcomes commit.
enum SendOutcome {
    Sent,
    Failed(ChannelError),
}

// ── SendMessage ──────────────────────────────────────────────────────────────

pub struct SendMessageUseCase<T: TransactionManager, G: ChannelGateway> {
    pub tx: T,
    pub gateway: G,
}

impl<T: TransactionManager, G: ChannelGateway> SendMessageUseCase<T, G> {
    /// Send message `id` regardless of owner (scheduler path).
    pub async fn execute(
        &self,
        id: MessageId,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        self.send(id, None, cancel).await
    }

    /// Send message `id` on behalf of `tenant_id`; another tenant's message
    /// is reported as not found.
    pub async fn execute_for_tenant(
        &self,
        tenant_id: TenantId,
        id: MessageId,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        self.send(id, Some(tenant_id), cancel).await
    }

    async fn send(
        &self,
        id: MessageId,
        owner: Option<TenantId>,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        let tx = self.tx.begin().await?;
        match self.send_within(&tx, id, owner, cancel).await {
            Ok(outcome) => {
                tx.commit().await?;
                match outcome {
                    SendOutcome::Sent => Ok(()),
                    SendOutcome::Failed(e) => Err(DispatchError::Channel(e)),
                }
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(message_id = %id, error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn send_within(
        &self,
        tx: &T::Tx,
        id: MessageId,
        owner: Option<TenantId>,
        cancel: &CancellationToken,
    ) -> Result<SendOutcome, DispatchError> {
        let mut message = tx
            .find_by_id_for_update(id)
            .await?
            .filter(|m| owner.is_none_or(|tenant_id| m.tenant_id == tenant_id))
            .ok_or(DispatchError::MessageNotFound)?;

        if !message.can_send() {
            return Err(DispatchError::CannotSend);
        }

        match self.gateway.push_text(&message.outbound_text(), cancel).await {
            Ok(()) => {
                message.mark_as_sent(Utc::now());
                tx.update(&message).await?;
                info!(message_id = %id, tenant_id = %message.tenant_id, "message sent");
                Ok(SendOutcome::Sent)
            }
            Err(ChannelError::Cancelled) => Err(DispatchError::Cancelled),
            Err(e) => {
                message.mark_as_failed(Utc::now());
                tx.update(&message).await?;
                warn!(message_id = %id, error = %e, "message send failed");
                Ok(SendOutcome::Failed(e))
            }
        }
    }
}
