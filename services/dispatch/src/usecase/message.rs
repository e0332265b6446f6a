use chrono::{DateTime, Utc};

use courier_domain::id::{MessageId, TenantId};
use courier_domain::message::Message;
use courier_domain::pagination::PageRequest;

use crate::domain::repository::{MessageRepository, TransactionManager, TransactionScope};
use crate::error::DispatchError;

// ── CreateMessage ────────────────────────────────────────────────────────────

pub struct CreateMessageInput {
    pub title: String,
    pub body: String,
}

pub struct CreateMessageUseCase<R: MessageRepository> {
    pub repo: R,
}

impl<R: MessageRepository> CreateMessageUseCase<R> {
    pub async fn execute(
        &self,
        tenant_id: TenantId,
        input: CreateMessageInput,
    ) -> Result<Message, DispatchError> {
        if input.title.trim().is_empty() {
            return Err(DispatchError::Validation("title is required".into()));
        }
        if input.body.trim().is_empty() {
            return Err(DispatchError::Validation("body is required".into()));
        }
        let message = Message::draft(tenant_id, input.title, input.body, Utc::now());
        self.repo.create(&message).await?;
        Ok(message)
    }
}

// ── GetMessage ───────────────────────────────────────────────────────────────

pub struct GetMessageUseCase<R: MessageRepository> {
    pub repo: R,
}

impl<R: MessageRepository> GetMessageUseCase<R> {
    pub async fn execute(
        &self,
        tenant_id: TenantId,
        id: MessageId,
    ) -> Result<Message, DispatchError> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|m| m.tenant_id == tenant_id)
            .ok_or(DispatchError::MessageNotFound)
    }
}

// ── ListMessages ─────────────────────────────────────────────────────────────

pub struct ListMessagesUseCase<R: MessageRepository> {
    pub repo: R,
}

impl<R: MessageRepository> ListMessagesUseCase<R> {
    pub async fn execute(
        &self,
        tenant_id: TenantId,
        page: PageRequest,
    ) -> Result<Vec<Message>, DispatchError> {
        self.repo.list(tenant_id, page.clamped()).await
    }
}

// ── ScheduleMessage ──────────────────────────────────────────────────────────

pub struct ScheduleMessageUseCase<T: TransactionManager> {
    pub tx: T,
}

impl<T: TransactionManager> ScheduleMessageUseCase<T> {
    pub async fn execute(
        &self,
        tenant_id: TenantId,
        id: MessageId,
        at: DateTime<Utc>,
    ) -> Result<Message, DispatchError> {
        let tx = self.tx.begin().await?;
        match Self::schedule_within(&tx, tenant_id, id, at).await {
            Ok(message) => {
                tx.commit().await?;
                Ok(message)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(message_id = %id, error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn schedule_within(
        tx: &T::Tx,
        tenant_id: TenantId,
        id: MessageId,
        at: DateTime<Utc>,
    ) -> Result<Message, DispatchError> {
        let mut message = tx
            .find_by_id_for_update(id)
            .await?
            .filter(|m| m.tenant_id == tenant_id)
            .ok_or(DispatchError::MessageNotFound)?;
        if !message.schedule(at, Utc::now()) {
            return Err(DispatchError::CannotSend);
        }
        tx.update(&message).await?;
        Ok(message)
    }
}
