use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use courier_core::identity::TenantIdentity;
use courier_domain::id::MessageId;
use courier_domain::message::{Message, MessageStatus};
use courier_domain::pagination::PageRequest;

use crate::error::DispatchError;
use crate::handlers::request_cancellation;
use crate::state::AppState;
use crate::usecase::delivery::SendMessageUseCase;
use crate::usecase::message::{
    CreateMessageInput, CreateMessageUseCase, GetMessageUseCase, ListMessagesUseCase,
    ScheduleMessageUseCase,
};

#[derive(Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub title: String,
    pub body: String,
    pub status: MessageStatus,
    #[serde(serialize_with = "courier_core::serde::opt_to_rfc3339_ms")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "courier_core::serde::opt_to_rfc3339_ms")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "courier_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "courier_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id.to_string(),
            title: m.title,
            body: m.body,
            status: m.status,
            scheduled_at: m.scheduled_at,
            sent_at: m.sent_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// ── POST /messages ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateMessageRequest {
    pub title: String,
    pub body: String,
}

pub async fn create_message(
    identity: TenantIdentity,
    State(state): State<AppState>,
    Json(body): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), DispatchError> {
    let usecase = CreateMessageUseCase {
        repo: state.message_repo(),
    };
    let message = usecase
        .execute(
            identity.tenant_id,
            CreateMessageInput {
                title: body.title,
                body: body.body,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

// ── GET /messages ────────────────────────────────────────────────────────────

pub async fn list_messages(
    identity: TenantIdentity,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<MessageResponse>>, DispatchError> {
    let usecase = ListMessagesUseCase {
        repo: state.message_repo(),
    };
    let messages = usecase.execute(identity.tenant_id, page).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

// ── GET /messages/{id} ───────────────────────────────────────────────────────

pub async fn get_message(
    identity: TenantIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, DispatchError> {
    let usecase = GetMessageUseCase {
        repo: state.message_repo(),
    };
    let message = usecase.execute(identity.tenant_id, MessageId(id)).await?;
    Ok(Json(message.into()))
}

// ── POST /messages/{id}/schedule ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ScheduleMessageRequest {
    pub scheduled_at: DateTime<Utc>,
}

pub async fn schedule_message(
    identity: TenantIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ScheduleMessageRequest>,
) -> Result<Json<MessageResponse>, DispatchError> {
    let usecase = ScheduleMessageUseCase {
        tx: state.tx_manager(),
    };
    let message = usecase
        .execute(identity.tenant_id, MessageId(id), body.scheduled_at)
        .await?;
    Ok(Json(message.into()))
}

// ── POST /messages/{id}/send ─────────────────────────────────────────────────

pub async fn send_message(
    identity: TenantIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, DispatchError> {
    let usecase = SendMessageUseCase {
        tx: state.tx_manager(),
        gateway: state.gateway(),
    };
    let (cancel, _guard) = request_cancellation();
    usecase
        .execute_for_tenant(identity.tenant_id, MessageId(id), &cancel)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
