use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use courier_core::identity::TenantIdentity;

use crate::error::DispatchError;
use crate::handlers::request_cancellation;
use crate::state::AppState;
use crate::usecase::broadcast::{Audience, BroadcastInput, BroadcastUseCase};

// ── POST /broadcasts ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BroadcastRequest {
    pub text: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BroadcastResponse {
    /// `broadcast` or `multicast`.
    pub mode: &'static str,
    /// Recipient count for multicasts; absent for broadcasts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<usize>,
}

impl From<Audience> for BroadcastResponse {
    fn from(audience: Audience) -> Self {
        match audience {
            Audience::Everyone => Self {
                mode: "broadcast",
                targets: None,
            },
            Audience::Targets(n) => Self {
                mode: "multicast",
                targets: Some(n),
            },
        }
    }
}

pub async fn create_broadcast(
    identity: TenantIdentity,
    State(state): State<AppState>,
    Json(body): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, DispatchError> {
    let usecase = BroadcastUseCase {
        gateway: state.gateway(),
    };
    let (cancel, _guard) = request_cancellation();
    let audience = usecase
        .execute(
            BroadcastInput {
                text: body.text,
                targets: body.targets,
            },
            &cancel,
        )
        .await?;
    tracing::info!(tenant_id = %identity.tenant_id, ?audience, "broadcast sent");
    Ok(Json(audience.into()))
}
