use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode};

use crate::error::DispatchError;
use crate::handlers::request_cancellation;
use crate::state::AppState;
use crate::usecase::webhook::ProcessWebhookUseCase;

pub const SIGNATURE_HEADER: &str = "x-channel-signature";

// ── POST /webhook ────────────────────────────────────────────────────────────

/// Raw body is kept as bytes: the signature covers the exact payload.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, DispatchError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let usecase = ProcessWebhookUseCase {
        verifier: state.verifier.clone(),
        tenants: state.tenant_directory(),
        rules: state.rule_repo(),
        gateway: state.gateway(),
    };
    let (cancel, _guard) = request_cancellation();
    usecase.execute(signature, &body, &cancel).await?;
    Ok(StatusCode::OK)
}
