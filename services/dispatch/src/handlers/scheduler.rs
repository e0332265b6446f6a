use std::time::Duration;

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::DispatchError;
use crate::handlers::request_cancellation;
use crate::state::AppState;
use crate::usecase::delivery::SendMessageUseCase;
use crate::usecase::scheduler::{MAX_BATCH, RunSchedulerUseCase};
use crate::usecase::signature::secrets_match;

pub const SCHEDULER_SECRET_HEADER: &str = "x-scheduler-secret";

// ── POST /scheduler/run ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RunSchedulerRequest {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct RunSchedulerResponse {
    pub processed_count: usize,
    pub message: String,
    #[serde(serialize_with = "courier_core::serde::to_rfc3339_ms")]
    pub timestamp: chrono::DateTime<Utc>,
}

/// Triggered by an external cron. An empty body runs with the default batch.
pub async fn run_scheduler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RunSchedulerResponse>, DispatchError> {
    authorize(state.scheduler_secret.as_deref(), &headers)?;

    let request = if body.is_empty() {
        RunSchedulerRequest::default()
    } else {
        serde_json::from_slice::<RunSchedulerRequest>(&body)
            .map_err(|e| DispatchError::Validation(format!("malformed request body: {e}")))?
    };
    let limit = request.limit.unwrap_or(MAX_BATCH as i64);

    let (cancel, _guard) = request_cancellation();
    spawn_deadline(cancel.clone(), state.scheduler_deadline);

    let usecase = RunSchedulerUseCase {
        repo: state.message_repo(),
        sender: SendMessageUseCase {
            tx: state.tx_manager(),
            gateway: state.gateway(),
        },
    };
    let report = usecase.execute(Utc::now(), limit, &cancel).await?;

    Ok(Json(RunSchedulerResponse {
        processed_count: report.sent,
        message: format!(
            "sent {} of {} due messages",
            report.sent, report.candidates
        ),
        timestamp: Utc::now(),
    }))
}

fn authorize(expected: Option<&str>, headers: &HeaderMap) -> Result<(), DispatchError> {
    let expected = expected
        .filter(|s| !s.is_empty())
        .ok_or(DispatchError::SchedulerNotConfigured)?;
    let provided = headers
        .get(SCHEDULER_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if !provided.is_some_and(|provided| secrets_match(expected, provided)) {
        warn!("scheduler run rejected: secret mismatch");
        return Err(DispatchError::Unauthorized);
    }
    Ok(())
}

/// Cancel `cancel` once `deadline` elapses. The task ends early if the token
/// is cancelled some other way.
fn spawn_deadline(cancel: CancellationToken, deadline: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(deadline) => {
                warn!(deadline_secs = deadline.as_secs(), "scheduler deadline reached");
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    });
}
