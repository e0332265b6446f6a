use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};

use courier_core::health::{healthz, readiness};
use courier_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    auto_reply::{create_rule, delete_rule, list_rules, update_rule},
    broadcast::create_broadcast,
    message::{create_message, get_message, list_messages, schedule_message, send_message},
    scheduler::run_scheduler,
    webhook::receive_webhook,
};
use crate::infra::db;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Scheduler
        .route("/scheduler/run", post(run_scheduler))
        // Channel webhook
        .route("/webhook", post(receive_webhook))
        // Messages
        .route("/messages", post(create_message).get(list_messages))
        .route("/messages/{id}", get(get_message))
        .route("/messages/{id}/schedule", post(schedule_message))
        .route("/messages/{id}/send", post(send_message))
        // Broadcasts
        .route("/broadcasts", post(create_broadcast))
        // Auto-reply rules
        .route("/auto-reply/rules", post(create_rule).get(list_rules))
        .route("/auto-reply/rules/{id}", patch(update_rule).delete(delete_rule))
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
        .with_state(state)
}

async fn readyz(State(state): State<AppState>) -> StatusCode {
    readiness(db::ping(&state.db).await)
}
