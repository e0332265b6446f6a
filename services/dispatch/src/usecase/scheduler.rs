//! Sweep of due scheduled messages.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::repository::{ChannelGateway, MessageRepository, TransactionManager};
use crate::domain::types::SchedulerReport;
use crate::error::DispatchError;
use crate::usecase::delivery::SendMessageUseCase;

/// Upper bound on messages handled by one sweep.
pub const MAX_BATCH: u64 = 50;

/// Non-positive or oversized limits fall back to [`MAX_BATCH`].
pub fn clamp_limit(limit: i64) -> u64 {
    match u64::try_from(limit) {
        Ok(n) if (1..=MAX_BATCH).contains(&n) => n,
        _ => MAX_BATCH,
    }
}

// ── RunScheduler ─────────────────────────────────────────────────────────────

pub struct RunSchedulerUseCase<R: MessageRepository, T: TransactionManager, G: ChannelGateway> {
    pub repo: R,
    pub sender: SendMessageUseCase<T, G>,
}

impl<R, T, G> RunSchedulerUseCase<R, T, G>
where
    R: MessageRepository,
    T: TransactionManager,
    G: ChannelGateway,
{
    /// Send every due message in `scheduled_at` order, one at a time.
    ///
    /// Per-message failures are logged and skipped. Only the due-item query
    /// itself can fail the sweep. Once `cancel` fires, remaining messages are
    /// left `scheduled` for the next run.
    pub async fn execute(
        &self,
        now: DateTime<Utc>,
        limit: i64,
        cancel: &CancellationToken,
    ) -> Result<SchedulerReport, DispatchError> {
        let limit = clamp_limit(limit);
        let due = self.repo.find_due(now, limit).await?;
        let mut report = SchedulerReport {
            candidates: due.len(),
            sent: 0,
        };
        info!(candidates = report.candidates, limit, "scheduler run started");

        for (index, message) in due.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    remaining = report.candidates - index,
                    "scheduler run cancelled"
                );
                break;
            }
            match self.sender.execute(message.id, cancel).await {
                Ok(()) => report.sent += 1,
                Err(e) => warn!(message_id = %message.id, error = %e, "scheduled send failed"),
            }
        }

        info!(
            candidates = report.candidates,
            sent = report.sent,
            "scheduler run finished"
        );
        Ok(report)
    }
}
