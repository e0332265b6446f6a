use tokio_util::sync::CancellationToken;

use crate::domain::repository::ChannelGateway;
use crate::error::DispatchError;

/// Which gateway call carried a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Targets(usize),
}

// ── Broadcast ────────────────────────────────────────────────────────────────

pub struct BroadcastInput {
    pub text: String,
    /// Empty means every follower.
    pub targets: Vec<String>,
}

pub struct BroadcastUseCase<G: ChannelGateway> {
    pub gateway: G,
}

impl<G: ChannelGateway> BroadcastUseCase<G> {
    pub async fn execute(
        &self,
        input: BroadcastInput,
        cancel: &CancellationToken,
    ) -> Result<Audience, DispatchError> {
        if input.text.trim().is_empty() {
            return Err(DispatchError::Validation("text is required".into()));
        }
        if input.targets.is_empty() {
            self.gateway.broadcast(&input.text, cancel).await?;
            Ok(Audience::Everyone)
        } else {
            self.gateway
                .multicast(&input.targets, &input.text, cancel)
                .await?;
            Ok(Audience::Targets(input.targets.len()))
        }
    }
}
