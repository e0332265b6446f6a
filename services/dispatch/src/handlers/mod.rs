pub mod auto_reply;
pub mod broadcast;
pub mod message;
pub mod scheduler;
pub mod webhook;

use tokio_util::sync::{CancellationToken, DropGuard};

/// Token cancelled when the returned guard drops, i.e. when the handler
/// finishes or its request future is abandoned.
pub(crate) fn request_cancellation() -> (CancellationToken, DropGuard) {
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    (cancel, guard)
}
