use uuid::Uuid;

/// Errors from enqueueing a message.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("queue backend error: {0}")]
    Backend(String),
}

/// Errors from receiving a message. Cancellation and an empty long-poll are
/// *not* errors — `Queue::receive` reports both as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    #[error("queue backend error: {0}")]
    Backend(String),
}

/// Errors from deleting a delivered message. A stale token means the
/// delivery it identified no longer exists, typically because the backend's
/// visibility window elapsed and the message was redelivered. Non-fatal to
/// the runner.
#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("stale delete token: {0}")]
    StaleToken(Uuid),

    #[error("queue backend error: {0}")]
    Backend(String),
}
