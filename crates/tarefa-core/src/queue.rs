use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{DeleteError, EnqueueError, ReceiveError};
use crate::message::Message;

/// Opaque receipt identifying one delivered message instance. Required to
/// delete exactly that instance; never valid across receives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteToken(pub(crate) Uuid);

/// One received message plus the token that acknowledges it.
#[derive(Debug)]
pub struct Delivery {
    pub message: Message,
    pub token: DeleteToken,
}

/// Contract between the runner and a durable at-least-once queue backend.
///
/// The backend owns redelivery: a received message that is never deleted
/// becomes visible again after a backend-defined visibility window. The
/// runner implements no retry policy of its own on top of this.
///
/// Implementations must be safe to share across runner instances — each
/// instance keeps its own loop state, the queue is the only shared piece.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Enqueue a message. No ordering guarantee across messages.
    async fn send(&self, message: Message) -> Result<(), EnqueueError>;

    /// Long-poll for the next available message, blocking up to the
    /// configured wait time.
    ///
    /// Returns `Ok(None)` when the wait elapses without a message, when
    /// `cancel` is already cancelled at call time (without contacting the
    /// backend), or when cancelled mid-wait (promptly, not after the full
    /// wait). None of these are errors. `Err` is reserved for genuine
    /// backend or transport failures.
    async fn receive(&self, cancel: &CancellationToken)
        -> Result<Option<Delivery>, ReceiveError>;

    /// Delete the message instance identified by `token`. Fails with
    /// [`DeleteError::StaleToken`] if that delivery no longer exists.
    async fn delete(&self, token: DeleteToken) -> Result<(), DeleteError>;
}

/// Queue backend tuning, deserializable from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueueConfig {
    /// How long one `receive` call may block waiting for a message.
    pub wait_time_ms: u64,
    /// How long a received, undeleted message stays invisible before the
    /// backend offers it again.
    pub visibility_timeout_ms: u64,
}

impl QueueConfig {
    /// Default long-poll wait: 20 seconds.
    pub const DEFAULT_WAIT_TIME_MS: u64 = 20_000;
    /// Default visibility timeout: 30 seconds.
    pub const DEFAULT_VISIBILITY_TIMEOUT_MS: u64 = 30_000;

    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time_ms)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_millis(self.visibility_timeout_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            wait_time_ms: Self::DEFAULT_WAIT_TIME_MS,
            visibility_timeout_ms: Self::DEFAULT_VISIBILITY_TIMEOUT_MS,
        }
    }
}
