use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DeleteError, EnqueueError, ReceiveError};
use crate::message::Message;
use crate::queue::{DeleteToken, Delivery, Queue, QueueConfig};

/// In-process queue backend with at-least-once semantics.
///
/// Received messages move to an in-flight table keyed by their delete token.
/// A delivery that is not deleted before the visibility timeout elapses is
/// reclaimed into the ready pool and offered again — the token from the
/// earlier delivery then becomes stale. Reclaim happens lazily, on the next
/// receive.
///
/// Safe to share across producers and runner instances behind an `Arc`.
pub struct MemoryQueue {
    state: Mutex<State>,
    notify: Notify,
    config: QueueConfig,
}

#[derive(Default)]
struct State {
    ready: VecDeque<Message>,
    in_flight: HashMap<Uuid, Lease>,
}

struct Lease {
    message: Message,
    taken_at: Instant,
}

/// Point-in-time queue depth, split by delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub ready: usize,
    pub in_flight: usize,
}

impl MemoryQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            config,
        }
    }

    pub async fn stats(&self) -> QueueStats {
        let state = self.state.lock().await;
        QueueStats {
            ready: state.ready.len(),
            in_flight: state.in_flight.len(),
        }
    }

    /// Take the next ready message, reclaiming expired leases first.
    async fn try_take(&self) -> Option<Delivery> {
        let mut state = self.state.lock().await;
        self.reclaim_expired(&mut state);

        let message = state.ready.pop_front()?;
        let id = Uuid::now_v7();
        state.in_flight.insert(
            id,
            Lease {
                message: message.clone(),
                taken_at: Instant::now(),
            },
        );
        Some(Delivery {
            message,
            token: DeleteToken(id),
        })
    }

    fn reclaim_expired(&self, state: &mut State) {
        let timeout = self.config.visibility_timeout();
        let expired: Vec<Uuid> = state
            .in_flight
            .iter()
            .filter(|(_, lease)| lease.taken_at.elapsed() >= timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(lease) = state.in_flight.remove(&id) {
                debug!(token = %id, "visibility window elapsed, message back in ready pool");
                state.ready.push_back(lease.message);
            }
        }
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn send(&self, message: Message) -> Result<(), EnqueueError> {
        {
            let mut state = self.state.lock().await;
            state.ready.push_back(message);
        }
        self.notify.notify_one();
        Ok(())
    }

    async fn receive(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Delivery>, ReceiveError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let deadline = Instant::now() + self.config.wait_time();
        loop {
            // Check before waiting: notify_one stores a permit when nobody
            // is parked, so a send between this check and the select below
            // still wakes us.
            if let Some(delivery) = self.try_take().await {
                return Ok(Some(delivery));
            }
            tokio::select! {
                _ = cancel.cancelled() => return Ok(None),
                _ = tokio::time::sleep_until(deadline) => {
                    return Ok(self.try_take().await);
                }
                _ = self.notify.notified() => {}
            }
        }
    }

    async fn delete(&self, token: DeleteToken) -> Result<(), DeleteError> {
        let mut state = self.state.lock().await;
        // A token whose visibility window has elapsed no longer acknowledges
        // anything; the message goes back to the ready pool instead.
        self.reclaim_expired(&mut state);
        match state.in_flight.remove(&token.0) {
            Some(_) => Ok(()),
            None => Err(DeleteError::StaleToken(token.0)),
        }
    }
}
