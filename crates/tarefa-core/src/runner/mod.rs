mod metrics;

pub use metrics::Metrics;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::queue::{Delivery, Queue};
use crate::registry::Registry;

/// Drives the poll → dispatch → acknowledge loop.
///
/// One runner runs one sequential loop: the next receive never starts before
/// the current handler returns, so handler order is deterministic within an
/// instance and no locking is needed around runner state. Throughput scales
/// by running several runners against the same shared queue and relying on
/// the backend's per-message visibility for exclusivity.
///
/// Per-message failures (receive errors, unresolvable job names, handler
/// errors, delete errors) are logged and counted but never stop the loop;
/// the only way out is cancellation.
pub struct Runner {
    queue: Arc<dyn Queue>,
    registry: Registry,
    metrics: Metrics,
}

impl Runner {
    pub fn new(queue: Arc<dyn Queue>, registry: Registry) -> Self {
        Self::with_metrics(queue, registry, Metrics::new())
    }

    /// Runner with metrics bound to a specific meter, for tests that assert
    /// counter values through an in-memory exporter.
    pub fn with_metrics(queue: Arc<dyn Queue>, registry: Registry, metrics: Metrics) -> Self {
        Self {
            queue,
            registry,
            metrics,
        }
    }

    /// Run until `cancel` fires. Blocking in the caller's sense: the future
    /// completes only after the loop has fully stopped.
    ///
    /// Cancellation is cooperative, checked at the top of each iteration and
    /// inside `receive`. An in-flight handler is never interrupted — the
    /// current iteration finishes first, so shutdown is bounded by the
    /// longest-running handler.
    pub async fn start(&self, cancel: CancellationToken) {
        info!("Starting");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let delivery = match self.queue.receive(&cancel).await {
                Ok(Some(delivery)) => delivery,
                // Empty poll or cancellation; the loop-top check decides.
                Ok(None) => continue,
                Err(err) => {
                    error!(error = %err, "Error receiving message");
                    self.metrics.record_receive_error();
                    continue;
                }
            };
            self.dispatch(&cancel, delivery).await;
        }
        info!("Stopping");
    }

    async fn dispatch(&self, cancel: &CancellationToken, delivery: Delivery) {
        let Delivery { message, token } = delivery;

        let name = match message.job_name() {
            Some(name) => name.to_string(),
            None => {
                error!("Message has no job name");
                self.metrics.record_unresolved(None);
                return;
            }
        };
        let Some(handler) = self.registry.lookup(&name) else {
            error!(job = %name, "No handler registered for job");
            self.metrics.record_unresolved(Some(&name));
            return;
        };

        if let Err(err) = (handler.as_ref())(cancel.child_token(), message).await {
            error!(job = %name, error = %err, "Error running job");
            self.metrics.record_failure(&name);
            return;
        }

        // Delete strictly after a successful run. If this fails the backend
        // will redeliver an already-processed message; handlers are expected
        // to be idempotent under at-least-once delivery, so the handler is
        // not re-run here.
        if let Err(err) = self.queue.delete(token).await {
            error!(job = %name, error = %err, "Error deleting message");
            self.metrics.record_delete_failure(&name);
            return;
        }

        info!(job = %name, "Successfully ran job");
        self.metrics.record_success(&name);
    }
}
