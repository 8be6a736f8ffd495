use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::message::Message;

/// Error side of a handler outcome. Handlers are opaque to the runner, so
/// this is a boxed error rather than a crate enum — the runner only logs it.
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Boxed future returned by a job handler invocation.
pub type JobFuture = Pin<Box<dyn Future<Output = Result<(), JobError>> + Send>>;

/// A registered job handler. Receives a shutdown-scoped cancellation token
/// and the message; the return outcome decides whether the message is
/// deleted from the queue.
pub type JobFunc = Arc<dyn Fn(CancellationToken, Message) -> JobFuture + Send + Sync>;

/// Name-to-handler table used by the runner for dispatch.
///
/// Built by the caller and moved into the runner before it starts, so there
/// is no process-global state and no mutation during an active run.
#[derive(Default)]
pub struct Registry {
    jobs: HashMap<String, JobFunc>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handler` under `name`. Registering the same name twice
    /// replaces the earlier handler — last write wins.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(CancellationToken, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let func: JobFunc = Arc::new(move |cancel, message| Box::pin(handler(cancel, message)));
        self.jobs.insert(name.into(), func);
    }

    /// Look up the handler for `name`. Pure, no side effects.
    pub fn lookup(&self, name: &str) -> Option<&JobFunc> {
        self.jobs.get(name)
    }

    /// Number of registered job names.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}
