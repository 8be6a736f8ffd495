use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::KeyValue;

/// Per-outcome counters for the runner loop. Created once at runner
/// construction; if no meter provider is configured (OTel disabled), the
/// instruments are no-op.
///
/// Delete failures are counted apart from handler failures: a failed delete
/// means possible duplicate processing, a failed handler means definite
/// non-processing.
pub struct Metrics {
    jobs_succeeded: Counter<u64>,
    jobs_failed: Counter<u64>,
    jobs_unresolved: Counter<u64>,
    receive_errors: Counter<u64>,
    deletes_failed: Counter<u64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create metrics from the global meter provider.
    pub fn new() -> Self {
        let meter = opentelemetry::global::meter("tarefa");
        Self::from_meter(&meter)
    }

    /// Create metrics from a specific meter (used in tests with an in-memory
    /// exporter).
    pub fn from_meter(meter: &Meter) -> Self {
        Self {
            jobs_succeeded: meter
                .u64_counter("tarefa.jobs.succeeded")
                .with_description("Jobs handled and deleted from the queue")
                .build(),
            jobs_failed: meter
                .u64_counter("tarefa.jobs.failed")
                .with_description("Jobs whose handler returned an error")
                .build(),
            jobs_unresolved: meter
                .u64_counter("tarefa.jobs.unresolved")
                .with_description("Messages with a missing or unregistered job name")
                .build(),
            receive_errors: meter
                .u64_counter("tarefa.receive.errors")
                .with_description("Queue receive failures")
                .build(),
            deletes_failed: meter
                .u64_counter("tarefa.deletes.failed")
                .with_description("Delete failures after a successful handler run")
                .build(),
        }
    }

    pub(crate) fn record_success(&self, job: &str) {
        self.jobs_succeeded
            .add(1, &[KeyValue::new("job", job.to_string())]);
    }

    pub(crate) fn record_failure(&self, job: &str) {
        self.jobs_failed
            .add(1, &[KeyValue::new("job", job.to_string())]);
    }

    pub(crate) fn record_unresolved(&self, job: Option<&str>) {
        match job {
            Some(job) => self
                .jobs_unresolved
                .add(1, &[KeyValue::new("job", job.to_string())]),
            None => self.jobs_unresolved.add(1, &[]),
        }
    }

    pub(crate) fn record_receive_error(&self) {
        self.receive_errors.add(1, &[]);
    }

    pub(crate) fn record_delete_failure(&self, job: &str) {
        self.deletes_failed
            .add(1, &[KeyValue::new("job", job.to_string())]);
    }
}
