use std::sync::{Arc, Mutex};

use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData, ResourceMetrics};
use opentelemetry_sdk::metrics::in_memory_exporter::InMemoryMetricExporter;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Log lines captured by [`capture_logs`], shared with the test body.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CapturedLogs {
    /// Messages recorded at exactly `level`, in emission order.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

struct CaptureLayer {
    logs: CapturedLogs,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if let Some(message) = visitor.message {
            self.logs
                .events
                .lock()
                .unwrap()
                .push((*event.metadata().level(), message));
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }
}

/// A subscriber that records event messages instead of printing them, plus a
/// handle to the recorded lines. Install with
/// `tracing::subscriber::with_default` and run the async body on a
/// current-thread runtime so every event lands on the instrumented thread.
pub fn capture_logs() -> (impl Subscriber + Send + Sync, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = Registry::default().with(CaptureLayer { logs: logs.clone() });
    (subscriber, logs)
}

/// Current-thread runtime for log-capture tests.
pub fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("build test runtime")
}

/// In-memory metrics pipeline for asserting runner counters. Bind the
/// runner's `Metrics` to `meter()` and read values back with `counter()`.
pub struct MetricsHarness {
    exporter: InMemoryMetricExporter,
    meter_provider: SdkMeterProvider,
}

impl MetricsHarness {
    pub fn new() -> Self {
        let exporter = InMemoryMetricExporter::default();
        let reader = PeriodicReader::builder(exporter.clone()).build();
        let meter_provider = SdkMeterProvider::builder().with_reader(reader).build();
        Self {
            exporter,
            meter_provider,
        }
    }

    pub fn meter(&self) -> Meter {
        self.meter_provider.meter("tarefa-test")
    }

    /// The value of a u64 counter whose attribute set matches exactly, or
    /// `None` if no such data point was recorded.
    pub fn counter(&self, name: &str, attrs: &[KeyValue]) -> Option<u64> {
        self.meter_provider.force_flush().expect("flush failed");
        let finished = self
            .exporter
            .get_finished_metrics()
            .expect("failed to get finished metrics");
        counter_value_u64(&finished, name, attrs)
    }
}

pub fn job_attr(job: &str) -> Vec<KeyValue> {
    vec![KeyValue::new("job", job.to_string())]
}

fn counter_value_u64(
    resource_metrics: &[ResourceMetrics],
    name: &str,
    expected_attrs: &[KeyValue],
) -> Option<u64> {
    for rm in resource_metrics {
        for sm in rm.scope_metrics() {
            for metric in sm.metrics() {
                if metric.name() == name {
                    if let AggregatedMetrics::U64(MetricData::Sum(sum)) = metric.data() {
                        for dp in sum.data_points() {
                            let dp_attrs: Vec<KeyValue> = dp.attributes().cloned().collect();
                            if dp_attrs.len() == expected_attrs.len()
                                && expected_attrs
                                    .iter()
                                    .all(|expected| dp_attrs.contains(expected))
                            {
                                return Some(dp.value());
                            }
                        }
                    }
                }
            }
        }
    }
    None
}
