use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tarefa_core::{MemoryQueue, Message, Queue, QueueConfig, Registry, Runner};

#[derive(Parser)]
#[command(name = "tarefa-worker", about = "Queue-driven job worker")]
struct Cli {
    /// Path to the worker configuration file
    #[arg(long)]
    config: Option<String>,
}

/// Top-level worker configuration, deserializable from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct WorkerConfig {
    queue: QueueConfig,
    heartbeat: HeartbeatConfig,
}

/// Demo producer settings: how often a heartbeat job is enqueued.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct HeartbeatConfig {
    interval_ms: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
        }
    }
}

fn load_config(override_path: Option<&str>) -> WorkerConfig {
    let default_paths = ["tarefa.toml", "/etc/tarefa/tarefa.toml"];
    let paths: Vec<&str> = match override_path {
        Some(path) => vec![path],
        None => default_paths.to_vec(),
    };

    for path in &paths {
        if Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => {
                        info!(path, "loaded configuration");
                        return config;
                    }
                    Err(e) => {
                        eprintln!("error parsing {path}: {e}");
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    eprintln!("error reading {path}: {e}");
                    std::process::exit(1);
                }
            }
        }
    }

    info!("no config file found, using defaults");
    WorkerConfig::default()
}

#[tokio::main]
async fn main() {
    tarefa_core::telemetry::init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let queue = Arc::new(MemoryQueue::new(config.queue.clone()));

    let mut registry = Registry::new();
    registry.register("heartbeat", |_cancel, message: Message| async move {
        debug!(sent_at = message.get("sent_at").unwrap_or("?"), "heartbeat");
        Ok(())
    });
    info!(jobs = registry.job_count(), "registered job handlers");

    let cancel = CancellationToken::new();

    // Cancel the runner once a shutdown signal arrives.
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    // Demo producer: the queue is in-process, so something has to feed it.
    tokio::spawn({
        let queue = queue.clone();
        let cancel = cancel.clone();
        let interval = Duration::from_millis(config.heartbeat.interval_ms);
        async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let message = Message::job("heartbeat")
                    .with("sent_at", format!("{:?}", std::time::SystemTime::now()));
                if let Err(e) = queue.send(message).await {
                    warn!(error = %e, "failed to enqueue heartbeat");
                }
            }
        }
    });

    let runner = Runner::new(queue, registry);
    runner.start(cancel).await;
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to install CTRL+C handler");
    }

    info!("received shutdown signal");
}
