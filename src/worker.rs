// Periodic mode: one sampling pass per tick, each pass published on its own.

use crate::collector::{CollectorContext, run_pass};
use crate::gateway::RuntimeGateway;
use crate::sink::{Emitter, IntegrationSink};
use std::io::Write;
use std::sync::Arc;
use tokio::time::{Duration, interval};

/// Gateway, sink, output and shutdown for the worker.
pub struct WorkerDeps<W> {
    pub gateway: Arc<dyn RuntimeGateway>,
    pub sink: Arc<IntegrationSink>,
    pub emitter: Emitter,
    pub context: CollectorContext,
    /// Where each pass's payload is written.
    pub out: W,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Worker timing. Stats logging uses its own real-time interval.
pub struct WorkerConfig {
    pub interval_secs: u64,
    pub stats_log_interval_secs: u64,
}

pub fn spawn<W>(deps: WorkerDeps<W>, config: WorkerConfig) -> tokio::task::JoinHandle<()>
where
    W: Write + Send + 'static,
{
    let WorkerDeps {
        gateway,
        sink,
        emitter,
        context,
        mut out,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        interval_secs,
        stats_log_interval_secs,
    } = config;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut passes_total: u64 = 0;
        let mut event_sets_published_total: u64 = 0;
        let mut pass_errors_total: u64 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let summary = run_pass(gateway.clone(), &emitter, &context).await;
                    passes_total += 1;
                    pass_errors_total += summary.errors as u64;
                    match sink.publish(&mut out) {
                        Ok(n) => event_sets_published_total += n as u64,
                        Err(e) => tracing::warn!(
                            error = %e,
                            operation = "publish",
                            "publishing pass failed"
                        ),
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        passes_total,
                        event_sets_published_total,
                        pass_errors_total,
                        "sampler stats"
                    );
                }
            }
        }
    })
}
