use anyhow::Result;
use dockmetrics::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the published payload; logs go to stderr
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let app_config = config::AppConfig::load()?;
    let hostname = sysinfo::System::host_name().unwrap_or_default();
    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        hostname = %hostname,
        "starting"
    );

    let entity = (!app_config.collection.local).then(|| sink::Entity {
        name: hostname.clone(),
        kind: "docker-host".into(),
    });
    let sink = Arc::new(sink::IntegrationSink::new(entity));
    let emitter = sink::Emitter::new(
        sink.clone(),
        filter::MetricFilter::from_list(&app_config.collection.exclude),
    );
    let gateway: Arc<dyn gateway::RuntimeGateway> =
        Arc::new(gateway::DockerGateway::connect(&app_config.runtime).await?);
    let context = collector::CollectorContext::from_config(&app_config, hostname);

    match app_config.collection.interval_secs {
        None => {
            collector::run_pass(gateway, &emitter, &context).await;
            sink.publish(std::io::stdout().lock())?;
        }
        Some(interval_secs) => {
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            let worker_handle = worker::spawn(
                worker::WorkerDeps {
                    gateway,
                    sink,
                    emitter,
                    context,
                    out: std::io::stdout(),
                    shutdown_rx,
                },
                worker::WorkerConfig {
                    interval_secs,
                    stats_log_interval_secs: app_config.collection.stats_log_interval_secs,
                },
            );
            shutdown_signal().await;
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = worker_handle.await;
        }
    }

    Ok(())
}
