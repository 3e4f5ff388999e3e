//! # Example: dependency-ordered startup with health-driven restarts.
//!
//! Run with: `cargo run --example basic --features logging`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use servisor::{
    Health, LogWriter, ServiceDescriptor, ServiceFn, ServiceSpec, ServiceStatus, Supervisor,
    SupervisorConfig,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let sup = Supervisor::builder(SupervisorConfig::default())
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    // A cache every other service depends on.
    sup.register(ServiceSpec::new(
        ServiceDescriptor::new("cache", "Cache Warmer", "cache").with_auto_start(true),
        ServiceFn::new().on_start(|| async { Ok(()) }).arc(),
    ))
    .await?;

    // A feed ingester that goes unhealthy after a few probes. With
    // max_restarts = 1 it gets one automatic restart, then is pinned
    // to Stopped.
    let ticks = Arc::new(AtomicUsize::new(0));
    let probe_ticks = Arc::clone(&ticks);
    sup.register(ServiceSpec::new(
        ServiceDescriptor::new("feed", "Knowledge Feed", "ingest")
            .with_dependency("cache")
            .with_auto_start(true)
            .with_max_restarts(1)
            .with_health_check_interval(Duration::from_millis(100)),
        ServiceFn::new()
            .on_start(|| async { Ok(()) })
            .on_health(move || {
                let ticks = Arc::clone(&probe_ticks);
                async move {
                    if ticks.fetch_add(1, Ordering::SeqCst) < 3 {
                        Ok(Health::healthy().with_cpu(0.2))
                    } else {
                        Ok(Health::unhealthy("feed source unreachable"))
                    }
                }
            })
            .arc(),
    ))
    .await?;

    tokio::time::sleep(Duration::from_secs(1)).await;

    let feed = sup.descriptor("feed").await?;
    println!(
        "feed: status={} restarts={} (expected: stopped after the cap)",
        feed.runtime.status, feed.runtime.restart_count
    );
    println!(
        "running services: {:?}",
        sup.list_by_status(ServiceStatus::Running)
            .await
            .iter()
            .map(|d| d.id.clone())
            .collect::<Vec<_>>()
    );
    println!("events recorded: {}", sup.events().await.len());

    sup.shutdown().await?;
    Ok(())
}
