//! # Example: snapshot export/import across a simulated process restart.
//!
//! Run with: `cargo run --example recovery`

use std::time::Duration;

use servisor::{
    Health, ServiceDescriptor, ServiceFn, ServiceSpec, Snapshot, Supervisor, SupervisorConfig,
};

fn cache_spec() -> ServiceSpec {
    ServiceSpec::new(
        ServiceDescriptor::new("cache", "Cache Warmer", "cache")
            .with_health_check_interval(Duration::from_millis(100)),
        ServiceFn::new()
            .on_start(|| async {
                println!("cache start hook invoked");
                Ok(())
            })
            .on_health(|| async { Ok(Health::healthy().with_memory(0.3)) })
            .arc(),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // "First process": start the cache and collect some health history.
    let sup = Supervisor::new(SupervisorConfig::default());
    sup.register(cache_spec()).await?;
    sup.start("cache").await?;
    tokio::time::sleep(Duration::from_millis(350)).await;

    let json = sup.export_snapshot().await.to_json()?;
    sup.shutdown().await?;
    println!("exported snapshot:\n{json}\n");

    // "Second process": same hooks registered, state restored. Note the
    // start hook does not run again — monitoring just resumes.
    let restored = Supervisor::new(SupervisorConfig::default());
    restored.register(cache_spec()).await?;
    restored.import_snapshot(Snapshot::from_json(&json)?).await?;

    println!(
        "restored cache: status={} probe_armed={}",
        restored.status("cache").await?,
        restored.probe_armed("cache").await,
    );

    let before = restored.health_history("cache").await.len();
    tokio::time::sleep(Duration::from_millis(350)).await;
    let after = restored.health_history("cache").await.len();
    println!("health records: {before} imported, {after} after resumed monitoring");

    restored.shutdown().await?;
    Ok(())
}
