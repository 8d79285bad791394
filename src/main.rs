//! dispatch-pilot - daemon entry point.
//!
//! Logs in to the game service, opens the mission store, and hands both
//! to the scheduler, which runs the periodic tasks until the process is
//! terminated.

use std::sync::Arc;

use dispatch_pilot::config::Config;
use dispatch_pilot::gateway::{Gateway, HttpGateway};
use dispatch_pilot::store::{MissionStore, SqliteMissionStore};
use dispatch_pilot::tasks::Scheduler;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dispatch_pilot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(base_url = %config.base_url, "loaded configuration");

    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::login(&config).await?);
    let store: Arc<dyn MissionStore> =
        Arc::new(SqliteMissionStore::new(config.db_path.clone()).await?);

    info!("starting scheduler");
    Scheduler::with_default_tasks(config.call_cooldown)
        .run(gateway, store)
        .await;

    Ok(())
}
