//! Periodic tasks and the scheduler.
//!
//! Each task is a named, independently-timed job against the shared
//! gateway/store handles. The scheduler gives every task its own tokio
//! task looping forever: run, log, sleep the task's interval, repeat. A
//! failed iteration is logged and absorbed so one fault never kills the
//! loop; the next run happens on schedule.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::dispatch::{dispatch_missing, probe_new, CooldownPacer, Pacer};
use crate::gateway::{Gateway, GatewayError};
use crate::reconcile::reconcile;
use crate::store::{MissionStore, StoreError};

/// Crew hired per building and pass.
const CREW_HIRE_COUNT: u32 = 3;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A named recurring job. `interval` is the wait *after* a run completes,
/// so a task never overlaps itself.
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    fn name(&self) -> &'static str;

    fn interval(&self) -> Duration;

    async fn run(
        &self,
        gateway: &dyn Gateway,
        store: &dyn MissionStore,
    ) -> Result<(), ControlError>;
}

/// Daily crew hiring: every owned building with open staff slots gets
/// three new hires.
pub struct CrewHirer;

#[async_trait]
impl PeriodicTask for CrewHirer {
    fn name(&self) -> &'static str {
        "HIRE CREW"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    async fn run(
        &self,
        gateway: &dyn Gateway,
        _store: &dyn MissionStore,
    ) -> Result<(), ControlError> {
        info!("hire crew in every building");
        for building in gateway.get_all_buildings().await? {
            if building.user_id == gateway.user_id() && building.personal_count > 0 {
                gateway.hire_crew(building.id, CREW_HIRE_COUNT).await?;
            }
        }
        Ok(())
    }
}

/// Asks the service to generate new missions. No local state.
pub struct MissionGenerator;

#[async_trait]
impl PeriodicTask for MissionGenerator {
    fn name(&self) -> &'static str {
        "GENERATE MISSIONS"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(20)
    }

    async fn run(
        &self,
        gateway: &dyn Gateway,
        _store: &dyn MissionStore,
    ) -> Result<(), ControlError> {
        gateway.generate_missions().await?;
        Ok(())
    }
}

/// The reconciliation + dispatch cycle. Reconciliation runs before
/// probing, after probing, and after dispatch, so the store captures the
/// effect of every command issued within the cycle.
pub struct MissionController {
    pacer: Arc<dyn Pacer>,
}

impl MissionController {
    pub fn new(pacer: Arc<dyn Pacer>) -> Self {
        Self { pacer }
    }
}

#[async_trait]
impl PeriodicTask for MissionController {
    fn name(&self) -> &'static str {
        "CONTROL MISSIONS"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(30)
    }

    async fn run(
        &self,
        gateway: &dyn Gateway,
        store: &dyn MissionStore,
    ) -> Result<(), ControlError> {
        reconcile(gateway, store).await?;
        probe_new(gateway, store, self.pacer.as_ref()).await?;
        reconcile(gateway, store).await?;
        dispatch_missing(gateway, store, self.pacer.as_ref()).await?;
        reconcile(gateway, store).await?;
        Ok(())
    }
}

/// Runs a fixed collection of periodic tasks until the process dies.
pub struct Scheduler {
    tasks: Vec<Arc<dyn PeriodicTask>>,
}

impl Scheduler {
    pub fn new(tasks: Vec<Arc<dyn PeriodicTask>>) -> Self {
        Self { tasks }
    }

    /// The production task set: crew hiring, mission generation, and the
    /// mission controller with a fixed inter-call cooldown.
    pub fn with_default_tasks(call_cooldown: Duration) -> Self {
        Self::new(vec![
            Arc::new(CrewHirer),
            Arc::new(MissionGenerator),
            Arc::new(MissionController::new(Arc::new(CooldownPacer::new(
                call_cooldown,
            )))),
        ])
    }

    /// Spawn one tokio task per periodic task and run them all forever.
    /// Tasks are independent: their cadences are not coordinated, and an
    /// error in one iteration only skips to that task's next scheduled run.
    pub async fn run(self, gateway: Arc<dyn Gateway>, store: Arc<dyn MissionStore>) {
        let mut handles = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            let gateway = Arc::clone(&gateway);
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                loop {
                    info!(task = task.name(), "running periodic task");
                    if let Err(e) = task.run(gateway.as_ref(), store.as_ref()).await {
                        error!(task = task.name(), error = %e, "task iteration failed");
                    }
                    tokio::time::sleep(task.interval()).await;
                }
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}
