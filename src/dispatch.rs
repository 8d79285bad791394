//! Vehicle probing and dispatch.
//!
//! Two phases, each consuming only missions the reconciliation pass
//! flagged: new missions get a resource-need probe, missing missions get
//! whatever vehicles the available pool can cover. Both phases pause
//! between service calls through an injectable [`Pacer`] so tests run
//! without wall-clock delays.

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

use crate::gateway::{Gateway, Vehicle};
use crate::store::{MissionStatus, MissionStore};
use crate::tasks::ControlError;

/// Per-mission result of a dispatch pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub mission_id: u64,
    /// Vehicle ids committed in the single dispatch call, in match order
    pub sent: Vec<u64>,
    /// Required-type descriptors the pool could not cover. Recorded only;
    /// escalation is out of scope.
    pub unfilled: Vec<String>,
}

/// Inter-call pacing policy.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps a fixed cooldown between service calls to respect rate limits.
pub struct CooldownPacer {
    delay: Duration,
}

impl CooldownPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Pacer for CooldownPacer {
    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// No pacing at all, for tests.
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self) {}
}

/// The set of vehicles still available for matching within one mission's
/// dispatch pass. Candidates are matched against a snapshot and removed by
/// id, so a vehicle is never selected twice.
struct VehiclePool {
    vehicles: Vec<Vehicle>,
}

impl VehiclePool {
    fn new(vehicles: Vec<Vehicle>) -> Self {
        Self { vehicles }
    }

    /// Remove and return the first vehicle whose type id is in `type_ids`.
    fn take_first_of_types(&mut self, type_ids: &HashSet<u64>) -> Option<Vehicle> {
        let pos = self.vehicles.iter().position(|v| type_ids.contains(&v.type_id))?;
        Some(self.vehicles.remove(pos))
    }
}

/// Submit a resource-need probe for every stored `New` mission.
pub async fn probe_new(
    gateway: &dyn Gateway,
    store: &dyn MissionStore,
    pacer: &dyn Pacer,
) -> Result<(), ControlError> {
    for mission in store.missions_by_status(MissionStatus::New).await? {
        info!(mission_id = mission.id, caption = %mission.caption, "probing resource need");
        let detail = gateway.get_mission_details(mission.id).await?;
        gateway
            .probe_need(mission.id, &detail.available_vehicles)
            .await?;
        pacer.pause().await;
    }
    Ok(())
}

/// Match available vehicles against every stored `Missing` mission and
/// issue one dispatch call per mission that got at least one match.
///
/// Restricted (`sw`) missions and missions not owned by the session user
/// are skipped: this automation cannot safely manage them. Partial
/// fulfillment is allowed; uncovered requirements are recorded on the
/// returned [`DispatchOutcome`] without escalation.
pub async fn dispatch_missing(
    gateway: &dyn Gateway,
    store: &dyn MissionStore,
    pacer: &dyn Pacer,
) -> Result<Vec<DispatchOutcome>, ControlError> {
    let mut outcomes = Vec::new();

    for mission in store.missions_by_status(MissionStatus::Missing).await? {
        if mission.sw || mission.user_id != gateway.user_id() {
            debug!(mission_id = mission.id, sw = mission.sw, "skipping excluded mission");
            continue;
        }
        let missing_text = match &mission.missing_text {
            Some(text) => text,
            // A Missing row always carries the text that made it Missing;
            // an empty one has nothing to match against.
            None => continue,
        };

        let detail = gateway.get_mission_details(mission.id).await?;
        let mut pool = VehiclePool::new(detail.available_vehicles);

        let mut sent = Vec::new();
        let mut unfilled = Vec::new();
        for descriptor in gateway.parse_missing(missing_text) {
            let type_ids = gateway.lookup_vehicle_type_ids(&descriptor);
            match pool.take_first_of_types(&type_ids) {
                Some(vehicle) => sent.push(vehicle.id),
                None => unfilled.push(descriptor),
            }
        }

        if !sent.is_empty() {
            gateway.send_vehicles_to_mission(mission.id, &sent).await?;
            info!(
                mission_id = mission.id,
                caption = %mission.caption,
                vehicles = ?sent,
                "sent vehicles to mission"
            );
            pacer.pause().await;
        }
        if !unfilled.is_empty() {
            debug!(
                mission_id = mission.id,
                unfilled = ?unfilled,
                "mission still needs help"
            );
        }

        outcomes.push(DispatchOutcome {
            mission_id: mission.id,
            sent,
            unfilled,
        });
    }

    Ok(outcomes)
}
