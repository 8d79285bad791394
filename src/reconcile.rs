//! Live-vs-stored mission reconciliation.
//!
//! Every pass diffs the live listing against the persisted snapshot:
//! stored missions that vanished from the listing finish, and every live
//! mission gets its status re-derived from its fields plus its previous
//! stored status. The pass is idempotent given an unchanged live set, so
//! the controller can safely re-run it around probing and dispatch.

use tracing::{info, warn};

use crate::gateway::{Gateway, LiveMission};
use crate::store::{Mission, MissionStatus, MissionStore};
use crate::tasks::ControlError;

/// Derive a live mission's status from its fields and its previous stored
/// status. First match wins:
///
/// 1. `vehicle_state == 1` → `Driving`
/// 2. `missing_text` present → `Missing`
/// 3. `vehicle_state == 2` → `Ongoing`
/// 4. never stored, or stored as `New` → `New`
/// 5. otherwise → `New`, flagged as an anomaly (no rule matched)
pub fn resolve_status(live: &LiveMission, prior: Option<MissionStatus>) -> (MissionStatus, bool) {
    if live.vehicle_state == 1 {
        return (MissionStatus::Driving, false);
    }
    if live.missing_text.is_some() {
        return (MissionStatus::Missing, false);
    }
    if live.vehicle_state == 2 {
        return (MissionStatus::Ongoing, false);
    }
    match prior {
        None | Some(MissionStatus::New) => (MissionStatus::New, false),
        Some(_) => (MissionStatus::New, true),
    }
}

/// Refresh the store from the live mission listing.
///
/// Finishes stored missions that are no longer listed (clearing their
/// `missing_text`), then upserts every live mission with its resolved
/// status. Per-mission anomalies are logged and absorbed; only gateway or
/// store failures abort the pass.
pub async fn reconcile(
    gateway: &dyn Gateway,
    store: &dyn MissionStore,
) -> Result<(), ControlError> {
    let live = gateway.get_all_missions().await?;

    // Stored missions absent from the live listing are done. Finished rows
    // never come back from current_missions, so this logs each at most once.
    for mut stored in store.current_missions().await? {
        if !live.contains_key(&stored.id) {
            info!(mission_id = stored.id, caption = %stored.caption, "finished mission");
            stored.status = MissionStatus::Finished;
            stored.missing_text = None;
            store.upsert_mission(&stored).await?;
        }
    }

    for (id, live_mission) in &live {
        let prior = store.get_mission(*id).await?;
        if prior.is_none() {
            info!(mission_id = *id, caption = %live_mission.caption, "new mission");
        }

        let (status, anomalous) = resolve_status(live_mission, prior.map(|m| m.status));
        if anomalous {
            warn!(
                mission_id = *id,
                caption = %live_mission.caption,
                "no status rule matched, defaulting to NEW"
            );
        }

        store
            .upsert_mission(&Mission::from_live(live_mission, status))
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Building, GatewayError, MissionDetail, Vehicle};
    use crate::store::InMemoryMissionStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};

    struct FixedGateway {
        live: HashMap<u64, LiveMission>,
    }

    impl FixedGateway {
        fn new(missions: Vec<LiveMission>) -> Self {
            Self {
                live: missions.into_iter().map(|m| (m.id, m)).collect(),
            }
        }
    }

    #[async_trait]
    impl Gateway for FixedGateway {
        fn user_id(&self) -> u64 {
            1
        }

        async fn get_all_buildings(&self) -> Result<Vec<Building>, GatewayError> {
            Ok(Vec::new())
        }

        async fn get_all_missions(&self) -> Result<HashMap<u64, LiveMission>, GatewayError> {
            Ok(self.live.clone())
        }

        async fn get_mission_details(&self, id: u64) -> Result<MissionDetail, GatewayError> {
            Ok(MissionDetail {
                id,
                available_vehicles: Vec::new(),
            })
        }

        async fn generate_missions(&self) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn hire_crew(&self, _building_id: u64, _count: u32) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn probe_need(&self, _id: u64, _vehicles: &[Vehicle]) -> Result<(), GatewayError> {
            Ok(())
        }

        fn parse_missing(&self, _text: &str) -> Vec<String> {
            Vec::new()
        }

        fn lookup_vehicle_type_ids(&self, _descriptor: &str) -> HashSet<u64> {
            HashSet::new()
        }

        async fn send_vehicles_to_mission(
            &self,
            _id: u64,
            _vehicle_ids: &[u64],
        ) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn live(id: u64, vehicle_state: i64, missing_text: Option<&str>) -> LiveMission {
        LiveMission {
            id,
            caption: format!("Mission {}", id),
            vehicle_state,
            missing_text: missing_text.map(str::to_string),
            user_id: 1,
            sw: false,
        }
    }

    fn stored(id: u64, status: MissionStatus) -> Mission {
        Mission {
            id,
            caption: format!("Mission {}", id),
            status,
            vehicle_state: 0,
            missing_text: None,
            user_id: 1,
            sw: false,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_first_observation_is_new() {
        let gateway = FixedGateway::new(vec![live(1, 0, None)]);
        let store = InMemoryMissionStore::new();

        reconcile(&gateway, &store).await.unwrap();

        let m = store.get_mission(1).await.unwrap().unwrap();
        assert_eq!(m.status, MissionStatus::New);
    }

    #[tokio::test]
    async fn test_absent_missions_finish_and_clear_missing_text() {
        let gateway = FixedGateway::new(Vec::new());
        let store = InMemoryMissionStore::new();
        let mut m = stored(1, MissionStatus::Missing);
        m.missing_text = Some("1 LF".to_string());
        store.upsert_mission(&m).await.unwrap();

        reconcile(&gateway, &store).await.unwrap();

        let m = store.get_mission(1).await.unwrap().unwrap();
        assert_eq!(m.status, MissionStatus::Finished);
        assert!(m.missing_text.is_none());
    }

    #[tokio::test]
    async fn test_driving_wins_over_missing_text() {
        let gateway = FixedGateway::new(vec![live(1, 1, Some("2 RTW"))]);
        let store = InMemoryMissionStore::new();
        store
            .upsert_mission(&stored(1, MissionStatus::Ongoing))
            .await
            .unwrap();

        reconcile(&gateway, &store).await.unwrap();

        let m = store.get_mission(1).await.unwrap().unwrap();
        assert_eq!(m.status, MissionStatus::Driving);
    }

    #[tokio::test]
    async fn test_missing_text_yields_missing() {
        let gateway = FixedGateway::new(vec![live(1, 0, Some("1 LF"))]);
        let store = InMemoryMissionStore::new();

        reconcile(&gateway, &store).await.unwrap();

        let m = store.get_mission(1).await.unwrap().unwrap();
        assert_eq!(m.status, MissionStatus::Missing);
        assert_eq!(m.missing_text.as_deref(), Some("1 LF"));
    }

    #[tokio::test]
    async fn test_ongoing_from_vehicle_state() {
        let gateway = FixedGateway::new(vec![live(1, 2, None)]);
        let store = InMemoryMissionStore::new();

        reconcile(&gateway, &store).await.unwrap();

        let m = store.get_mission(1).await.unwrap().unwrap();
        assert_eq!(m.status, MissionStatus::Ongoing);
    }

    #[tokio::test]
    async fn test_stored_new_stays_new() {
        let gateway = FixedGateway::new(vec![live(1, 0, None)]);
        let store = InMemoryMissionStore::new();
        store
            .upsert_mission(&stored(1, MissionStatus::New))
            .await
            .unwrap();

        reconcile(&gateway, &store).await.unwrap();

        let m = store.get_mission(1).await.unwrap().unwrap();
        assert_eq!(m.status, MissionStatus::New);
    }

    #[tokio::test]
    async fn test_anomaly_defaults_to_new() {
        // Stored as Ongoing, but the live view now carries no signal at all.
        let gateway = FixedGateway::new(vec![live(1, 0, None)]);
        let store = InMemoryMissionStore::new();
        store
            .upsert_mission(&stored(1, MissionStatus::Ongoing))
            .await
            .unwrap();

        reconcile(&gateway, &store).await.unwrap();

        let m = store.get_mission(1).await.unwrap().unwrap();
        assert_eq!(m.status, MissionStatus::New);
    }

    #[tokio::test]
    async fn test_idempotent_on_unchanged_live_set() {
        let gateway = FixedGateway::new(vec![
            live(1, 1, None),
            live(2, 0, Some("1 DLK")),
            live(3, 2, None),
        ]);
        let store = InMemoryMissionStore::new();
        store
            .upsert_mission(&stored(4, MissionStatus::Driving))
            .await
            .unwrap();

        reconcile(&gateway, &store).await.unwrap();
        let snapshot = |missions: Vec<Mission>| {
            let mut v: Vec<(u64, MissionStatus, Option<String>)> = missions
                .into_iter()
                .map(|m| (m.id, m.status, m.missing_text))
                .collect();
            v.sort_by_key(|(id, _, _)| *id);
            v
        };
        let first = snapshot(store.current_missions().await.unwrap());

        reconcile(&gateway, &store).await.unwrap();
        let second = snapshot(store.current_missions().await.unwrap());

        assert_eq!(first, second);
        // The vanished mission stays finished across both runs.
        let gone = store.get_mission(4).await.unwrap().unwrap();
        assert_eq!(gone.status, MissionStatus::Finished);
    }

    #[test]
    fn test_resolve_status_priority_order() {
        let mut m = live(1, 1, Some("1 LF"));
        assert_eq!(resolve_status(&m, None).0, MissionStatus::Driving);

        m.vehicle_state = 2;
        assert_eq!(resolve_status(&m, None).0, MissionStatus::Missing);

        m.missing_text = None;
        assert_eq!(resolve_status(&m, None).0, MissionStatus::Ongoing);

        m.vehicle_state = 0;
        assert_eq!(resolve_status(&m, None), (MissionStatus::New, false));
        assert_eq!(
            resolve_status(&m, Some(MissionStatus::Driving)),
            (MissionStatus::New, true)
        );
    }
}
