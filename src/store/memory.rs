//! In-memory mission store (non-persistent).

use super::{Mission, MissionStatus, MissionStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryMissionStore {
    missions: Arc<RwLock<HashMap<u64, Mission>>>,
}

impl InMemoryMissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MissionStore for InMemoryMissionStore {
    async fn current_missions(&self) -> Result<Vec<Mission>, StoreError> {
        Ok(self
            .missions
            .read()
            .await
            .values()
            .filter(|m| m.status != MissionStatus::Finished)
            .cloned()
            .collect())
    }

    async fn get_mission(&self, id: u64) -> Result<Option<Mission>, StoreError> {
        Ok(self.missions.read().await.get(&id).cloned())
    }

    async fn missions_by_status(&self, status: MissionStatus) -> Result<Vec<Mission>, StoreError> {
        Ok(self
            .missions
            .read()
            .await
            .values()
            .filter(|m| m.status == status)
            .cloned()
            .collect())
    }

    async fn upsert_mission(&self, mission: &Mission) -> Result<(), StoreError> {
        self.missions
            .write()
            .await
            .insert(mission.id, mission.clone());
        Ok(())
    }
}
