//! Mission storage with pluggable backends.
//!
//! The store holds the locally persisted snapshot of the live mission
//! listing that reconciliation diffs against on every pass.
//!
//! Backends:
//! - `sqlite`: SQLite database (production)
//! - `memory`: in-memory map (tests, ephemeral runs)

mod memory;
mod sqlite;

pub use memory::InMemoryMissionStore;
pub use sqlite::SqliteMissionStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::gateway::LiveMission;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking task join error: {0}")]
    Join(String),
}

/// Status of a stored mission.
///
/// # State Machine
/// ```text
/// New -> Driving | Missing | Ongoing   (per live fields, every pass)
/// any non-Finished -> Finished          (id absent from the live listing)
/// ```
/// `Finished` is terminal: reconciliation never revisits a finished row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionStatus {
    /// First observed, not yet crewed
    New,
    /// Vehicles are en route
    Driving,
    /// Vehicles are on scene
    Ongoing,
    /// The service reports a resource shortfall
    Missing,
    /// No longer present in the live listing
    Finished,
}

impl MissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Driving => "DRIVING",
            Self::Ongoing => "ONGOING",
            Self::Missing => "MISSING",
            Self::Finished => "FINISHED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Self::New),
            "DRIVING" => Some(Self::Driving),
            "ONGOING" => Some(Self::Ongoing),
            "MISSING" => Some(Self::Missing),
            "FINISHED" => Some(Self::Finished),
            _ => None,
        }
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted mission record.
#[derive(Debug, Clone)]
pub struct Mission {
    /// Service-issued id, the join key against the live listing
    pub id: u64,
    /// Display text, used for logging only
    pub caption: String,
    pub status: MissionStatus,
    /// Vehicle movement signal from the service (1 = driving, 2 = on scene)
    pub vehicle_state: i64,
    /// Outstanding-need text; cleared when the mission finishes
    pub missing_text: Option<String>,
    /// Owner of the mission
    pub user_id: u64,
    /// Restricted category, excluded from automatic dispatch
    pub sw: bool,
    pub updated_at: DateTime<Utc>,
}

impl Mission {
    /// Build a store record from a live mission and its resolved status.
    pub fn from_live(live: &LiveMission, status: MissionStatus) -> Self {
        Self {
            id: live.id,
            caption: live.caption.clone(),
            status,
            vehicle_state: live.vehicle_state,
            missing_text: live.missing_text.clone(),
            user_id: live.user_id,
            sw: live.sw,
            updated_at: Utc::now(),
        }
    }
}

/// Mission store trait - implemented by all storage backends.
#[async_trait]
pub trait MissionStore: Send + Sync {
    /// All missions that have not finished yet.
    async fn current_missions(&self) -> Result<Vec<Mission>, StoreError>;

    /// A single mission by id, or `None` if never observed.
    async fn get_mission(&self, id: u64) -> Result<Option<Mission>, StoreError>;

    /// All missions currently carrying the given status.
    async fn missions_by_status(&self, status: MissionStatus) -> Result<Vec<Mission>, StoreError>;

    /// Insert the mission, overwriting any prior record with the same id.
    async fn upsert_mission(&self, mission: &Mission) -> Result<(), StoreError>;
}
