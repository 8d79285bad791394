//! Remote service gateway.
//!
//! The game service is session-based: one authenticated user, everything
//! else keyed off that session. All consumed operations live behind the
//! [`Gateway`] trait so the engines can be exercised against mocks.

mod catalog;
mod http;

pub use catalog::{parse_missing_text, type_ids_for};
pub use http::HttpGateway;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("unexpected response ({status}): {body}")]
    UnexpectedResponse {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// A mission as reported by the live listing.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveMission {
    pub id: u64,
    pub caption: String,
    /// Vehicle movement signal: 1 = driving, 2 = on scene.
    #[serde(default)]
    pub vehicle_state: i64,
    /// Free-text description of outstanding needs. Present iff the mission
    /// currently lacks resources.
    #[serde(default)]
    pub missing_text: Option<String>,
    pub user_id: u64,
    /// Restricted mission category, excluded from automatic dispatch.
    #[serde(default)]
    pub sw: bool,
}

/// A building as reported by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct Building {
    pub id: u64,
    pub caption: String,
    pub user_id: u64,
    /// Number of open staff slots.
    #[serde(default)]
    pub personal_count: i64,
}

/// A vehicle currently stationed and available for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub type_id: u64,
}

/// Detail view of a single mission.
#[derive(Debug, Clone)]
pub struct MissionDetail {
    pub id: u64,
    pub available_vehicles: Vec<Vehicle>,
}

/// Remote service operations consumed by the engines and tasks.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Id of the user owning the current session. Dispatch only acts on
    /// missions owned by this user.
    fn user_id(&self) -> u64;

    /// All buildings known to the service.
    async fn get_all_buildings(&self) -> Result<Vec<Building>, GatewayError>;

    /// The full live mission listing, keyed by mission id.
    async fn get_all_missions(&self) -> Result<HashMap<u64, LiveMission>, GatewayError>;

    /// Detail view of one mission, including its available vehicles.
    async fn get_mission_details(&self, mission_id: u64) -> Result<MissionDetail, GatewayError>;

    /// Ask the service to generate new missions.
    async fn generate_missions(&self) -> Result<(), GatewayError>;

    /// Hire `count` crew at the given building.
    async fn hire_crew(&self, building_id: u64, count: u32) -> Result<(), GatewayError>;

    /// Ask the service to evaluate resource need for a mission given its
    /// currently available vehicles.
    async fn probe_need(&self, mission_id: u64, vehicles: &[Vehicle]) -> Result<(), GatewayError>;

    /// Resolve a missing-resource text into required vehicle-type
    /// descriptors, in the order they appear.
    fn parse_missing(&self, missing_text: &str) -> Vec<String>;

    /// Resolve a vehicle-type descriptor into the set of matching type ids.
    /// Unknown descriptors resolve to the empty set.
    fn lookup_vehicle_type_ids(&self, descriptor: &str) -> HashSet<u64>;

    /// Commit the given vehicles to a mission.
    async fn send_vehicles_to_mission(
        &self,
        mission_id: u64,
        vehicle_ids: &[u64],
    ) -> Result<(), GatewayError>;
}
