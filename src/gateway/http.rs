//! HTTP gateway against the live game service.
//!
//! The service is session-based: a form login establishes a cookie session
//! that every later call rides on. The user id is resolved once at login
//! and held on the gateway, never in process-global state.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use url::Url;

use super::{
    catalog, Building, Gateway, GatewayError, LiveMission, MissionDetail, Vehicle,
};
use crate::config::Config;

/// Mission fields as the service serializes them. The listing keys its JSON
/// map by the string form of the id, so ids are normalized to `u64` on
/// ingest and the key is authoritative.
#[derive(Debug, Deserialize)]
struct WireMission {
    caption: String,
    #[serde(default)]
    vehicle_state: i64,
    #[serde(default)]
    missing_text: Option<String>,
    user_id: u64,
    #[serde(default)]
    sw: bool,
}

#[derive(Debug, Deserialize)]
struct WireVehicleList {
    #[serde(default)]
    available: Vec<Vehicle>,
}

#[derive(Debug, Deserialize)]
struct WireMissionDetail {
    vehicles: WireVehicleList,
}

#[derive(Debug, Deserialize)]
struct WireProfile {
    user_id: u64,
}

/// Production [`Gateway`] backed by the game service's HTTP API.
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    user_id: u64,
}

impl HttpGateway {
    /// Log in and resolve the session user.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Auth` when the credentials are rejected.
    pub async fn login(config: &Config) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("dispatch-pilot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let resp = client
            .post(config.base_url.join("users/sign_in")?)
            .form(&[
                ("user[email]", config.email.as_str()),
                ("user[password]", config.password.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GatewayError::Auth(format!(
                "sign_in returned {}",
                resp.status()
            )));
        }

        let profile: WireProfile = client
            .get(config.base_url.join("api/profile")?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::info!(user_id = profile.user_id, "session established");

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            user_id: profile.user_id,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.base_url.join(path)?)
    }

    /// POST a JSON body and require a success status.
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        let resp = self
            .client
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::UnexpectedResponse { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    fn user_id(&self) -> u64 {
        self.user_id
    }

    async fn get_all_buildings(&self) -> Result<Vec<Building>, GatewayError> {
        let buildings: Vec<Building> = self
            .client
            .get(self.endpoint("api/buildings")?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(buildings)
    }

    async fn get_all_missions(&self) -> Result<HashMap<u64, LiveMission>, GatewayError> {
        let wire: HashMap<String, WireMission> = self
            .client
            .get(self.endpoint("api/missions")?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut missions = HashMap::with_capacity(wire.len());
        for (key, m) in wire {
            let id: u64 = match key.parse() {
                Ok(id) => id,
                Err(_) => {
                    tracing::warn!(key = %key, "skipping mission with non-numeric id");
                    continue;
                }
            };
            missions.insert(
                id,
                LiveMission {
                    id,
                    caption: m.caption,
                    vehicle_state: m.vehicle_state,
                    missing_text: m.missing_text,
                    user_id: m.user_id,
                    sw: m.sw,
                },
            );
        }
        Ok(missions)
    }

    async fn get_mission_details(&self, mission_id: u64) -> Result<MissionDetail, GatewayError> {
        let detail: WireMissionDetail = self
            .client
            .get(self.endpoint(&format!("api/missions/{}", mission_id))?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(MissionDetail {
            id: mission_id,
            available_vehicles: detail.vehicles.available,
        })
    }

    async fn generate_missions(&self) -> Result<(), GatewayError> {
        self.post_json("missions/generate", &serde_json::json!({}))
            .await
    }

    async fn hire_crew(&self, building_id: u64, count: u32) -> Result<(), GatewayError> {
        self.post_json(
            &format!("buildings/{}/hire", building_id),
            &serde_json::json!({ "amount": count }),
        )
        .await
    }

    async fn probe_need(&self, mission_id: u64, vehicles: &[Vehicle]) -> Result<(), GatewayError> {
        let vehicle_ids: Vec<u64> = vehicles.iter().map(|v| v.id).collect();
        self.post_json(
            &format!("api/missions/{}/probe", mission_id),
            &serde_json::json!({ "vehicle_ids": vehicle_ids }),
        )
        .await
    }

    fn parse_missing(&self, missing_text: &str) -> Vec<String> {
        catalog::parse_missing_text(missing_text)
    }

    fn lookup_vehicle_type_ids(&self, descriptor: &str) -> HashSet<u64> {
        catalog::type_ids_for(descriptor)
    }

    async fn send_vehicles_to_mission(
        &self,
        mission_id: u64,
        vehicle_ids: &[u64],
    ) -> Result<(), GatewayError> {
        self.post_json(
            &format!("api/missions/{}/alarm", mission_id),
            &serde_json::json!({ "vehicle_ids": vehicle_ids }),
        )
        .await
    }
}
