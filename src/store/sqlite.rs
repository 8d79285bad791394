//! SQLite-backed mission store.

use super::{Mission, MissionStatus, MissionStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS missions (
    id INTEGER PRIMARY KEY NOT NULL,
    caption TEXT NOT NULL,
    status TEXT NOT NULL,
    vehicle_state INTEGER NOT NULL DEFAULT 0,
    missing_text TEXT,
    user_id INTEGER NOT NULL,
    sw INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_missions_status ON missions(status);
"#;

const MISSION_COLUMNS: &str =
    "id, caption, status, vehicle_state, missing_text, user_id, sw, updated_at";

pub struct SqliteMissionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMissionStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            conn.execute_batch(SCHEMA)?;
            Ok::<_, rusqlite::Error>(conn)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn mission_from_row(row: &Row<'_>) -> Result<Mission, rusqlite::Error> {
        let status_str: String = row.get(2)?;
        let updated_at_str: String = row.get(7)?;

        Ok(Mission {
            id: row.get(0)?,
            caption: row.get(1)?,
            // Rows are only ever written through MissionStatus::as_str, so an
            // unparsable status means a foreign writer; treat it as New.
            status: MissionStatus::parse(&status_str).unwrap_or(MissionStatus::New),
            vehicle_state: row.get(3)?,
            missing_text: row.get(4)?,
            user_id: row.get(5)?,
            sw: row.get::<_, i64>(6)? != 0,
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl MissionStore for SqliteMissionStore {
    async fn current_missions(&self) -> Result<Vec<Mission>, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM missions WHERE status != ?1",
                MISSION_COLUMNS
            ))?;
            let missions = stmt
                .query_map(params![MissionStatus::Finished.as_str()], |row| {
                    Self::mission_from_row(row)
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(missions)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }

    async fn get_mission(&self, id: u64) -> Result<Option<Mission>, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mission = conn
                .query_row(
                    &format!("SELECT {} FROM missions WHERE id = ?1", MISSION_COLUMNS),
                    params![id],
                    |row| Self::mission_from_row(row),
                )
                .optional()?;
            Ok(mission)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }

    async fn missions_by_status(&self, status: MissionStatus) -> Result<Vec<Mission>, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM missions WHERE status = ?1",
                MISSION_COLUMNS
            ))?;
            let missions = stmt
                .query_map(params![status.as_str()], |row| Self::mission_from_row(row))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(missions)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }

    async fn upsert_mission(&self, mission: &Mission) -> Result<(), StoreError> {
        let conn = self.conn.clone();
        let m = mission.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT OR REPLACE INTO missions
                 (id, caption, status, vehicle_state, missing_text, user_id, sw, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    m.id,
                    m.caption,
                    m.status.as_str(),
                    m.vehicle_state,
                    m.missing_text,
                    m.user_id,
                    if m.sw { 1 } else { 0 },
                    m.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }
}
