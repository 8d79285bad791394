//! # dispatch-pilot
//!
//! Automation daemon for a session-based emergency-dispatch game service.
//!
//! The daemon runs a fixed set of independently-timed periodic tasks against
//! the remote service:
//! - hire crew in every owned building (daily)
//! - ask the service to generate new missions (every 20s)
//! - reconcile the local mission snapshot with the live listing and send
//!   available vehicles to missions that report a shortfall (every 30s)
//!
//! ## Control Flow
//!
//! ```text
//!        ┌───────────────────────────────┐
//!        │          Scheduler            │
//!        │  (one tokio task per job)     │
//!        └──────────────┬────────────────┘
//!                       │
//!        reconcile → probe → reconcile → dispatch → reconcile
//!                       │
//!                       ▼
//!          ┌──────────┐    ┌──────────────┐
//!          │ Gateway  │    │ MissionStore │
//!          │ (HTTP)   │    │ (SQLite)     │
//!          └──────────┘    └──────────────┘
//! ```
//!
//! ## Modules
//! - `gateway`: remote service client (missions, vehicles, buildings)
//! - `store`: persisted mission snapshot with pluggable backends
//! - `reconcile`: live-vs-stored status reconciliation
//! - `dispatch`: vehicle matching and dispatch commands
//! - `tasks`: periodic task trait, concrete tasks, and the scheduler

pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod reconcile;
pub mod store;
pub mod tasks;

pub use config::Config;
pub use gateway::{Gateway, HttpGateway};
pub use store::{Mission, MissionStatus, MissionStore, SqliteMissionStore};
pub use tasks::{ControlError, PeriodicTask, Scheduler};
