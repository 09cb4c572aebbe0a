//! `agenda-core`: types and configuration shared by every agenda crate.
//!
//! The alert engine in `agenda-alerts` only ever sees the persistence layer
//! through the [`gateway::StoreGateway`] trait defined here, so the SQLite
//! store and the in-test fakes are interchangeable.

pub mod config;
pub mod datetime;
pub mod error;
pub mod gateway;
pub mod types;

pub use error::{CoreError, Result};
pub use gateway::StoreGateway;
pub use types::{DueWindow, ItemId, ScheduledItem, View};
