//! `agenda-store`: SQLite persistence for agenda items.
//!
//! Items live in a single `agenda_items` table. [`AgendaStore`] is the
//! production [`agenda_core::StoreGateway`]: the notification poller asks it
//! for due items on every cycle and flags each one once it has been surfaced.

pub mod db;
pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::AgendaStore;
