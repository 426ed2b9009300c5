//! # ballotbook-store
//!
//! SQLite storage for election ballots.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection`: reference data and voter sessions, the
//! eligibility check, the transactional vote cast, and results queries
//! including the drill-through view.

pub mod ballots;
pub mod database;
pub mod eligibility;
pub mod migrations;
pub mod models;
pub mod profiles;
pub mod reference;
pub mod results;
pub mod seed;

mod error;

#[cfg(test)]
mod fixtures;

pub use ballots::{CastReceipt, CastVote};
pub use database::Database;
pub use eligibility::Eligibility;
pub use error::{Result, StoreError};
pub use models::*;
pub use seed::{SeedData, SeedSummary};
