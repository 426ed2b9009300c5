//! # ballotbook-shared
//!
//! Domain types shared by the ballot store and the HTTP server: receipt
//! codes, identity anchors, bot-detection telemetry, party tallies and the
//! drill-through report builder. Nothing in this crate touches storage.

pub mod bot;
pub mod constants;
pub mod drill;
pub mod error;
pub mod identity;
pub mod receipt;
pub mod results;

pub use bot::BotDetection;
pub use drill::{DrillLevel, DrillQuery, DrillThroughReport, PastResultRow};
pub use error::ReceiptError;
pub use identity::IdentityAnchor;
pub use receipt::ReceiptCode;
pub use results::PartyTally;
