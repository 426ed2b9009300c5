//! JSON seed import for reference data, voter profiles and sessions.
//!
//! The document is a single object with one array per table; every array is
//! optional. Rows are upserted, so importing the same file twice is a no-op.
//!
//! ```json
//! {
//!   "elections":   [{ "election_id": 1, "election_name_en": "National" }],
//!   "evaluations": [{ "election_evaluation_id": 3, "election_id": 1,
//!                     "evaluation_name_en": "Round 1", "evaluation_name_bn": "...",
//!                     "is_current": true }],
//!   "parties": [], "divisions": [], "districts": [], "constituencies": [],
//!   "candidates": [], "profiles": [], "sessions": []
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::database::Database;
use crate::error::Result;
use crate::models::{
    CandidateNomination, Constituency, District, Division, Election, ElectionEvaluation, Party,
    UserProfile, UserSession,
};
use crate::{profiles, reference};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub elections: Vec<Election>,
    pub evaluations: Vec<ElectionEvaluation>,
    pub parties: Vec<Party>,
    pub divisions: Vec<Division>,
    pub districts: Vec<District>,
    pub constituencies: Vec<Constituency>,
    pub candidates: Vec<CandidateNomination>,
    pub profiles: Vec<UserProfile>,
    pub sessions: Vec<UserSession>,
}

impl SeedData {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

/// Row counts written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub elections: usize,
    pub evaluations: usize,
    pub parties: usize,
    pub locations: usize,
    pub candidates: usize,
    pub profiles: usize,
    pub sessions: usize,
}

impl Database {
    /// Upsert everything in `seed` inside one transaction.
    ///
    /// Parents are written before children so foreign keys hold.
    pub fn import_seed(&mut self, seed: &SeedData) -> Result<SeedSummary> {
        let tx = self.conn_mut().transaction()?;

        for e in &seed.elections {
            reference::upsert_election(&tx, e)?;
        }
        for ev in &seed.evaluations {
            reference::upsert_evaluation(&tx, ev)?;
        }
        for p in &seed.parties {
            reference::upsert_party(&tx, p)?;
        }
        for d in &seed.divisions {
            reference::upsert_division(&tx, d)?;
        }
        for d in &seed.districts {
            reference::upsert_district(&tx, d)?;
        }
        for c in &seed.constituencies {
            reference::upsert_constituency(&tx, c)?;
        }
        for c in &seed.candidates {
            reference::upsert_candidate(&tx, c)?;
        }
        for p in &seed.profiles {
            profiles::upsert_profile(&tx, p)?;
        }
        for s in &seed.sessions {
            profiles::upsert_session(&tx, s)?;
        }

        tx.commit()?;

        let summary = SeedSummary {
            elections: seed.elections.len(),
            evaluations: seed.evaluations.len(),
            parties: seed.parties.len(),
            locations: seed.divisions.len() + seed.districts.len() + seed.constituencies.len(),
            candidates: seed.candidates.len(),
            profiles: seed.profiles.len(),
            sessions: seed.sessions.len(),
        };
        tracing::info!(?summary, "seed data imported");
        Ok(summary)
    }
}
