//! Domain model structs persisted in the ballot database.
//!
//! Reference structs derive `Serialize` and `Deserialize` so they double as
//! seed-file records and API payloads.

use ballotbook_shared::{BotDetection, IdentityAnchor, PartyTally, ReceiptCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Elections
// ---------------------------------------------------------------------------

/// A voting event (e.g. a national parliamentary election).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Election {
    pub election_id: i64,
    #[serde(default)]
    pub election_type_code: Option<String>,
    #[serde(default = "default_status")]
    pub election_status_code: String,
    pub election_name_en: String,
    #[serde(default)]
    pub election_name_bn: Option<String>,
    #[serde(default)]
    pub election_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A voting round within an election. Voters cast at most one ballot per
/// evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElectionEvaluation {
    pub election_evaluation_id: i64,
    pub election_id: i64,
    pub evaluation_name_en: String,
    pub evaluation_name_bn: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// An evaluation open for voting, joined with its election.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentElection {
    pub election_evaluation_id: i64,
    pub election_id: i64,
    pub evaluation_name_en: String,
    pub evaluation_name_bn: String,
    pub election_name_en: String,
    pub election_date: Option<NaiveDate>,
}

/// An evaluation that has results in the results view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PastElection {
    pub election_evaluation_id: i64,
    pub evaluation_name: String,
}

// ---------------------------------------------------------------------------
// Parties and candidates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Party {
    pub party_id: i64,
    #[serde(default)]
    pub party_name_en: Option<String>,
    pub party_name_bn: String,
    #[serde(default)]
    pub party_short_name_bn: Option<String>,
    #[serde(default)]
    pub party_symbol_name_bn: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateNomination {
    pub candidate_id: i64,
    pub election_evaluation_id: i64,
    pub constituency_id: i64,
    #[serde(default)]
    pub party_id: Option<i64>,
    #[serde(default)]
    pub candidate_name_en: Option<String>,
    pub candidate_name_bn: String,
}

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Division {
    pub division_id: i64,
    pub division_name_en: String,
    pub division_name_bn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct District {
    pub district_id: i64,
    pub division_id: i64,
    pub district_name_en: String,
    pub district_name_bn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Constituency {
    pub constituency_id: i64,
    pub district_id: i64,
    pub constituency_name_en: String,
    pub constituency_name_bn: String,
    #[serde(default)]
    pub seat_number_en: Option<String>,
    #[serde(default)]
    pub seat_number_bn: Option<String>,
    #[serde(default)]
    pub area_list_bn: Option<String>,
}

// ---------------------------------------------------------------------------
// Voters
// ---------------------------------------------------------------------------

/// The voting identity behind a login account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub user_profile_id: i64,
    pub user_account_id: i64,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A login session together with its risk signals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSession {
    pub user_session_id: i64,
    pub user_profile_id: i64,
    #[serde(default = "default_true")]
    pub is_authenticated_session: bool,
    #[serde(default)]
    pub is_vpn_suspected: bool,
    #[serde(default)]
    pub risk_score: Option<i64>,
    #[serde(default)]
    pub ip_address: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Ballots
// ---------------------------------------------------------------------------

/// Proof that a voter has used their vote in an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryBookEntry {
    pub registry_book_id: i64,
    pub election_evaluation_id: i64,
    pub user_profile_id: i64,
    pub identity_anchor: IdentityAnchor,
    pub mobile_sim_slot_number: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DigitalBallot {
    pub digital_ballot_id: i64,
    pub registry_book_id: i64,
    pub election_id: i64,
    pub election_evaluation_id: i64,
    pub user_profile_id: i64,
    pub receipt_code: ReceiptCode,
    /// `None` only while the casting transaction is in flight.
    pub cast_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub bot_detection: BotDetection,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// The selection recorded on a ballot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteEntry {
    pub vote_entry_id: i64,
    pub digital_ballot_id: i64,
    pub election_id: i64,
    pub constituency_id: i64,
    pub union_parishad_id: Option<i64>,
    pub party_id: i64,
    pub candidate_id: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Live per-party counts for one evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NationalResults {
    pub results: Vec<PartyTally>,
    pub total_votes: i64,
}

fn default_true() -> bool {
    true
}

fn default_status() -> String {
    "scheduled".to_string()
}
