//! Ballot casting and lookup.
//!
//! A cast writes three rows in one `BEGIN IMMEDIATE` transaction: the
//! registry book entry that marks the voter as having voted, the ballot
//! carrying the receipt code, and the vote entry with the selection. The
//! ballot's cast timestamp is only set once the vote entry exists, so
//! results never count a ballot without a selection.
//!
//! Taking the write lock up front serialises concurrent casts; eligibility
//! is re-checked under that lock and the unique registry index backs it up.

use ballotbook_shared::constants::{MAX_IP_ADDRESS_LEN, WEB_SIM_SLOT};
use ballotbook_shared::{receipt, BotDetection, IdentityAnchor, ReceiptCode};
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;

use crate::database::{parse_timestamp, timestamp, Database};
use crate::eligibility;
use crate::error::{Result, StoreError};
use crate::models::{DigitalBallot, RegistryBookEntry, VoteEntry};

/// A voter's selection plus the request metadata stored with it.
#[derive(Debug, Clone)]
pub struct CastVote {
    pub election_evaluation_id: i64,
    pub election_id: i64,
    pub constituency_id: i64,
    pub party_id: i64,
    pub candidate_id: Option<i64>,
    pub union_parishad_id: Option<i64>,
    pub bot_detection: BotDetection,
    pub identity_anchor: IdentityAnchor,
    pub ip_address: Option<String>,
}

/// Returned to the voter after a successful cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastReceipt {
    pub ballot_id: i64,
    pub receipt_code: ReceiptCode,
    pub cast_at: DateTime<Utc>,
}

impl Database {
    /// Record a ballot for `user_account_id`.
    ///
    /// Fails with [`StoreError::Ineligible`] when any eligibility rule fails
    /// and [`StoreError::AlreadyVoted`] if the registry index rejects the
    /// row. Nothing is written on failure.
    pub fn cast_vote(
        &mut self,
        user_account_id: i64,
        vote: &CastVote,
        risk_threshold: i64,
    ) -> Result<CastReceipt> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let check = eligibility::evaluate(
            &tx,
            user_account_id,
            vote.election_evaluation_id,
            risk_threshold,
        )?;
        if !check.is_eligible() {
            return Err(StoreError::Ineligible(check.reasons));
        }
        let profile = check.profile.ok_or(StoreError::NotFound)?;

        let receipt_code = receipt::generate_unique(&mut rand::thread_rng(), |code| {
            receipt_taken(&tx, code).map_err(StoreError::from)
        })?;

        let created = timestamp(&Utc::now());

        let inserted = tx.execute(
            "INSERT INTO digital_ballot_registry_book
                (election_evaluation_id, user_profile_id, hash_identity_anchor,
                 mobile_sim_slot_number, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                vote.election_evaluation_id,
                profile.user_profile_id,
                &vote.identity_anchor.as_bytes()[..],
                WEB_SIM_SLOT,
                created,
            ],
        );
        match inserted {
            Err(e) if is_unique_violation(&e) => return Err(StoreError::AlreadyVoted),
            other => {
                other?;
            }
        }
        let registry_book_id = tx.last_insert_rowid();

        let ip_address = vote.ip_address.as_deref().map(truncate_ip);
        tx.execute(
            "INSERT INTO digital_ballots
                (registry_book_id, election_id, election_evaluation_id, user_profile_id,
                 receipt_code, ballot_cast_timestamp, geofencing_ip_address,
                 is_active, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, 1, ?7, ?7)",
            params![
                registry_book_id,
                vote.election_id,
                vote.election_evaluation_id,
                profile.user_profile_id,
                receipt_code.as_str(),
                ip_address,
                created,
            ],
        )?;
        let ballot_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO digital_ballot_vote_entries
                (digital_ballot_id, election_id, constituency_id, union_parishad_id,
                 party_id, candidate_id, is_active, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
            params![
                ballot_id,
                vote.election_id,
                vote.constituency_id,
                vote.union_parishad_id,
                vote.party_id,
                vote.candidate_id,
                created,
            ],
        )?;

        // Stored at microsecond precision; keep the receipt identical.
        let cast_at = Utc::now().trunc_subsecs(6);
        let bot = &vote.bot_detection;
        tx.execute(
            "UPDATE digital_ballots
             SET ballot_cast_timestamp = ?1,
                 botdetection_vote_duration_ms = ?2,
                 botdetection_interaction_count = ?3,
                 botdetection_question_avg = ?4,
                 modified_at = ?1
             WHERE digital_ballot_id = ?5",
            params![
                timestamp(&cast_at),
                bot.vote_duration_ms,
                bot.interaction_count,
                bot.question_avg,
                ballot_id,
            ],
        )?;

        tx.commit()?;

        tracing::info!(
            evaluation = vote.election_evaluation_id,
            ballot_id,
            has_telemetry = !vote.bot_detection.is_empty(),
            "ballot cast"
        );

        Ok(CastReceipt {
            ballot_id,
            receipt_code,
            cast_at,
        })
    }

    /// Look up a ballot by the code handed to the voter.
    pub fn get_ballot_by_receipt(&self, code: &ReceiptCode) -> Result<DigitalBallot> {
        self.conn()
            .query_row(
                "SELECT digital_ballot_id, registry_book_id, election_id, election_evaluation_id,
                        user_profile_id, receipt_code, ballot_cast_timestamp,
                        geofencing_ip_address, botdetection_vote_duration_ms,
                        botdetection_interaction_count, botdetection_question_avg,
                        is_active, created_at
                 FROM digital_ballots WHERE receipt_code = ?1",
                params![code.as_str()],
                row_to_ballot,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
    }

    pub fn get_vote_entries(&self, digital_ballot_id: i64) -> Result<Vec<VoteEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT vote_entry_id, digital_ballot_id, election_id, constituency_id,
                    union_parishad_id, party_id, candidate_id, is_active, created_at
             FROM digital_ballot_vote_entries
             WHERE digital_ballot_id = ?1
             ORDER BY vote_entry_id ASC",
        )?;
        let rows = stmt.query_map(params![digital_ballot_id], |row| {
            let created_str: String = row.get(8)?;
            Ok(VoteEntry {
                vote_entry_id: row.get(0)?,
                digital_ballot_id: row.get(1)?,
                election_id: row.get(2)?,
                constituency_id: row.get(3)?,
                union_parishad_id: row.get(4)?,
                party_id: row.get(5)?,
                candidate_id: row.get(6)?,
                is_active: row.get(7)?,
                created_at: parse_timestamp(8, &created_str)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn get_registry_entry(
        &self,
        election_evaluation_id: i64,
        user_profile_id: i64,
    ) -> Result<Option<RegistryBookEntry>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT registry_book_id, election_evaluation_id, user_profile_id,
                        hash_identity_anchor, mobile_sim_slot_number, created_at
                 FROM digital_ballot_registry_book
                 WHERE election_evaluation_id = ?1 AND user_profile_id = ?2",
                params![election_evaluation_id, user_profile_id],
                row_to_registry,
            )
            .optional()?)
    }

    /// Number of voters registered as having voted in an evaluation.
    pub fn count_registry_entries(&self, election_evaluation_id: i64) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM digital_ballot_registry_book WHERE election_evaluation_id = ?1",
            params![election_evaluation_id],
            |row| row.get(0),
        )?)
    }
}

fn receipt_taken(conn: &Connection, code: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM digital_ballots WHERE receipt_code = ?1)",
        params![code],
        |row| row.get(0),
    )
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn truncate_ip(ip: &str) -> String {
    ip.chars().take(MAX_IP_ADDRESS_LEN).collect()
}

fn row_to_ballot(row: &rusqlite::Row<'_>) -> rusqlite::Result<DigitalBallot> {
    let receipt_str: String = row.get(5)?;
    let cast_str: Option<String> = row.get(6)?;
    let created_str: String = row.get(12)?;

    let receipt_code = ReceiptCode::parse(&receipt_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(DigitalBallot {
        digital_ballot_id: row.get(0)?,
        registry_book_id: row.get(1)?,
        election_id: row.get(2)?,
        election_evaluation_id: row.get(3)?,
        user_profile_id: row.get(4)?,
        receipt_code,
        cast_at: cast_str.as_deref().map(|s| parse_timestamp(6, s)).transpose()?,
        ip_address: row.get(7)?,
        bot_detection: BotDetection {
            vote_duration_ms: row.get(8)?,
            interaction_count: row.get(9)?,
            question_avg: row.get(10)?,
        },
        is_active: row.get(11)?,
        created_at: parse_timestamp(12, &created_str)?,
    })
}

fn row_to_registry(row: &rusqlite::Row<'_>) -> rusqlite::Result<RegistryBookEntry> {
    let anchor_bytes: Vec<u8> = row.get(3)?;
    let created_str: String = row.get(5)?;

    let anchor: [u8; 32] = anchor_bytes.try_into().map_err(|v: Vec<u8>| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Blob,
            format!("identity anchor must be 32 bytes, got {}", v.len()).into(),
        )
    })?;

    Ok(RegistryBookEntry {
        registry_book_id: row.get(0)?,
        election_evaluation_id: row.get(1)?,
        user_profile_id: row.get(2)?,
        identity_anchor: IdentityAnchor(anchor),
        mobile_sim_slot_number: row.get(4)?,
        created_at: parse_timestamp(5, &created_str)?,
    })
}
