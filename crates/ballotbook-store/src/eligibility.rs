//! Who may cast a ballot in an evaluation.

use ballotbook_shared::constants::{
    REASON_ALREADY_VOTED, REASON_HIGH_RISK, REASON_NO_PROFILE, REASON_VPN,
};
use rusqlite::{params, Connection};

use crate::database::Database;
use crate::error::Result;
use crate::models::UserProfile;
use crate::profiles::{latest_active_session, profile_by_account};

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    pub profile: Option<UserProfile>,
    pub reasons: Vec<String>,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        self.reasons.is_empty()
    }

    /// All reasons as one human-readable sentence.
    pub fn message(&self) -> String {
        self.reasons.join(" ")
    }
}

impl Database {
    /// Check whether `user_account_id` may vote in `election_evaluation_id`.
    ///
    /// A missing profile short-circuits. Otherwise every failing rule adds
    /// its reason, in the order: VPN, risk score, already voted.
    pub fn check_eligibility(
        &self,
        user_account_id: i64,
        election_evaluation_id: i64,
        risk_threshold: i64,
    ) -> Result<Eligibility> {
        Ok(evaluate(
            self.conn(),
            user_account_id,
            election_evaluation_id,
            risk_threshold,
        )?)
    }
}

/// Runs against any connection so the casting transaction can re-check.
pub(crate) fn evaluate(
    conn: &Connection,
    user_account_id: i64,
    election_evaluation_id: i64,
    risk_threshold: i64,
) -> rusqlite::Result<Eligibility> {
    let Some(profile) = profile_by_account(conn, user_account_id)? else {
        return Ok(Eligibility {
            profile: None,
            reasons: vec![REASON_NO_PROFILE.to_string()],
        });
    };

    let mut reasons = Vec::new();

    if let Some(session) = latest_active_session(conn, profile.user_profile_id)? {
        if session.is_vpn_suspected {
            reasons.push(REASON_VPN.to_string());
        }
        if session.risk_score.is_some_and(|score| score > risk_threshold) {
            reasons.push(REASON_HIGH_RISK.to_string());
        }
    }

    if has_registry_entry(conn, election_evaluation_id, profile.user_profile_id)? {
        reasons.push(REASON_ALREADY_VOTED.to_string());
    }

    Ok(Eligibility {
        profile: Some(profile),
        reasons,
    })
}

pub(crate) fn has_registry_entry(
    conn: &Connection,
    election_evaluation_id: i64,
    user_profile_id: i64,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM digital_ballot_registry_book
            WHERE election_evaluation_id = ?1 AND user_profile_id = ?2
         )",
        params![election_evaluation_id, user_profile_id],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, ACCOUNT, EVALUATION, PROFILE};
    use ballotbook_shared::constants::RISK_SCORE_THRESHOLD;

    #[test]
    fn fresh_voter_is_eligible() {
        let db = fixtures::seeded();
        let result = db
            .check_eligibility(ACCOUNT, EVALUATION, RISK_SCORE_THRESHOLD)
            .unwrap();

        assert!(result.is_eligible());
        assert_eq!(result.profile.unwrap().user_profile_id, PROFILE);
    }

    #[test]
    fn unknown_account_has_no_profile() {
        let db = fixtures::seeded();
        let result = db
            .check_eligibility(9999, EVALUATION, RISK_SCORE_THRESHOLD)
            .unwrap();

        assert!(result.profile.is_none());
        assert_eq!(result.reasons, vec![REASON_NO_PROFILE]);
    }

    #[test]
    fn vpn_and_risk_reasons_accumulate() {
        let db = fixtures::seeded();
        fixtures::add_session(&db, 101, PROFILE, true, Some(85), 10);

        let result = db
            .check_eligibility(ACCOUNT, EVALUATION, RISK_SCORE_THRESHOLD)
            .unwrap();
        assert_eq!(result.reasons, vec![REASON_VPN, REASON_HIGH_RISK]);
        assert_eq!(
            result.message(),
            "VPN detected. Voting not allowed over VPN. Session risk score too high."
        );
    }

    #[test]
    fn risk_at_threshold_is_allowed() {
        let db = fixtures::seeded();
        fixtures::add_session(&db, 101, PROFILE, false, Some(RISK_SCORE_THRESHOLD), 10);

        let result = db
            .check_eligibility(ACCOUNT, EVALUATION, RISK_SCORE_THRESHOLD)
            .unwrap();
        assert!(result.is_eligible());
    }

    #[test]
    fn only_the_newest_open_session_counts() {
        let db = fixtures::seeded();
        // Older risky session, then a newer clean one.
        fixtures::add_session(&db, 101, PROFILE, true, Some(99), 5);
        fixtures::add_session(&db, 102, PROFILE, false, Some(10), 20);

        let result = db
            .check_eligibility(ACCOUNT, EVALUATION, RISK_SCORE_THRESHOLD)
            .unwrap();
        assert!(result.is_eligible());
    }

    #[test]
    fn registry_row_blocks_voting() {
        let db = fixtures::seeded();
        fixtures::add_registry_row(&db, EVALUATION, PROFILE);

        let result = db
            .check_eligibility(ACCOUNT, EVALUATION, RISK_SCORE_THRESHOLD)
            .unwrap();
        assert_eq!(result.reasons, vec![REASON_ALREADY_VOTED]);

        // A different evaluation is unaffected.
        let other = db
            .check_eligibility(ACCOUNT, fixtures::OTHER_EVALUATION, RISK_SCORE_THRESHOLD)
            .unwrap();
        assert!(other.is_eligible());
    }
}
