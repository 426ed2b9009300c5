//! Vote counts: live national tallies and the drill-through results view.

use ballotbook_shared::drill::{self, DrillQuery, DrillThroughReport, PastResultRow};
use ballotbook_shared::results::{calculate_percentages, PartyTally};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NationalResults, PastElection};

impl Database {
    /// Per-party vote counts across every active cast ballot of an evaluation.
    pub fn national_results(&self, election_evaluation_id: i64) -> Result<NationalResults> {
        let mut stmt = self.conn().prepare(
            "SELECT e.party_id,
                    COALESCE(p.party_name_bn, 'Party ' || e.party_id),
                    COALESCE(p.party_symbol_name_bn, ''),
                    COALESCE(p.file_path, ''),
                    COALESCE(p.file_name, ''),
                    COUNT(*) AS votes
             FROM digital_ballot_vote_entries e
             JOIN digital_ballots b ON b.digital_ballot_id = e.digital_ballot_id
             LEFT JOIN parties p ON p.party_id = e.party_id
             WHERE b.election_evaluation_id = ?1
               AND b.is_active = 1
               AND e.is_active = 1
               AND b.ballot_cast_timestamp IS NOT NULL
             GROUP BY e.party_id
             ORDER BY votes DESC, e.party_id ASC",
        )?;

        let rows = stmt.query_map(params![election_evaluation_id], |row| {
            Ok(PartyTally {
                party_id: row.get(0)?,
                party_name: row.get(1)?,
                party_short_name: row.get(2)?,
                file_path: row.get(3)?,
                file_name: row.get(4)?,
                votes: row.get(5)?,
                percentage: 0.0,
            })
        })?;
        let mut results = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;

        let total_votes = calculate_percentages(&mut results);
        Ok(NationalResults {
            results,
            total_votes,
        })
    }

    /// Every results-view row for one evaluation.
    pub fn past_result_rows(&self, election_evaluation_id: i64) -> Result<Vec<PastResultRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT election_evaluation_id, evaluation_name, party_id, party_name,
                    party_symbol_name, file_path, file_name,
                    division_id, division_name, division_name_en,
                    district_id, district_name, district_name_en,
                    constituency_id, constituency_name, seat_number,
                    national_party_vote, division_party_vote, district_party_vote,
                    seat_party_vote
             FROM vw_past_results
             WHERE election_evaluation_id = ?1
             ORDER BY division_id, district_id, constituency_id, party_id",
        )?;

        let rows = stmt.query_map(params![election_evaluation_id], |row| {
            Ok(PastResultRow {
                election_evaluation_id: row.get(0)?,
                evaluation_name: row.get(1)?,
                party_id: row.get(2)?,
                party_name: row.get(3)?,
                party_symbol_name: row.get(4)?,
                file_path: row.get(5)?,
                file_name: row.get(6)?,
                division_id: row.get(7)?,
                division_name: row.get(8)?,
                division_name_en: row.get(9)?,
                district_id: row.get(10)?,
                district_name: row.get(11)?,
                district_name_en: row.get(12)?,
                constituency_id: row.get(13)?,
                constituency_name: row.get(14)?,
                seat_number: row.get(15)?,
                national_party_vote: row.get(16)?,
                division_party_vote: row.get(17)?,
                district_party_vote: row.get(18)?,
                seat_party_vote: row.get(19)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Evaluations that have at least one counted ballot.
    pub fn past_elections(&self) -> Result<Vec<PastElection>> {
        let mut stmt = self.conn().prepare(
            "SELECT DISTINCT election_evaluation_id, evaluation_name
             FROM vw_past_results
             ORDER BY evaluation_name ASC, election_evaluation_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PastElection {
                election_evaluation_id: row.get(0)?,
                evaluation_name: row.get(1)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Drill-through report for one evaluation at the level `query` selects.
    pub fn past_results_report(
        &self,
        election_evaluation_id: i64,
        query: &DrillQuery,
        base_path: &str,
    ) -> Result<DrillThroughReport> {
        let rows = self.past_result_rows(election_evaluation_id)?;
        tracing::debug!(
            evaluation = election_evaluation_id,
            rows = rows.len(),
            level = ?query.level(),
            "building drill-through report"
        );
        Ok(drill::build_report(
            election_evaluation_id,
            &rows,
            query,
            base_path,
        ))
    }
}
