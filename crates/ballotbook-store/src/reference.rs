//! Reference data: elections, evaluations, parties, geography, candidates.
//!
//! Writes are upserts so a seed file can be re-imported safely. They take a
//! plain [`Connection`] so that [`Database::import_seed`] can run them inside
//! one transaction.

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{
    CandidateNomination, Constituency, CurrentElection, District, Division, Election,
    ElectionEvaluation, Party,
};

// ------------------------------------------------------------------
// Upserts
// ------------------------------------------------------------------

pub(crate) fn upsert_election(conn: &Connection, e: &Election) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO elections (election_id, election_type_code, election_status_code,
                                election_name_en, election_name_bn, election_date, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(election_id) DO UPDATE SET
            election_type_code = excluded.election_type_code,
            election_status_code = excluded.election_status_code,
            election_name_en = excluded.election_name_en,
            election_name_bn = excluded.election_name_bn,
            election_date = excluded.election_date,
            is_active = excluded.is_active",
        params![
            e.election_id,
            e.election_type_code,
            e.election_status_code,
            e.election_name_en,
            e.election_name_bn,
            e.election_date.map(|d| d.format("%Y-%m-%d").to_string()),
            e.is_active,
        ],
    )?;
    Ok(())
}

pub(crate) fn upsert_evaluation(conn: &Connection, ev: &ElectionEvaluation) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO election_evaluations (election_evaluation_id, election_id, evaluation_name_en,
                                           evaluation_name_bn, is_current, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(election_evaluation_id) DO UPDATE SET
            election_id = excluded.election_id,
            evaluation_name_en = excluded.evaluation_name_en,
            evaluation_name_bn = excluded.evaluation_name_bn,
            is_current = excluded.is_current,
            is_active = excluded.is_active",
        params![
            ev.election_evaluation_id,
            ev.election_id,
            ev.evaluation_name_en,
            ev.evaluation_name_bn,
            ev.is_current,
            ev.is_active,
        ],
    )?;
    Ok(())
}

pub(crate) fn upsert_party(conn: &Connection, p: &Party) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO parties (party_id, party_name_en, party_name_bn, party_short_name_bn,
                              party_symbol_name_bn, file_path, file_name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(party_id) DO UPDATE SET
            party_name_en = excluded.party_name_en,
            party_name_bn = excluded.party_name_bn,
            party_short_name_bn = excluded.party_short_name_bn,
            party_symbol_name_bn = excluded.party_symbol_name_bn,
            file_path = excluded.file_path,
            file_name = excluded.file_name",
        params![
            p.party_id,
            p.party_name_en,
            p.party_name_bn,
            p.party_short_name_bn,
            p.party_symbol_name_bn,
            p.file_path,
            p.file_name,
        ],
    )?;
    Ok(())
}

pub(crate) fn upsert_division(conn: &Connection, d: &Division) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO divisions (division_id, division_name_en, division_name_bn)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(division_id) DO UPDATE SET
            division_name_en = excluded.division_name_en,
            division_name_bn = excluded.division_name_bn",
        params![d.division_id, d.division_name_en, d.division_name_bn],
    )?;
    Ok(())
}

pub(crate) fn upsert_district(conn: &Connection, d: &District) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO districts (district_id, division_id, district_name_en, district_name_bn)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(district_id) DO UPDATE SET
            division_id = excluded.division_id,
            district_name_en = excluded.district_name_en,
            district_name_bn = excluded.district_name_bn",
        params![d.district_id, d.division_id, d.district_name_en, d.district_name_bn],
    )?;
    Ok(())
}

pub(crate) fn upsert_constituency(conn: &Connection, c: &Constituency) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO constituencies (constituency_id, district_id, constituency_name_en,
                                     constituency_name_bn, seat_number_en, seat_number_bn,
                                     area_list_bn)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(constituency_id) DO UPDATE SET
            district_id = excluded.district_id,
            constituency_name_en = excluded.constituency_name_en,
            constituency_name_bn = excluded.constituency_name_bn,
            seat_number_en = excluded.seat_number_en,
            seat_number_bn = excluded.seat_number_bn,
            area_list_bn = excluded.area_list_bn",
        params![
            c.constituency_id,
            c.district_id,
            c.constituency_name_en,
            c.constituency_name_bn,
            c.seat_number_en,
            c.seat_number_bn,
            c.area_list_bn,
        ],
    )?;
    Ok(())
}

pub(crate) fn upsert_candidate(conn: &Connection, c: &CandidateNomination) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO candidate_nominations (candidate_id, election_evaluation_id, constituency_id,
                                            party_id, candidate_name_en, candidate_name_bn)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(candidate_id) DO UPDATE SET
            election_evaluation_id = excluded.election_evaluation_id,
            constituency_id = excluded.constituency_id,
            party_id = excluded.party_id,
            candidate_name_en = excluded.candidate_name_en,
            candidate_name_bn = excluded.candidate_name_bn",
        params![
            c.candidate_id,
            c.election_evaluation_id,
            c.constituency_id,
            c.party_id,
            c.candidate_name_en,
            c.candidate_name_bn,
        ],
    )?;
    Ok(())
}

// ------------------------------------------------------------------
// Reads
// ------------------------------------------------------------------

impl Database {
    /// Active evaluations flagged as current, newest election first.
    pub fn list_current_elections(&self) -> Result<Vec<CurrentElection>> {
        let mut stmt = self.conn().prepare(
            "SELECT ev.election_evaluation_id, ev.election_id, ev.evaluation_name_en,
                    ev.evaluation_name_bn, e.election_name_en, e.election_date
             FROM election_evaluations ev
             JOIN elections e ON e.election_id = ev.election_id
             WHERE ev.is_current = 1 AND ev.is_active = 1 AND e.is_active = 1
             ORDER BY e.election_date DESC, ev.election_evaluation_id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let date: Option<String> = row.get(5)?;
            Ok(CurrentElection {
                election_evaluation_id: row.get(0)?,
                election_id: row.get(1)?,
                evaluation_name_en: row.get(2)?,
                evaluation_name_bn: row.get(3)?,
                election_name_en: row.get(4)?,
                election_date: date.as_deref().map(|d| parse_date(5, d)).transpose()?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Active districts of a division, by English name.
    pub fn list_districts(&self, division_id: i64) -> Result<Vec<District>> {
        let mut stmt = self.conn().prepare(
            "SELECT district_id, division_id, district_name_en, district_name_bn
             FROM districts
             WHERE division_id = ?1 AND is_active = 1
             ORDER BY district_name_en ASC",
        )?;
        let rows = stmt.query_map(params![division_id], |row| {
            Ok(District {
                district_id: row.get(0)?,
                division_id: row.get(1)?,
                district_name_en: row.get(2)?,
                district_name_bn: row.get(3)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Active constituencies of a district, by numeric seat number.
    pub fn list_constituencies(&self, district_id: i64) -> Result<Vec<Constituency>> {
        let mut stmt = self.conn().prepare(
            "SELECT constituency_id, district_id, constituency_name_en, constituency_name_bn,
                    seat_number_en, seat_number_bn, area_list_bn
             FROM constituencies
             WHERE district_id = ?1 AND is_active = 1
             ORDER BY CAST(seat_number_en AS INTEGER) ASC, constituency_id ASC",
        )?;
        let rows = stmt.query_map(params![district_id], |row| {
            Ok(Constituency {
                constituency_id: row.get(0)?,
                district_id: row.get(1)?,
                constituency_name_en: row.get(2)?,
                constituency_name_bn: row.get(3)?,
                seat_number_en: row.get(4)?,
                seat_number_bn: row.get(5)?,
                area_list_bn: row.get(6)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
