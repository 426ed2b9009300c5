//! v002 -- One registry book row per voter and evaluation.
//!
//! The application re-checks for an existing row inside the cast
//! transaction; this index makes the store refuse a second row even when
//! two connections race.

use rusqlite::Connection;

const UP_SQL: &str = r#"
DROP INDEX IF EXISTS idx_registry_voter;

CREATE UNIQUE INDEX IF NOT EXISTS idx_registry_voter_unique
    ON digital_ballot_registry_book(election_evaluation_id, user_profile_id);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
