//! v001 -- Initial schema creation.
//!
//! Reference data (elections, parties, geography, candidates), voter
//! profiles and sessions, the three ballot tables, and the results view.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Elections
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS elections (
    election_id          INTEGER PRIMARY KEY NOT NULL,
    election_type_code   TEXT,
    election_status_code TEXT NOT NULL DEFAULT 'scheduled',
    election_name_en     TEXT NOT NULL,
    election_name_bn     TEXT,
    election_date        TEXT,                    -- YYYY-MM-DD
    is_active            INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS election_evaluations (
    election_evaluation_id INTEGER PRIMARY KEY NOT NULL,
    election_id            INTEGER NOT NULL,
    evaluation_name_en     TEXT NOT NULL,
    evaluation_name_bn     TEXT NOT NULL,
    is_current             INTEGER NOT NULL DEFAULT 0,
    is_active              INTEGER NOT NULL DEFAULT 1,

    FOREIGN KEY (election_id) REFERENCES elections(election_id)
);

-- ----------------------------------------------------------------
-- Parties
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS parties (
    party_id             INTEGER PRIMARY KEY NOT NULL,
    party_name_en        TEXT,
    party_name_bn        TEXT NOT NULL,
    party_short_name_bn  TEXT,
    party_symbol_name_bn TEXT,
    file_path            TEXT,                    -- logo location
    file_name            TEXT
);

-- ----------------------------------------------------------------
-- Geography: division > district > constituency
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS divisions (
    division_id      INTEGER PRIMARY KEY NOT NULL,
    division_name_en TEXT NOT NULL,
    division_name_bn TEXT NOT NULL,
    is_active        INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS districts (
    district_id      INTEGER PRIMARY KEY NOT NULL,
    division_id      INTEGER NOT NULL,
    district_name_en TEXT NOT NULL,
    district_name_bn TEXT NOT NULL,
    is_active        INTEGER NOT NULL DEFAULT 1,

    FOREIGN KEY (division_id) REFERENCES divisions(division_id)
);

CREATE INDEX IF NOT EXISTS idx_districts_division ON districts(division_id);

CREATE TABLE IF NOT EXISTS constituencies (
    constituency_id      INTEGER PRIMARY KEY NOT NULL,
    district_id          INTEGER NOT NULL,
    constituency_name_en TEXT NOT NULL,
    constituency_name_bn TEXT NOT NULL,
    seat_number_en       TEXT,
    seat_number_bn       TEXT,
    area_list_bn         TEXT,
    is_active            INTEGER NOT NULL DEFAULT 1,

    FOREIGN KEY (district_id) REFERENCES districts(district_id)
);

CREATE INDEX IF NOT EXISTS idx_constituencies_district ON constituencies(district_id);

CREATE TABLE IF NOT EXISTS candidate_nominations (
    candidate_id           INTEGER PRIMARY KEY NOT NULL,
    election_evaluation_id INTEGER NOT NULL,
    constituency_id        INTEGER NOT NULL,
    party_id               INTEGER,               -- NULL for independents
    candidate_name_en      TEXT,
    candidate_name_bn      TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Voters
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS user_profiles (
    user_profile_id INTEGER PRIMARY KEY NOT NULL,
    user_account_id INTEGER NOT NULL UNIQUE,      -- login identity
    display_name    TEXT,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_sessions (
    user_session_id          INTEGER PRIMARY KEY NOT NULL,
    user_profile_id          INTEGER NOT NULL,
    is_authenticated_session INTEGER NOT NULL DEFAULT 1,
    is_vpn_suspected         INTEGER NOT NULL DEFAULT 0,
    risk_score               INTEGER,
    ip_address               TEXT,
    started_at               TEXT NOT NULL,
    ended_at                 TEXT,                -- NULL while active

    FOREIGN KEY (user_profile_id) REFERENCES user_profiles(user_profile_id)
);

CREATE INDEX IF NOT EXISTS idx_user_sessions_profile
    ON user_sessions(user_profile_id, started_at DESC);

-- ----------------------------------------------------------------
-- Ballots: registry book > ballot > vote entry
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS digital_ballot_registry_book (
    registry_book_id       INTEGER PRIMARY KEY NOT NULL,
    election_evaluation_id INTEGER NOT NULL,
    user_profile_id        INTEGER NOT NULL,
    hash_identity_anchor   BLOB NOT NULL,         -- SHA-256 of provider key
    mobile_sim_slot_number INTEGER NOT NULL DEFAULT 0,
    created_at             TEXT NOT NULL,
    modified_at            TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_registry_voter
    ON digital_ballot_registry_book(election_evaluation_id, user_profile_id);

CREATE TABLE IF NOT EXISTS digital_ballots (
    digital_ballot_id              INTEGER PRIMARY KEY NOT NULL,
    registry_book_id               INTEGER NOT NULL UNIQUE,
    election_id                    INTEGER NOT NULL,
    election_evaluation_id         INTEGER NOT NULL,
    user_profile_id                INTEGER NOT NULL,
    receipt_code                   TEXT NOT NULL UNIQUE,
    ballot_cast_timestamp          TEXT,          -- set after the vote entry
    geofencing_ip_address          TEXT,
    botdetection_vote_duration_ms  INTEGER,
    botdetection_interaction_count INTEGER,
    botdetection_question_avg      REAL,
    is_active                      INTEGER NOT NULL DEFAULT 1,
    created_at                     TEXT NOT NULL,
    modified_at                    TEXT NOT NULL,

    FOREIGN KEY (registry_book_id) REFERENCES digital_ballot_registry_book(registry_book_id)
);

CREATE INDEX IF NOT EXISTS idx_ballots_evaluation ON digital_ballots(election_evaluation_id);

CREATE TABLE IF NOT EXISTS digital_ballot_vote_entries (
    vote_entry_id     INTEGER PRIMARY KEY NOT NULL,
    digital_ballot_id INTEGER NOT NULL,
    election_id       INTEGER NOT NULL,
    constituency_id   INTEGER NOT NULL,
    union_parishad_id INTEGER,
    party_id          INTEGER NOT NULL,
    candidate_id      INTEGER,
    is_active         INTEGER NOT NULL DEFAULT 1,
    created_at        TEXT NOT NULL,
    modified_at       TEXT NOT NULL,

    FOREIGN KEY (digital_ballot_id) REFERENCES digital_ballots(digital_ballot_id)
);

CREATE INDEX IF NOT EXISTS idx_vote_entries_ballot ON digital_ballot_vote_entries(digital_ballot_id);

-- ----------------------------------------------------------------
-- Results view: one row per (evaluation, constituency, party) with the
-- party's totals at every enclosing level. Only cast ballots count.
-- ----------------------------------------------------------------
CREATE VIEW IF NOT EXISTS vw_past_results AS
WITH seat_votes AS (
    SELECT b.election_evaluation_id,
           e.constituency_id,
           e.party_id,
           COUNT(*) AS seat_party_vote
    FROM digital_ballot_vote_entries e
    JOIN digital_ballots b ON b.digital_ballot_id = e.digital_ballot_id
    WHERE b.is_active = 1
      AND e.is_active = 1
      AND b.ballot_cast_timestamp IS NOT NULL
    GROUP BY b.election_evaluation_id, e.constituency_id, e.party_id
)
SELECT sv.election_evaluation_id,
       ev.evaluation_name_bn  AS evaluation_name,
       p.party_id,
       p.party_name_bn        AS party_name,
       p.party_symbol_name_bn AS party_symbol_name,
       p.file_path,
       p.file_name,
       dv.division_id,
       dv.division_name_bn    AS division_name,
       dv.division_name_en,
       ds.district_id,
       ds.district_name_bn    AS district_name,
       ds.district_name_en,
       c.constituency_id,
       c.constituency_name_bn AS constituency_name,
       c.seat_number_bn       AS seat_number,
       SUM(sv.seat_party_vote) OVER (
           PARTITION BY sv.election_evaluation_id, sv.party_id
       ) AS national_party_vote,
       SUM(sv.seat_party_vote) OVER (
           PARTITION BY sv.election_evaluation_id, dv.division_id, sv.party_id
       ) AS division_party_vote,
       SUM(sv.seat_party_vote) OVER (
           PARTITION BY sv.election_evaluation_id, ds.district_id, sv.party_id
       ) AS district_party_vote,
       sv.seat_party_vote
FROM seat_votes sv
JOIN election_evaluations ev ON ev.election_evaluation_id = sv.election_evaluation_id
JOIN parties p               ON p.party_id = sv.party_id
JOIN constituencies c        ON c.constituency_id = sv.constituency_id
JOIN districts ds            ON ds.district_id = c.district_id
JOIN divisions dv            ON dv.division_id = ds.division_id;
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
