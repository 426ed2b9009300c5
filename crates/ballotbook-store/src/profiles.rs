//! Voter profiles and login sessions.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::{parse_timestamp, timestamp, Database};
use crate::error::Result;
use crate::models::{UserProfile, UserSession};

pub(crate) fn upsert_profile(conn: &Connection, p: &UserProfile) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO user_profiles (user_profile_id, user_account_id, display_name, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_profile_id) DO UPDATE SET
            user_account_id = excluded.user_account_id,
            display_name = excluded.display_name",
        params![
            p.user_profile_id,
            p.user_account_id,
            p.display_name,
            timestamp(&Utc::now()),
        ],
    )?;
    Ok(())
}

pub(crate) fn upsert_session(conn: &Connection, s: &UserSession) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO user_sessions (user_session_id, user_profile_id, is_authenticated_session,
                                    is_vpn_suspected, risk_score, ip_address, started_at, ended_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(user_session_id) DO UPDATE SET
            user_profile_id = excluded.user_profile_id,
            is_authenticated_session = excluded.is_authenticated_session,
            is_vpn_suspected = excluded.is_vpn_suspected,
            risk_score = excluded.risk_score,
            ip_address = excluded.ip_address,
            started_at = excluded.started_at,
            ended_at = excluded.ended_at",
        params![
            s.user_session_id,
            s.user_profile_id,
            s.is_authenticated_session,
            s.is_vpn_suspected,
            s.risk_score,
            s.ip_address,
            timestamp(&s.started_at),
            s.ended_at.as_ref().map(timestamp),
        ],
    )?;
    Ok(())
}

pub(crate) fn profile_by_account(
    conn: &Connection,
    user_account_id: i64,
) -> rusqlite::Result<Option<UserProfile>> {
    conn.query_row(
        "SELECT user_profile_id, user_account_id, display_name
         FROM user_profiles WHERE user_account_id = ?1",
        params![user_account_id],
        |row| {
            Ok(UserProfile {
                user_profile_id: row.get(0)?,
                user_account_id: row.get(1)?,
                display_name: row.get(2)?,
            })
        },
    )
    .optional()
}

/// The newest authenticated session that has not ended.
pub(crate) fn latest_active_session(
    conn: &Connection,
    user_profile_id: i64,
) -> rusqlite::Result<Option<UserSession>> {
    conn.query_row(
        "SELECT user_session_id, user_profile_id, is_authenticated_session, is_vpn_suspected,
                risk_score, ip_address, started_at, ended_at
         FROM user_sessions
         WHERE user_profile_id = ?1
           AND is_authenticated_session = 1
           AND ended_at IS NULL
         ORDER BY started_at DESC, user_session_id DESC
         LIMIT 1",
        params![user_profile_id],
        row_to_session,
    )
    .optional()
}

impl Database {
    pub fn get_profile_by_account(&self, user_account_id: i64) -> Result<Option<UserProfile>> {
        Ok(profile_by_account(self.conn(), user_account_id)?)
    }

    pub fn get_latest_active_session(&self, user_profile_id: i64) -> Result<Option<UserSession>> {
        Ok(latest_active_session(self.conn(), user_profile_id)?)
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserSession> {
    let started_str: String = row.get(6)?;
    let ended_str: Option<String> = row.get(7)?;

    Ok(UserSession {
        user_session_id: row.get(0)?,
        user_profile_id: row.get(1)?,
        is_authenticated_session: row.get(2)?,
        is_vpn_suspected: row.get(3)?,
        risk_score: row.get(4)?,
        ip_address: row.get(5)?,
        started_at: parse_timestamp(6, &started_str)?,
        ended_at: ended_str.as_deref().map(|s| parse_timestamp(7, s)).transpose()?,
    })
}
