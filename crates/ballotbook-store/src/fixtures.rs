//! Shared test data: one election with two evaluations, three parties, two
//! divisions and a handful of voters with clean sessions.

use chrono::{DateTime, Duration, Utc};
use rusqlite::params;

use crate::database::{timestamp, Database};
use crate::models::{
    Constituency, District, Division, Election, ElectionEvaluation, Party, UserProfile,
    UserSession,
};
use crate::{profiles, reference};

pub const ELECTION: i64 = 1;
pub const EVALUATION: i64 = 3;
pub const OTHER_EVALUATION: i64 = 4;
pub const ACCOUNT: i64 = 100;
pub const PROFILE: i64 = 1;

/// Account ids for voters 1..=5; profile id equals the index.
pub fn account_of(profile: i64) -> i64 {
    ACCOUNT * profile
}

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-01-01T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn seeded() -> Database {
    let db = Database::open_in_memory().unwrap();
    seed_into(&db);
    db
}

pub fn seed_into(db: &Database) {
    let conn = db.conn();

    reference::upsert_election(
        conn,
        &Election {
            election_id: ELECTION,
            election_type_code: Some("NATIONAL".into()),
            election_status_code: "ongoing".into(),
            election_name_en: "National Parliamentary Election".into(),
            election_name_bn: Some("জাতীয় সংসদ নির্বাচন".into()),
            election_date: None,
            is_active: true,
        },
    )
    .unwrap();

    for (id, en, bn, current) in [
        (EVALUATION, "Opinion round 1", "মতামত ১", true),
        (OTHER_EVALUATION, "Opinion round 2", "মতামত ২", false),
    ] {
        reference::upsert_evaluation(
            conn,
            &ElectionEvaluation {
                election_evaluation_id: id,
                election_id: ELECTION,
                evaluation_name_en: en.into(),
                evaluation_name_bn: bn.into(),
                is_current: current,
                is_active: true,
            },
        )
        .unwrap();
    }

    for (id, name) in [(1, "দল ক"), (2, "দল খ"), (3, "দল গ")] {
        reference::upsert_party(
            conn,
            &Party {
                party_id: id,
                party_name_en: None,
                party_name_bn: name.into(),
                party_short_name_bn: None,
                party_symbol_name_bn: Some(format!("প্রতীক {id}")),
                file_path: Some("/media/party/".into()),
                file_name: Some(format!("{id}.png")),
            },
        )
        .unwrap();
    }

    for (id, en, bn) in [(1, "Dhaka", "ঢাকা"), (2, "Chattogram", "চট্টগ্রাম")] {
        reference::upsert_division(
            conn,
            &Division {
                division_id: id,
                division_name_en: en.into(),
                division_name_bn: bn.into(),
            },
        )
        .unwrap();
    }

    for (id, division, en, bn) in [
        (10, 1, "Gazipur", "গাজীপুর"),
        (11, 1, "Dhaka", "ঢাকা"),
        (20, 2, "Cumilla", "কুমিল্লা"),
    ] {
        reference::upsert_district(
            conn,
            &District {
                district_id: id,
                division_id: division,
                district_name_en: en.into(),
                district_name_bn: bn.into(),
            },
        )
        .unwrap();
    }

    for (id, district, seat) in [(10, 11, "10"), (11, 11, "2"), (12, 10, "1"), (20, 20, "1")] {
        reference::upsert_constituency(
            conn,
            &Constituency {
                constituency_id: id,
                district_id: district,
                constituency_name_en: format!("Seat {id}"),
                constituency_name_bn: format!("আসন {id}"),
                seat_number_en: Some(seat.into()),
                seat_number_bn: Some(format!("আসন-{seat}")),
                area_list_bn: None,
            },
        )
        .unwrap();
    }

    for profile in 1..=5 {
        profiles::upsert_profile(
            conn,
            &UserProfile {
                user_profile_id: profile,
                user_account_id: account_of(profile),
                display_name: None,
            },
        )
        .unwrap();
        add_session(db, profile, profile, false, Some(5), 0);
    }
}

/// Open session starting `minutes` after [`base_time`].
pub fn add_session(
    db: &Database,
    session_id: i64,
    profile: i64,
    vpn: bool,
    risk: Option<i64>,
    minutes: i64,
) {
    profiles::upsert_session(
        db.conn(),
        &UserSession {
            user_session_id: session_id,
            user_profile_id: profile,
            is_authenticated_session: true,
            is_vpn_suspected: vpn,
            risk_score: risk,
            ip_address: Some("203.0.113.7".into()),
            started_at: base_time() + Duration::minutes(minutes),
            ended_at: None,
        },
    )
    .unwrap();
}

pub fn add_registry_row(db: &Database, evaluation: i64, profile: i64) {
    let now = timestamp(&Utc::now());
    db.conn()
        .execute(
            "INSERT INTO digital_ballot_registry_book
                (election_evaluation_id, user_profile_id, hash_identity_anchor, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![evaluation, profile, vec![0u8; 32], now],
        )
        .unwrap();
}
