use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use ballotbook_shared::{BotDetection, DrillQuery, DrillThroughReport, ReceiptCode};
use ballotbook_store::{
    CastVote, Constituency, CurrentElection, Database, District, NationalResults, PastElection,
    StoreError,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::Voter;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{client_ip, rate_limit_middleware, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/election_vote/api/cast-vote/", post(cast_vote))
        .route(
            "/election_vote/api/check-eligibility/:id/",
            get(check_eligibility),
        )
        .route(
            "/election_vote/api/national-results/:id/",
            get(national_results),
        )
        .route("/election_vote/past-results/:id/", get(past_results))
        .route(
            "/election_vote/api/current-elections/",
            get(current_elections),
        )
        .route("/election_vote/api/past-elections/", get(past_elections))
        .route("/election_vote/api/districts/:id/", get(districts))
        .route("/election_vote/api/constituencies/:id/", get(constituencies))
        .route("/election_vote/api/verify-receipt/:code/", get(verify_receipt))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run `f` against the database on the blocking pool.
async fn with_db<T, F>(state: &AppState, f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&mut Database) -> Result<T, StoreError> + Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = db.blocking_lock();
        f(&mut guard)
    })
    .await
    .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct CastVoteResponse {
    success: bool,
    receipt_code: ReceiptCode,
}

#[derive(Serialize)]
struct EligibilityResponse {
    eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ReceiptResponse {
    success: bool,
    receipt_code: ReceiptCode,
    election_evaluation_id: i64,
    cast_at: Option<DateTime<Utc>>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

const REQUIRED_FIELDS: [&str; 4] = [
    "election_evaluation_id",
    "election_id",
    "constituency_id",
    "party_id",
];

/// Read an id from a JSON body. Zero, empty and missing all count as absent.
fn id_field(body: &Value, name: &str) -> Option<i64> {
    match body.get(name)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .filter(|id| *id != 0)
}

fn parse_cast_request(raw: &[u8]) -> Result<CastVoteFields, ServerError> {
    let body: Value = serde_json::from_slice(raw)
        .ok()
        .filter(Value::is_object)
        .ok_or_else(|| ServerError::BadRequest("Invalid JSON.".to_string()))?;

    let ids = REQUIRED_FIELDS.map(|name| id_field(&body, name));

    let [Some(election_evaluation_id), Some(election_id), Some(constituency_id), Some(party_id)] =
        ids
    else {
        let missing = REQUIRED_FIELDS
            .iter()
            .zip(ids)
            .filter(|(_, id)| id.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        return Err(ServerError::MissingFields(missing));
    };

    // Telemetry is advisory; a malformed block is dropped, not rejected.
    let bot_detection = body
        .get("bot_detection")
        .and_then(|v| serde_json::from_value::<BotDetection>(v.clone()).ok())
        .unwrap_or_default();

    Ok(CastVoteFields {
        election_evaluation_id,
        election_id,
        constituency_id,
        party_id,
        candidate_id: id_field(&body, "candidate_id"),
        union_parishad_id: id_field(&body, "union_parishad_id"),
        bot_detection,
    })
}

struct CastVoteFields {
    election_evaluation_id: i64,
    election_id: i64,
    constituency_id: i64,
    party_id: i64,
    candidate_id: Option<i64>,
    union_parishad_id: Option<i64>,
    bot_detection: BotDetection,
}

async fn cast_vote(
    State(state): State<AppState>,
    voter: Voter,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CastVoteResponse>, ServerError> {
    let fields = parse_cast_request(&body)?;

    let vote = CastVote {
        election_evaluation_id: fields.election_evaluation_id,
        election_id: fields.election_id,
        constituency_id: fields.constituency_id,
        party_id: fields.party_id,
        candidate_id: fields.candidate_id,
        union_parishad_id: fields.union_parishad_id,
        bot_detection: fields.bot_detection,
        identity_anchor: voter.identity_anchor,
        ip_address: client_ip(
            &headers,
            peer.map(|ConnectInfo(addr)| addr),
            state.config.trust_forwarded_for,
        ),
    };

    let account = voter.user_account_id;
    let threshold = state.config.risk_score_threshold;
    let evaluation = vote.election_evaluation_id;

    let result = with_db(&state, move |db| db.cast_vote(account, &vote, threshold)).await;

    match result {
        Ok(receipt) => {
            info!(evaluation, ballot_id = receipt.ballot_id, "vote accepted");
            Ok(Json(CastVoteResponse {
                success: true,
                receipt_code: receipt.receipt_code,
            }))
        }
        Err(e @ (StoreError::Ineligible(_) | StoreError::AlreadyVoted)) => {
            warn!(account, evaluation, reason = %e, "vote refused");
            Err(e.into())
        }
        Err(e) => Err(ServerError::SubmissionFailed(e.to_string())),
    }
}

async fn check_eligibility(
    State(state): State<AppState>,
    voter: Voter,
    Path(evaluation_id): Path<i64>,
) -> Result<Json<EligibilityResponse>, ServerError> {
    let threshold = state.config.risk_score_threshold;
    let account = voter.user_account_id;

    let eligibility = with_db(&state, move |db| {
        db.check_eligibility(account, evaluation_id, threshold)
    })
    .await?;

    Ok(Json(if eligibility.is_eligible() {
        EligibilityResponse {
            eligible: true,
            error: None,
        }
    } else {
        EligibilityResponse {
            eligible: false,
            error: Some(eligibility.message()),
        }
    }))
}

async fn national_results(
    State(state): State<AppState>,
    Path(evaluation_id): Path<i64>,
) -> Result<Json<NationalResults>, ServerError> {
    let results = with_db(&state, move |db| db.national_results(evaluation_id)).await?;
    Ok(Json(results))
}

/// Blank or non-numeric location ids are treated as absent.
fn drill_query(params: &HashMap<String, String>) -> DrillQuery {
    let id = |name: &str| params.get(name).and_then(|v| v.trim().parse::<i64>().ok());
    DrillQuery {
        view: params.get("view").filter(|v| !v.is_empty()).cloned(),
        division_id: id("division_id"),
        district_id: id("district_id"),
    }
}

async fn past_results(
    State(state): State<AppState>,
    Path(evaluation_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DrillThroughReport>, ServerError> {
    let query = drill_query(&params);
    let base_path = format!("/election_vote/past-results/{evaluation_id}/");

    let report = with_db(&state, move |db| {
        db.past_results_report(evaluation_id, &query, &base_path)
    })
    .await?;
    Ok(Json(report))
}

async fn current_elections(
    State(state): State<AppState>,
) -> Result<Json<Vec<CurrentElection>>, ServerError> {
    let elections = with_db(&state, |db| db.list_current_elections()).await?;
    Ok(Json(elections))
}

async fn past_elections(
    State(state): State<AppState>,
) -> Result<Json<Vec<PastElection>>, ServerError> {
    let elections = with_db(&state, |db| db.past_elections()).await?;
    Ok(Json(elections))
}

async fn districts(
    State(state): State<AppState>,
    Path(division_id): Path<i64>,
) -> Result<Json<Vec<District>>, ServerError> {
    let districts = with_db(&state, move |db| db.list_districts(division_id)).await?;
    Ok(Json(districts))
}

async fn constituencies(
    State(state): State<AppState>,
    Path(district_id): Path<i64>,
) -> Result<Json<Vec<Constituency>>, ServerError> {
    let seats = with_db(&state, move |db| db.list_constituencies(district_id)).await?;
    Ok(Json(seats))
}

async fn verify_receipt(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ReceiptResponse>, ServerError> {
    let code = ReceiptCode::parse(code.trim().to_ascii_uppercase().as_str())
        .map_err(|_| ServerError::BadRequest("Malformed receipt code.".to_string()))?;

    let ballot = with_db(&state, move |db| db.get_ballot_by_receipt(&code))
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ServerError::NotFound("Receipt not found.".to_string()),
            other => other.into(),
        })?;

    Ok(Json(ReceiptResponse {
        success: true,
        receipt_code: ballot.receipt_code,
        election_evaluation_id: ballot.election_evaluation_id,
        cast_at: ballot.cast_at,
    }))
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
