//! # ballotbook-server
//!
//! HTTP service for the election ballot book.
//!
//! This binary provides:
//! - **Vote casting** with eligibility checks and one ballot per voter per
//!   evaluation, enforced inside a single SQLite transaction
//! - **Results**: live national tallies and the division / district /
//!   constituency drill-through of past results
//! - **Listings** of current and past elections and of the geography used by
//!   the ballot form
//! - **Per-IP rate limiting** to protect against abuse

mod api;
mod auth;
mod config;
mod error;
mod rate_limit;

use std::sync::Arc;

use ballotbook_shared::constants::APP_NAME;
use ballotbook_store::{Database, SeedData};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ballotbook_server=debug")),
        )
        .init();

    info!("Starting {APP_NAME} server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database and import seed data
    // -----------------------------------------------------------------------
    let mut db = Database::open_at(&config.database_path)?;

    if let Some(seed_path) = &config.seed_file {
        let seed = SeedData::from_file(seed_path)?;
        let summary = db.import_seed(&seed)?;
        info!(path = %seed_path.display(), ?summary, "Imported seed file");
    }

    let rate_limiter = RateLimiter::new(
        config.rate_limit_per_sec,
        config.rate_limit_burst,
        config.trust_forwarded_for,
    );

    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_stale(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
