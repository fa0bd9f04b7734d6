//! GradeTrack security service entry point.
//!
//! Loads configuration, opens the database, and runs the periodic
//! maintenance loops (rate-limit sweep and expired-token cleanup) until
//! interrupted. The HTTP layer mounts the flows from [`gradetrack::flows`]
//! on top of the state set up here.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use gradetrack::auth::{TokenService, TokenTtls};
use gradetrack::clock::{Clock, SystemClock};
use gradetrack::db::Database;
use gradetrack::rate_limit::{spawn_sweeper, RateLimitConfig, RateLimiter};
use gradetrack::{Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    gradetrack::logging::init(&config.logging)?;
    info!("Starting GradeTrack security service");

    let db = Database::open(&config.database.path).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let limiter = Arc::new(RateLimiter::new(
        RateLimitConfig::from(&config.security),
        clock.clone(),
    ));
    let sweep_interval = Duration::from_secs(config.security.sweep_interval_secs);
    let sweeper = spawn_sweeper(limiter.clone(), sweep_interval);

    let ttls = TokenTtls::from(&config.security);
    let cleanup = {
        let clock = clock.clone();
        let pool = db.pool().clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let tokens = TokenService::new(&pool, clock.clone(), ttls);
                if let Err(e) = tokens.cleanup_expired().await {
                    error!(error = %e, "Token cleanup failed");
                }
            }
        })
    };

    info!("Maintenance loops running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    sweeper.abort();
    cleanup.abort();
    Ok(())
}
