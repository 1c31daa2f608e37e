use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::{
    metrics::{SESSIONS_TOTAL, SESSION_SWEEPER_TICKS_TOTAL},
    services::session_service::SessionStore,
};

/// Background loop that drops respondent sessions idle past their TTL.
pub struct SessionSweeper {
    sessions: Arc<SessionStore>,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(sessions: Arc<SessionStore>, interval_secs: u64) -> Self {
        Self {
            sessions,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    pub async fn run(&self) {
        info!(
            "Starting session sweeper loop (interval {}s)",
            self.interval.as_secs()
        );

        loop {
            sleep(self.interval).await;
            self.run_once().await;
        }
    }

    pub async fn run_once(&self) -> usize {
        let purged = self.sessions.purge_expired(Utc::now()).await;
        SESSION_SWEEPER_TICKS_TOTAL
            .with_label_values(&["success"])
            .inc();

        if purged > 0 {
            SESSIONS_TOTAL
                .with_label_values(&["expired"])
                .inc_by(purged as u64);
            info!("Session sweeper purged {} expired sessions", purged);
        } else {
            debug!("Session sweeper tick: nothing to purge");
        }
        purged
    }
}
