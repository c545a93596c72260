//! Background jobs for periodic maintenance tasks.
//!
//! Login attempts are consumed by the OAuth callback; abandoned ones are
//! dropped here once they outlive their TTL.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use crate::auth::store::LoginStateStore;

/// How often expired login attempts are swept.
pub const LOGIN_STATE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Start all background jobs
///
/// Returns the join handles so the caller can abort them on shutdown
pub fn start_background_jobs(
    login_store: Arc<dyn LoginStateStore>,
) -> Vec<tokio::task::JoinHandle<()>> {
    vec![tokio::spawn(periodic_login_state_sweep(
        login_store,
        LOGIN_STATE_SWEEP_INTERVAL,
    ))]
}

async fn periodic_login_state_sweep(store: Arc<dyn LoginStateStore>, period: Duration) {
    let mut interval = interval(period);

    loop {
        interval.tick().await;
        sweep_login_states(store.as_ref()).await;
    }
}

/// Run one eviction pass, returning how many attempts were dropped.
pub async fn sweep_login_states(store: &dyn LoginStateStore) -> usize {
    match store.evict_expired().await {
        Ok(removed) if removed > 0 => {
            tracing::info!("Evicted {removed} expired login attempts");
            removed
        }
        Ok(_) => {
            tracing::debug!("Login state sweep complete: nothing expired");
            0
        }
        Err(e) => {
            tracing::error!("Failed to evict expired login attempts: {e}");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{pkce::LoginAttempt, store::MemoryLoginStore};

    #[tokio::test]
    async fn test_sweep_removes_expired_attempts() {
        let store = MemoryLoginStore::new(Duration::ZERO);
        store.put(LoginAttempt::generate()).await.unwrap();
        store.put(LoginAttempt::generate()).await.unwrap();

        assert_eq!(sweep_login_states(&store).await, 2);
        assert_eq!(sweep_login_states(&store).await, 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_attempts() {
        let store = MemoryLoginStore::new(Duration::from_secs(600));
        store.put(LoginAttempt::generate()).await.unwrap();

        assert_eq!(sweep_login_states(&store).await, 0);
        assert_eq!(store.pending_count().await.unwrap(), 1);
    }
}
