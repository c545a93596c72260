//! Storage for pending login attempts.
//!
//! A login attempt lives from `/init-login` until the OAuth callback consumes
//! it. Entries are single-use: [`LoginStateStore::take`] removes what it
//! returns, and anything never consumed is dropped once it outlives the TTL.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use super::pkce::{LoginAttempt, is_well_formed_state};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed login record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Refusing to store login attempt under malformed state {0:?}")]
    InvalidKey(String),
    #[error("Login state TTL {0:?} is out of range")]
    TtlOutOfRange(Duration),
}

/// Key-value store of pending login attempts, keyed by `state`.
#[async_trait]
pub trait LoginStateStore: Send + Sync + 'static {
    async fn put(&self, attempt: LoginAttempt) -> Result<(), StoreError>;

    /// Remove and return the attempt stored under `state`, if present and not expired.
    async fn take(&self, state: &str) -> Result<Option<LoginAttempt>, StoreError>;

    /// Drop expired attempts, returning how many were removed.
    async fn evict_expired(&self) -> Result<usize, StoreError>;

    /// Number of attempts currently held, expired or not.
    async fn pending_count(&self) -> Result<usize, StoreError>;
}

#[derive(Debug)]
struct Entry {
    attempt: LoginAttempt,
    expires_at: Instant,
}

/// In-process store. Expiry is checked lazily on `take` and swept by
/// [`crate::jobs::start_background_jobs`].
#[derive(Clone, Debug)]
pub struct MemoryLoginStore {
    entries: Arc<DashMap<String, Entry>>,
    ttl: Duration,
}

impl MemoryLoginStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl LoginStateStore for MemoryLoginStore {
    async fn put(&self, attempt: LoginAttempt) -> Result<(), StoreError> {
        let expires_at = Instant::now()
            .checked_add(self.ttl)
            .ok_or(StoreError::TtlOutOfRange(self.ttl))?;
        let entry = Entry {
            expires_at,
            attempt,
        };
        self.entries.insert(entry.attempt.state.clone(), entry);
        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<LoginAttempt>, StoreError> {
        Ok(self
            .entries
            .remove(state)
            .filter(|(_, entry)| Instant::now() < entry.expires_at)
            .map(|(_, entry)| entry.attempt))
    }

    async fn evict_expired(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn pending_count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len())
    }
}

/// One JSON file per attempt, `{dir}/{state}.json`.
///
/// Expiry is based on the file's modification time, so records survive a
/// restart of the server as long as they are younger than the TTL.
#[derive(Clone, Debug)]
pub struct FileLoginStore {
    dir: PathBuf,
    ttl: Duration,
}

impl FileLoginStore {
    pub async fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir, ttl })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Only states we could have generated ever become file names.
    fn path_for(&self, state: &str) -> Option<PathBuf> {
        is_well_formed_state(state).then(|| self.dir.join(format!("{state}.json")))
    }

    async fn is_expired(&self, path: &Path) -> Result<bool, std::io::Error> {
        let modified = tokio::fs::metadata(path).await?.modified()?;
        Ok(modified.elapsed().unwrap_or_default() >= self.ttl)
    }
}

#[async_trait]
impl LoginStateStore for FileLoginStore {
    async fn put(&self, attempt: LoginAttempt) -> Result<(), StoreError> {
        let path = self
            .path_for(&attempt.state)
            .ok_or_else(|| StoreError::InvalidKey(attempt.state.clone()))?;

        let contents = serde_json::to_vec_pretty(&attempt)?;
        tokio::fs::write(path, contents).await?;
        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<LoginAttempt>, StoreError> {
        let Some(path) = self.path_for(state) else {
            return Ok(None);
        };

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let expired = match self.is_expired(&path).await {
            Ok(expired) => expired,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Whoever removes the file owns the attempt.
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        if expired {
            return Ok(None);
        }

        // An unreadable record is as good as an unknown state.
        match serde_json::from_slice(&contents) {
            Ok(attempt) => Ok(Some(attempt)),
            Err(e) => {
                tracing::warn!(state, "Discarding malformed login record: {e}");
                Ok(None)
            }
        }
    }

    async fn evict_expired(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match self.is_expired(&path).await {
                Ok(true) => match tokio::fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                },
                Ok(false) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(removed)
    }

    async fn pending_count(&self) -> Result<usize, StoreError> {
        let mut count = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().and_then(|ext| ext.to_str()) == Some("json") {
                count += 1;
            }
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(600);

    #[tokio::test]
    async fn test_memory_take_is_single_use() {
        let store = MemoryLoginStore::new(TTL);
        let attempt = LoginAttempt::generate();

        store.put(attempt.clone()).await.unwrap();
        assert_eq!(store.pending_count().await.unwrap(), 1);

        let taken = store.take(&attempt.state).await.unwrap();
        assert_eq!(taken, Some(attempt.clone()));
        assert_eq!(store.take(&attempt.state).await.unwrap(), None);
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_unknown_state() {
        let store = MemoryLoginStore::new(TTL);
        assert_eq!(store.take("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_expired_attempts() {
        let store = MemoryLoginStore::new(Duration::ZERO);
        let first = LoginAttempt::generate();
        let second = LoginAttempt::generate();

        store.put(first.clone()).await.unwrap();
        store.put(second).await.unwrap();

        assert_eq!(store.take(&first.state).await.unwrap(), None);
        assert_eq!(store.evict_expired().await.unwrap(), 1);
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_round_trip_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLoginStore::new(dir.path(), TTL).await.unwrap();
        let attempt = LoginAttempt::generate();

        store.put(attempt.clone()).await.unwrap();

        let path = dir.path().join(format!("{}.json", attempt.state));
        let on_disk: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk["codeVerifier"], attempt.code_verifier);
        assert_eq!(on_disk["state"], attempt.state);

        assert_eq!(store.take(&attempt.state).await.unwrap(), Some(attempt.clone()));
        assert!(!path.exists());
        assert_eq!(store.take(&attempt.state).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_rejects_malformed_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLoginStore::new(dir.path(), TTL).await.unwrap();

        assert_eq!(store.take("../secret").await.unwrap(), None);

        let attempt = LoginAttempt {
            state: "../secret".to_string(),
            ..LoginAttempt::generate()
        };
        assert!(matches!(
            store.put(attempt).await,
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_file_malformed_record_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLoginStore::new(dir.path(), TTL).await.unwrap();
        let state = LoginAttempt::generate().state;
        let path = dir.path().join(format!("{state}.json"));

        std::fs::write(&path, "{garbage").unwrap();

        assert_eq!(store.take(&state).await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_concurrent_take_has_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileLoginStore::new(dir.path(), TTL).await.unwrap());

        for _ in 0..20 {
            let attempt = LoginAttempt::generate();
            store.put(attempt.clone()).await.unwrap();

            let takers: Vec<_> = (0..8)
                .map(|_| {
                    let store = store.clone();
                    let state = attempt.state.clone();
                    tokio::spawn(async move { store.take(&state).await })
                })
                .collect();

            let mut winners = 0;
            for taker in takers {
                if taker.await.unwrap().unwrap().is_some() {
                    winners += 1;
                }
            }
            assert_eq!(winners, 1);
        }
    }

    #[tokio::test]
    async fn test_memory_ttl_out_of_range() {
        let store = MemoryLoginStore::new(Duration::MAX);

        assert!(matches!(
            store.put(LoginAttempt::generate()).await,
            Err(StoreError::TtlOutOfRange(_))
        ));
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_expired_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLoginStore::new(dir.path(), Duration::ZERO).await.unwrap();
        let first = LoginAttempt::generate();
        let second = LoginAttempt::generate();

        store.put(first.clone()).await.unwrap();
        store.put(second).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a login record").unwrap();

        assert_eq!(store.take(&first.state).await.unwrap(), None);
        assert_eq!(store.evict_expired().await.unwrap(), 1);
        assert_eq!(store.pending_count().await.unwrap(), 0);
        assert!(dir.path().join("notes.txt").exists());
    }
}
