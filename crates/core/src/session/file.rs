use super::{Clock, SessionStore, SessionToken, SystemClock, TOKEN_KEY};
use crate::error::StoreResult;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

type Jar = BTreeMap<String, SessionToken>;

/// Cookie-jar style store persisted as JSON.
///
/// Every read goes back to disk so that edits made outside this process (a
/// hand-edited jar, a logout from another shell) are seen on the next `get`.
/// A jar that cannot be read or parsed counts as "no session".
///
/// Reads never write. `set` and `clear` are read-modify-write cycles
/// serialized only within this process; two processes writing the same jar
/// at once can lose one of the writes.
pub struct FileSessionStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_jar(&self) -> StoreResult<Jar> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Jar::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Jar::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_jar(&self, jar: &Jar) -> StoreResult<()> {
        if jar.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(jar)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<SessionToken> {
        let jar = match self.read_jar() {
            Ok(jar) => jar,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Unreadable session jar, treating as logged out");
                return None;
            }
        };

        // Expired records stay on disk until the next set or clear replaces them
        let token = jar.get(TOKEN_KEY)?;
        if token.is_expired_at(self.clock.now()) {
            tracing::debug!("Session token expired");
            return None;
        }

        Some(token.clone())
    }

    fn set(&self, token: &str, ttl_days: u32) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // A corrupt jar is replaced rather than blocking a fresh login
        let mut jar = self.read_jar().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable session jar");
            Jar::new()
        });

        let issued = SessionToken::issue(token, ttl_days, self.clock.now())?;
        tracing::debug!(path = %self.path.display(), expires_at = %issued.expires_at(), "Storing session token");
        jar.insert(TOKEN_KEY.to_string(), issued);
        self.write_jar(&jar)
    }

    fn clear(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(path = %self.path.display(), "Clearing session token");

        let mut jar = self.read_jar().unwrap_or_default();
        jar.remove(TOKEN_KEY);
        self.write_jar(&jar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ManualClock;
    use chrono::{Duration, Utc};

    fn store_in(dir: &tempfile::TempDir) -> (FileSessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let store = FileSessionStore::with_clock(dir.path().join("session.json"), clock.clone());
        (store, clock)
    }

    #[test]
    fn test_set_get_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let (store, clock) = store_in(&dir);

        store.set("abc", 7).unwrap();
        assert_eq!(store.get().unwrap().value(), "abc");

        // A second handle on the same file sees the same token
        let other = FileSessionStore::with_clock(store.path(), clock);
        assert_eq!(other.get().unwrap().value(), "abc");
    }

    #[test]
    fn test_clear_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_in(&dir);

        store.clear().unwrap();
        assert!(store.get().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_clear_removes_token() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_in(&dir);

        store.set("abc", 7).unwrap();
        store.clear().unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_external_edit_is_observed() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_in(&dir);
        store.set("abc", 7).unwrap();

        std::fs::remove_file(store.path()).unwrap();
        assert!(store.get().is_none());

        let mut jar = Jar::new();
        jar.insert(
            TOKEN_KEY.to_string(),
            SessionToken::new("hand-written", Utc::now() + Duration::days(1)),
        );
        std::fs::write(store.path(), serde_json::to_vec(&jar).unwrap()).unwrap();
        assert_eq!(store.get().unwrap().value(), "hand-written");
    }

    #[test]
    fn test_expired_token_is_not_returned() {
        let dir = tempfile::tempdir().unwrap();
        let (store, clock) = store_in(&dir);

        store.set("abc", 7).unwrap();
        clock.advance(Duration::days(8));

        assert!(store.get().is_none());
        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_read_of_expired_token_leaves_jar_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (store, clock) = store_in(&dir);
        store.set("stale", 7).unwrap();
        clock.advance(Duration::days(8));

        let before = std::fs::read(store.path()).unwrap();
        assert!(store.get().is_none());
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_oversized_ttl_leaves_jar_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_in(&dir);
        store.set("kept", 7).unwrap();

        assert!(store.set("t", u32::MAX).is_err());
        assert_eq!(store.get().unwrap().value(), "kept");
    }

    #[test]
    fn test_corrupt_jar_reads_as_logged_out_and_set_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_in(&dir);

        std::fs::write(store.path(), b"{ not json").unwrap();
        assert!(store.get().is_none());

        store.set("fresh", 7).unwrap();
        assert_eq!(store.get().unwrap().value(), "fresh");
    }

    #[test]
    fn test_other_keys_survive_clear() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_in(&dir);

        let mut jar = Jar::new();
        jar.insert(
            "theme".to_string(),
            SessionToken::new("dark", Utc::now() + Duration::days(30)),
        );
        std::fs::write(store.path(), serde_json::to_vec(&jar).unwrap()).unwrap();

        store.set("abc", 7).unwrap();
        store.clear().unwrap();

        let remaining: Jar = serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert!(remaining.contains_key("theme"));
        assert!(!remaining.contains_key(TOKEN_KEY));
    }
}
