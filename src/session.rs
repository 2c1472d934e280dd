//! Authenticated session storage.
//!
//! Persists the signed-in session to disk at `{data_dir}/.rachaconta/session.json`
//! so a restart does not force a new sign-in. The store is the single writer
//! of session state; every other component reads through it or subscribes to
//! the watch channel for sign-in/sign-out transitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use crate::model::User;

/// A signed-in session as returned by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for authenticated requests.
    pub token: String,
    /// The signed-in user.
    #[serde(rename = "usuario")]
    pub user: User,
}

/// In-memory session state with disk persistence.
#[derive(Debug)]
pub struct SessionStore {
    session: RwLock<Option<Session>>,
    tx: watch::Sender<Option<Session>>,
    storage_path: PathBuf,
}

impl SessionStore {
    /// Create a session store, loading any persisted session from disk.
    ///
    /// A file that fails to parse is treated as absent and removed, so a
    /// corrupt session can never wedge the client in a half-signed-in state.
    pub fn load(data_dir: &PathBuf) -> Self {
        let storage_path = data_dir.join(".rachaconta/session.json");

        let session = if storage_path.exists() {
            match Self::load_from_path(&storage_path) {
                Ok(s) => {
                    tracing::info!("Loaded session from {}", storage_path.display());
                    Some(s)
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load session from {}: {}, purging",
                        storage_path.display(),
                        e
                    );
                    if let Err(e) = std::fs::remove_file(&storage_path) {
                        tracing::warn!("Failed to remove corrupt session file: {}", e);
                    }
                    None
                }
            }
        } else {
            None
        };

        let (tx, _) = watch::channel(session.clone());
        Self {
            session: RwLock::new(session),
            tx,
            storage_path,
        }
    }

    fn load_from_path(path: &PathBuf) -> Result<Session, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Persistence failures are logged, never surfaced: the in-memory
    /// session stays authoritative for the rest of the process lifetime.
    fn save_to_disk(&self, session: &Option<Session>) {
        let result = (|| -> Result<(), std::io::Error> {
            match session {
                Some(s) => {
                    if let Some(parent) = self.storage_path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    let contents = serde_json::to_string_pretty(s)
                        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                    std::fs::write(&self.storage_path, contents)?;
                }
                None => {
                    if self.storage_path.exists() {
                        std::fs::remove_file(&self.storage_path)?;
                    }
                }
            }
            Ok(())
        })();

        if let Err(e) = result {
            tracing::warn!(
                "Failed to persist session to {}: {}",
                self.storage_path.display(),
                e
            );
        }
    }

    /// Get a clone of the current session, if signed in.
    pub async fn current(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// The current bearer token, if signed in.
    pub async fn token(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.token.clone())
    }

    /// The signed-in user, if any.
    pub async fn user(&self) -> Option<User> {
        self.session.read().await.as_ref().map(|s| s.user.clone())
    }

    /// Subscribe to sign-in/sign-out transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    /// Replace the session after a sign-in or registration.
    pub async fn set(&self, session: Session) {
        let mut guard = self.session.write().await;
        *guard = Some(session.clone());
        drop(guard);
        self.save_to_disk(&Some(session.clone()));
        let _ = self.tx.send(Some(session));
    }

    /// Swap in a refreshed token, keeping the user unchanged.
    pub async fn update_token(&self, token: String) {
        let mut guard = self.session.write().await;
        if let Some(session) = guard.as_mut() {
            session.token = token;
            let updated = session.clone();
            drop(guard);
            self.save_to_disk(&Some(updated.clone()));
            let _ = self.tx.send(Some(updated));
        }
    }

    /// Replace the cached user profile after an edit.
    pub async fn update_user(&self, user: User) {
        let mut guard = self.session.write().await;
        if let Some(session) = guard.as_mut() {
            session.user = user;
            let updated = session.clone();
            drop(guard);
            self.save_to_disk(&Some(updated.clone()));
            let _ = self.tx.send(Some(updated));
        }
    }

    /// Sign out: drop the session and remove the persisted file.
    pub async fn clear(&self) {
        let mut guard = self.session.write().await;
        *guard = None;
        drop(guard);
        self.save_to_disk(&None);
        let _ = self.tx.send(None);
    }
}

/// Shared session store wrapped in Arc for concurrent access.
pub type SharedSessionStore = Arc<SessionStore>;

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            pix_key: "ana@pix".to_string(),
        }
    }

    fn test_session() -> Session {
        Session {
            token: "tok-123".to_string(),
            user: test_user(),
        }
    }

    #[tokio::test]
    async fn set_then_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let store = SessionStore::load(&path);
        assert!(store.current().await.is_none());
        store.set(test_session()).await;

        let reloaded = SessionStore::load(&path);
        let session = reloaded.current().await.unwrap();
        assert_eq!(session.token, "tok-123");
        assert_eq!(session.user.name, "Ana");
    }

    #[tokio::test]
    async fn corrupt_file_is_purged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let file = path.join(".rachaconta/session.json");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "{not json").unwrap();

        let store = SessionStore::load(&path);
        assert!(store.current().await.is_none());
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn clear_removes_the_file_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let store = SessionStore::load(&path);
        let mut rx = store.subscribe();
        store.set(test_session()).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());

        store.clear().await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(!path.join(".rachaconta/session.json").exists());
    }

    #[tokio::test]
    async fn update_token_keeps_the_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load(&dir.path().to_path_buf());
        store.set(test_session()).await;

        store.update_token("tok-456".to_string()).await;
        let session = store.current().await.unwrap();
        assert_eq!(session.token, "tok-456");
        assert_eq!(session.user.id, 1);
    }
}
