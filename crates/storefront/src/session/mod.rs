//! Client session: the token and profile of the signed-in user.
//!
//! The store is the single writer of session state. `login` and `logout` are
//! the only mutations; everything else reads a [`SessionSnapshot`] or
//! subscribes to changes through a `tokio::sync::watch` channel.
//!
//! State is mirrored into two durable slots, `token` and `userInfo`, and read
//! back by [`SessionStore::open`] at startup.

mod storage;

pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use eshop_core::{Role, UserProfile};

use crate::error::{clear_sentry_user, set_sentry_user};

/// Slot holding the raw session token.
pub const TOKEN_SLOT: &str = "token";

/// Slot holding the JSON-serialized [`UserProfile`].
pub const USER_SLOT: &str = "userInfo";

/// Errors from session mutations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to serialize user profile: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Read-only view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_logged_in: bool,
    /// `None` when no profile is stored. A token without a profile is still
    /// logged in, with no role.
    pub role: Option<Role>,
    pub user: Option<UserProfile>,
    /// Changes on every login and logout. Anything built for an older
    /// generation belongs to a session that no longer exists.
    pub generation: u64,
}

impl SessionSnapshot {
    /// Whether the session is logged in with the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_logged_in && self.role == Some(Role::Admin)
    }
}

#[derive(Default)]
struct Session {
    token: Option<SecretString>,
    user: Option<UserProfile>,
    generation: u64,
}

impl Session {
    fn snapshot(&self) -> SessionSnapshot {
        match (&self.token, &self.user) {
            (Some(_), Some(user)) => SessionSnapshot {
                is_logged_in: true,
                role: Some(user.role()),
                user: Some(user.clone()),
                generation: self.generation,
            },
            (None, Some(user)) => SessionSnapshot {
                is_logged_in: false,
                role: Some(user.role()),
                user: Some(user.clone()),
                generation: self.generation,
            },
            (token, None) => SessionSnapshot {
                is_logged_in: token.is_some(),
                role: None,
                user: None,
                generation: self.generation,
            },
        }
    }
}

/// Shared handle to the client session.
///
/// Cheap to clone; every clone sees the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    storage: Arc<dyn SessionStorage>,
    session: RwLock<Session>,
    changes: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    /// Restore the session from `storage`.
    ///
    /// Never fails: unreadable slots and profiles that do not parse are
    /// logged and treated as absent.
    pub fn open(storage: Arc<dyn SessionStorage>) -> Self {
        let token = read_slot(storage.as_ref(), TOKEN_SLOT)
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        let user = read_slot(storage.as_ref(), USER_SLOT).and_then(|raw| {
            serde_json::from_str::<UserProfile>(&raw)
                .map_err(|e| warn!(error = %e, "Stored user profile is unreadable, ignoring it"))
                .ok()
        });

        let session = Session {
            token,
            user,
            generation: 0,
        };
        let (changes, _) = watch::channel(session.snapshot());

        Self {
            inner: Arc::new(SessionStoreInner {
                storage,
                session: RwLock::new(session),
                changes,
            }),
        }
    }

    /// Persist and activate a session.
    ///
    /// # Errors
    ///
    /// Returns an error if either slot cannot be written; the in-memory
    /// session is left unchanged in that case.
    pub fn login(
        &self,
        token: SecretString,
        profile: UserProfile,
    ) -> Result<SessionSnapshot, SessionError> {
        let serialized = serde_json::to_string(&profile)?;
        self.inner
            .storage
            .set(TOKEN_SLOT, token.expose_secret())?;
        self.inner.storage.set(USER_SLOT, &serialized)?;

        set_sentry_user(&profile);
        info!(user_id = %profile.id, role = %profile.role(), "Logged in");

        let snapshot = self.replace(|session| Session {
            token: Some(token),
            user: Some(profile),
            generation: session.generation + 1,
        });
        Ok(snapshot)
    }

    /// End the session.
    ///
    /// In-memory state is cleared first, so even when a slot cannot be
    /// removed nothing of the old session stays reachable in this process.
    ///
    /// # Errors
    ///
    /// Returns an error if a durable slot cannot be removed.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.replace(|session| Session {
            token: None,
            user: None,
            generation: session.generation + 1,
        });
        clear_sentry_user();
        info!("Logged out");

        let token = self.inner.storage.remove(TOKEN_SLOT);
        let user = self.inner.storage.remove(USER_SLOT);
        token?;
        user?;
        Ok(())
    }

    /// Current session state.
    #[must_use]
    pub fn current(&self) -> SessionSnapshot {
        self.inner.changes.borrow().clone()
    }

    /// Token currently held, read at call time.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    /// Receive a snapshot after every login and logout.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.changes.subscribe()
    }

    fn replace(&self, next: impl FnOnce(&Session) -> Session) -> SessionSnapshot {
        let mut session = self
            .inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let replacement = next(&session);
        *session = replacement;
        let snapshot = session.snapshot();
        self.inner.changes.send_replace(snapshot.clone());
        snapshot
    }
}

fn read_slot(storage: &dyn SessionStorage, slot: &str) -> Option<String> {
    storage
        .get(slot)
        .map_err(|e| warn!(slot, error = %e, "Failed to read session slot"))
        .ok()
        .flatten()
}
