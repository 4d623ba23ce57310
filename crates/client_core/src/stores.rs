//! Shared session and login-gate state observed by every presentation surface.

use std::sync::Arc;

use shared::domain::{BearerToken, Session, UserId};
use tokio::sync::watch;
use tracing::{debug, info};

/// Holds the authenticated session, or nothing when anonymous.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn with_session(session: Session) -> Self {
        let store = Self::new();
        store.set_session(session);
        store
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn credential(&self) -> Option<BearerToken> {
        self.tx
            .borrow()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.tx.borrow().as_ref().map(Session::user_id)
    }

    /// Replaces any prior session wholesale.
    pub fn set_session(&self, session: Session) {
        info!(user_id = session.user_id().0, "session established");
        self.tx.send_replace(Some(session));
    }

    pub fn clear_session(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("session cleared");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

/// Visibility of the login/registration overlay.
#[derive(Clone)]
pub struct LoginGateStore {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for LoginGateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginGateStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn show(&self, visible: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == visible {
                return false;
            }
            *current = visible;
            true
        });
        if changed {
            debug!(visible, "login gate toggled");
        }
    }

    pub fn is_visible(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Returns the session if present, otherwise raises the login gate.
pub(crate) fn require_session(
    session: &SessionStore,
    login_gate: &LoginGateStore,
) -> Option<Session> {
    let current = session.current();
    if current.is_none() {
        login_gate.show(true);
    }
    current
}

#[cfg(test)]
#[path = "tests/stores_tests.rs"]
mod tests;
