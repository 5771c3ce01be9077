//! Session Binding
//!
//! Follows the identity provider's auth events and keeps the sync engine
//! bound to whoever is signed in.
//!
//! Loading → Authenticated(user) | Unauthenticated. A new uid rebinds the
//! engine; the same uid again only refreshes the user record. Auth
//! operation failures are returned to the caller and never change state.
//!
//! The binding exists before the engine: the engine is attached afterwards
//! and reads the current identity through `subscribe()`.

use std::sync::{Arc, OnceLock};

use tokio::sync::{mpsc, watch};

use crate::auth::{IdentityProvider, User};
use crate::error::AuthResult;
use crate::sync::SyncEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No auth event received yet
    Loading,
    Unauthenticated,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

pub struct SessionBinding {
    identity: Arc<dyn IdentityProvider>,
    engine: OnceLock<Arc<SyncEngine>>,
    state: watch::Sender<SessionState>,
}

impl SessionBinding {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            identity,
            engine: OnceLock::new(),
            state,
        }
    }

    /// Attach the engine this binding drives; `false` if one is already attached
    pub fn attach(&self, engine: Arc<SyncEngine>) -> bool {
        self.engine.set(engine).is_ok()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn engine(&self) -> Option<&Arc<SyncEngine>> {
        self.engine.get()
    }

    // ========================
    // Auth events
    // ========================

    /// Apply one auth event from the provider
    pub async fn handle_auth_change(&self, user: Option<User>) {
        let current = self.current();
        match user {
            Some(user) => {
                if current.user().is_some_and(|u| u.uid == user.uid) {
                    self.state.send_if_modified(|state| {
                        let changed = state.user() != Some(&user);
                        *state = SessionState::Authenticated(user);
                        changed
                    });
                    return;
                }
                tracing::info!(uid = %user.uid, "signed in");
                // The engine clears the previous user's data before the
                // new identity becomes visible.
                if let Some(engine) = self.engine() {
                    engine.bind(&user.uid).await;
                }
                self.state.send_replace(SessionState::Authenticated(user));
            }
            None => {
                if current == SessionState::Unauthenticated {
                    return;
                }
                if current.user().is_some() {
                    tracing::info!("signed out");
                }
                if let Some(engine) = self.engine() {
                    engine.unbind().await;
                }
                self.state.send_replace(SessionState::Unauthenticated);
            }
        }
    }

    /// Drive the binding from an auth event stream until it closes
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<Option<User>>) {
        while let Some(user) = events.recv().await {
            self.handle_auth_change(user).await;
        }
        tracing::debug!("auth event stream closed");
    }

    // ========================
    // Auth operations
    // ========================

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<()> {
        let result = self.identity.sign_in(email, password).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "sign in failed");
        }
        result
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<()> {
        let result = self.identity.sign_up(email, password).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "sign up failed");
        }
        result
    }

    pub async fn sign_in_with_google(&self) -> AuthResult<()> {
        let result = self.identity.sign_in_with_google().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "google sign in failed");
        }
        result
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        let result = self.identity.sign_out().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "sign out failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::repository::StoreOp;
    use crate::testkit::{Harness, ScriptedIdentity};

    fn attached(session: &SessionBinding, harness: &Harness) -> Arc<SyncEngine> {
        let engine = Arc::new(
            SyncEngine::new(harness.store.clone(), harness.engine.reminders().clone())
                .with_session(session.subscribe()),
        );
        assert!(session.attach(engine.clone()));
        engine
    }

    fn binding(identity: ScriptedIdentity) -> (SessionBinding, Arc<SyncEngine>, Harness) {
        let harness = Harness::new();
        let session = SessionBinding::new(Arc::new(identity));
        let engine = attached(&session, &harness);
        (session, engine, harness)
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let (session, engine, _) = binding(ScriptedIdentity::new());
        assert_eq!(session.current(), SessionState::Loading);
        assert!(engine.current_uid().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_binds_engine() {
        let (session, engine, harness) = binding(ScriptedIdentity::new());

        session.handle_auth_change(Some(User::new("alice", None))).await;

        assert_eq!(session.current().user().map(|u| u.uid.as_str()), Some("alice"));
        assert_eq!(engine.current_uid().as_deref(), Some("alice"));
        assert_eq!(harness.store.active_listeners(), 2);
    }

    #[tokio::test]
    async fn test_same_uid_does_not_rebind() {
        let (session, _, harness) = binding(ScriptedIdentity::new());
        session.handle_auth_change(Some(User::new("alice", None))).await;
        harness.store.clear_ops();

        session
            .handle_auth_change(Some(User::new("alice", Some("alice@example.com".to_string()))))
            .await;

        assert!(harness.store.ops().is_empty());
        assert_eq!(
            session.current().user().and_then(|u| u.email.clone()).as_deref(),
            Some("alice@example.com")
        );
    }

    #[tokio::test]
    async fn test_switching_users_rebinds() {
        let (session, engine, harness) = binding(ScriptedIdentity::new());
        session.handle_auth_change(Some(User::new("alice", None))).await;
        session.handle_auth_change(Some(User::new("bob", None))).await;

        let unlistens = harness
            .store
            .ops()
            .iter()
            .filter(|op| matches!(op, StoreOp::Unlisten(_)))
            .count();
        assert_eq!(unlistens, 2);
        assert_eq!(harness.store.active_listeners(), 2);
        assert_eq!(engine.current_uid().as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_sign_out_unbinds() {
        let (session, engine, harness) = binding(ScriptedIdentity::new());
        session.handle_auth_change(Some(User::new("alice", None))).await;

        session.handle_auth_change(None).await;

        assert_eq!(session.current(), SessionState::Unauthenticated);
        assert!(engine.current_uid().is_none());
        assert_eq!(harness.store.active_listeners(), 0);
    }

    struct Running {
        identity: Arc<ScriptedIdentity>,
        session: Arc<SessionBinding>,
        engine: Arc<SyncEngine>,
        harness: Harness,
        task: tokio::task::JoinHandle<()>,
    }

    /// Session fed by the identity's own event stream
    fn running(identity: ScriptedIdentity) -> Running {
        let identity = Arc::new(identity);
        let harness = Harness::new();
        let session = Arc::new(SessionBinding::new(identity.clone()));
        let engine = attached(&session, &harness);
        let events = identity.auth_state_changes();
        let task = tokio::spawn({
            let session = session.clone();
            async move { session.run(events).await }
        });
        Running {
            identity,
            session,
            engine,
            harness,
            task,
        }
    }

    async fn wait_session(session: &SessionBinding, pred: impl FnMut(&SessionState) -> bool) -> SessionState {
        let mut rx = session.subscribe();
        let state = tokio::time::timeout(std::time::Duration::from_secs(2), rx.wait_for(pred))
            .await
            .unwrap()
            .unwrap();
        SessionState::clone(&state)
    }

    #[tokio::test]
    async fn test_run_follows_provider_events() {
        let Running {
            identity,
            session,
            engine,
            task,
            ..
        } = running(ScriptedIdentity::new().with_account("hero@example.com", "secret1", "hero"));

        identity.emit(None);
        session.sign_in("hero@example.com", "secret1").await.unwrap();

        let state = wait_session(&session, |s| matches!(s, SessionState::Authenticated(_))).await;
        assert_eq!(state.user().unwrap().uid, "hero");
        assert_eq!(engine.current_uid().as_deref(), Some("hero"));
        task.abort();
    }

    #[tokio::test]
    async fn test_google_sign_in_binds_engine() {
        let Running {
            identity,
            session,
            engine,
            harness,
            task,
        } = running(ScriptedIdentity::new());
        identity.emit(None);
        wait_session(&session, |s| *s == SessionState::Unauthenticated).await;

        session.sign_in_with_google().await.unwrap();

        let state = wait_session(&session, |s| s.user().is_some()).await;
        let user = state.user().unwrap();
        assert_eq!(user.uid, "google-uid");
        assert_eq!(user.email.as_deref(), Some("player@gmail.com"));
        assert_eq!(engine.current_uid().as_deref(), Some("google-uid"));
        assert_eq!(harness.store.active_listeners(), 2);
        task.abort();
    }

    #[tokio::test]
    async fn test_offline_auth_keeps_state() {
        let Running {
            identity,
            session,
            engine,
            harness,
            task,
        } = running(ScriptedIdentity::new().with_account("hero@example.com", "secret1", "hero"));
        identity.emit(None);
        wait_session(&session, |s| *s == SessionState::Unauthenticated).await;

        identity.set_offline(true);
        let err = session.sign_in("hero@example.com", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        let err = session.sign_in_with_google().await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert_eq!(session.current(), SessionState::Unauthenticated);

        identity.set_offline(false);
        session.sign_in("hero@example.com", "secret1").await.unwrap();
        wait_session(&session, |s| s.user().is_some()).await;

        identity.set_offline(true);
        let err = session.sign_out().await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert_eq!(session.current().user().map(|u| u.uid.as_str()), Some("hero"));
        assert_eq!(engine.current_uid().as_deref(), Some("hero"));
        assert_eq!(harness.store.active_listeners(), 2);
        task.abort();
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_state() {
        let (session, _, _) = binding(ScriptedIdentity::new().with_account("hero@example.com", "secret1", "hero"));
        session.handle_auth_change(None).await;

        let err = session.sign_in("hero@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = session.sign_up("new@example.com", "123").await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));

        assert_eq!(session.current(), SessionState::Unauthenticated);
    }
}
