//! Identity Boundary
//!
//! The authentication provider: an opaque user handle, a stream of
//! sign-in/sign-out events, and the account operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::AuthResult;

/// Authenticated user as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
}

impl User {
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Stream of auth state changes; `None` means signed out.
    /// The provider reports the current state as the first event.
    fn auth_state_changes(&self) -> mpsc::UnboundedReceiver<Option<User>>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<()>;

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<()>;

    async fn sign_in_with_google(&self) -> AuthResult<()>;

    async fn sign_out(&self) -> AuthResult<()>;
}
