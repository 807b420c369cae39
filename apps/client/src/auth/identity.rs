use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::auth::AuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl AuthUser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }
}

/// The third-party identity provider as seen by the client.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current user; the receiver fires on every sign-in and sign-out.
    fn watch_user(&self) -> watch::Receiver<Option<AuthUser>>;

    /// A fresh bearer token for the current user, `None` when signed out.
    async fn id_token(&self) -> Result<Option<String>, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

#[derive(Debug, Clone)]
enum TokenState {
    None,
    Valid(String),
    Broken(String),
}

/// Identity backed by a token handed to us by the host (CLI flag, env var,
/// an embedding app that already ran the sign-in flow).
pub struct TokenIdentity {
    user: watch::Sender<Option<AuthUser>>,
    token: RwLock<TokenState>,
}

impl Default for TokenIdentity {
    fn default() -> Self {
        Self::signed_out()
    }
}

impl TokenIdentity {
    pub fn signed_out() -> Self {
        let (user, _) = watch::channel(None);
        Self {
            user,
            token: RwLock::new(TokenState::None),
        }
    }

    pub fn signed_in(user: AuthUser, token: impl Into<String>) -> Self {
        let identity = Self::signed_out();
        identity.sign_in(user, token);
        identity
    }

    pub fn sign_in(&self, user: AuthUser, token: impl Into<String>) {
        self.set_token(TokenState::Valid(token.into()));
        self.user.send_replace(Some(user));
    }

    /// Keeps the user signed in but makes token refresh fail.
    pub fn break_token(&self, reason: impl Into<String>) {
        self.set_token(TokenState::Broken(reason.into()));
    }

    fn set_token(&self, state: TokenState) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = state;
    }
}

#[async_trait]
impl IdentityProvider for TokenIdentity {
    fn watch_user(&self) -> watch::Receiver<Option<AuthUser>> {
        self.user.subscribe()
    }

    async fn id_token(&self) -> Result<Option<String>, AuthError> {
        let state = self.token.read().unwrap_or_else(|e| e.into_inner()).clone();
        match state {
            TokenState::None => Ok(None),
            TokenState::Valid(token) => Ok(Some(token)),
            TokenState::Broken(reason) => Err(AuthError::TokenUnavailable(reason)),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_token(TokenState::None);
        self.user.send_replace(None);
        Ok(())
    }
}
