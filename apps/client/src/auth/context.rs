use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::auth::{AuthError, AuthUser, IdentityProvider, ProfileSource};
use crate::entitlement::{Entitlement, EntitlementSource};
use crate::models::user::{Plan, UserProfile, DEFAULT_FREE_USES};

/// What every workflow needs to know about the session.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<AuthUser>,
    pub profile: Option<UserProfile>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            profile: None,
            loading: true,
        }
    }
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_premium(&self) -> bool {
        self.profile.as_ref().map(|p| p.plan) == Some(Plan::Premium)
    }

    /// Falls back to the new-account grant until a profile document exists.
    pub fn free_uses_remaining(&self) -> u32 {
        self.profile
            .as_ref()
            .map_or(DEFAULT_FREE_USES, |p| p.free_uses_remaining)
    }

    pub fn entitlement(&self) -> Entitlement {
        Entitlement {
            plan: if self.is_premium() {
                Plan::Premium
            } else {
                Plan::Free
            },
            free_uses_remaining: self.free_uses_remaining(),
        }
    }
}

/// Single source of truth for the signed-in user and their profile.
///
/// Runs one background task that follows the identity provider and keeps a
/// profile subscription open for the current user. Dropping the context
/// stops the task, which releases the profile subscription with it.
pub struct AuthContext {
    identity: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<AuthState>>,
    task: JoinHandle<()>,
}

impl AuthContext {
    pub fn start(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileSource>) -> Self {
        let (tx, _) = watch::channel(AuthState::default());
        let state = Arc::new(tx);
        let task = tokio::spawn(follow_identity(
            identity.watch_user(),
            profiles,
            Arc::clone(&state),
        ));

        Self {
            identity,
            state,
            task,
        }
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Resolves once the first identity/profile answer has arrived.
    pub async fn wait_until_loaded(&self) -> AuthState {
        let mut rx = self.state.subscribe();
        loop {
            {
                let current = rx.borrow_and_update();
                if !current.loading {
                    return current.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Err(e) = self.identity.sign_out().await {
            error!("Error signing out: {e}");
            return Err(e);
        }
        self.state.send_modify(|s| {
            s.user = None;
            s.profile = None;
        });
        Ok(())
    }
}

impl EntitlementSource for AuthContext {
    fn entitlement(&self) -> Entitlement {
        self.state.borrow().entitlement()
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn follow_identity(
    mut users: watch::Receiver<Option<AuthUser>>,
    profiles: Arc<dyn ProfileSource>,
    state: Arc<watch::Sender<AuthState>>,
) {
    loop {
        let user = users.borrow_and_update().clone();

        let Some(user) = user else {
            state.send_modify(|s| {
                s.user = None;
                s.profile = None;
                s.loading = false;
            });
            if users.changed().await.is_err() {
                return;
            }
            continue;
        };

        debug!("Following profile for {}", user.uid);
        state.send_modify(|s| {
            if s.user.as_ref().map(|u| &u.uid) != Some(&user.uid) {
                s.profile = None;
            }
            s.user = Some(user.clone());
        });

        // Dropped at the end of this iteration, i.e. whenever the user changes.
        let mut subscription = profiles.subscribe(&user.uid);
        let mut feed_open = true;

        loop {
            tokio::select! {
                changed = users.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
                snapshot = subscription.next(), if feed_open => match snapshot {
                    Some(Ok(profile)) => state.send_modify(|s| {
                        s.profile = profile;
                        s.loading = false;
                    }),
                    Some(Err(e)) => {
                        error!("Error fetching user profile: {e}");
                        state.send_modify(|s| s.loading = false);
                    }
                    None => feed_open = false,
                },
            }
        }
    }
}
