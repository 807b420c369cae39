//! Who is signed in, and what their profile currently says.

pub mod context;
pub mod identity;
pub mod profile_feed;

use thiserror::Error;

pub use context::{AuthContext, AuthState};
pub use identity::{AuthUser, IdentityProvider, TokenIdentity};
pub use profile_feed::{
    PollingProfileSource, ProfileFeedError, ProfileSnapshot, ProfileSource, ProfileSubscription,
    PushProfileSource,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token unavailable: {0}")]
    TokenUnavailable(String),
}
