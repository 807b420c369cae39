use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::auth::AuthContext;
use crate::models::user::ProfileUpdate;
use crate::workflows::{Confirm, HasUpgradePrompt, Lifecycle, Phase, UpgradePrompt, ViewState};

pub const DELETE_ACCOUNT_PROMPT: &str =
    "Delete your account? All CVs, cover letters and applications will be removed.";
pub const SAVE_FAILED: &str = "Failed to update profile. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete account. Please try again.";

#[derive(Debug, Clone, Default)]
pub struct SettingsView {
    pub display_name: String,
    pub save: Phase,
    pub opening_portal: bool,
    pub delete: Phase,
    pub upgrade: UpgradePrompt,
}

impl HasUpgradePrompt for SettingsView {
    fn upgrade_mut(&mut self) -> &mut UpgradePrompt {
        &mut self.upgrade
    }
}

/// Account page: profile name, billing and account removal.
pub struct Settings {
    api: ApiClient,
    auth: Arc<AuthContext>,
    state: ViewState<SettingsView>,
}

impl Settings {
    /// Prefills the display name from the current profile.
    pub fn new(api: ApiClient, auth: Arc<AuthContext>, lifecycle: Lifecycle) -> Self {
        let display_name = auth
            .snapshot()
            .profile
            .and_then(|p| p.display_name)
            .unwrap_or_default();
        let initial = SettingsView {
            display_name,
            ..Default::default()
        };
        Self {
            api,
            auth,
            state: ViewState::new(initial, lifecycle),
        }
    }

    pub fn view(&self) -> SettingsView {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<SettingsView> {
        self.state.subscribe()
    }

    pub fn set_display_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.state.modify(|v| v.display_name = name);
    }

    /// The live profile feed picks up the change; nothing is patched locally.
    pub async fn save_display_name(&self) {
        let name = self.state.read(|v| v.display_name.trim().to_string());
        if name.is_empty() {
            return;
        }
        if !self.state.begin(|v| &mut v.save) {
            return;
        }

        let update = ProfileUpdate {
            display_name: Some(name),
            ..Default::default()
        };
        match self.api.users().update_profile(&update).await {
            Ok(_) => {
                self.state.apply(|v| v.save = Phase::Succeeded);
            }
            Err(e) => {
                warn!("Updating profile failed: {e}");
                self.state
                    .apply(|v| v.save = Phase::Failed(SAVE_FAILED.to_string()));
            }
        }
    }

    /// Returns the billing portal URL the host should open.
    pub async fn open_portal(&self, return_url: &str) -> Option<String> {
        let started = self.state.try_modify(|v| {
            if v.opening_portal {
                false
            } else {
                v.opening_portal = true;
                true
            }
        });
        if !started {
            return None;
        }

        let result = self.api.subscriptions().portal(return_url).await;
        self.state.apply(|v| v.opening_portal = false);
        match result {
            Ok(session) => Some(session.portal_url),
            Err(e) => {
                warn!("Opening billing portal failed: {e}");
                None
            }
        }
    }

    pub fn show_upgrade(&self) {
        self.state.show_upgrade();
    }

    pub fn dismiss_upgrade(&self) {
        self.state.dismiss_upgrade();
    }

    pub async fn start_checkout(&self, success_url: &str, cancel_url: &str) -> Option<String> {
        self.state.checkout(&self.api, success_url, cancel_url).await
    }

    /// Removes the account on the backend, then signs out.
    pub async fn delete_account(&self, confirm: &dyn Confirm) -> bool {
        if !confirm.confirm(DELETE_ACCOUNT_PROMPT) {
            return false;
        }
        if !self.state.begin(|v| &mut v.delete) {
            return false;
        }

        if let Err(e) = self.api.users().delete_account().await {
            warn!("Deleting account failed: {e}");
            self.state
                .apply(|v| v.delete = Phase::Failed(DELETE_FAILED.to_string()));
            return false;
        }

        info!("Account deleted");
        self.state.apply(|v| v.delete = Phase::Succeeded);
        if let Err(e) = self.auth.sign_out().await {
            warn!("Sign out after account deletion failed: {e}");
        }
        true
    }

    pub async fn sign_out(&self) -> bool {
        self.auth.sign_out().await.is_ok()
    }
}
