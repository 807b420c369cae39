use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::api::ApiClient;
use crate::entitlement::{Entitlement, EntitlementSource};
use crate::models::user::UserStats;
use crate::workflows::{Lifecycle, ViewState};

#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub stats: Option<UserStats>,
    pub loading: bool,
}

/// Landing page: usage counters and plan summary.
pub struct Dashboard {
    api: ApiClient,
    entitlement: Arc<dyn EntitlementSource>,
    state: ViewState<DashboardView>,
}

impl Dashboard {
    pub fn new(api: ApiClient, entitlement: Arc<dyn EntitlementSource>, lifecycle: Lifecycle) -> Self {
        let initial = DashboardView {
            stats: None,
            loading: true,
        };
        Self {
            api,
            entitlement,
            state: ViewState::new(initial, lifecycle),
        }
    }

    pub fn view(&self) -> DashboardView {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.state.subscribe()
    }

    /// Read live, so the summary follows profile updates.
    pub fn entitlement(&self) -> Entitlement {
        self.entitlement.entitlement()
    }

    /// Best-effort: on failure the page simply shows no numbers.
    pub async fn load_stats(&self) {
        self.state.modify(|v| v.loading = true);
        let result = self.api.users().stats().await;
        self.state.apply(|v| {
            match result {
                Ok(stats) => v.stats = Some(stats),
                Err(e) => warn!("Loading stats failed: {e}"),
            }
            v.loading = false;
        });
    }
}
