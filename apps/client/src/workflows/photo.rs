use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::api::{ApiClient, Blob, Upload};
use crate::entitlement::{self, EntitlementSource, GateDecision};
use crate::models::photo::{Background, PhotoEnhanceParams};
use crate::workflows::{HasUpgradePrompt, Lifecycle, Phase, UpgradePrompt, ViewState};

pub const NOT_AN_IMAGE: &str = "Please select an image file.";
pub const ENHANCE_FAILED: &str = "Failed to enhance photo. Please try a different image.";

#[derive(Debug, Clone, Default)]
pub struct PhotoView {
    pub file: Option<Upload>,
    pub params: PhotoEnhanceParams,
    pub enhance: Phase,
    pub result: Option<Blob>,
    pub upgrade: UpgradePrompt,
}

impl HasUpgradePrompt for PhotoView {
    fn upgrade_mut(&mut self) -> &mut UpgradePrompt {
        &mut self.upgrade
    }
}

pub struct PhotoWorkflow {
    api: ApiClient,
    entitlement: Arc<dyn EntitlementSource>,
    state: ViewState<PhotoView>,
}

impl PhotoWorkflow {
    pub fn new(api: ApiClient, entitlement: Arc<dyn EntitlementSource>, lifecycle: Lifecycle) -> Self {
        Self {
            api,
            entitlement,
            state: ViewState::new(PhotoView::default(), lifecycle),
        }
    }

    pub fn view(&self) -> PhotoView {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<PhotoView> {
        self.state.subscribe()
    }

    /// Accepts image files only. A new selection discards the previous
    /// result and error; a running enhancement stays in flight.
    pub fn select_file(&self, file: Upload) -> bool {
        if !file.is_image() {
            self.state
                .modify(|v| v.enhance.settle(Phase::Failed(NOT_AN_IMAGE.to_string())));
            return false;
        }
        self.state.modify(|v| {
            v.file = Some(file);
            v.result = None;
            v.enhance.settle(Phase::Idle);
        });
        true
    }

    pub fn set_background(&self, background: Background) {
        self.state.modify(|v| v.params.background = background);
    }

    pub fn set_params(&self, params: PhotoEnhanceParams) {
        self.state.modify(|v| v.params = params);
    }

    /// Uploads the selected image with the current settings. Costs one AI use.
    pub async fn enhance(&self) {
        let (file, params) = self.state.read(|v| (v.file.clone(), v.params));
        let Some(file) = file else {
            return;
        };

        if entitlement::check(self.entitlement.as_ref()) == GateDecision::UpgradeRequired {
            self.state.modify(|v| v.enhance.settle(Phase::Gated));
            self.state.show_upgrade();
            return;
        }

        if let Err(message) = params.validate() {
            self.state.modify(|v| v.enhance.settle(Phase::Failed(message)));
            return;
        }

        if !self.state.begin(|v| &mut v.enhance) {
            return;
        }

        match self.api.photos().enhance(&file, &params).await {
            Ok(blob) => {
                self.state.apply(|v| {
                    v.result = Some(blob);
                    v.enhance = Phase::Succeeded;
                });
            }
            Err(e) => {
                warn!("Photo enhancement failed: {e}");
                let phase = Phase::from_error(&e, ENHANCE_FAILED);
                self.state.apply(|v| {
                    v.upgrade.visible |= phase == Phase::Gated;
                    v.enhance = phase;
                });
            }
        }
    }

    /// Clears the selection and result; keeps the chosen settings.
    pub fn reset(&self) {
        self.state.modify(|v| {
            v.file = None;
            v.result = None;
            v.enhance.settle(Phase::Idle);
        });
    }

    pub fn dismiss_upgrade(&self) {
        self.state.dismiss_upgrade();
    }

    pub async fn start_checkout(&self, success_url: &str, cancel_url: &str) -> Option<String> {
        self.state.checkout(&self.api, success_url, cancel_url).await
    }
}
