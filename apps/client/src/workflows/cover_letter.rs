use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::api::cover_letters::DEFAULT_HISTORY_LIMIT;
use crate::api::ApiClient;
use crate::entitlement::{self, EntitlementSource, GateDecision};
use crate::models::cover_letter::{CoverLetterListItem, CoverLetterRequest, CoverLetterResponse, Tone};
use crate::store::DraftStore;
use crate::workflows::{Confirm, HasUpgradePrompt, Lifecycle, Phase, UpgradePrompt, ViewState};

pub const MISSING_FIELDS: &str = "Please fill in job title, company name, and job description.";
pub const GENERATE_FAILED: &str = "Failed to generate cover letter. Please try again.";
pub const SAVE_FAILED: &str = "Failed to save cover letter. Please try again.";

#[derive(Debug, Clone, Default)]
pub struct CoverLetterView {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub tone: Tone,
    pub additional_context: String,
    pub generate: Phase,
    pub letter: Option<CoverLetterResponse>,
    /// Text area contents; may drift from `letter.content` until `save`.
    pub editable_content: String,
    pub save: Phase,
    pub history: Vec<CoverLetterListItem>,
    pub loading_history: bool,
    pub upgrade: UpgradePrompt,
}

impl CoverLetterView {
    pub fn has_unsaved_edits(&self) -> bool {
        self.letter
            .as_ref()
            .is_some_and(|l| l.content != self.editable_content)
    }
}

impl HasUpgradePrompt for CoverLetterView {
    fn upgrade_mut(&mut self) -> &mut UpgradePrompt {
        &mut self.upgrade
    }
}

pub struct CoverLetterWorkflow {
    api: ApiClient,
    entitlement: Arc<dyn EntitlementSource>,
    store: DraftStore,
    state: ViewState<CoverLetterView>,
}

impl CoverLetterWorkflow {
    /// Prefills job title, company and description from the shared draft.
    /// Call `load_history` afterwards to fill the sidebar.
    pub fn new(
        api: ApiClient,
        entitlement: Arc<dyn EntitlementSource>,
        store: DraftStore,
        lifecycle: Lifecycle,
    ) -> Self {
        let draft = store.snapshot();
        let initial = CoverLetterView {
            job_title: draft.job_title,
            company_name: draft.company_name,
            job_description: draft.job_description,
            loading_history: true,
            ..Default::default()
        };
        Self {
            api,
            entitlement,
            store,
            state: ViewState::new(initial, lifecycle),
        }
    }

    pub fn view(&self) -> CoverLetterView {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<CoverLetterView> {
        self.state.subscribe()
    }

    pub fn set_job_title(&self, value: impl Into<String>) {
        let value = value.into();
        self.store.set_job_title(value.clone());
        self.state.modify(|v| v.job_title = value);
    }

    pub fn set_company_name(&self, value: impl Into<String>) {
        let value = value.into();
        self.store.set_company_name(value.clone());
        self.state.modify(|v| v.company_name = value);
    }

    pub fn set_job_description(&self, value: impl Into<String>) {
        let value = value.into();
        self.store.set_job_description(value.clone());
        self.state.modify(|v| v.job_description = value);
    }

    pub fn set_tone(&self, tone: Tone) {
        self.state.modify(|v| v.tone = tone);
    }

    pub fn set_additional_context(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.modify(|v| v.additional_context = value);
    }

    /// Best-effort: a failed load leaves the list as it was.
    pub async fn load_history(&self) {
        self.state.modify(|v| v.loading_history = true);
        let result = self.api.cover_letters().list(DEFAULT_HISTORY_LIMIT).await;
        self.state.apply(|v| {
            match result {
                Ok(letters) => v.history = letters,
                Err(e) => warn!("Loading cover letter history failed: {e}"),
            }
            v.loading_history = false;
        });
    }

    pub async fn generate(&self) {
        if entitlement::check(self.entitlement.as_ref()) == GateDecision::UpgradeRequired {
            self.state.modify(|v| v.generate.settle(Phase::Gated));
            self.state.show_upgrade();
            return;
        }

        let view = self.state.get();
        if view.job_title.trim().is_empty()
            || view.company_name.trim().is_empty()
            || view.job_description.trim().is_empty()
        {
            self.state
                .modify(|v| v.generate.settle(Phase::Failed(MISSING_FIELDS.to_string())));
            return;
        }

        if !self.state.begin(|v| &mut v.generate) {
            return;
        }

        let request = CoverLetterRequest {
            job_title: view.job_title,
            company_name: view.company_name,
            job_description: view.job_description,
            tone: view.tone,
            additional_context: Some(view.additional_context).filter(|c| !c.trim().is_empty()),
        };

        match self.api.cover_letters().generate(&request).await {
            Ok(letter) => {
                let applied = self.state.apply(|v| {
                    v.editable_content = letter.content.clone();
                    v.letter = Some(letter);
                    v.generate = Phase::Succeeded;
                    v.save.settle(Phase::Idle);
                });
                if applied {
                    self.load_history().await;
                }
            }
            Err(e) => {
                warn!("Cover letter generation failed: {e}");
                let phase = Phase::from_error(&e, GENERATE_FAILED);
                self.state.apply(|v| {
                    v.upgrade.visible |= phase == Phase::Gated;
                    v.generate = phase;
                });
            }
        }
    }

    /// Local edit of the text area. Never persisted on its own.
    pub fn edit_content(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.modify(|v| v.editable_content = text);
    }

    /// Persists the edited text. No-op without a generated letter.
    pub async fn save(&self) {
        let (id, content) = match self.state.read(|v| {
            v.letter
                .as_ref()
                .map(|l| (l.id.clone(), v.editable_content.clone()))
        }) {
            Some(pair) => pair,
            None => return,
        };

        if !self.state.begin(|v| &mut v.save) {
            return;
        }

        match self.api.cover_letters().update(&id, &content).await {
            Ok(letter) => {
                self.state.apply(|v| {
                    v.editable_content = letter.content.clone();
                    v.letter = Some(letter);
                    v.save = Phase::Succeeded;
                });
            }
            Err(e) => {
                warn!("Saving cover letter {id} failed: {e}");
                self.state
                    .apply(|v| v.save = Phase::Failed(SAVE_FAILED.to_string()));
            }
        }
    }

    /// Reopens a stored letter, restoring the form exactly as it was saved.
    /// Failure is silent.
    pub async fn load_from_history(&self, id: &str) {
        match self.api.cover_letters().get(id).await {
            Ok(letter) => {
                self.state.apply(|v| {
                    v.job_title = letter.job_title.clone();
                    v.company_name = letter.company_name.clone();
                    v.tone = letter.tone;
                    v.editable_content = letter.content.clone();
                    v.letter = Some(letter);
                    v.save.settle(Phase::Idle);
                });
            }
            Err(e) => warn!("Loading cover letter {id} failed: {e}"),
        }
    }

    /// Removes a stored letter once the backend confirms.
    /// Returns whether it was removed.
    pub async fn delete(&self, id: &str, confirm: &dyn Confirm) -> bool {
        if !confirm.confirm("Delete this cover letter?") {
            return false;
        }

        match self.api.cover_letters().delete(id).await {
            Ok(()) => self.state.apply(|v| {
                v.history.retain(|item| item.id != id);
                if v.letter.as_ref().is_some_and(|l| l.id == id) {
                    v.letter = None;
                    v.editable_content.clear();
                }
            }),
            Err(e) => {
                warn!("Deleting cover letter {id} failed: {e}");
                false
            }
        }
    }

    pub fn dismiss_upgrade(&self) {
        self.state.dismiss_upgrade();
    }

    pub async fn start_checkout(&self, success_url: &str, cancel_url: &str) -> Option<String> {
        self.state.checkout(&self.api, success_url, cancel_url).await
    }
}
