use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::applications::DEFAULT_LIST_LIMIT;
use crate::api::ApiClient;
use crate::models::application::{
    ApplicationCreate, ApplicationResponse, ApplicationStatus, ApplicationUpdate,
};
use crate::workflows::{Confirm, Lifecycle, Phase, ViewState};

pub const DELETE_PROMPT: &str = "Delete this application?";
pub const SAVE_FAILED: &str = "Failed to save application. Please try again.";

/// Add/edit modal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationForm {
    pub open: bool,
    /// `Some` when editing an existing application.
    pub editing_id: Option<String>,
    pub company_name: String,
    pub position: String,
    pub status: ApplicationStatus,
    pub job_url: String,
    pub notes: String,
}

impl ApplicationForm {
    fn for_edit(app: &ApplicationResponse) -> Self {
        ApplicationForm {
            open: true,
            editing_id: Some(app.id.clone()),
            company_name: app.company_name.clone(),
            position: app.position.clone(),
            status: app.status,
            job_url: app.job_url.clone().unwrap_or_default(),
            notes: app.notes.clone().unwrap_or_default(),
        }
    }

    /// Company and position are both required.
    pub fn is_valid(&self) -> bool {
        !self.company_name.trim().is_empty() && !self.position.trim().is_empty()
    }

    pub fn to_create(&self) -> ApplicationCreate {
        ApplicationCreate {
            company_name: self.company_name.trim().to_string(),
            position: self.position.trim().to_string(),
            status: self.status,
            job_url: non_blank(&self.job_url),
            notes: non_blank(&self.notes),
            ..Default::default()
        }
    }

    pub fn to_update(&self) -> ApplicationUpdate {
        ApplicationUpdate {
            company_name: Some(self.company_name.trim().to_string()),
            position: Some(self.position.trim().to_string()),
            status: Some(self.status),
            job_url: non_blank(&self.job_url),
            notes: non_blank(&self.notes),
            ..Default::default()
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationsView {
    pub applications: Vec<ApplicationResponse>,
    pub loading: bool,
    pub form: ApplicationForm,
    pub save: Phase,
    /// Id of the row whose delete is in flight.
    pub deleting: Option<String>,
}

impl ApplicationsView {
    /// Board columns in fixed status order, empty columns included.
    pub fn grouped(&self) -> Vec<(ApplicationStatus, Vec<&ApplicationResponse>)> {
        ApplicationStatus::ALL
            .into_iter()
            .map(|status| {
                let column = self
                    .applications
                    .iter()
                    .filter(|app| app.status == status)
                    .collect();
                (status, column)
            })
            .collect()
    }
}

/// Kanban-style tracker. The list shown is always what the backend last
/// returned; nothing is removed or changed before the backend confirms.
pub struct ApplicationTracker {
    api: ApiClient,
    state: ViewState<ApplicationsView>,
}

impl ApplicationTracker {
    pub fn new(api: ApiClient, lifecycle: Lifecycle) -> Self {
        let initial = ApplicationsView {
            loading: true,
            ..Default::default()
        };
        Self {
            api,
            state: ViewState::new(initial, lifecycle),
        }
    }

    pub fn view(&self) -> ApplicationsView {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<ApplicationsView> {
        self.state.subscribe()
    }

    /// Best-effort: a failed load leaves the list as it was.
    pub async fn load(&self) {
        self.state.modify(|v| v.loading = true);
        let result = self.api.applications().list(DEFAULT_LIST_LIMIT).await;
        self.state.apply(|v| {
            match result {
                Ok(apps) => v.applications = apps,
                Err(e) => warn!("Loading applications failed: {e}"),
            }
            v.loading = false;
        });
    }

    pub fn open_create(&self) {
        self.state.modify(|v| {
            v.form = ApplicationForm {
                open: true,
                ..Default::default()
            };
            v.save.settle(Phase::Idle);
        });
    }

    /// Opens the modal prefilled from a listed application.
    pub fn open_edit(&self, id: &str) -> bool {
        self.state.try_modify(|v| {
            match v.applications.iter().find(|app| app.id == id) {
                Some(app) => {
                    v.form = ApplicationForm::for_edit(app);
                    v.save.settle(Phase::Idle);
                    true
                }
                None => false,
            }
        })
    }

    pub fn update_form(&self, f: impl FnOnce(&mut ApplicationForm)) {
        self.state.modify(|v| f(&mut v.form));
    }

    pub fn close_form(&self) {
        self.state.modify(|v| v.form = ApplicationForm::default());
    }

    /// Creates or updates from the modal. Blank required fields send nothing.
    pub async fn save(&self) {
        let form = self.state.read(|v| v.form.clone());
        if !form.is_valid() {
            return;
        }

        if !self.state.begin(|v| &mut v.save) {
            return;
        }

        let result = match &form.editing_id {
            Some(id) => self.api.applications().update(id, &form.to_update()).await,
            None => self.api.applications().create(&form.to_create()).await,
        };

        match result {
            Ok(app) => {
                info!(id = %app.id, "Saved application");
                let applied = self.state.apply(|v| {
                    v.form = ApplicationForm::default();
                    v.save = Phase::Succeeded;
                });
                if applied {
                    self.load().await;
                }
            }
            Err(e) => {
                warn!("Saving application failed: {e}");
                self.state
                    .apply(|v| v.save = Phase::Failed(SAVE_FAILED.to_string()));
            }
        }
    }

    /// Moves a card to another column once the backend accepts it.
    pub async fn change_status(&self, id: &str, status: ApplicationStatus) -> bool {
        let update = ApplicationUpdate::status_only(status);
        match self.api.applications().update(id, &update).await {
            Ok(updated) => self.state.try_modify(|v| {
                match v.applications.iter_mut().find(|app| app.id == updated.id) {
                    Some(row) => {
                        *row = updated;
                        true
                    }
                    None => false,
                }
            }),
            Err(e) => {
                warn!("Changing status of application {id} failed: {e}");
                false
            }
        }
    }

    /// Asks first; the row disappears only after the backend confirms.
    pub async fn delete(&self, id: &str, confirm: &dyn Confirm) -> bool {
        if !confirm.confirm(DELETE_PROMPT) {
            return false;
        }

        let started = self.state.try_modify(|v| {
            if v.deleting.is_some() {
                false
            } else {
                v.deleting = Some(id.to_string());
                true
            }
        });
        if !started {
            return false;
        }

        let result = self.api.applications().delete(id).await;
        let mut removed = false;
        self.state.apply(|v| {
            v.deleting = None;
            match &result {
                Ok(()) => {
                    v.applications.retain(|app| app.id != id);
                    removed = true;
                }
                Err(e) => warn!("Deleting application {id} failed: {e}"),
            }
        });
        removed
    }
}
