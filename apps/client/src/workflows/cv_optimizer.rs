use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::api::{ApiClient, Blob, Upload};
use crate::entitlement::{self, EntitlementSource, GateDecision};
use crate::models::cv::{CvAnalysis, ExportTemplate, OptimizedCv};
use crate::store::DraftStore;
use crate::workflows::{HasUpgradePrompt, Lifecycle, Phase, UpgradePrompt, ViewState};

pub const MIN_DESCRIPTION_CHARS: usize = 50;

pub const MISSING_INPUT: &str = "Please upload a CV and paste a job description.";
pub const DESCRIPTION_TOO_SHORT: &str = "Job description must be at least 50 characters.";
pub const ANALYZE_FAILED: &str = "Failed to analyze CV. Please try again.";
pub const OPTIMIZE_FAILED: &str = "Failed to optimize CV. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    #[default]
    Upload = 1,
    Analysis = 2,
    Optimized = 3,
}

#[derive(Debug, Clone, Default)]
pub struct CvOptimizerView {
    pub step: Step,
    pub file: Option<Upload>,
    pub job_description: String,
    pub analyze: Phase,
    pub analysis: Option<CvAnalysis>,
    pub optimize: Phase,
    pub optimized: Option<OptimizedCv>,
    pub template: ExportTemplate,
    pub exporting: bool,
    pub upgrade: UpgradePrompt,
}

impl HasUpgradePrompt for CvOptimizerView {
    fn upgrade_mut(&mut self) -> &mut UpgradePrompt {
        &mut self.upgrade
    }
}

/// Three-step flow: upload and describe, read the ATS analysis, get the
/// rewritten CV. Going back never discards computed results; only
/// `restart` does.
pub struct CvOptimizer {
    api: ApiClient,
    entitlement: Arc<dyn EntitlementSource>,
    store: DraftStore,
    state: ViewState<CvOptimizerView>,
}

impl CvOptimizer {
    /// Prefills the file and job description from the shared draft.
    pub fn new(
        api: ApiClient,
        entitlement: Arc<dyn EntitlementSource>,
        store: DraftStore,
        lifecycle: Lifecycle,
    ) -> Self {
        let draft = store.snapshot();
        let initial = CvOptimizerView {
            file: draft.cv_file,
            job_description: draft.job_description,
            ..Default::default()
        };
        Self {
            api,
            entitlement,
            store,
            state: ViewState::new(initial, lifecycle),
        }
    }

    pub fn view(&self) -> CvOptimizerView {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<CvOptimizerView> {
        self.state.subscribe()
    }

    pub fn set_file(&self, file: Upload) {
        self.store.set_cv_file(Some(file.clone()));
        self.state.modify(|v| v.file = Some(file));
    }

    pub fn set_job_description(&self, text: impl Into<String>) {
        let text = text.into();
        self.store.set_job_description(text.clone());
        self.state.modify(|v| v.job_description = text);
    }

    pub fn set_template(&self, template: ExportTemplate) {
        self.state.modify(|v| v.template = template);
    }

    /// Step 1 → 2. ATS analysis is free, so no entitlement check here;
    /// a 402 from the backend still opens the upgrade prompt.
    pub async fn analyze(&self) {
        let (file, description) = self.state.read(|v| (v.file.clone(), v.job_description.clone()));

        let file = match file {
            Some(f) if !description.trim().is_empty() => f,
            _ => return self.fail_analysis(MISSING_INPUT),
        };
        if description.trim().chars().count() < MIN_DESCRIPTION_CHARS {
            return self.fail_analysis(DESCRIPTION_TOO_SHORT);
        }

        if !self.state.begin(|v| &mut v.analyze) {
            return;
        }

        let result = self.api.cv().analyze(&file, &description).await;
        if !self.state.is_mounted() {
            return;
        }

        match result {
            Ok(analysis) => {
                if let CvAnalysis::Full(full) = &analysis {
                    self.store.set_job_description(description.clone());
                    self.store.set_analysis_result(Some(full.clone()));
                }
                self.state.apply(|v| {
                    v.analysis = Some(analysis);
                    v.analyze = Phase::Succeeded;
                    v.step = Step::Analysis;
                    // A rewrite belongs to the analysis it was built from.
                    v.optimized = None;
                    v.optimize.settle(Phase::Idle);
                });
            }
            Err(e) => {
                warn!("CV analysis failed: {e}");
                let phase = Phase::from_error(&e, ANALYZE_FAILED);
                self.state.apply(|v| {
                    v.upgrade.visible |= phase == Phase::Gated;
                    v.analyze = phase;
                });
            }
        }
    }

    /// Step 2 → 3. Costs one AI use.
    pub async fn optimize(&self) {
        if entitlement::check(self.entitlement.as_ref()) == GateDecision::UpgradeRequired {
            self.state.modify(|v| v.optimize.settle(Phase::Gated));
            self.state.show_upgrade();
            return;
        }

        let (file, description, analysis_id) = self.state.read(|v| {
            (
                v.file.clone(),
                v.job_description.clone(),
                v.analysis
                    .as_ref()
                    .and_then(|a| a.analysis_id())
                    .map(str::to_string),
            )
        });
        let Some(file) = file else {
            return;
        };

        if !self.state.begin(|v| &mut v.optimize) {
            return;
        }

        let result = self
            .api
            .cv()
            .optimize(&file, &description, analysis_id.as_deref())
            .await;

        match result {
            Ok(cv) => {
                self.state.apply(|v| {
                    v.optimized = Some(cv);
                    v.optimize = Phase::Succeeded;
                    v.step = Step::Optimized;
                });
            }
            Err(e) => {
                warn!("CV optimization failed: {e}");
                let phase = Phase::from_error(&e, OPTIMIZE_FAILED);
                self.state.apply(|v| {
                    v.upgrade.visible |= phase == Phase::Gated;
                    v.optimize = phase;
                });
            }
        }
    }

    /// Renders the optimized CV to PDF with the selected template.
    /// Failures are logged and otherwise silent.
    pub async fn export_pdf(&self) -> Option<Blob> {
        let (cv, template) = self.state.read(|v| (v.optimized.clone(), v.template));
        let cv = cv?;

        let started = self.state.try_modify(|v| {
            if v.exporting {
                false
            } else {
                v.exporting = true;
                true
            }
        });
        if !started {
            return None;
        }

        let result = self.api.cv().export_pdf(&cv, template).await;
        self.state.apply(|v| v.exporting = false);

        match result {
            Ok(blob) => Some(blob),
            Err(e) => {
                warn!("PDF export failed: {e}");
                None
            }
        }
    }

    /// Moves between steps. Backward moves always succeed and keep data;
    /// forward moves need the target step's data.
    pub fn go_to_step(&self, step: Step) -> bool {
        let allowed = self.state.read(|v| match step {
            Step::Upload => true,
            Step::Analysis => v.analysis.is_some(),
            Step::Optimized => v.optimized.is_some(),
        });
        if allowed {
            self.state.modify(|v| v.step = step);
        }
        allowed
    }

    /// Starts over, clearing the shared draft as well.
    pub fn restart(&self) {
        self.store.reset();
        self.state.modify(|v| *v = CvOptimizerView::default());
    }

    pub fn dismiss_upgrade(&self) {
        self.state.dismiss_upgrade();
    }

    pub async fn start_checkout(&self, success_url: &str, cancel_url: &str) -> Option<String> {
        self.state.checkout(&self.api, success_url, cancel_url).await
    }

    fn fail_analysis(&self, message: &str) {
        self.state
            .modify(|v| v.analyze.settle(Phase::Failed(message.to_string())));
    }
}
