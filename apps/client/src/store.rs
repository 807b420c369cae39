use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::Upload;
use crate::models::cv::CvAnalysisResult;

/// Form input shared between the CV and cover-letter workflows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub cv_file: Option<Upload>,
    pub analysis_result: Option<CvAnalysisResult>,
}

/// Shared handle to the current `Draft`.
///
/// Cloned into every workflow that needs it; writes are last-write-wins and
/// nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct DraftStore {
    inner: Arc<RwLock<Draft>>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Draft {
        self.read().clone()
    }

    pub fn set_job_title(&self, value: impl Into<String>) {
        self.write().job_title = value.into();
    }

    pub fn set_company_name(&self, value: impl Into<String>) {
        self.write().company_name = value.into();
    }

    pub fn set_job_description(&self, value: impl Into<String>) {
        self.write().job_description = value.into();
    }

    pub fn set_cv_file(&self, file: Option<Upload>) {
        self.write().cv_file = file;
    }

    pub fn set_analysis_result(&self, result: Option<CvAnalysisResult>) {
        self.write().analysis_result = result;
    }

    pub fn reset(&self) {
        *self.write() = Draft::default();
    }

    fn read(&self) -> RwLockReadGuard<'_, Draft> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Draft> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
