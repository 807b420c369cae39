use reqwest::multipart::Form;
use reqwest::Method;

use crate::api::{ApiClient, Blob, RequestOptions, Upload};
use crate::errors::ApiError;
use crate::models::cv::{CvAnalysis, CvAnalysisResult, ExportRequest, ExportTemplate, OptimizedCv};

pub struct CvApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CvApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// POST /cv/analyze with the caller's token. Signed-in callers get a
    /// full analysis; the backend may still answer with a preview.
    pub async fn analyze(&self, file: &Upload, job_description: &str) -> Result<CvAnalysis, ApiError> {
        let form = analysis_form(file, job_description)?;
        self.client
            .request("/cv/analyze", RequestOptions::multipart(form))
            .await
    }

    /// POST /cv/analyze anonymously; always a preview.
    pub async fn analyze_public(
        &self,
        file: &Upload,
        job_description: &str,
    ) -> Result<CvAnalysis, ApiError> {
        let form = analysis_form(file, job_description)?;
        self.client
            .request("/cv/analyze", RequestOptions::multipart(form).public())
            .await
    }

    /// POST /cv/optimize. Consumes a free use; 402 when none are left.
    pub async fn optimize(
        &self,
        file: &Upload,
        job_description: &str,
        analysis_id: Option<&str>,
    ) -> Result<OptimizedCv, ApiError> {
        let mut form = analysis_form(file, job_description)?;
        if let Some(id) = analysis_id.filter(|id| !id.is_empty()) {
            form = form.text("analysis_id", id.to_string());
        }
        self.client
            .request("/cv/optimize", RequestOptions::multipart(form))
            .await
    }

    /// POST /cv/export, returning the rendered PDF.
    pub async fn export_pdf(&self, cv: &OptimizedCv, template: ExportTemplate) -> Result<Blob, ApiError> {
        let body = ExportRequest { cv, template };
        self.client
            .request_bytes(
                "/cv/export",
                RequestOptions::json(Method::POST, &body)?,
                "Export failed",
            )
            .await
    }

    /// GET /cv/analyses
    pub async fn analyses(&self, limit: u32) -> Result<Vec<CvAnalysisResult>, ApiError> {
        self.client
            .request("/cv/analyses", RequestOptions::get().query("limit", limit))
            .await
    }

    /// GET /cv/analyses/{id}
    pub async fn analysis(&self, id: &str) -> Result<CvAnalysisResult, ApiError> {
        self.client
            .request(&format!("/cv/analyses/{id}"), RequestOptions::get())
            .await
    }

    /// DELETE /cv/analyses/{id}
    pub async fn delete_analysis(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .request(&format!("/cv/analyses/{id}"), RequestOptions::delete())
            .await
    }
}

fn analysis_form(file: &Upload, job_description: &str) -> Result<Form, ApiError> {
    Ok(Form::new()
        .part("file", file.to_part()?)
        .text("job_description", job_description.to_string()))
}
