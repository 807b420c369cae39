use reqwest::Method;

use crate::api::{ApiClient, RequestOptions};
use crate::errors::ApiError;
use crate::models::cover_letter::{
    CoverLetterListItem, CoverLetterRequest, CoverLetterResponse, CoverLetterUpdate,
};

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

pub struct CoverLettersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CoverLettersApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// POST /cover-letters/generate. Consumes a free use; 402 when none are left.
    pub async fn generate(&self, request: &CoverLetterRequest) -> Result<CoverLetterResponse, ApiError> {
        self.client
            .request(
                "/cover-letters/generate",
                RequestOptions::json(Method::POST, request)?,
            )
            .await
    }

    pub async fn list(&self, limit: u32) -> Result<Vec<CoverLetterListItem>, ApiError> {
        self.client
            .request("/cover-letters", RequestOptions::get().query("limit", limit))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<CoverLetterResponse, ApiError> {
        self.client
            .request(&format!("/cover-letters/{id}"), RequestOptions::get())
            .await
    }

    pub async fn update(&self, id: &str, content: &str) -> Result<CoverLetterResponse, ApiError> {
        let body = CoverLetterUpdate {
            content: content.to_string(),
        };
        self.client
            .request(
                &format!("/cover-letters/{id}"),
                RequestOptions::json(Method::PUT, &body)?,
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .request(&format!("/cover-letters/{id}"), RequestOptions::delete())
            .await
    }
}
