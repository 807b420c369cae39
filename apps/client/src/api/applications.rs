use reqwest::Method;

use crate::api::{ApiClient, RequestOptions};
use crate::errors::ApiError;
use crate::models::application::{ApplicationCreate, ApplicationResponse, ApplicationUpdate};

pub const DEFAULT_LIST_LIMIT: u32 = 50;

pub struct ApplicationsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ApplicationsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, app: &ApplicationCreate) -> Result<ApplicationResponse, ApiError> {
        self.client
            .request("/applications/", RequestOptions::json(Method::POST, app)?)
            .await
    }

    pub async fn list(&self, limit: u32) -> Result<Vec<ApplicationResponse>, ApiError> {
        self.client
            .request("/applications/", RequestOptions::get().query("limit", limit))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<ApplicationResponse, ApiError> {
        self.client
            .request(&format!("/applications/{id}"), RequestOptions::get())
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        update: &ApplicationUpdate,
    ) -> Result<ApplicationResponse, ApiError> {
        self.client
            .request(
                &format!("/applications/{id}"),
                RequestOptions::json(Method::PUT, update)?,
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .request(&format!("/applications/{id}"), RequestOptions::delete())
            .await
    }
}
