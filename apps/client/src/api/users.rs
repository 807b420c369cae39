use reqwest::Method;

use crate::api::{ApiClient, RequestOptions};
use crate::errors::ApiError;
use crate::models::user::{ProfileUpdate, UserProfile, UserStats};

pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// GET /users/me
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.client.request("/users/me", RequestOptions::get()).await
    }

    /// PATCH /users/me
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.client
            .request("/users/me", RequestOptions::json(Method::PATCH, update)?)
            .await
    }

    /// DELETE /users/me
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        self.client.request("/users/me", RequestOptions::delete()).await
    }

    /// GET /users/me/stats
    pub async fn stats(&self) -> Result<UserStats, ApiError> {
        self.client
            .request("/users/me/stats", RequestOptions::get())
            .await
    }
}
