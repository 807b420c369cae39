use reqwest::Method;

use crate::api::{ApiClient, RequestOptions};
use crate::errors::ApiError;
use crate::models::subscription::{
    CheckoutRequest, CheckoutSession, PlanStatus, PortalSession, SubscriptionStatus,
};

pub struct SubscriptionsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SubscriptionsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn status(&self) -> Result<SubscriptionStatus, ApiError> {
        self.client
            .request("/subscriptions/status", RequestOptions::get())
            .await
    }

    pub async fn plan_status(&self) -> Result<PlanStatus, ApiError> {
        self.client
            .request("/subscriptions/plan-status", RequestOptions::get())
            .await
    }

    /// Opens a checkout session; the caller redirects to `checkout_url`.
    pub async fn checkout(&self, success_url: &str, cancel_url: &str) -> Result<CheckoutSession, ApiError> {
        let body = CheckoutRequest {
            success_url: success_url.to_string(),
            cancel_url: cancel_url.to_string(),
        };
        self.client
            .request(
                "/subscriptions/checkout",
                RequestOptions::json(Method::POST, &body)?,
            )
            .await
    }

    /// Opens the billing portal for an existing subscriber.
    pub async fn portal(&self, return_url: &str) -> Result<PortalSession, ApiError> {
        self.client
            .request(
                "/subscriptions/portal",
                RequestOptions::with_method(Method::POST).query("return_url", return_url),
            )
            .await
    }
}
