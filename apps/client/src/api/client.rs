use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::applications::ApplicationsApi;
use crate::api::cover_letters::CoverLettersApi;
use crate::api::cv::CvApi;
use crate::api::photos::PhotosApi;
use crate::api::subscriptions::SubscriptionsApi;
use crate::api::users::UsersApi;
use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::errors::{ApiError, DEFAULT_ERROR_MESSAGE};

pub enum Body {
    Empty,
    Json(Value),
    Multipart(Form),
}

/// Per-request knobs. `authenticated` defaults to true.
pub struct RequestOptions {
    pub method: Method,
    pub body: Body,
    pub query: Vec<(String, String)>,
    pub authenticated: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            method: Method::GET,
            body: Body::Empty,
            query: Vec::new(),
            authenticated: true,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self::with_method(Method::DELETE)
    }

    pub fn with_method(method: Method) -> Self {
        RequestOptions {
            method,
            ..Self::default()
        }
    }

    pub fn json<T: Serialize + ?Sized>(method: Method, body: &T) -> Result<Self, ApiError> {
        Ok(RequestOptions {
            method,
            body: Body::Json(serde_json::to_value(body)?),
            ..Self::default()
        })
    }

    pub fn multipart(form: Form) -> Self {
        RequestOptions {
            method: Method::POST,
            body: Body::Multipart(form),
            ..Self::default()
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Sends the request without a bearer token.
    pub fn public(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// Raw bytes from a binary endpoint (PDF export, enhanced photo).
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// The single HTTP client for the backend.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
    identity: Arc<dyn IdentityProvider>,
}

impl ApiClient {
    pub fn new(config: &Config, identity: Arc<dyn IdentityProvider>) -> Result<Self, ApiError> {
        Self::with_timeout(&config.api_url, config.request_timeout, identity)
    }

    pub fn with_timeout(
        base_url: &str,
        timeout: Duration,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            identity,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    pub fn cv(&self) -> CvApi<'_> {
        CvApi::new(self)
    }

    pub fn cover_letters(&self) -> CoverLettersApi<'_> {
        CoverLettersApi::new(self)
    }

    pub fn applications(&self) -> ApplicationsApi<'_> {
        ApplicationsApi::new(self)
    }

    pub fn photos(&self) -> PhotosApi<'_> {
        PhotosApi::new(self)
    }

    pub fn subscriptions(&self) -> SubscriptionsApi<'_> {
        SubscriptionsApi::new(self)
    }

    /// Sends a request and decodes the JSON reply.
    ///
    /// 204 replies skip body parsing and decode `T` from `null`, which is
    /// what `()` and `Option<_>` expect.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let response = self.send(endpoint, options).await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(serde_json::from_value(Value::Null)?);
        }

        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::from_body(
                status.as_u16(),
                &body,
                DEFAULT_ERROR_MESSAGE,
            ));
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Like `request`, but returns the body untouched.
    /// `fallback` is the message used when an error body has no `detail`.
    pub async fn request_bytes(
        &self,
        endpoint: &str,
        options: RequestOptions,
        fallback: &str,
    ) -> Result<Blob, ApiError> {
        let response = self.send(endpoint, options).await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::from_body(status.as_u16(), &bytes, fallback));
        }

        Ok(Blob {
            bytes,
            content_type,
        })
    }

    async fn send(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}", options.method, url);

        let mut builder = self.http.request(options.method, &url);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }

        if options.authenticated {
            if let Some(token) = self.bearer_token().await {
                builder = builder.bearer_auth(token);
            }
        }

        builder = match options.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(form) => builder.multipart(form),
        };

        Ok(builder.send().await?)
    }

    /// A token failure never aborts the request; the backend decides
    /// whether the endpoint needs one.
    async fn bearer_token(&self) -> Option<String> {
        match self.identity.id_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to get auth token: {e}");
                None
            }
        }
    }
}
