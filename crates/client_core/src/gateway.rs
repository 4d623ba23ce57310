//! Request layer between the workflow and the listings backend.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{BearerToken, Listing, ListingDraft, ListingId},
    error::ApiError,
    protocol::CreateListingRequest,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::stores::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("missing, expired or rejected credential")]
    Unauthorized,
    #[error("backend rejected the listing: {0}")]
    ValidationFailed(String),
    #[error("listing not found")]
    NotFound,
    #[error("network error: {0}")]
    Network(String),
}

impl GatewayError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::ValidationFailed(rejection_message(status, body))
            }
            other => Self::Network(format!("backend responded with status {other}")),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

fn rejection_message(status: StatusCode, body: &str) -> String {
    if let Ok(api_error) = serde_json::from_str::<ApiError>(body) {
        return api_error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Listing operations against the backend. Single attempt, no retry.
#[async_trait]
pub trait ListingGateway: Send + Sync {
    async fn create(
        &self,
        draft: &ListingDraft,
        registration_number: &str,
    ) -> Result<Listing, GatewayError>;
    async fn update(&self, id: ListingId, draft: &ListingDraft) -> Result<Listing, GatewayError>;
    async fn delete(&self, id: ListingId) -> Result<(), GatewayError>;
    async fn list_mine(&self) -> Result<Vec<Listing>, GatewayError>;
    async fn fetch(&self, id: ListingId) -> Result<Listing, GatewayError>;
}

/// [`ListingGateway`] over HTTP, authenticating with the current session.
pub struct HttpListingGateway {
    http: Client,
    base_url: String,
    session: SessionStore,
}

impl HttpListingGateway {
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Self {
        Self::with_client(Client::new(), base_url, session)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, session: SessionStore) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            session,
        }
    }

    fn credential(&self) -> Result<BearerToken, GatewayError> {
        self.session.credential().ok_or(GatewayError::Unauthorized)
    }

    fn listings_url(&self) -> String {
        format!("{}/listings", self.base_url)
    }

    fn listing_url(&self, id: ListingId) -> String {
        format!("{}/listings/{}", self.base_url, id.0)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = GatewayError::from_status(status, &body);
        warn!(status = status.as_u16(), error = %err, "listing request failed");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|err| {
            GatewayError::Network(format!("failed to decode listing response: {err}"))
        })
    }
}

#[async_trait]
impl ListingGateway for HttpListingGateway {
    async fn create(
        &self,
        draft: &ListingDraft,
        registration_number: &str,
    ) -> Result<Listing, GatewayError> {
        let token = self.credential()?;
        let body = CreateListingRequest::new(draft.clone(), registration_number);
        debug!(reg_no = registration_number, "creating listing");
        self.send_json(
            self.http
                .post(self.listings_url())
                .bearer_auth(token.expose())
                .json(&body),
        )
        .await
    }

    async fn update(&self, id: ListingId, draft: &ListingDraft) -> Result<Listing, GatewayError> {
        let token = self.credential()?;
        debug!(listing_id = id.0, "updating listing");
        self.send_json(
            self.http
                .put(self.listing_url(id))
                .bearer_auth(token.expose())
                .json(draft),
        )
        .await
    }

    async fn delete(&self, id: ListingId) -> Result<(), GatewayError> {
        let token = self.credential()?;
        debug!(listing_id = id.0, "deleting listing");
        self.send(
            self.http
                .delete(self.listing_url(id))
                .bearer_auth(token.expose()),
        )
        .await?;
        Ok(())
    }

    async fn list_mine(&self) -> Result<Vec<Listing>, GatewayError> {
        let token = self.credential()?;
        self.send_json(
            self.http
                .get(format!("{}/my-listings", self.listings_url()))
                .bearer_auth(token.expose()),
        )
        .await
    }

    async fn fetch(&self, id: ListingId) -> Result<Listing, GatewayError> {
        let mut request = self.http.get(self.listing_url(id));
        if let Some(token) = self.session.credential() {
            request = request.bearer_auth(token.expose());
        }
        self.send_json(request).await
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
