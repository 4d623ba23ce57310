//! Presentation surfaces that read the shared stores: the header login
//! control and the "my listings" page.

use std::sync::Arc;

use shared::domain::{Listing, ListingId, UserId};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::{
    gateway::{GatewayError, ListingGateway},
    notifications::{Notification, NotificationCenter},
    orchestrator::{SubmissionOrchestrator, WorkflowError},
    stores::{require_session, LoginGateStore, SessionStore},
    wizard::ContextId,
    AppStores,
};

pub const LOGIN_LABEL: &str = "Login / Register";
pub const MY_LISTINGS_LABEL: &str = "My Listings";
pub const LOGOUT_LABEL: &str = "Logout";
pub const LOGIN_PROMPT: &str = "Please log in to see your listings.";
pub const EMPTY_LISTINGS_MESSAGE: &str = "You have no active listings.";
pub const CREATE_LISTING_LABEL: &str = "Create a Listing";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderView {
    Anonymous,
    Authenticated { user_id: UserId },
}

impl HeaderView {
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::Anonymous => &[LOGIN_LABEL],
            Self::Authenticated { .. } => &[MY_LISTINGS_LABEL, LOGOUT_LABEL],
        }
    }
}

/// Header login/logout control.
#[derive(Clone)]
pub struct HeaderControl {
    session: SessionStore,
    login_gate: LoginGateStore,
}

impl HeaderControl {
    pub fn new(stores: &AppStores) -> Self {
        Self {
            session: stores.session.clone(),
            login_gate: stores.login_gate.clone(),
        }
    }

    pub fn view(&self) -> HeaderView {
        match self.session.user_id() {
            Some(user_id) => HeaderView::Authenticated { user_id },
            None => HeaderView::Anonymous,
        }
    }

    pub fn request_login(&self) {
        self.login_gate.show(true);
    }

    pub fn logout(&self) {
        self.session.clear_session();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    pub listing: Listing,
}

impl ListingCard {
    pub fn actions(&self) -> [CardAction; 2] {
        [CardAction::Edit, CardAction::Delete]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MyListingsView {
    LoginRequired,
    Empty,
    Listings(Vec<ListingCard>),
}

impl MyListingsView {
    fn from_listings(listings: &[Listing]) -> Self {
        if listings.is_empty() {
            return Self::Empty;
        }
        Self::Listings(
            listings
                .iter()
                .cloned()
                .map(|listing| ListingCard { listing })
                .collect(),
        )
    }
}

struct CachedListings {
    user_id: UserId,
    listings: Vec<Listing>,
}

/// The caller's own listings, cached per signed-in user.
pub struct MyListingsController {
    gateway: Arc<dyn ListingGateway>,
    orchestrator: Arc<SubmissionOrchestrator>,
    session: SessionStore,
    login_gate: LoginGateStore,
    notifications: NotificationCenter,
    cache: Mutex<Option<CachedListings>>,
}

impl MyListingsController {
    pub fn new(
        gateway: Arc<dyn ListingGateway>,
        orchestrator: Arc<SubmissionOrchestrator>,
        stores: &AppStores,
    ) -> Self {
        Self {
            gateway,
            orchestrator,
            session: stores.session.clone(),
            login_gate: stores.login_gate.clone(),
            notifications: stores.notifications.clone(),
            cache: Mutex::new(None),
        }
    }

    /// Renders from cache when it belongs to the current user, otherwise
    /// refetches.
    pub async fn view(&self) -> Result<MyListingsView, GatewayError> {
        let Some(user_id) = self.session.user_id() else {
            return Ok(MyListingsView::LoginRequired);
        };
        {
            let guard = self.cache.lock().await;
            if let Some(cached) = guard.as_ref().filter(|cached| cached.user_id == user_id) {
                return Ok(MyListingsView::from_listings(&cached.listings));
            }
        }
        self.refresh().await
    }

    pub async fn refresh(&self) -> Result<MyListingsView, GatewayError> {
        let Some(user_id) = self.session.user_id() else {
            self.cache.lock().await.take();
            return Ok(MyListingsView::LoginRequired);
        };

        let listings = match self.gateway.list_mine().await {
            Ok(listings) => listings,
            Err(err) => {
                warn!(user_id = user_id.0, error = %err, "failed to load my listings");
                self.notifications
                    .notify(Notification::LoadFailed { reason: err.clone() });
                return Err(err);
            }
        };

        info!(user_id = user_id.0, count = listings.len(), "loaded my listings");
        let view = MyListingsView::from_listings(&listings);
        *self.cache.lock().await = Some(CachedListings { user_id, listings });
        Ok(view)
    }

    pub async fn invalidate(&self) {
        self.cache.lock().await.take();
    }

    /// Starts a new listing from the empty-state affordance.
    pub fn create_listing(
        &self,
        registration_number: impl Into<String>,
    ) -> Result<ContextId, WorkflowError> {
        self.orchestrator.start_new_listing(registration_number)
    }

    /// Opens the wizard on `listing_id`, hydrating from cache when possible.
    pub async fn edit(&self, listing_id: ListingId) -> Result<ContextId, WorkflowError> {
        let user_id = self.session.user_id();
        let cached = {
            let guard = self.cache.lock().await;
            guard
                .as_ref()
                .filter(|cached| Some(cached.user_id) == user_id)
                .and_then(|cached| {
                    cached
                        .listings
                        .iter()
                        .find(|listing| listing.id == listing_id)
                        .cloned()
                })
        };
        match cached {
            Some(listing) => self.orchestrator.open_edit(listing),
            None => self.orchestrator.start_edit(listing_id).await,
        }
    }

    /// Deletes `listing_id` and refetches the collection.
    pub async fn delete(&self, listing_id: ListingId) -> Result<MyListingsView, GatewayError> {
        if require_session(&self.session, &self.login_gate).is_none() {
            info!(listing_id = listing_id.0, "login required before deleting a listing");
            return Ok(MyListingsView::LoginRequired);
        }
        if let Err(err) = self.gateway.delete(listing_id).await {
            error!(listing_id = listing_id.0, error = %err, "failed to delete listing");
            self.notifications.notify(Notification::DeleteFailed {
                listing_id,
                reason: err.clone(),
            });
            return Err(err);
        }

        info!(listing_id = listing_id.0, "listing deleted");
        self.notifications
            .notify(Notification::ListingDeleted { listing_id });
        self.invalidate().await;
        self.refresh().await
    }
}

#[cfg(test)]
#[path = "tests/surfaces_tests.rs"]
mod tests;
