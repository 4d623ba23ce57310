//! User-visible notifications (toasts) raised by the workflow.

use std::sync::Arc;

use shared::domain::ListingId;
use tokio::sync::broadcast;

use crate::gateway::GatewayError;

pub const CREATED_MESSAGE: &str = "Listing created successfully";
pub const UPDATED_MESSAGE: &str = "Listing updated successfully";
pub const DELETED_MESSAGE: &str = "Listing deleted";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ListingCreated {
        listing_id: ListingId,
    },
    ListingUpdated {
        listing_id: ListingId,
    },
    SubmissionFailed {
        reason: GatewayError,
    },
    ListingDeleted {
        listing_id: ListingId,
    },
    DeleteFailed {
        listing_id: ListingId,
        reason: GatewayError,
    },
    LoadFailed {
        reason: GatewayError,
    },
}

impl Notification {
    pub fn level(&self) -> NotificationLevel {
        match self {
            Self::ListingCreated { .. }
            | Self::ListingUpdated { .. }
            | Self::ListingDeleted { .. } => NotificationLevel::Success,
            Self::SubmissionFailed { .. }
            | Self::DeleteFailed { .. }
            | Self::LoadFailed { .. } => NotificationLevel::Error,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::ListingCreated { .. } => CREATED_MESSAGE,
            Self::ListingUpdated { .. } => UPDATED_MESSAGE,
            Self::ListingDeleted { .. } => DELETED_MESSAGE,
            Self::SubmissionFailed { .. }
            | Self::DeleteFailed { .. }
            | Self::LoadFailed { .. } => GENERIC_FAILURE_MESSAGE,
        }
    }
}

/// Fan-out of notifications to any number of listeners.
#[derive(Clone)]
pub struct NotificationCenter {
    tx: Arc<broadcast::Sender<Notification>>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx: Arc::new(tx) }
    }

    pub fn notify(&self, notification: Notification) {
        // No listeners is fine; toasts are best-effort.
        let _ = self.tx.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}
