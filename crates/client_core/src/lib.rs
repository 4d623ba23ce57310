//! Client-side orchestration for authoring marketplace listings.
//!
//! Stores are cheap cloneable handles; hand the same [`AppStores`] to every
//! component that needs to observe or mutate shared state.

pub mod gateway;
pub mod notifications;
pub mod orchestrator;
pub mod stores;
pub mod surfaces;
pub mod wizard;

pub use gateway::{GatewayError, HttpListingGateway, ListingGateway};
pub use notifications::{Notification, NotificationCenter, NotificationLevel};
pub use orchestrator::{
    OrchestratorConfig, StepNavigationPolicy, SubmissionOrchestrator, SubmissionOutcome,
    WorkflowError,
};
pub use stores::{LoginGateStore, SessionStore};
pub use surfaces::{HeaderControl, HeaderView, ListingCard, MyListingsController, MyListingsView};
pub use wizard::{
    ContextId, DetailForm, FormStep, SubmissionToken, WizardEvent, WizardStage, WizardStore,
    WizardTransitionError,
};

/// Shared state handles for one signed-in client.
#[derive(Clone, Default)]
pub struct AppStores {
    pub session: SessionStore,
    pub login_gate: LoginGateStore,
    pub wizard: WizardStore,
    pub notifications: NotificationCenter,
}

impl AppStores {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
