//! Multi-step listing form controller.
//!
//! Sequences the three form steps, branches create vs. update on submit,
//! and hands a successful submission over to the image-upload stage. All
//! gateway failures stop here: they are logged, turned into a notification,
//! and returned to the caller without touching the draft.

use std::sync::Arc;

use shared::domain::{DraftField, Listing, ListingDraft, ListingId};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    gateway::{GatewayError, ListingGateway},
    notifications::{Notification, NotificationCenter},
    stores::{require_session, LoginGateStore, SessionStore},
    wizard::{
        ContextId, DetailForm, FormStep, SubmissionToken, WizardEvent, WizardStage, WizardStore,
        WizardTransitionError,
    },
    AppStores,
};

/// Whether "Next" requires the current step's required fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepNavigationPolicy {
    #[default]
    RequireStepComplete,
    Permissive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub navigation: StepNavigationPolicy,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("sign in required")]
    Unauthorized,
    #[error("missing required fields: {}", join_labels(.0))]
    IncompleteDraft(Vec<DraftField>),
    #[error(transparent)]
    Wizard(#[from] WizardTransitionError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

fn join_labels(fields: &[DraftField]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Created(ListingId),
    Updated(ListingId),
    /// The wizard moved on before the response arrived; nothing was applied.
    Discarded,
}

impl SubmissionOutcome {
    pub fn listing_id(self) -> Option<ListingId> {
        match self {
            Self::Created(id) | Self::Updated(id) => Some(id),
            Self::Discarded => None,
        }
    }
}

pub struct SubmissionOrchestrator {
    gateway: Arc<dyn ListingGateway>,
    session: SessionStore,
    login_gate: LoginGateStore,
    wizard: WizardStore,
    notifications: NotificationCenter,
    config: OrchestratorConfig,
}

impl SubmissionOrchestrator {
    pub fn new(
        gateway: Arc<dyn ListingGateway>,
        stores: &AppStores,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            session: stores.session.clone(),
            login_gate: stores.login_gate.clone(),
            wizard: stores.wizard.clone(),
            notifications: stores.notifications.clone(),
            config,
        }
    }

    pub fn wizard(&self) -> &WizardStore {
        &self.wizard
    }

    fn require_session(&self) -> Result<(), WorkflowError> {
        match require_session(&self.session, &self.login_gate) {
            Some(_) => Ok(()),
            None => {
                info!("login required before authoring a listing");
                Err(WorkflowError::Unauthorized)
            }
        }
    }

    fn current_form(&self) -> Result<DetailForm, WorkflowError> {
        self.wizard
            .detail_form()
            .ok_or(WorkflowError::Wizard(WizardTransitionError::NotOpen))
    }

    /// Opens a blank draft for `registration_number`.
    pub fn start_new_listing(
        &self,
        registration_number: impl Into<String>,
    ) -> Result<ContextId, WorkflowError> {
        self.require_session()?;
        let context_id = self.wizard.open_create(registration_number)?;
        info!(context_id = context_id.0, "opened new listing form");
        Ok(context_id)
    }

    /// Fetches listing `listing_id` and opens it for editing.
    pub async fn start_edit(&self, listing_id: ListingId) -> Result<ContextId, WorkflowError> {
        self.require_session()?;
        let listing = match self.gateway.fetch(listing_id).await {
            Ok(listing) => listing,
            Err(err) => {
                warn!(listing_id = listing_id.0, error = %err, "failed to load listing for edit");
                self.notifications
                    .notify(Notification::LoadFailed { reason: err.clone() });
                return Err(err.into());
            }
        };
        self.open_edit(listing)
    }

    /// Opens an already fetched listing for editing.
    pub fn open_edit(&self, listing: Listing) -> Result<ContextId, WorkflowError> {
        self.require_session()?;
        let listing_id = listing.id;
        let context_id = self.wizard.open_edit(listing)?;
        info!(
            context_id = context_id.0,
            listing_id = listing_id.0,
            "opened listing for edit"
        );
        Ok(context_id)
    }

    pub fn update_draft(&self, edit: impl FnOnce(&mut ListingDraft)) -> Result<(), WorkflowError> {
        let mut draft = self.current_form()?.draft;
        edit(&mut draft);
        self.wizard.apply(WizardEvent::UpdateDraft(draft))?;
        Ok(())
    }

    /// Moves to the next step. A no-op on the final step.
    pub fn next(&self) -> Result<FormStep, WorkflowError> {
        let form = self.current_form()?;
        if self.config.navigation == StepNavigationPolicy::RequireStepComplete
            && !form.step.is_final()
        {
            let missing = form.draft.missing_among(form.step.fields());
            if !missing.is_empty() {
                return Err(WorkflowError::IncompleteDraft(missing));
            }
        }
        let stage = self.wizard.apply(WizardEvent::Advance)?;
        Ok(stage.detail_form().map_or(form.step, |form| form.step))
    }

    pub fn back_to(&self, step: FormStep) -> Result<FormStep, WorkflowError> {
        self.wizard.apply(WizardEvent::Retreat { to: step })?;
        Ok(step)
    }

    /// Closes the wizard and drops the draft. An in-flight request keeps
    /// running; its response will be discarded.
    pub fn cancel(&self) {
        if let Some(form) = self.wizard.detail_form() {
            if form.is_submitting() {
                info!(
                    context_id = form.context_id.0,
                    "wizard closed while a submission is in flight"
                );
            }
        }
        self.wizard.close();
    }

    pub fn finish_image_upload(&self) -> Result<(), WorkflowError> {
        self.wizard.apply(WizardEvent::ImageUploadFinished)?;
        Ok(())
    }

    pub async fn submit(&self) -> Result<SubmissionOutcome, WorkflowError> {
        if let Err(err) = self.require_session() {
            warn!("submission attempted without a session");
            return Err(err);
        }

        let form = self.current_form()?;
        if !form.step.is_final() {
            return Err(WizardTransitionError::NotOnFinalStep.into());
        }
        let missing = form.draft.missing_required_fields();
        if !missing.is_empty() {
            return Err(WorkflowError::IncompleteDraft(missing));
        }

        let token = SubmissionToken::new();
        let dispatched = self.wizard.apply(WizardEvent::SubmissionDispatched {
            context_id: form.context_id,
            token,
        })?;
        let snapshot = match dispatched {
            WizardStage::DetailForm(form) => form,
            _ => return Err(WizardTransitionError::NotOpen.into()),
        };

        let result = match snapshot.listing_id {
            Some(listing_id) => self
                .gateway
                .update(listing_id, &snapshot.draft)
                .await
                .map(|_| SubmissionOutcome::Updated(listing_id)),
            None => {
                let registration_number =
                    snapshot.registration_number.as_deref().unwrap_or_default();
                self.gateway
                    .create(&snapshot.draft, registration_number)
                    .await
                    .map(|listing| SubmissionOutcome::Created(listing.id))
            }
        };

        self.settle(&snapshot, token, result)
    }

    fn settle(
        &self,
        snapshot: &DetailForm,
        token: SubmissionToken,
        result: Result<SubmissionOutcome, GatewayError>,
    ) -> Result<SubmissionOutcome, WorkflowError> {
        let context_id = snapshot.context_id;
        match result {
            Ok(outcome) => {
                let Some(listing_id) = outcome.listing_id() else {
                    return Ok(outcome);
                };
                match self.wizard.apply(WizardEvent::SubmissionAccepted {
                    context_id,
                    token,
                    listing_id,
                }) {
                    Ok(_) => {}
                    Err(WizardTransitionError::StaleSubmission) => {
                        info!(
                            context_id = context_id.0,
                            listing_id = listing_id.0,
                            "discarding stale submission response"
                        );
                        return Ok(SubmissionOutcome::Discarded);
                    }
                    Err(err) => return Err(err.into()),
                }

                info!(
                    context_id = context_id.0,
                    listing_id = listing_id.0,
                    "listing submitted; moving to image upload"
                );
                self.notifications.notify(match outcome {
                    SubmissionOutcome::Updated(_) => Notification::ListingUpdated { listing_id },
                    _ => Notification::ListingCreated { listing_id },
                });
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    context_id = context_id.0,
                    listing_id = snapshot.listing_id.map(|id| id.0),
                    error = %err,
                    "listing submission failed"
                );
                let event = if err == GatewayError::NotFound && snapshot.is_editing() {
                    WizardEvent::SubmissionTargetGone { context_id, token }
                } else {
                    WizardEvent::SubmissionRejected { context_id, token }
                };
                match self.wizard.apply(event) {
                    Ok(_) => {}
                    Err(WizardTransitionError::StaleSubmission) => {
                        info!(
                            context_id = context_id.0,
                            "discarding stale submission failure"
                        );
                        return Ok(SubmissionOutcome::Discarded);
                    }
                    Err(other) => return Err(other.into()),
                }

                if err == GatewayError::Unauthorized {
                    self.login_gate.show(true);
                }
                self.notifications.notify(Notification::SubmissionFailed {
                    reason: err.clone(),
                });
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
