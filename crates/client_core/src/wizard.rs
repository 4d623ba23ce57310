//! Listing-authoring wizard: stage state machine and its shared store.
//!
//! Every mutation goes through [`transition`], so a stage can never hold a
//! contradictory combination of flags. The store assigns each opened
//! detail form a fresh [`ContextId`]; submissions carry that id plus a
//! [`SubmissionToken`] so late responses for a closed or replaced form are
//! rejected instead of applied.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use shared::domain::{DraftField, Listing, ListingDraft, ListingId};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionToken(Uuid);

impl SubmissionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormStep {
    VehicleDetails,
    PriceAndFeatures,
    ContactInformation,
}

impl FormStep {
    pub const ALL: [FormStep; 3] = [
        FormStep::VehicleDetails,
        FormStep::PriceAndFeatures,
        FormStep::ContactInformation,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            Self::VehicleDetails => 0,
            Self::PriceAndFeatures => 1,
            Self::ContactInformation => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::VehicleDetails => "Car Details",
            Self::PriceAndFeatures => "Price & Features",
            Self::ContactInformation => "Contact Information",
        }
    }

    pub fn fields(self) -> &'static [DraftField] {
        match self {
            Self::VehicleDetails => &[DraftField::VehicleType, DraftField::KilometersDriven],
            Self::PriceAndFeatures => &[DraftField::Price, DraftField::Description],
            Self::ContactInformation => &[DraftField::City, DraftField::SellerPhone],
        }
    }

    pub fn is_final(self) -> bool {
        self.next().is_none()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }
}

impl fmt::Display for FormStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Live detail-form context: one per opened wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailForm {
    pub context_id: ContextId,
    pub step: FormStep,
    pub draft: ListingDraft,
    pub registration_number: Option<String>,
    pub listing_id: Option<ListingId>,
    pub in_flight: Option<SubmissionToken>,
}

impl DetailForm {
    pub fn is_editing(&self) -> bool {
        self.listing_id.is_some()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_editing() {
            "Update"
        } else {
            "Submit"
        }
    }

    /// Steps the user may jump back to from the indicator row.
    pub fn reachable_steps(&self) -> impl Iterator<Item = FormStep> + '_ {
        FormStep::ALL
            .into_iter()
            .filter(move |step| step.index() < self.step.index())
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WizardStage {
    #[default]
    Closed,
    DetailForm(DetailForm),
    ImageUpload {
        listing_id: ListingId,
    },
}

impl WizardStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::DetailForm(_) => "detail_form",
            Self::ImageUpload { .. } => "image_upload",
        }
    }

    pub fn detail_form(&self) -> Option<&DetailForm> {
        match self {
            Self::DetailForm(form) => Some(form),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum WizardEvent {
    OpenCreate {
        context_id: ContextId,
        registration_number: String,
    },
    OpenEdit {
        context_id: ContextId,
        listing: Listing,
    },
    Cancel,
    UpdateDraft(ListingDraft),
    Advance,
    Retreat {
        to: FormStep,
    },
    SubmissionDispatched {
        context_id: ContextId,
        token: SubmissionToken,
    },
    SubmissionRejected {
        context_id: ContextId,
        token: SubmissionToken,
    },
    SubmissionAccepted {
        context_id: ContextId,
        token: SubmissionToken,
        listing_id: ListingId,
    },
    SubmissionTargetGone {
        context_id: ContextId,
        token: SubmissionToken,
    },
    ImageUploadFinished,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardTransitionError {
    #[error("wizard is already open ({stage})")]
    AlreadyOpen { stage: &'static str },
    #[error("no detail form is open")]
    NotOpen,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("cannot move back from step {from} to step {to}")]
    InvalidStepTarget { from: usize, to: usize },
    #[error("submission is only available on the final step")]
    NotOnFinalStep,
    #[error("submission response does not match the current wizard context")]
    StaleSubmission,
    #[error("wizard is not in the image upload stage")]
    NotUploading,
}

/// Computes the stage that follows `event`. Rejected events leave the
/// current stage untouched.
pub fn transition(
    current: &WizardStage,
    event: WizardEvent,
) -> Result<WizardStage, WizardTransitionError> {
    use WizardEvent as E;

    match event {
        E::OpenCreate {
            context_id,
            registration_number,
        } => {
            ensure_closed(current)?;
            Ok(WizardStage::DetailForm(DetailForm {
                context_id,
                step: FormStep::VehicleDetails,
                draft: ListingDraft::default(),
                registration_number: Some(registration_number),
                listing_id: None,
                in_flight: None,
            }))
        }
        E::OpenEdit {
            context_id,
            listing,
        } => {
            ensure_closed(current)?;
            Ok(WizardStage::DetailForm(DetailForm {
                context_id,
                step: FormStep::VehicleDetails,
                draft: ListingDraft::from_listing(&listing),
                registration_number: listing.registration_number.clone(),
                listing_id: Some(listing.id),
                in_flight: None,
            }))
        }
        E::Cancel => Ok(WizardStage::Closed),
        E::UpdateDraft(draft) => {
            let mut form = editable_form(current)?;
            form.draft = draft;
            Ok(WizardStage::DetailForm(form))
        }
        E::Advance => {
            let mut form = editable_form(current)?;
            if let Some(next) = form.step.next() {
                form.step = next;
            }
            Ok(WizardStage::DetailForm(form))
        }
        E::Retreat { to } => {
            let mut form = editable_form(current)?;
            if to.index() >= form.step.index() {
                return Err(WizardTransitionError::InvalidStepTarget {
                    from: form.step.index(),
                    to: to.index(),
                });
            }
            form.step = to;
            Ok(WizardStage::DetailForm(form))
        }
        E::SubmissionDispatched { context_id, token } => {
            let mut form = editable_form(current)?;
            if form.context_id != context_id {
                return Err(WizardTransitionError::StaleSubmission);
            }
            if !form.step.is_final() {
                return Err(WizardTransitionError::NotOnFinalStep);
            }
            form.in_flight = Some(token);
            Ok(WizardStage::DetailForm(form))
        }
        E::SubmissionRejected { context_id, token } => {
            let mut form = awaiting_form(current, context_id, token)?;
            form.in_flight = None;
            Ok(WizardStage::DetailForm(form))
        }
        E::SubmissionAccepted {
            context_id,
            token,
            listing_id,
        } => {
            awaiting_form(current, context_id, token)?;
            Ok(WizardStage::ImageUpload { listing_id })
        }
        E::SubmissionTargetGone { context_id, token } => {
            awaiting_form(current, context_id, token)?;
            Ok(WizardStage::Closed)
        }
        E::ImageUploadFinished => match current {
            WizardStage::ImageUpload { .. } => Ok(WizardStage::Closed),
            _ => Err(WizardTransitionError::NotUploading),
        },
    }
}

fn ensure_closed(current: &WizardStage) -> Result<(), WizardTransitionError> {
    match current {
        WizardStage::Closed => Ok(()),
        other => Err(WizardTransitionError::AlreadyOpen {
            stage: other.name(),
        }),
    }
}

fn editable_form(current: &WizardStage) -> Result<DetailForm, WizardTransitionError> {
    let form = current
        .detail_form()
        .ok_or(WizardTransitionError::NotOpen)?;
    if form.is_submitting() {
        return Err(WizardTransitionError::SubmissionInFlight);
    }
    Ok(form.clone())
}

fn awaiting_form(
    current: &WizardStage,
    context_id: ContextId,
    token: SubmissionToken,
) -> Result<DetailForm, WizardTransitionError> {
    match current.detail_form() {
        Some(form) if form.context_id == context_id && form.in_flight == Some(token) => {
            Ok(form.clone())
        }
        _ => Err(WizardTransitionError::StaleSubmission),
    }
}

/// Shared handle to the single live wizard.
#[derive(Clone)]
pub struct WizardStore {
    tx: Arc<watch::Sender<WizardStage>>,
    next_context: Arc<AtomicU64>,
}

impl Default for WizardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(WizardStage::Closed);
        Self {
            tx: Arc::new(tx),
            next_context: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn stage(&self) -> WizardStage {
        self.tx.borrow().clone()
    }

    pub fn detail_form(&self) -> Option<DetailForm> {
        self.tx.borrow().detail_form().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<WizardStage> {
        self.tx.subscribe()
    }

    pub fn allocate_context(&self) -> ContextId {
        ContextId(self.next_context.fetch_add(1, Ordering::Relaxed))
    }

    /// Applies `event` atomically. Subscribers are only woken on success.
    pub fn apply(&self, event: WizardEvent) -> Result<WizardStage, WizardTransitionError> {
        let mut outcome = Err(WizardTransitionError::NotOpen);
        self.tx.send_if_modified(|stage| match transition(stage, event) {
            Ok(next) => {
                let changed = *stage != next;
                *stage = next.clone();
                outcome = Ok(next);
                changed
            }
            Err(err) => {
                outcome = Err(err);
                false
            }
        });
        outcome
    }

    pub fn open_create(
        &self,
        registration_number: impl Into<String>,
    ) -> Result<ContextId, WizardTransitionError> {
        let context_id = self.allocate_context();
        self.apply(WizardEvent::OpenCreate {
            context_id,
            registration_number: registration_number.into(),
        })?;
        Ok(context_id)
    }

    pub fn open_edit(&self, listing: Listing) -> Result<ContextId, WizardTransitionError> {
        let context_id = self.allocate_context();
        self.apply(WizardEvent::OpenEdit {
            context_id,
            listing,
        })?;
        Ok(context_id)
    }

    pub fn close(&self) {
        let _ = self.apply(WizardEvent::Cancel);
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
