//! Command flows driving the listing workflow from the terminal.

use anyhow::{bail, Result};
use client_core::{
    AppStores, FormStep, MyListingsController, MyListingsView, NotificationLevel,
    SubmissionOrchestrator, SubmissionOutcome, WizardStage,
};
use shared::domain::{ListingDraft, ListingId, VehicleType};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{info, warn};

pub struct NewListing {
    pub reg_no: String,
    pub vehicle_type: VehicleType,
    pub kilometers: u64,
    pub price: u64,
    pub city: String,
    pub phone: String,
    pub description: String,
}

#[derive(Default)]
pub struct DraftOverrides {
    pub vehicle_type: Option<VehicleType>,
    pub kilometers: Option<u64>,
    pub price: Option<u64>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

impl DraftOverrides {
    /// Applies the overrides that belong to `step`.
    fn apply(&self, step: FormStep, draft: &mut ListingDraft) {
        match step {
            FormStep::VehicleDetails => {
                if let Some(v) = self.vehicle_type {
                    draft.vehicle_type = v;
                }
                if let Some(v) = self.kilometers {
                    draft.kilometers_driven = v;
                }
            }
            FormStep::PriceAndFeatures => {
                if let Some(v) = self.price {
                    draft.price = v;
                }
                if let Some(v) = &self.description {
                    draft.description = v.clone();
                }
            }
            FormStep::ContactInformation => {
                if let Some(v) = &self.city {
                    draft.city = v.clone();
                }
                if let Some(v) = &self.phone {
                    draft.seller_phone = v.clone();
                }
            }
        }
    }
}

impl From<&NewListing> for DraftOverrides {
    fn from(listing: &NewListing) -> Self {
        Self {
            vehicle_type: Some(listing.vehicle_type),
            kilometers: Some(listing.kilometers),
            price: Some(listing.price),
            city: Some(listing.city.clone()),
            phone: Some(listing.phone.clone()),
            description: Some(listing.description.clone()),
        }
    }
}

/// Prints toasts until every notification sender is gone.
pub fn spawn_notification_printer(stores: &AppStores) -> JoinHandle<()> {
    let mut rx = stores.notifications.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => match notification.level() {
                    NotificationLevel::Success => println!("[ok] {}", notification.message()),
                    NotificationLevel::Error => eprintln!("[error] {}", notification.message()),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn print_view(view: &MyListingsView) {
    match view {
        MyListingsView::LoginRequired => println!("{}", client_core::surfaces::LOGIN_PROMPT),
        MyListingsView::Empty => {
            println!("{}", client_core::surfaces::EMPTY_LISTINGS_MESSAGE);
            println!(
                "{}: seller create --reg-no <REG_NO> ...",
                client_core::surfaces::CREATE_LISTING_LABEL
            );
        }
        MyListingsView::Listings(cards) => {
            for card in cards {
                let listing = &card.listing;
                println!(
                    "#{} {} {} km, {} in {} (phone {})",
                    listing.id,
                    listing.vehicle_type,
                    listing.kilometers_driven,
                    listing.price,
                    listing.city,
                    listing.seller_phone
                );
            }
        }
    }
}

pub async fn print_my_listings(controller: &MyListingsController) -> Result<()> {
    let view = controller.view().await?;
    print_view(&view);
    Ok(())
}

pub async fn delete_listing(controller: &MyListingsController, id: ListingId) -> Result<()> {
    let view = controller.delete(id).await?;
    print_view(&view);
    Ok(())
}

/// Walks every step, applying the fields that belong to it, then submits.
async fn complete_and_submit(
    orchestrator: &SubmissionOrchestrator,
    overrides: &DraftOverrides,
) -> Result<SubmissionOutcome> {
    for step in FormStep::ALL {
        orchestrator.update_draft(|draft| overrides.apply(step, draft))?;
        info!(step = step.title(), "step completed");
        if !step.is_final() {
            orchestrator.next()?;
        }
    }

    let outcome = orchestrator.submit().await?;
    match orchestrator.wizard().stage() {
        WizardStage::ImageUpload { listing_id } => {
            println!("Listing {listing_id} is ready for image upload.");
            // Image upload happens outside this tool.
            orchestrator.finish_image_upload()?;
        }
        other => bail!("unexpected wizard stage after submit: {}", other.name()),
    }
    Ok(outcome)
}

pub async fn create_listing(
    orchestrator: &SubmissionOrchestrator,
    listing: NewListing,
) -> Result<()> {
    orchestrator.start_new_listing(listing.reg_no.clone())?;
    let overrides = DraftOverrides::from(&listing);
    let result = complete_and_submit(orchestrator, &overrides).await;
    if result.is_err() {
        orchestrator.cancel();
    }
    result.map(|_| ())
}

pub async fn edit_listing(
    orchestrator: &SubmissionOrchestrator,
    id: ListingId,
    overrides: DraftOverrides,
) -> Result<()> {
    orchestrator.start_edit(id).await?;
    let result = complete_and_submit(orchestrator, &overrides).await;
    if result.is_err() {
        orchestrator.cancel();
    }
    result.map(|_| ())
}
