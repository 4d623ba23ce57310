mod config;
mod flows;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AppStores, HttpListingGateway, MyListingsController, OrchestratorConfig, StepNavigationPolicy,
    SubmissionOrchestrator,
};
use shared::domain::{ListingId, Session, UserId, VehicleType};
use tracing_subscriber::EnvFilter;

use crate::flows::{DraftOverrides, NewListing};

#[derive(Parser, Debug)]
#[command(name = "seller", about = "Author and manage vehicle listings")]
struct Args {
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    token: Option<String>,
    #[arg(long, global = true)]
    user_id: Option<i64>,
    /// Allow "Next" even when the current step has empty required fields.
    #[arg(long, global = true)]
    permissive_steps: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the listings owned by the signed-in user.
    MyListings,
    /// Delete one of your listings.
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Create a listing through the three form steps.
    Create {
        #[arg(long)]
        reg_no: String,
        #[arg(long, default_value = "car")]
        vehicle_type: VehicleType,
        #[arg(long)]
        kilometers: u64,
        #[arg(long)]
        price: u64,
        #[arg(long)]
        city: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Edit an existing listing.
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        vehicle_type: Option<VehicleType>,
        #[arg(long)]
        kilometers: Option<u64>,
        #[arg(long)]
        price: Option<u64>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings().context("failed to load settings")?;
    if let Some(url) = args.server_url.as_deref() {
        settings.backend_api_url = config::normalize_backend_url(url)?;
    }
    if args.token.is_some() {
        settings.access_token = args.token.clone();
    }
    if args.user_id.is_some() {
        settings.user_id = args.user_id;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let stores = AppStores::new();
    if let (Some(token), Some(user_id)) = (settings.access_token.clone(), settings.user_id) {
        stores.session.set_session(Session::new(token, UserId(user_id)));
    }

    let navigation = if args.permissive_steps {
        StepNavigationPolicy::Permissive
    } else {
        settings.navigation_policy()
    };
    let gateway = Arc::new(HttpListingGateway::new(
        settings.backend_api_url.clone(),
        stores.session.clone(),
    ));
    let orchestrator = Arc::new(SubmissionOrchestrator::new(
        gateway.clone(),
        &stores,
        OrchestratorConfig { navigation },
    ));
    let my_listings = MyListingsController::new(gateway, orchestrator.clone(), &stores);
    let toasts = flows::spawn_notification_printer(&stores);

    let result = match args.command {
        Command::MyListings => flows::print_my_listings(&my_listings).await,
        Command::Delete { id } => flows::delete_listing(&my_listings, ListingId(id)).await,
        Command::Create {
            reg_no,
            vehicle_type,
            kilometers,
            price,
            city,
            phone,
            description,
        } => {
            let listing = NewListing {
                reg_no,
                vehicle_type,
                kilometers,
                price,
                city,
                phone,
                description: description.unwrap_or_default(),
            };
            flows::create_listing(&orchestrator, listing).await
        }
        Command::Edit {
            id,
            vehicle_type,
            kilometers,
            price,
            city,
            phone,
            description,
        } => {
            let overrides = DraftOverrides {
                vehicle_type,
                kilometers,
                price,
                city,
                phone,
                description,
            };
            flows::edit_listing(&orchestrator, ListingId(id), overrides).await
        }
    };

    drop(my_listings);
    drop(orchestrator);
    drop(stores);
    let _ = toasts.await;
    result
}
