//! In-memory gateway with scripted responses for unit tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use shared::domain::{Listing, ListingDraft, ListingId, Session, UserId, VehicleType};
use tokio::sync::{oneshot, Mutex};

use crate::{
    gateway::{GatewayError, ListingGateway},
    AppStores,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { draft: ListingDraft, reg_no: String },
    Update { id: ListingId, draft: ListingDraft },
    Delete(ListingId),
    ListMine,
    Fetch(ListingId),
}

pub enum Reply {
    Now(Result<Listing, GatewayError>),
    Later(oneshot::Receiver<Result<Listing, GatewayError>>),
}

#[derive(Default)]
pub struct ScriptedGateway {
    pub calls: Mutex<Vec<Call>>,
    submissions: Mutex<VecDeque<Reply>>,
    deletes: Mutex<VecDeque<Result<(), GatewayError>>>,
    listings: Mutex<VecDeque<Result<Vec<Listing>, GatewayError>>>,
    stored: Mutex<HashMap<ListingId, Listing>>,
}

impl ScriptedGateway {
    pub async fn reply(&self, result: Result<Listing, GatewayError>) {
        self.submissions.lock().await.push_back(Reply::Now(result));
    }

    pub async fn reply_later(&self) -> oneshot::Sender<Result<Listing, GatewayError>> {
        let (tx, rx) = oneshot::channel();
        self.submissions.lock().await.push_back(Reply::Later(rx));
        tx
    }

    pub async fn reply_delete(&self, result: Result<(), GatewayError>) {
        self.deletes.lock().await.push_back(result);
    }

    pub async fn reply_listings(&self, result: Result<Vec<Listing>, GatewayError>) {
        self.listings.lock().await.push_back(result);
    }

    pub async fn store(&self, listing: Listing) {
        self.stored.lock().await.insert(listing.id, listing);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn next_submission(&self) -> Result<Listing, GatewayError> {
        let reply = self.submissions.lock().await.pop_front();
        match reply {
            Some(Reply::Now(result)) => result,
            Some(Reply::Later(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(GatewayError::Network("reply dropped".to_string()))),
            None => Err(GatewayError::Network("no scripted reply".to_string())),
        }
    }
}

#[async_trait]
impl ListingGateway for ScriptedGateway {
    async fn create(
        &self,
        draft: &ListingDraft,
        registration_number: &str,
    ) -> Result<Listing, GatewayError> {
        self.calls.lock().await.push(Call::Create {
            draft: draft.clone(),
            reg_no: registration_number.to_string(),
        });
        self.next_submission().await
    }

    async fn update(&self, id: ListingId, draft: &ListingDraft) -> Result<Listing, GatewayError> {
        self.calls.lock().await.push(Call::Update {
            id,
            draft: draft.clone(),
        });
        self.next_submission().await
    }

    async fn delete(&self, id: ListingId) -> Result<(), GatewayError> {
        self.calls.lock().await.push(Call::Delete(id));
        self.deletes.lock().await.pop_front().unwrap_or(Ok(()))
    }

    async fn list_mine(&self) -> Result<Vec<Listing>, GatewayError> {
        self.calls.lock().await.push(Call::ListMine);
        self.listings
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch(&self, id: ListingId) -> Result<Listing, GatewayError> {
        self.calls.lock().await.push(Call::Fetch(id));
        self.stored
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(GatewayError::NotFound)
    }
}

pub fn listing(id: i64, draft: &ListingDraft) -> Listing {
    Listing {
        id: ListingId(id),
        vehicle_type: draft.vehicle_type,
        kilometers_driven: draft.kilometers_driven,
        price: draft.price,
        city: draft.city.clone(),
        seller_phone: draft.seller_phone.clone(),
        description: Some(draft.description.clone()),
        owner_id: Some(UserId(1)),
        registration_number: None,
        created_at: None,
    }
}

pub fn complete_draft() -> ListingDraft {
    ListingDraft {
        vehicle_type: VehicleType::Car,
        kilometers_driven: 15_000,
        price: 500_000,
        city: "Pune".to_string(),
        seller_phone: "9999999999".to_string(),
        description: String::new(),
    }
}

pub fn signed_in_stores() -> AppStores {
    let stores = AppStores::new();
    stores
        .session
        .set_session(Session::new("access-123", UserId(1)));
    stores
}
