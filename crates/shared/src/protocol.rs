use serde::{Deserialize, Serialize};

use crate::domain::ListingDraft;

/// Body of `POST /listings`: the draft fields plus the registration number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateListingRequest {
    #[serde(flatten)]
    pub draft: ListingDraft,
    pub reg_no: String,
}

impl CreateListingRequest {
    pub fn new(draft: ListingDraft, reg_no: impl Into<String>) -> Self {
        Self {
            draft,
            reg_no: reg_no.into(),
        }
    }
}

/// Body of `PUT /listings/{id}`.
pub type UpdateListingRequest = ListingDraft;
