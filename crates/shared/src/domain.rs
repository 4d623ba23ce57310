use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UnknownVehicleType;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ListingId);

pub const DEFAULT_CITY: &str = "New Delhi";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    #[default]
    Car,
    Bike,
}

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Bike => "bike",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = UnknownVehicleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(Self::Car),
            "bike" => Ok(Self::Bike),
            other => Err(UnknownVehicleType(other.to_string())),
        }
    }
}

/// Editable fields of a listing draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    VehicleType,
    KilometersDriven,
    Price,
    Description,
    City,
    SellerPhone,
}

impl DraftField {
    pub fn label(self) -> &'static str {
        match self {
            Self::VehicleType => "Vehicle Type",
            Self::KilometersDriven => "Kilometers Driven",
            Self::Price => "Price",
            Self::Description => "Description",
            Self::City => "City",
            Self::SellerPhone => "Phone",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(
            self,
            Self::KilometersDriven | Self::Price | Self::City | Self::SellerPhone
        )
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// In-progress listing values. Serializes to the update body as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub vehicle_type: VehicleType,
    pub kilometers_driven: u64,
    pub price: u64,
    pub city: String,
    pub seller_phone: String,
    #[serde(default)]
    pub description: String,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            vehicle_type: VehicleType::Car,
            kilometers_driven: 0,
            price: 0,
            city: DEFAULT_CITY.to_string(),
            seller_phone: String::new(),
            description: String::new(),
        }
    }
}

impl ListingDraft {
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            vehicle_type: listing.vehicle_type,
            kilometers_driven: listing.kilometers_driven,
            price: listing.price,
            city: listing.city.clone(),
            seller_phone: listing.seller_phone.clone(),
            description: listing.description.clone().unwrap_or_default(),
        }
    }

    pub fn is_filled(&self, field: DraftField) -> bool {
        match field {
            DraftField::VehicleType => true,
            DraftField::KilometersDriven => self.kilometers_driven > 0,
            DraftField::Price => self.price > 0,
            DraftField::Description => !self.description.trim().is_empty(),
            DraftField::City => !self.city.trim().is_empty(),
            DraftField::SellerPhone => !self.seller_phone.trim().is_empty(),
        }
    }

    /// Required fields among `fields` that are still empty or zero.
    pub fn missing_among(&self, fields: &[DraftField]) -> Vec<DraftField> {
        fields
            .iter()
            .copied()
            .filter(|field| field.is_required() && !self.is_filled(*field))
            .collect()
    }

    pub fn missing_required_fields(&self) -> Vec<DraftField> {
        self.missing_among(&[
            DraftField::VehicleType,
            DraftField::KilometersDriven,
            DraftField::Price,
            DraftField::Description,
            DraftField::City,
            DraftField::SellerPhone,
        ])
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required_fields().is_empty()
    }
}

/// Server-owned listing as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub vehicle_type: VehicleType,
    pub kilometers_driven: u64,
    pub price: u64,
    pub city: String,
    pub seller_phone: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "user_id")]
    pub owner_id: Option<UserId>,
    #[serde(default, rename = "reg_no")]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Opaque bearer credential. Never printed in full.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: BearerToken,
    pub user: SessionUser,
}

impl Session {
    pub fn new(access_token: impl Into<String>, user_id: UserId) -> Self {
        Self {
            access_token: BearerToken::new(access_token),
            user: SessionUser { id: user_id },
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
