use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{AggregateId, EntityMetadata, ValidationError};
use crate::enums::listing_status::ListingStatus;

/// Earliest accepted manufacturing year
pub const MIN_YEAR: i32 = 1900;
/// Upper bound for odometer readings
pub const MAX_MILEAGE: i64 = 2_000_000;
/// Upper bound for asking prices
pub const MAX_PRICE: f64 = 500_000_000.0;

/// Latest accepted manufacturing year (next year's models are on sale already)
pub fn max_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year() + 1
}

// ============================================================================
// ID Type
// ============================================================================

/// Unique identifier of a car listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub Uuid);

impl ListingId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for ListingId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ListingId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// One vehicle-for-sale record in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarListing {
    pub id: ListingId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: Option<i64>,
    pub description: Option<String>,
    pub status: ListingStatus,

    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl CarListing {
    /// Build a new listing from a validated draft. The caller (storage)
    /// supplies the identity; both timestamps start equal.
    pub fn new_for_insert(id: ListingId, draft: NewListing) -> Self {
        Self {
            id,
            make: draft.make,
            model: draft.model,
            year: draft.year,
            price: draft.price,
            mileage: draft.mileage,
            description: draft.description,
            status: ListingStatus::Active,
            metadata: EntityMetadata::new(),
        }
    }

    /// ID as a string
    pub fn to_string_id(&self) -> String {
        self.id.as_string()
    }
}

// ============================================================================
// Input DTOs
// ============================================================================

/// Payload for creating a listing. Unknown fields are rejected at
/// deserialization so client mistakes do not pass silently.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewListing {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    #[serde(default)]
    pub mileage: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewListing {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_make(&self.make)?;
        validate_model(&self.model)?;
        validate_year(self.year)?;
        validate_price(self.price)?;
        if let Some(mileage) = self.mileage {
            validate_mileage(mileage)?;
        }
        Ok(())
    }
}

/// Partial update payload; absent fields stay untouched. `status` is not
/// patchable, it only changes through the mark-sold operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingPatch {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<f64>,
    pub mileage: Option<i64>,
    pub description: Option<String>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        self.make.is_none()
            && self.model.is_none()
            && self.year.is_none()
            && self.price.is_none()
            && self.mileage.is_none()
            && self.description.is_none()
    }

    /// Validate only the fields that are present
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(make) = &self.make {
            validate_make(make)?;
        }
        if let Some(model) = &self.model {
            validate_model(model)?;
        }
        if let Some(year) = self.year {
            validate_year(year)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(mileage) = self.mileage {
            validate_mileage(mileage)?;
        }
        Ok(())
    }
}

// ============================================================================
// Field constraints
// ============================================================================

fn validate_make(make: &str) -> Result<(), ValidationError> {
    if make.trim().is_empty() {
        return Err(ValidationError::new("make", "must not be empty"));
    }
    Ok(())
}

fn validate_model(model: &str) -> Result<(), ValidationError> {
    if model.trim().is_empty() {
        return Err(ValidationError::new("model", "must not be empty"));
    }
    Ok(())
}

fn validate_year(year: i32) -> Result<(), ValidationError> {
    let max = max_year();
    if year < MIN_YEAR || year > max {
        return Err(ValidationError::new(
            "year",
            format!("must be between {} and {}", MIN_YEAR, max),
        ));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() {
        return Err(ValidationError::new("price", "must be a finite number"));
    }
    if price < 0.0 {
        return Err(ValidationError::new("price", "must not be negative"));
    }
    if price > MAX_PRICE {
        return Err(ValidationError::new("price", "looks too large"));
    }
    Ok(())
}

fn validate_mileage(mileage: i64) -> Result<(), ValidationError> {
    if mileage < 0 {
        return Err(ValidationError::new("mileage", "must not be negative"));
    }
    if mileage > MAX_MILEAGE {
        return Err(ValidationError::new(
            "mileage",
            format!("must be at most {}", MAX_MILEAGE),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewListing {
        NewListing {
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2020,
            price: 15000.0,
            mileage: Some(42_000),
            description: None,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut d = draft();
        d.price = -1.0;
        let err = d.validate().unwrap_err();
        assert_eq!(err.field, "price");
    }

    #[test]
    fn negative_mileage_is_rejected() {
        let mut d = draft();
        d.mileage = Some(-5);
        let err = d.validate().unwrap_err();
        assert_eq!(err.field, "mileage");
    }

    #[test]
    fn blank_make_is_rejected() {
        let mut d = draft();
        d.make = "   ".into();
        assert_eq!(d.validate().unwrap_err().field, "make");
    }

    #[test]
    fn year_outside_range_is_rejected() {
        let mut d = draft();
        d.year = 1899;
        assert_eq!(d.validate().unwrap_err().field, "year");
        d.year = max_year() + 1;
        assert_eq!(d.validate().unwrap_err().field, "year");
    }

    #[test]
    fn unknown_field_fails_deserialization() {
        let body = r#"{"make":"Toyota","model":"Corolla","year":2020,"price":1000,"color":"red"}"#;
        assert!(serde_json::from_str::<NewListing>(body).is_err());
    }

    #[test]
    fn patch_validates_only_present_fields() {
        let patch = ListingPatch {
            price: Some(9000.0),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert!(!patch.is_empty());

        let bad = ListingPatch {
            year: Some(1500),
            ..Default::default()
        };
        assert_eq!(bad.validate().unwrap_err().field, "year");
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ListingPatch::default().is_empty());
    }

    #[test]
    fn new_for_insert_starts_active_with_equal_timestamps() {
        let listing = CarListing::new_for_insert(ListingId::new_v4(), draft());
        assert_eq!(listing.status, ListingStatus::Active);
        assert_eq!(listing.metadata.created_at, listing.metadata.updated_at);
    }
}
