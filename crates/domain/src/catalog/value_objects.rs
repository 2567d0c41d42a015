//! Value objects for the catalog.

use common::FoodId;
use serde::{Deserialize, Serialize};
use store::FoodRecord;

use super::validation::{
    ValidationError, normalize_allergens, normalize_name, validate_amount, validate_price,
};

/// A catalog entry joined with its quantity on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: FoodId,
    pub name: String,
    pub amount: u32,
    pub price: u32,
    pub allergens: Vec<String>,
}

impl FoodItem {
    /// Joins a catalog record with its stock quantity.
    pub fn from_record(record: FoodRecord, amount: u32) -> Self {
        Self {
            id: record.id,
            name: record.name,
            amount,
            price: record.price,
            allergens: record.allergens,
        }
    }

    /// Returns true if the item carries the given (uppercase) allergen tag.
    pub fn has_allergen(&self, tag: &str) -> bool {
        self.allergens.iter().any(|a| a == tag)
    }
}

/// Unvalidated food fields as supplied by a caller.
///
/// Numbers are kept signed so negative input can be reported instead of
/// failing at deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFood {
    pub name: String,
    pub amount: i64,
    pub price: i64,
    #[serde(default)]
    pub allergens: Vec<String>,
}

impl NewFood {
    pub fn new(
        name: impl Into<String>,
        amount: i64,
        price: i64,
        allergens: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            price,
            allergens: allergens.into_iter().map(Into::into).collect(),
        }
    }

    /// Validates and normalizes every field.
    pub fn validate(&self) -> Result<ValidFood, ValidationError> {
        Ok(ValidFood {
            name: normalize_name(&self.name)?,
            amount: validate_amount(self.amount)?,
            price: validate_price(self.price)?,
            allergens: normalize_allergens(&self.allergens)?,
        })
    }
}

/// Food fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFood {
    pub name: String,
    pub amount: u32,
    pub price: u32,
    pub allergens: Vec<String>,
}

impl ValidFood {
    /// Builds the catalog record for this food under the given id.
    pub fn into_record(self, id: FoodId) -> (FoodRecord, u32) {
        let record = FoodRecord {
            id,
            name: self.name,
            price: self.price,
            allergens: self.allergens,
        };
        (record, self.amount)
    }
}
