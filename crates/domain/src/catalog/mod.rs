//! Catalog of food items and field validation.

mod seed;
mod service;
mod validation;
mod value_objects;

pub use seed::sample_catalog;
pub use service::Catalog;
pub use validation::{
    ValidationError, normalize_allergens, normalize_name, validate_amount, validate_price,
};
pub use value_objects::{FoodItem, NewFood, ValidFood};
