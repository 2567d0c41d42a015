//! Field validation and normalization for catalog input.

use thiserror::Error;

/// Errors raised by field validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Food name is empty after trimming.
    #[error("name must not be blank")]
    BlankName,

    /// Stock amount below zero.
    #[error("amount must be a non-negative integer")]
    NegativeAmount,

    /// Price below zero.
    #[error("price must be a non-negative integer")]
    NegativePrice,

    /// An allergen tag is empty after trimming.
    #[error("allergens must not contain blank entries")]
    BlankAllergen,

    /// A numeric field does not fit the stored range.
    #[error("{field} is too large: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    /// An order was submitted without any line items.
    #[error("an order must contain at least one item")]
    EmptyOrder,
}

/// Normalizes a food name: trims, collapses inner whitespace, uppercases.
pub fn normalize_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(ValidationError::BlankName);
    }
    Ok(name.to_uppercase())
}

/// Normalizes allergen tags into a sorted, deduplicated uppercase list.
pub fn normalize_allergens<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>, ValidationError> {
    let mut allergens = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.as_ref().trim();
        if tag.is_empty() {
            return Err(ValidationError::BlankAllergen);
        }
        allergens.push(tag.to_uppercase());
    }
    allergens.sort();
    allergens.dedup();
    Ok(allergens)
}

/// Checks a stock amount and narrows it to the stored width.
pub fn validate_amount(amount: i64) -> Result<u32, ValidationError> {
    if amount < 0 {
        return Err(ValidationError::NegativeAmount);
    }
    u32::try_from(amount).map_err(|_| ValidationError::OutOfRange {
        field: "amount",
        value: amount,
    })
}

/// Checks a unit price and narrows it to the stored width.
pub fn validate_price(price: i64) -> Result<u32, ValidationError> {
    if price < 0 {
        return Err(ValidationError::NegativePrice);
    }
    u32::try_from(price).map_err(|_| ValidationError::OutOfRange {
        field: "price",
        value: price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_collapsed_and_uppercased() {
        assert_eq!(normalize_name("  orange   juice ").unwrap(), "ORANGE JUICE");
        assert_eq!(normalize_name("Coffee").unwrap(), "COFFEE");
    }

    #[test]
    fn blank_name_rejected() {
        assert_eq!(normalize_name(""), Err(ValidationError::BlankName));
        assert_eq!(normalize_name(" \t "), Err(ValidationError::BlankName));
    }

    #[test]
    fn allergens_normalized_as_set() {
        let tags = normalize_allergens(&["milk", " Dairy", "MILK"]).unwrap();
        assert_eq!(tags, vec!["DAIRY", "MILK"]);
    }

    #[test]
    fn blank_allergen_rejected() {
        assert_eq!(
            normalize_allergens(&["nuts", "  "]),
            Err(ValidationError::BlankAllergen)
        );
    }

    #[test]
    fn amount_bounds() {
        assert_eq!(validate_amount(0), Ok(0));
        assert_eq!(validate_amount(-1), Err(ValidationError::NegativeAmount));
        assert!(matches!(
            validate_amount(i64::MAX),
            Err(ValidationError::OutOfRange { field: "amount", .. })
        ));
        assert_eq!(
            ValidationError::NegativeAmount.to_string(),
            "amount must be a non-negative integer"
        );
    }

    #[test]
    fn price_bounds() {
        assert_eq!(validate_price(12), Ok(12));
        assert_eq!(validate_price(-5), Err(ValidationError::NegativePrice));
    }
}
