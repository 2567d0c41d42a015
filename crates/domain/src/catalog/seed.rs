//! Built-in sample catalog used to populate an empty deployment.

use super::NewFood;

/// (name, amount, price, allergens)
const SAMPLE_FOODS: &[(&str, i64, i64, &[&str])] = &[
    // Breakfast and drinks
    ("COFFEE", 50, 3, &["CAFFEINE"]),
    ("TEA", 40, 2, &["CAFFEINE"]),
    ("BAGEL", 30, 4, &["GLUTEN", "WHEAT", "SESAME"]),
    ("BANANA", 60, 1, &[]),
    ("APPLE", 50, 2, &[]),
    ("ORANGE JUICE", 25, 5, &[]),
    ("YOGURT", 35, 4, &["MILK", "DAIRY", "LACTOSE"]),
    ("GRANOLA BAR", 45, 3, &["TREE-NUTS", "PEANUTS", "GLUTEN", "WHEAT", "SOY"]),
    // Lunch
    (
        "TURKEY SANDWICH",
        20,
        12,
        &["GLUTEN", "WHEAT", "MEAT", "POULTRY", "DAIRY", "EGGS", "MUSTARD"],
    ),
    ("GARDEN SALAD", 15, 10, &[]),
    (
        "CAESAR SALAD",
        15,
        11,
        &["MILK", "DAIRY", "EGGS", "FISH", "GLUTEN", "WHEAT"],
    ),
    ("PASTA", 18, 14, &["GLUTEN", "WHEAT", "EGGS"]),
    (
        "PIZZA SLICE",
        25,
        8,
        &["GLUTEN", "WHEAT", "MILK", "DAIRY", "LACTOSE"],
    ),
    (
        "BURRITO",
        22,
        11,
        &["GLUTEN", "WHEAT", "MILK", "DAIRY", "LACTOSE", "MEAT", "BEEF", "SOY"],
    ),
    ("VEGETABLE SOUP", 20, 9, &["SOY"]),
    (
        "CHICKEN NOODLE SOUP",
        18,
        10,
        &["GLUTEN", "WHEAT", "MEAT", "POULTRY", "EGGS"],
    ),
    ("SUSHI ROLL", 15, 13, &["FISH", "SOY", "SESAME", "EGGS"]),
    (
        "CHICKEN WRAP",
        18,
        10,
        &["GLUTEN", "WHEAT", "MEAT", "POULTRY", "MILK", "DAIRY"],
    ),
    // Dinner
    ("STEAK", 10, 28, &["MEAT", "BEEF"]),
    ("SALMON", 12, 24, &["FISH"]),
    ("LOBSTER", 8, 35, &["SHELLFISH"]),
    (
        "SUSHI PLATTER",
        10,
        32,
        &["FISH", "SHELLFISH", "SOY", "SESAME", "EGGS"],
    ),
    ("RIBEYE", 8, 30, &["MEAT", "BEEF"]),
    // Plant based
    ("VEGGIE BURGER", 20, 11, &["GLUTEN", "WHEAT", "SOY", "SESAME"]),
    ("TOFU BOWL", 18, 12, &["SOY", "SESAME"]),
    ("QUINOA SALAD", 15, 13, &[]),
    ("HUMMUS WRAP", 20, 9, &["GLUTEN", "WHEAT", "SESAME"]),
    // Desserts
    (
        "CHOCOLATE CAKE",
        12,
        7,
        &["GLUTEN", "WHEAT", "MILK", "DAIRY", "LACTOSE", "EGGS", "SOY"],
    ),
    ("ICE CREAM", 25, 6, &["MILK", "DAIRY", "LACTOSE", "EGGS"]),
    (
        "COOKIES",
        30,
        5,
        &["GLUTEN", "WHEAT", "MILK", "DAIRY", "EGGS", "SOY", "TREE-NUTS", "PEANUTS"],
    ),
    ("FRUIT SALAD", 20, 8, &[]),
];

/// Returns the sample catalog as unvalidated input.
pub fn sample_catalog() -> Vec<NewFood> {
    SAMPLE_FOODS
        .iter()
        .map(|(name, amount, price, allergens)| {
            NewFood::new(*name, *amount, *price, allergens.iter().copied())
        })
        .collect()
}
