//! Built-in demo cards so a fresh dev server has something to practice
//! even without a config file.

use chrono::{DateTime, Utc};

use crate::domain::Card;

/// Minimal Spanish-English deck spanning two categories plus a few
/// uncategorized entries. Ids are minted fresh on every startup.
pub fn demo_cards(owner: &str, now: DateTime<Utc>) -> Vec<Card> {
    let entries: [(&str, &str, Option<&str>); 12] = [
        ("la casa", "the house", Some("basics")),
        ("el libro", "the book", Some("basics")),
        ("la ciudad", "the city", Some("basics")),
        ("el perro", "the dog", Some("basics")),
        ("la manzana", "the apple", Some("food")),
        ("el pan", "the bread", Some("food")),
        ("la leche", "the milk", Some("food")),
        ("el queso", "the cheese", Some("food")),
        ("hola", "hello", None),
        ("gracias", "thank you", None),
        ("por favor", "please", None),
        ("buenos días", "good morning", None),
    ];

    entries
        .into_iter()
        .map(|(text, translation, category)| {
            Card::new(
                owner.to_string(),
                category.map(str::to_string),
                text.to_string(),
                translation.to_string(),
                now,
            )
        })
        .collect()
}
