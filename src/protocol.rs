//! Public request/response DTOs for the HTTP endpoints (serde ready).
//! Wire names are camelCase; the domain types stay wire-agnostic.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Card, CardId, CardStatus, CategoryScope, ExerciseKind};
use crate::service::SelectionResult;

/// `category` query value selecting cards without a category.
pub const UNCATEGORIZED: &str = "none";

/// Parses the optional `category` parameter. Absent (or empty) means all
/// categories; the [`UNCATEGORIZED`] sentinel means cards without one.
pub fn parse_category_scope(raw: Option<&str>) -> Option<CategoryScope> {
    match raw {
        None => None,
        Some(s) if s.is_empty() => None,
        Some(UNCATEGORIZED) => Some(CategoryScope::Uncategorized),
        Some(id) => Some(CategoryScope::Category(id.to_string())),
    }
}

/// Parses the comma-separated `excludeIds` parameter. Blank segments are
/// dropped.
pub fn parse_exclude_ids(raw: Option<&str>) -> HashSet<CardId> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleQuery {
    pub owner_id: String,
    /// Exercise kind tag; parsed past serde so junk reports as an invalid
    /// argument instead of a generic deserialization failure.
    pub exercise: String,
    pub limit: Option<usize>,
    pub category: Option<String>,
    /// Comma-separated card ids already shown in this session.
    pub exclude_ids: Option<String>,
}

/// One id or a batch; a whole exercise round is often submitted at once.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeIn {
    pub owner_id: String,
    #[serde(rename = "cardIds", alias = "cardId")]
    pub card_ids: OneOrMany<CardId>,
    pub exercise: String,
    pub correct: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetIn {
    pub owner_id: String,
    pub card_id: CardId,
}

/// Card as delivered to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardOut {
    pub id: CardId,
    pub owner_id: String,
    pub category_id: Option<String>,
    pub text: String,
    pub translation: String,
    pub status: CardStatus,
    pub completed_exercises: Vec<ExerciseKind>,
    pub reading_used: bool,
    pub progress_percent: u8,
    pub last_reviewed_at: DateTime<Utc>,
    pub added_to_learning_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Convert the internal card to the public DTO.
pub fn to_out(c: &Card) -> CardOut {
    CardOut {
        id: c.id.clone(),
        owner_id: c.owner_id.clone(),
        category_id: c.category_id.clone(),
        text: c.text.clone(),
        translation: c.translation.clone(),
        status: c.status,
        completed_exercises: c.core_progress.kinds().collect(),
        reading_used: c.reading_used,
        progress_percent: c.progress_percent(),
        last_reviewed_at: c.last_reviewed_at,
        added_to_learning_at: c.added_to_learning_at,
        reviewed_at: c.reviewed_at,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionOut {
    pub cards: Vec<CardOut>,
    pub rotation_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_snapshot: Option<Vec<CardOut>>,
}

pub fn selection_to_out(r: &SelectionResult) -> SelectionOut {
    SelectionOut {
        cards: r.cards.iter().map(to_out).collect(),
        rotation_applied: r.rotation_applied,
        scope_snapshot: r
            .scope_snapshot
            .as_ref()
            .map(|cards| cards.iter().map(to_out).collect()),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeOut {
    pub cards: Vec<CardOut>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
