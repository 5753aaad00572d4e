//! In-memory card store: a `HashMap` behind an async `RwLock`.
//!
//! The default backend for the dev server and the test suites. Reads clone
//! cards out of the map so callers never hold the lock across awaits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Card, CardId};
use crate::error::StoreError;
use crate::store::{CardFilter, CardPatch, CardStore};

#[derive(Clone, Default)]
pub struct MemoryStore {
    cards: Arc<RwLock<HashMap<CardId, Card>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Card>, StoreError> {
        Ok(self.cards.read().await.get(id).cloned())
    }

    async fn find_many(&self, filter: &CardFilter) -> Result<Vec<Card>, StoreError> {
        let cards = self.cards.read().await;
        Ok(cards.values().filter(|c| filter.matches(c)).cloned().collect())
    }

    async fn update_one(&self, id: &str, patch: CardPatch) -> Result<Card, StoreError> {
        let mut cards = self.cards.write().await;
        match cards.get_mut(id) {
            Some(card) => {
                patch.apply(card);
                Ok(card.clone())
            }
            None => Err(StoreError::MissingCard(id.to_string())),
        }
    }

    async fn update_many(
        &self,
        filter: &CardFilter,
        patch: CardPatch,
    ) -> Result<usize, StoreError> {
        let mut cards = self.cards.write().await;
        let mut touched = 0usize;
        for card in cards.values_mut().filter(|c| filter.matches(c)) {
            patch.apply(card);
            touched += 1;
        }
        Ok(touched)
    }

    async fn insert(&self, card: Card) -> Result<(), StoreError> {
        self.cards.write().await.insert(card.id.clone(), card);
        Ok(())
    }
}
