//! Application state: configuration and the practice service over the
//! in-memory card store.
//!
//! This module owns startup seeding: bank cards from TOML config first, then
//! the built-in demo deck, plus the startup inventory log.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{error, info, instrument};

use crate::config::{load_app_config_from_env, AppConfig};
use crate::seeds::demo_cards;
use crate::service::PracticeService;
use crate::store::{CardStore, MemoryStore};

pub struct AppState {
    pub config: AppConfig,
    pub service: PracticeService<MemoryStore>,
}

impl AppState {
    /// Build state from env: load config, seed the store, report inventory.
    #[instrument(level = "info", skip_all)]
    pub async fn new() -> Self {
        let config = load_app_config_from_env().unwrap_or_default();
        let store = MemoryStore::new();
        let now = Utc::now();

        // Config-bank cards (if any) land first.
        for entry in &config.cards {
            let card = entry.to_card(&config.practice.demo_owner, now);
            if let Err(e) = store.insert(card).await {
                error!(target: "lexivault_backend", error = %e, text = %entry.text, "Failed to seed bank card");
            }
        }

        // Built-in demo deck for the demo owner.
        for card in demo_cards(&config.practice.demo_owner, now) {
            if let Err(e) = store.insert(card).await {
                error!(target: "lexivault_backend", error = %e, "Failed to seed demo card");
            }
        }

        // Inventory summary by category.
        let mut count_by_category: HashMap<String, usize> = HashMap::new();
        if let Ok(cards) = store.find_many(&Default::default()).await {
            for c in &cards {
                let label = c
                    .category_id
                    .clone()
                    .unwrap_or_else(|| "uncategorized".to_string());
                *count_by_category.entry(label).or_insert(0) += 1;
            }
        }
        for (category, count) in &count_by_category {
            info!(target: "practice", %category, count, "Startup card inventory");
        }
        let total = store.len().await;
        info!(target: "lexivault_backend", total, "Card store seeded");

        Self {
            config,
            service: PracticeService::new(store),
        }
    }
}
