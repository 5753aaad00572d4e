//! Application configuration (practice defaults + optional card bank) from
//! TOML.
//!
//! See `AppConfig` for the expected schema. Everything has a default, so the
//! server runs fine with no config file at all.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Card;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub practice: PracticeConfig,
    #[serde(default)]
    pub cards: Vec<SeedCardCfg>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    /// Cards handed out for a core exercise when a request does not say
    /// how many.
    pub default_limit: usize,
    /// Cards handed out per reading-comprehension round by default. Reading
    /// rounds are longer per card, so this sits lower than `default_limit`.
    pub default_rotation_count: usize,
    /// Owner the built-in demo cards (and bank cards without an owner)
    /// belong to.
    pub demo_owner: String,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            default_rotation_count: 5,
            demo_owner: "demo-user".into(),
        }
    }
}

/// Card entry accepted in TOML configuration (`[[cards]]` blocks).
#[derive(Clone, Debug, Deserialize)]
pub struct SeedCardCfg {
    #[serde(default)]
    pub owner: Option<String>,
    pub text: String,
    pub translation: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl SeedCardCfg {
    /// A fresh learning card for this bank entry.
    pub fn to_card(&self, fallback_owner: &str, now: DateTime<Utc>) -> Card {
        Card::new(
            self.owner.clone().unwrap_or_else(|| fallback_owner.to_string()),
            self.category.clone(),
            self.text.clone(),
            self.translation.clone(),
            now,
        )
    }
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error,
/// returns None and the caller falls back to defaults.
pub fn load_app_config_from_env() -> Option<AppConfig> {
    let path = std::env::var("APP_CONFIG_PATH").ok()?;
    match std::fs::read_to_string(&path) {
        Ok(s) => match toml::from_str::<AppConfig>(&s) {
            Ok(cfg) => {
                info!(target: "lexivault_backend", %path, "Loaded app config (TOML)");
                Some(cfg)
            }
            Err(e) => {
                error!(target: "lexivault_backend", %path, error = %e, "Failed to parse TOML config");
                None
            }
        },
        Err(e) => {
            error!(target: "lexivault_backend", %path, error = %e, "Failed to read TOML config file");
            None
        }
    }
}
