//! Lexivault · vocabulary practice backend.
//!
//! The practice core of a vocabulary-learning app:
//! - per-card learning progress across four core exercise types, with
//!   promotion to review once all four are completed
//! - eligibility selection for core exercises
//! - cycle-based rotation for the auxiliary reading-comprehension exercise
//! - a thin Axum HTTP API over the in-memory card store
//!
//! Binary entry lives in `main.rs`; integration tests drive the service and
//! router through this crate root.

pub mod config;
pub mod domain;
pub mod error;
pub mod progress;
pub mod protocol;
pub mod rotation;
pub mod routes;
pub mod sampling;
pub mod seeds;
pub mod selection;
pub mod service;
pub mod state;
pub mod store;
pub mod telemetry;
