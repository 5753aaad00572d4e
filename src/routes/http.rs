//! HTTP endpoint handlers. Thin wrappers that parse the wire shapes and
//! forward to the practice service; each handler is instrumented and logs
//! basic result info.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::ExerciseKind;
use crate::error::Error;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, q), fields(owner = %q.owner_id, exercise = %q.exercise))]
pub async fn http_get_eligible(
    State(state): State<Arc<AppState>>,
    Query(q): Query<EligibleQuery>,
) -> Result<Json<SelectionOut>, Error> {
    let kind: ExerciseKind = q.exercise.parse()?;
    let limit = q.limit.unwrap_or(if kind.is_core() {
        state.config.practice.default_limit
    } else {
        state.config.practice.default_rotation_count
    });
    let scope = parse_category_scope(q.category.as_deref());
    let exclude = parse_exclude_ids(q.exclude_ids.as_deref());

    let result = state
        .service
        .eligible_cards(&q.owner_id, kind, limit, scope, &exclude, Utc::now())
        .await?;
    info!(
        target: "practice",
        owner = %q.owner_id,
        %kind,
        served = result.cards.len(),
        rotation = result.rotation_applied,
        "HTTP eligible cards served"
    );
    Ok(Json(selection_to_out(&result)))
}

#[instrument(level = "info", skip(state, body), fields(owner = %body.owner_id, exercise = %body.exercise, correct = body.correct))]
pub async fn http_post_outcome(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OutcomeIn>,
) -> Result<Json<OutcomeOut>, Error> {
    let kind: ExerciseKind = body.exercise.parse()?;
    let card_ids = body.card_ids.into_vec();

    let cards = state
        .service
        .record_outcome(&body.owner_id, &card_ids, kind, body.correct, Utc::now())
        .await?;
    info!(
        target: "practice",
        owner = %body.owner_id,
        %kind,
        updated = cards.len(),
        "HTTP outcome recorded"
    );
    Ok(Json(OutcomeOut {
        cards: cards.iter().map(to_out).collect(),
    }))
}

#[instrument(level = "info", skip(state, body), fields(owner = %body.owner_id, card = %body.card_id))]
pub async fn http_post_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetIn>,
) -> Result<Json<CardOut>, Error> {
    let card = state.service.reset_card(&body.owner_id, &body.card_id).await?;
    info!(target: "practice", card = %card.id, "HTTP card reset");
    Ok(Json(to_out(&card)))
}
