//! Done marks and the catalog refresh.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::get,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tera::Context;
use tracing::info;

use scal_core::catalog;

use crate::error::AppError;
use crate::pages;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/mark-done/{id}", get(mark_done))
        .route("/api/unmark-done/{id}", get(unmark_done))
        .route("/api/refresh-item-map", get(refresh_item_map))
        .route("/mark-overdue", get(mark_overdue))
}

#[derive(Debug, Deserialize)]
pub struct OccurrenceQuery {
    pub occ: Option<String>,
}

/// GET /api/mark-done/:id - Mark an item (or one occurrence) done
async fn mark_done(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OccurrenceQuery>,
) -> Result<Redirect, AppError> {
    state.store.mark_done(&id, query.occ.as_deref())?;
    Ok(Redirect::to("/ok"))
}

/// GET /api/unmark-done/:id - Remove a done mark
async fn unmark_done(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OccurrenceQuery>,
) -> Result<Redirect, AppError> {
    state.store.unmark_done(&id, query.occ.as_deref())?;
    Ok(Redirect::to("/ok"))
}

/// GET /api/refresh-item-map - Rebuild the section catalog now
async fn refresh_item_map(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let summary = catalog::refresh(
        state.upstream.as_ref(),
        &state.store,
        &state.config,
        Utc::now(),
        true,
    )
    .await?;

    let mut context = Context::new();
    context.insert("summary", &summary);
    pages::render(&state.templates, "refresh.html", context, None)
}

/// GET /mark-overdue - Mark every assignment whose start has passed as done
async fn mark_overdue(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let tz = state.config.tz();
    let now = Utc::now().with_timezone(&tz);
    let from = (now - Duration::days(state.config.window.days_back)).date_naive();

    let events = state.upstream.events(from, now.date_naive()).await?;

    let mut ids = Vec::new();
    let mut newly = 0;
    for event in events.iter().filter(|e| e.is_assignment()) {
        let Some(start) = event.start_in(tz) else {
            continue;
        };
        if start >= now {
            continue;
        }

        let id = event.assignment_key();
        if state.store.mark_done(id, None)? {
            newly += 1;
        }
        ids.push(id.to_string());
    }

    info!(total = ids.len(), newly, "Marked past assignments done");

    let mut context = Context::new();
    context.insert("ids", &ids);
    context.insert("newly", &newly);
    pages::render(&state.templates, "mark_overdue.html", context, None)
}
