use axum::{
    Form, Router,
    extract::{Query, State},
    response::{Html, Redirect},
    routing::get,
};
use serde::Deserialize;
use tera::Context;

use scal_core::ScalError;

use crate::error::AppError;
use crate::pages;
use crate::routes::{NoticeQuery, redirect_with_notice};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(show).post(save))
}

/// HTML checkboxes are absent when unchecked.
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub stack_events: Option<String>,
    pub stack_start_time: Option<String>,
}

/// GET /settings - Effective stacking settings
async fn show(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    let effective = state
        .store
        .settings()
        .resolve(state.config.stack_events, state.config.default_stack_start());

    let mut context = Context::new();
    context.insert("stack_events", &effective.stack_events);
    context.insert(
        "stack_start_time",
        &effective.stack_start.format("%H:%M").to_string(),
    );

    pages::render(&state.templates, "settings.html", context, query.notice.as_deref())
}

/// POST /settings - Save stacking settings
async fn save(
    State(state): State<AppState>,
    Form(form): Form<SettingsForm>,
) -> Result<Redirect, AppError> {
    let stack = form
        .stack_events
        .as_deref()
        .is_some_and(|v| matches!(v, "on" | "true" | "1"));

    match state
        .store
        .update_settings(Some(stack), form.stack_start_time.as_deref())
    {
        Ok(_) => Ok(redirect_with_notice("/settings", "Settings saved.")),
        Err(ScalError::InvalidInput(msg)) => Ok(redirect_with_notice("/settings", &msg)),
        Err(e) => Err(e.into()),
    }
}
