//! Custom event pages.

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tera::Context;

use scal_core::ScalError;
use scal_core::custom::{CustomEvent, CustomEventDraft, display_order};

use crate::error::AppError;
use crate::pages;
use crate::routes::{NoticeQuery, redirect_with_notice};
use crate::state::AppState;

/// Rows shown on the list page.
const LIST_LIMIT: usize = 50;

const REPEATS: [&str; 5] = ["none", "daily", "weekly", "monthly", "yearly"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/custom", get(list))
        .route("/custom/add", post(add))
        .route("/custom/delete/{id}", post(delete))
        .route("/custom/edit/{id}", get(edit_form).post(edit))
}

/// Form body. Accepts both the current field names and the short ones.
#[derive(Debug, Default, Deserialize)]
pub struct CustomForm {
    #[serde(default, alias = "event_name")]
    pub name: String,
    #[serde(default, alias = "event_description")]
    pub description: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, alias = "event_date")]
    pub date: String,
    #[serde(default, alias = "event_time")]
    pub time: String,
    #[serde(default)]
    pub repeat: String,
}

impl From<CustomForm> for CustomEventDraft {
    fn from(form: CustomForm) -> Self {
        CustomEventDraft {
            name: form.name,
            description: form.description,
            course_name: form.course_name,
            kind: form.kind,
            date: form.date,
            time: form.time,
            repeat: form.repeat,
        }
    }
}

/// Field values for the add/edit form.
#[derive(Debug, Default, Serialize)]
struct FormView {
    name: String,
    description: String,
    course_name: String,
    kind: String,
    date: String,
    time: String,
    repeat: String,
}

impl From<&CustomEvent> for FormView {
    fn from(event: &CustomEvent) -> Self {
        FormView {
            name: event.name.clone(),
            description: event.description.clone(),
            course_name: event.course_name.clone(),
            kind: event.kind.as_str().to_string(),
            date: event.date.format("%Y-%m-%d").to_string(),
            time: event
                .time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            repeat: event.repeat.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Row {
    id: String,
    name: String,
    course_name: String,
    kind: &'static str,
    date: String,
    time: String,
    repeat: &'static str,
}

fn form_context(form: FormView) -> Context {
    let mut context = Context::new();
    context.insert("form", &form);
    context.insert("repeats", &REPEATS);
    context
}

/// GET /custom - List custom events, upcoming first
async fn list(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    let now = Utc::now().with_timezone(&state.config.tz());
    let today = now.date_naive();

    let rows: Vec<Row> = display_order(state.store.custom_events(), now)
        .into_iter()
        .take(LIST_LIMIT)
        .map(|e| Row {
            date: e.display_date(today).format("%a, %b %-d, %Y").to_string(),
            time: e
                .time
                .map(|t| t.format("%-I:%M %p").to_string())
                .unwrap_or_default(),
            kind: e.kind.as_str(),
            repeat: e.repeat.as_str(),
            id: e.id,
            name: e.name,
            course_name: e.course_name,
        })
        .collect();

    let mut context = form_context(FormView {
        kind: "event".into(),
        repeat: "none".into(),
        ..Default::default()
    });
    context.insert("events", &rows);

    pages::render(&state.templates, "custom.html", context, query.notice.as_deref())
}

/// POST /custom/add - Create a custom event
async fn add(
    State(state): State<AppState>,
    Form(form): Form<CustomForm>,
) -> Result<Redirect, AppError> {
    match state.store.add_custom_event(&form.into()) {
        Ok(event) => Ok(redirect_with_notice("/custom", &format!("Added {}.", event.name))),
        Err(ScalError::InvalidInput(msg)) => Ok(redirect_with_notice("/custom", &msg)),
        Err(e) => Err(e.into()),
    }
}

/// POST /custom/delete/:id - Delete a custom event
async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let notice = if state.store.remove_custom_event(&id)? {
        "Deleted."
    } else {
        "That event was already gone."
    };
    Ok(redirect_with_notice("/custom", notice))
}

/// GET /custom/edit/:id - Edit form
async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    let event = state
        .store
        .custom_event(&id)
        .ok_or_else(|| ScalError::NotFound(format!("Custom event {id}")))?;

    let mut context = form_context(FormView::from(&event));
    context.insert("id", &event.id);

    pages::render(&state.templates, "custom_edit.html", context, query.notice.as_deref())
}

/// POST /custom/edit/:id - Save an edit
async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CustomForm>,
) -> Result<Redirect, AppError> {
    match state.store.update_custom_event(&id, &form.into()) {
        Ok(event) => Ok(redirect_with_notice("/custom", &format!("Saved {}.", event.name))),
        Err(ScalError::InvalidInput(msg)) => {
            Ok(redirect_with_notice(&format!("/custom/edit/{id}"), &msg))
        }
        Err(e) => Err(e.into()),
    }
}
